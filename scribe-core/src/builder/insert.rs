//! INSERT statement builder

use super::{require_table, CrudMode, QueryBuilder};
use crate::parser::{normalize_columns, normalize_rows, quote_identifier, Columns, Values};
use crate::{Error, Fields, Literal, Result};

/// INSERT statement builder
///
/// A column-value mapping, when given, takes precedence over separately
/// supplied columns and values.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertBuilder {
    pub(crate) table_name: String,
    pub(crate) columns: Option<Columns>,
    pub(crate) values: Option<Values>,
    pub(crate) columns_values: Option<Fields>,
}

impl InsertBuilder {
    /// Create a new INSERT builder
    pub fn new(table: &str) -> Self {
        Self {
            table_name: table.to_string(),
            columns: None,
            values: None,
            columns_values: None,
        }
    }

    /// Set the target columns
    pub fn columns(mut self, columns: impl Into<Columns>) -> Self {
        self.columns = Some(columns.into());
        self
    }

    /// Set one row of values, or a batch of rows
    ///
    /// # Examples
    /// ```
    /// use scribe_core::{insert, QueryBuilder};
    ///
    /// let query = insert("test")
    ///     .columns("id, name")
    ///     .values([["1", "henn"], ["2", "test1"]]);
    /// assert_eq!(
    ///     query.to_sql().unwrap(),
    ///     "INSERT INTO test (`id`, `name`) VALUES ('1', 'henn'), ('2', 'test1')"
    /// );
    /// ```
    pub fn values(mut self, values: impl Into<Values>) -> Self {
        self.values = Some(values.into());
        self
    }

    /// Set columns and values together from an ordered mapping
    pub fn columns_values(mut self, fields: impl Into<Fields>) -> Self {
        self.columns_values = Some(fields.into());
        self
    }

    fn resolve(&self) -> Result<(Vec<String>, Vec<Vec<Literal>>)> {
        if let Some(fields) = self.columns_values.as_ref().filter(|f| !f.is_empty()) {
            let (columns, values) = fields.decompose();
            let row = values.iter().map(Literal::from).collect();
            return Ok((columns, vec![row]));
        }

        let columns = match &self.columns {
            Some(columns) => normalize_columns(columns)?,
            None => Vec::new(),
        };
        if columns.is_empty() {
            return Err(Error::validation("INSERT requires columns"));
        }

        let rows = match &self.values {
            Some(values) => normalize_rows(values),
            None => Vec::new(),
        };
        if rows.is_empty() || rows.iter().all(|row| row.is_empty()) {
            return Err(Error::validation("INSERT requires values"));
        }

        Ok((columns, rows))
    }
}

impl QueryBuilder for InsertBuilder {
    fn mode(&self) -> CrudMode {
        CrudMode::Insert
    }

    fn to_sql(&self) -> Result<String> {
        let table = require_table(&self.table_name)?;
        let (columns, rows) = self.resolve()?;

        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(Error::validation(format!(
                    "INSERT row {} has {} values for {} columns",
                    i,
                    row.len(),
                    columns.len()
                )));
            }
        }

        let mut sql = String::new();

        // INSERT INTO clause
        sql.push_str("INSERT INTO ");
        sql.push_str(table);

        // Columns
        sql.push_str(" (");
        sql.push_str(
            &columns
                .iter()
                .map(|c| quote_identifier(c))
                .collect::<Vec<_>>()
                .join(", "),
        );
        sql.push(')');

        // VALUES clause, batch rows joined as `), (`
        sql.push_str(" VALUES (");
        let value_groups: Vec<String> = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(Literal::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .collect();
        sql.push_str(&value_groups.join("), ("));
        sql.push(')');

        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{insert, Value};

    const EXPECTED: &str =
        "INSERT INTO test (`id`, `name`, `datetime`) VALUES ('1', 'henn', now())";

    #[test]
    fn test_insert_list_columns_delimited_values() {
        let query = insert("test")
            .columns(["id", "name", "datetime"])
            .values("1, henn, now()");
        assert_eq!(query.to_sql().unwrap(), EXPECTED);
    }

    #[test]
    fn test_insert_delimited_columns_list_values() {
        let query = insert("test")
            .columns("id, name, datetime")
            .values(["1", "henn", "now()"]);
        assert_eq!(query.to_sql().unwrap(), EXPECTED);
    }

    #[test]
    fn test_insert_columns_values_mapping() {
        let query = insert("test").columns_values([("id", "1"), ("name", "henn"), ("datetime", "now()")]);
        assert_eq!(query.to_sql().unwrap(), EXPECTED);
    }

    #[test]
    fn test_mapping_overrides_columns_and_values() {
        let query = insert("test")
            .columns("other")
            .values("x")
            .columns_values([("id", "1"), ("name", "henn"), ("datetime", "now()")]);
        assert_eq!(query.to_sql().unwrap(), EXPECTED);
    }

    #[test]
    fn test_insert_batch() {
        let query = insert("test")
            .columns("id, name, datetime")
            .values([
                ["1", "henn", "now()"],
                ["2", "test1", "now()"],
                ["3", "test 2", "now()"],
            ]);
        assert_eq!(
            query.to_sql().unwrap(),
            "INSERT INTO test (`id`, `name`, `datetime`) VALUES ('1', 'henn', now()), ('2', 'test1', now()), ('3', 'test 2', now())"
        );
    }

    #[test]
    fn test_insert_typed_values() {
        let query = insert("users")
            .columns_values(Fields::new().with("user_id", 7).with("is_active", true).with("note", Value::Null));
        assert_eq!(
            query.to_sql().unwrap(),
            "INSERT INTO users (`user_id`, `is_active`, `note`) VALUES ('7', '1', NULL)"
        );
    }

    #[test]
    fn test_insert_requires_columns() {
        let err = insert("test").values("1, 2").to_sql().unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert!(err.to_string().contains("INSERT requires columns"));
    }

    #[test]
    fn test_insert_requires_values() {
        let err = insert("test").columns("id").to_sql().unwrap_err();
        assert!(err.to_string().contains("INSERT requires values"));

        let err = insert("test")
            .columns("id")
            .values(Vec::<Value>::new())
            .to_sql()
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn test_insert_row_length_mismatch_fails() {
        let err = insert("test")
            .columns("id, name")
            .values(vec![vec!["1", "a"], vec!["2"]])
            .to_sql()
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn test_insert_requires_table() {
        let err = insert("").columns("id").values("1").to_sql().unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }
}
