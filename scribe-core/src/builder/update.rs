//! UPDATE statement builder

use super::{require_table, CrudMode, QueryBuilder};
use crate::parser::{
    normalize_columns, normalize_delimited_values, normalize_values, parse_conditions,
    quote_identifier, render_conditions, Columns, Conditions, Values,
};
use crate::{Error, Fields, Literal, Result};

/// UPDATE statement builder
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateBuilder {
    pub(crate) table_name: String,
    pub(crate) columns: Option<Columns>,
    pub(crate) values: Option<Values>,
    pub(crate) columns_values: Option<Fields>,
    pub(crate) conditions: Option<Conditions>,
}

impl UpdateBuilder {
    /// Create a new UPDATE builder
    pub fn new(table: &str) -> Self {
        Self {
            table_name: table.to_string(),
            columns: None,
            values: None,
            columns_values: None,
            conditions: None,
        }
    }

    /// Set column values from an ordered mapping
    ///
    /// # Examples
    /// ```
    /// use scribe_core::{update, QueryBuilder};
    ///
    /// let query = update("users")
    ///     .set([("last_log_id", 42)])
    ///     .where_([("user_id", 7)]);
    /// assert_eq!(
    ///     query.to_sql().unwrap(),
    ///     "UPDATE users SET `last_log_id`='42' WHERE `user_id`='7'"
    /// );
    /// ```
    pub fn set(mut self, fields: impl Into<Fields>) -> Self {
        self.columns_values = Some(fields.into());
        self
    }

    /// Set the columns to modify, paired positionally with [`values`](Self::values)
    pub fn columns(mut self, columns: impl Into<Columns>) -> Self {
        self.columns = Some(columns.into());
        self
    }

    /// Set the new values, paired positionally with [`columns`](Self::columns)
    pub fn values(mut self, values: impl Into<Values>) -> Self {
        self.values = Some(values.into());
        self
    }

    /// Restrict the affected rows with AND-combined conditions
    pub fn where_(mut self, conditions: impl Into<Conditions>) -> Self {
        self.conditions = Some(conditions.into());
        self
    }

    fn assignments(&self) -> Result<Vec<(String, Literal)>> {
        let (columns, values) = match self.columns_values.as_ref().filter(|f| !f.is_empty()) {
            Some(fields) => {
                let (columns, values) = fields.decompose();
                (columns, normalize_values(&values))
            }
            None => {
                let columns = match &self.columns {
                    Some(columns) => normalize_columns(columns)?,
                    None => Vec::new(),
                };
                let values = match &self.values {
                    Some(Values::Row(row)) => normalize_values(row),
                    Some(Values::Delimited(text)) => normalize_delimited_values(text),
                    Some(Values::Batch(_)) => {
                        return Err(Error::validation("UPDATE does not accept batch values"))
                    }
                    None => Vec::new(),
                };
                (columns, values)
            }
        };

        if columns.is_empty() {
            return Err(Error::validation("UPDATE requires columns"));
        }
        if values.is_empty() {
            return Err(Error::validation("UPDATE requires values"));
        }
        if columns.len() != values.len() {
            return Err(Error::validation(format!(
                "UPDATE has {} columns but {} values",
                columns.len(),
                values.len()
            )));
        }

        Ok(columns.into_iter().zip(values).collect())
    }
}

impl QueryBuilder for UpdateBuilder {
    fn mode(&self) -> CrudMode {
        CrudMode::Update
    }

    fn to_sql(&self) -> Result<String> {
        let table = require_table(&self.table_name)?;
        let assignments = self.assignments()?;

        let mut sql = String::new();

        // UPDATE clause
        sql.push_str("UPDATE ");
        sql.push_str(table);

        // SET clause
        sql.push_str(" SET ");
        let set_parts: Vec<String> = assignments
            .iter()
            .map(|(column, value)| format!("{}={}", quote_identifier(column), value))
            .collect();
        sql.push_str(&set_parts.join(", "));

        // WHERE clause
        if let Some(conditions) = &self.conditions {
            let clauses = parse_conditions(conditions)?;
            if !clauses.is_empty() {
                sql.push_str(" WHERE ");
                sql.push_str(&render_conditions(&clauses));
            }
        }

        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::update;

    const EXPECTED: &str =
        "UPDATE test SET `id`='1', `name`='henn', `datetime`=now() WHERE `id`='1' AND `name`='chu henn'";

    #[test]
    fn test_update_columns_and_values() {
        let query = update("test")
            .columns(["id", "name", "datetime"])
            .values(["1", "henn", "now()"])
            .where_([("id", "1"), ("name", "chu henn")]);
        assert_eq!(query.to_sql().unwrap(), EXPECTED);
    }

    #[test]
    fn test_update_mapping() {
        let query = update("test")
            .set([("id", "1"), ("name", "henn"), ("datetime", "now()")])
            .where_([("id", "1"), ("name", "chu henn")]);
        assert_eq!(query.to_sql().unwrap(), EXPECTED);
    }

    #[test]
    fn test_update_without_conditions() {
        let query = update("test").columns("flag").values("0");
        assert_eq!(query.to_sql().unwrap(), "UPDATE test SET `flag`='0'");
    }

    #[test]
    fn test_update_length_mismatch_fails() {
        let err = update("test")
            .columns("id, name, datetime")
            .values("1, henn")
            .to_sql()
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert!(err.to_string().contains("3 columns but 2 values"));
    }

    #[test]
    fn test_update_requires_columns_and_values() {
        let err = update("test").values("1").to_sql().unwrap_err();
        assert!(err.to_string().contains("UPDATE requires columns"));

        let err = update("test").columns("id").to_sql().unwrap_err();
        assert!(err.to_string().contains("UPDATE requires values"));
    }

    #[test]
    fn test_update_rejects_batch() {
        let err = update("test")
            .columns("id")
            .values([["1"], ["2"]])
            .to_sql()
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }
}
