//! SELECT statement builder

use super::{CrudMode, JoinKind, QueryBuilder};
use crate::parser::{
    normalize_columns, parse_conditions, quote_identifier, render_conditions, Columns,
    Conditions, Tables,
};
use crate::{Error, Result};

/// SELECT statement builder over one table, or two joined tables
#[derive(Debug, Clone, PartialEq)]
pub struct SelectBuilder {
    pub(crate) tables: Tables,
    pub(crate) columns: Option<Columns>,
    pub(crate) conditions: Option<Conditions>,
    pub(crate) join: Option<String>,
    pub(crate) join_condition: Option<String>,
    pub(crate) limit_value: u64,
    pub(crate) offset_value: u64,
}

impl SelectBuilder {
    /// Create a new SELECT builder
    pub fn from_tables(tables: impl Into<Tables>) -> Self {
        Self {
            tables: tables.into(),
            columns: None,
            conditions: None,
            join: None,
            join_condition: None,
            limit_value: 0,
            offset_value: 0,
        }
    }

    /// Select specific columns; defaults to `*`
    pub fn select(mut self, columns: impl Into<Columns>) -> Self {
        self.columns = Some(columns.into());
        self
    }

    /// Restrict the result with AND-combined conditions
    ///
    /// # Examples
    /// ```
    /// use scribe_core::{from, QueryBuilder};
    ///
    /// let query = from("test").where_("id > 12, datetime <= now()");
    /// assert_eq!(
    ///     query.to_sql().unwrap(),
    ///     "SELECT * FROM test WHERE `id`>'12' AND `datetime`<=now()"
    /// );
    /// ```
    pub fn where_(mut self, conditions: impl Into<Conditions>) -> Self {
        self.conditions = Some(conditions.into());
        self
    }

    /// Join the second table, e.g. `join("LEFT JOIN", "a.id=b.a_id")`
    pub fn join(mut self, kind: impl Into<String>, condition: impl Into<String>) -> Self {
        self.join = Some(kind.into());
        self.join_condition = Some(condition.into());
        self
    }

    /// Set the LIMIT clause; 0 means unlimited
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit_value = limit;
        self
    }

    /// Set the OFFSET clause; only emitted together with LIMIT
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset_value = offset;
        self
    }

    /// Validate the join descriptor for a two-table select
    fn join_clause(&self, tables: &[String]) -> Result<Option<String>> {
        match tables {
            [_] => {
                if self.join.is_some() {
                    tracing::debug!("join parameters ignored for single-table select");
                }
                Ok(None)
            }
            [_, second] => {
                let kind = self
                    .join
                    .as_deref()
                    .filter(|k| !k.trim().is_empty())
                    .ok_or_else(|| {
                        Error::validation(
                            "join method and condition are required for multiple tables",
                        )
                    })?
                    .parse::<JoinKind>()?;
                let condition = self
                    .join_condition
                    .as_deref()
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .ok_or_else(|| {
                        Error::validation("join condition is expected for table join")
                    })?;
                Ok(Some(format!("{} {} ON {}", kind, second, condition)))
            }
            _ => Err(Error::validation(format!(
                "SELECT supports one table or two joined tables, got {}",
                tables.len()
            ))),
        }
    }
}

impl QueryBuilder for SelectBuilder {
    fn mode(&self) -> CrudMode {
        CrudMode::Select
    }

    fn to_sql(&self) -> Result<String> {
        let tables = self.tables.normalized()?;
        let join = self.join_clause(&tables)?;

        let columns = match &self.columns {
            Some(columns) => normalize_columns(columns)?,
            None => Vec::new(),
        };

        let mut sql = String::new();

        // SELECT clause
        sql.push_str("SELECT ");
        if columns.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(
                &columns
                    .iter()
                    .map(|c| quote_identifier(c))
                    .collect::<Vec<_>>()
                    .join(", "),
            );
        }

        // FROM clause
        sql.push_str(" FROM ");
        sql.push_str(&tables[0]);

        // JOIN clause
        if let Some(join) = join {
            sql.push(' ');
            sql.push_str(&join);
        }

        // WHERE clause
        if let Some(conditions) = &self.conditions {
            let clauses = parse_conditions(conditions)?;
            if !clauses.is_empty() {
                sql.push_str(" WHERE ");
                sql.push_str(&render_conditions(&clauses));
            }
        }

        // LIMIT and OFFSET
        if self.limit_value > 0 {
            sql.push_str(&format!(" LIMIT {}", self.limit_value));
            if self.offset_value > 0 {
                sql.push_str(&format!(" OFFSET {}", self.offset_value));
            }
        } else if self.offset_value > 0 {
            tracing::warn!(
                offset = self.offset_value,
                "OFFSET without LIMIT is not emitted"
            );
        }

        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{from, Fields, Value};

    #[test]
    fn test_select_columns_with_mapping_conditions() {
        let query = from("test")
            .select("id, name, datetime")
            .where_([("id", "1"), ("name", "chu henn")]);
        assert_eq!(
            query.to_sql().unwrap(),
            "SELECT `id`, `name`, `datetime` FROM test WHERE `id`='1' AND `name`='chu henn'"
        );
    }

    #[test]
    fn test_select_empty_conditions_omit_where() {
        let query = from("test")
            .select(["id", "name", "datetime"])
            .where_(Fields::new());
        assert_eq!(query.to_sql().unwrap(), "SELECT `id`, `name`, `datetime` FROM test");
    }

    #[test]
    fn test_select_expression_conditions() {
        let query = from("test")
            .select(["id", "name", "datetime"])
            .where_(r#"name="chu henn", id > 12, datetime <= now()"#);
        assert_eq!(
            query.to_sql().unwrap(),
            "SELECT `id`, `name`, `datetime` FROM test WHERE `name`='chu henn' AND `id`>'12' AND `datetime`<=now()"
        );
    }

    #[test]
    fn test_select_join() {
        let query = from(["users", "token_log"])
            .select("users.user_id, token_log.jwt_token")
            .join("left join", "users.last_log_id=token_log.log_id")
            .where_([("users.username", "chkhong")]);
        assert_eq!(
            query.to_sql().unwrap(),
            "SELECT `users`.`user_id`, `token_log`.`jwt_token` FROM users LEFT JOIN token_log ON users.last_log_id=token_log.log_id WHERE `users`.`username`='chkhong'"
        );
    }

    #[test]
    fn test_select_two_tables_without_join_fails() {
        let err = from(["test", "test2"]).to_sql().unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn test_select_join_without_condition_fails() {
        let query = from(["test", "test2"]).join("INNER JOIN", "  ");
        assert!(matches!(query.to_sql().unwrap_err(), Error::Validation { .. }));
    }

    #[test]
    fn test_select_unsupported_join_fails() {
        let query = from(["test", "test2"]).join("FULL JOIN", "test.id=test2.id");
        assert!(matches!(query.to_sql().unwrap_err(), Error::Validation { .. }));
    }

    #[test]
    fn test_select_more_than_two_tables_fails() {
        let query = from(["a", "b", "c"]).join("INNER JOIN", "a.id=b.id");
        let err = query.to_sql().unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert!(err.to_string().contains("got 3"));
    }

    #[test]
    fn test_select_limit_offset_order() {
        let query = from(["test", "test2"])
            .join("INNER JOIN", "test.id=test2.id")
            .where_([("test.id", Value::from(1))])
            .limit(50)
            .offset(5);
        assert_eq!(
            query.to_sql().unwrap(),
            "SELECT * FROM test INNER JOIN test2 ON test.id=test2.id WHERE `test`.`id`='1' LIMIT 50 OFFSET 5"
        );
    }

    #[test]
    fn test_select_offset_requires_limit() {
        let query = from("test").offset(5);
        assert_eq!(query.to_sql().unwrap(), "SELECT * FROM test");
    }

    #[test]
    fn test_select_join_ignored_for_single_table() {
        let query = from("test").join("INNER JOIN", "test.id=test2.id");
        assert_eq!(query.to_sql().unwrap(), "SELECT * FROM test");
    }

    #[test]
    fn test_select_malformed_condition_fails() {
        let err = from("test").where_("id 1").to_sql().unwrap_err();
        assert!(matches!(err, Error::Format { .. }));
    }
}
