//! DELETE statement builder

use super::{require_table, CrudMode, QueryBuilder};
use crate::parser::{parse_conditions, render_conditions, Conditions};
use crate::{Error, Result};

/// DELETE statement builder
///
/// A DELETE must carry at least one condition; an empty predicate is
/// rejected instead of compiling to an unconditioned delete.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteBuilder {
    pub(crate) table_name: String,
    pub(crate) conditions: Option<Conditions>,
}

impl DeleteBuilder {
    /// Create a new DELETE builder
    pub fn new(table: &str) -> Self {
        Self {
            table_name: table.to_string(),
            conditions: None,
        }
    }

    /// Restrict the deleted rows with AND-combined conditions
    pub fn where_(mut self, conditions: impl Into<Conditions>) -> Self {
        self.conditions = Some(conditions.into());
        self
    }
}

impl QueryBuilder for DeleteBuilder {
    fn mode(&self) -> CrudMode {
        CrudMode::Delete
    }

    fn to_sql(&self) -> Result<String> {
        let table = require_table(&self.table_name)?;

        let clauses = match &self.conditions {
            Some(conditions) => parse_conditions(conditions)?,
            None => Vec::new(),
        };
        if clauses.is_empty() {
            return Err(Error::validation(
                "DELETE requires WHERE condition for safety",
            ));
        }

        let mut sql = String::new();

        // DELETE FROM clause
        sql.push_str("DELETE FROM ");
        sql.push_str(table);

        // WHERE clause
        sql.push_str(" WHERE ");
        sql.push_str(&render_conditions(&clauses));

        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{delete, Fields};

    #[test]
    fn test_delete_builder() {
        let query = delete("test").where_([("id", "1"), ("name", "chu henn")]);
        assert_eq!(
            query.to_sql().unwrap(),
            "DELETE FROM test WHERE `id`='1' AND `name`='chu henn'"
        );
    }

    #[test]
    fn test_delete_expression() {
        let query = delete("token_log").where_("created_at < now()");
        assert_eq!(
            query.to_sql().unwrap(),
            "DELETE FROM token_log WHERE `created_at`<now()"
        );
    }

    #[test]
    fn test_delete_without_where_fails() {
        let result = delete("users").to_sql();
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("DELETE requires WHERE condition for safety"));
    }

    #[test]
    fn test_delete_with_empty_conditions_fails() {
        let err = delete("users").where_(Fields::new()).to_sql().unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));

        let err = delete("users").where_("   ").to_sql().unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }
}
