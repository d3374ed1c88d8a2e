//! Scribe Core - a textual SQL statement compiler with a single-connection
//! execution gateway
//!
//! Statements are built from loosely-typed inputs (lists, comma-delimited
//! strings or ordered mappings), compiled into MySQL text and executed over
//! one fresh connection per call. Results always come back as an
//! [`Envelope`].
//!
//! Values are interpolated as quoted literals and are **not** escaped.
//! Never feed untrusted input through the builders; use
//! [`Gateway::execute`] or [`Gateway::retrieve`] with bound arguments
//! instead.

pub mod builder;
pub mod envelope;
pub mod error;
pub mod executor;
pub mod operator;
pub mod parser;
pub mod value;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export main types
pub use builder::{
    CrudMode, DeleteBuilder, InsertBuilder, JoinKind, QueryBuilder, SelectBuilder, Statement,
    UpdateBuilder,
};
pub use envelope::{Envelope, Row};
pub use error::{Error, Result};
pub use executor::{Connection, Connector, Gateway, Outcome};
pub use operator::Operator;
pub use parser::{Clause, Columns, Conditions, Tables, Values};
pub use value::{Fields, Literal, Value, NOW};

/// Start an INSERT into `table`
pub fn insert(table: &str) -> InsertBuilder {
    InsertBuilder::new(table)
}

/// Start a SELECT from one table, or two tables to be joined
///
/// # Examples
/// ```
/// use scribe_core::{from, QueryBuilder};
///
/// let query = from(["users", "roles"])
///     .join("INNER JOIN", "users.role_id=roles.role_id")
///     .where_([("users.user_id", 3)]);
/// assert_eq!(
///     query.to_sql().unwrap(),
///     "SELECT * FROM users INNER JOIN roles ON users.role_id=roles.role_id WHERE `users`.`user_id`='3'"
/// );
/// ```
pub fn from(tables: impl Into<Tables>) -> SelectBuilder {
    SelectBuilder::from_tables(tables)
}

/// Start an UPDATE of `table`
pub fn update(table: &str) -> UpdateBuilder {
    UpdateBuilder::new(table)
}

/// Start a DELETE from `table`
pub fn delete(table: &str) -> DeleteBuilder {
    DeleteBuilder::new(table)
}
