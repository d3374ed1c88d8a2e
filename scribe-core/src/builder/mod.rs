//! Statement compiler
//!
//! Turns a CRUD request into one SQL string. The output is textual SQL with
//! values interpolated as quoted literals; no parameter binding happens on
//! this path, so input must be sanitized by the caller.

pub mod delete;
pub mod insert;
pub mod select;
pub mod update;

use std::fmt::{self, Display};
use std::str::FromStr;

use crate::parser::{Columns, Conditions, Tables, Values};
use crate::{Error, Fields, Result};

pub use delete::DeleteBuilder;
pub use insert::InsertBuilder;
pub use select::SelectBuilder;
pub use update::UpdateBuilder;

/// Core trait for all statement builders
pub trait QueryBuilder {
    /// The grammar branch this builder compiles
    fn mode(&self) -> CrudMode;

    /// Generate the SQL statement
    fn to_sql(&self) -> Result<String>;
}

/// The grammar branch of a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrudMode {
    Insert,
    Select,
    Update,
    Delete,
}

impl CrudMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrudMode::Insert => "INSERT",
            CrudMode::Select => "SELECT",
            CrudMode::Update => "UPDATE",
            CrudMode::Delete => "DELETE",
        }
    }

    /// Whether statements of this mode run inside commit/rollback control
    pub fn is_modification(&self) -> bool {
        !matches!(self, CrudMode::Select)
    }
}

impl Display for CrudMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CrudMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "INSERT" => Ok(CrudMode::Insert),
            "SELECT" => Ok(CrudMode::Select),
            "UPDATE" => Ok(CrudMode::Update),
            "DELETE" => Ok(CrudMode::Delete),
            other => Err(Error::validation(format!(
                "crud_mode '{}' not supported, supported methods: INSERT, SELECT, UPDATE, DELETE",
                other
            ))),
        }
    }
}

/// JOIN kinds supported for two-table SELECTs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Cross,
}

impl Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinKind::Inner => write!(f, "INNER JOIN"),
            JoinKind::Left => write!(f, "LEFT JOIN"),
            JoinKind::Right => write!(f, "RIGHT JOIN"),
            JoinKind::Cross => write!(f, "CROSS JOIN"),
        }
    }
}

impl FromStr for JoinKind {
    type Err = Error;

    /// Case-insensitive; runs of whitespace between the words are collapsed
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase();
        match normalized.as_str() {
            "INNER JOIN" => Ok(JoinKind::Inner),
            "LEFT JOIN" => Ok(JoinKind::Left),
            "RIGHT JOIN" => Ok(JoinKind::Right),
            "CROSS JOIN" => Ok(JoinKind::Cross),
            _ => Err(Error::validation(format!(
                "join method '{}' not supported, supported: INNER JOIN, LEFT JOIN, RIGHT JOIN, CROSS JOIN",
                s
            ))),
        }
    }
}

/// A loosely-typed statement request: a CRUD mode plus whichever inputs the
/// caller supplied. [`Statement::compile`] validates it and dispatches to the
/// per-mode builder.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub mode: CrudMode,
    pub tables: Tables,
    pub columns: Option<Columns>,
    pub values: Option<Values>,
    pub columns_values: Option<Fields>,
    pub conditions: Option<Conditions>,
    pub join: Option<String>,
    pub join_condition: Option<String>,
    pub offset: u64,
    pub limit: u64,
}

impl Statement {
    pub fn new(mode: CrudMode, tables: impl Into<Tables>) -> Self {
        Self {
            mode,
            tables: tables.into(),
            columns: None,
            values: None,
            columns_values: None,
            conditions: None,
            join: None,
            join_condition: None,
            offset: 0,
            limit: 0,
        }
    }

    /// Parse the mode from its keyword, e.g. `"SELECT"`
    pub fn parse(mode: &str, tables: impl Into<Tables>) -> Result<Self> {
        Ok(Self::new(mode.parse()?, tables))
    }

    pub fn columns(mut self, columns: impl Into<Columns>) -> Self {
        self.columns = Some(columns.into());
        self
    }

    pub fn values(mut self, values: impl Into<Values>) -> Self {
        self.values = Some(values.into());
        self
    }

    pub fn columns_values(mut self, fields: impl Into<Fields>) -> Self {
        self.columns_values = Some(fields.into());
        self
    }

    pub fn conditions(mut self, conditions: impl Into<Conditions>) -> Self {
        self.conditions = Some(conditions.into());
        self
    }

    pub fn join(mut self, kind: impl Into<String>, condition: impl Into<String>) -> Self {
        self.join = Some(kind.into());
        self.join_condition = Some(condition.into());
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Validate the request and compile it into SQL text
    pub fn compile(&self) -> Result<String> {
        let tables = self.tables.normalized()?;

        match self.mode {
            CrudMode::Select => {
                let mut query = SelectBuilder::from_tables(tables)
                    .limit(self.limit)
                    .offset(self.offset);
                query.columns = self.columns.clone();
                query.conditions = self.conditions.clone();
                query.join = self.join.clone();
                query.join_condition = self.join_condition.clone();
                query.to_sql()
            }
            mode => {
                let table = single_table(mode, &tables)?;
                match mode {
                    CrudMode::Insert => {
                        let mut query = InsertBuilder::new(table);
                        query.columns = self.columns.clone();
                        query.values = self.values.clone();
                        query.columns_values = self.columns_values.clone();
                        query.to_sql()
                    }
                    CrudMode::Update => {
                        let mut query = UpdateBuilder::new(table);
                        query.columns = self.columns.clone();
                        query.values = self.values.clone();
                        query.columns_values = self.columns_values.clone();
                        query.conditions = self.conditions.clone();
                        query.to_sql()
                    }
                    _ => {
                        let mut query = DeleteBuilder::new(table);
                        query.conditions = self.conditions.clone();
                        query.to_sql()
                    }
                }
            }
        }
    }
}

impl QueryBuilder for Statement {
    fn mode(&self) -> CrudMode {
        self.mode
    }

    fn to_sql(&self) -> Result<String> {
        self.compile()
    }
}

fn single_table(mode: CrudMode, tables: &[String]) -> Result<&str> {
    match tables {
        [table] => Ok(table),
        _ => Err(Error::validation(format!(
            "{} expects exactly one table, got {}",
            mode,
            tables.len()
        ))),
    }
}

/// Shared validation for the table name of single-table statements
pub(crate) fn require_table(table: &str) -> Result<&str> {
    let table = table.trim();
    if table.is_empty() {
        Err(Error::validation("no table is specified"))
    } else {
        Ok(table)
    }
}
