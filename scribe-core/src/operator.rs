//! Comparison operators understood by the condition language

use std::fmt::{self, Display};
use std::str::FromStr;

use crate::Error;

/// A comparison operator in a condition clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operator(&'static str);

impl Operator {
    pub const EQ: Self = Operator("=");
    pub const NEQ: Self = Operator("!=");
    pub const LT: Self = Operator("<");
    pub const LTE: Self = Operator("<=");
    pub const GT: Self = Operator(">");
    pub const GTE: Self = Operator(">=");

    /// Matching order: two-character tokens come before the one-character
    /// tokens they share a prefix with.
    const MATCH_ORDER: [Operator; 6] = [
        Operator::GTE,
        Operator::LTE,
        Operator::NEQ,
        Operator::EQ,
        Operator::LT,
        Operator::GT,
    ];

    /// Get the string representation of the operator
    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// Match an operator at the start of `input`, returning it together with
    /// the number of bytes it occupies.
    ///
    /// # Examples
    /// ```
    /// use scribe_core::Operator;
    ///
    /// assert_eq!(Operator::match_prefix(">= 5"), Some((Operator::GTE, 2)));
    /// assert_eq!(Operator::match_prefix("> 5"), Some((Operator::GT, 1)));
    /// assert_eq!(Operator::match_prefix("! 5"), None);
    /// ```
    pub fn match_prefix(input: &str) -> Option<(Operator, usize)> {
        Self::MATCH_ORDER
            .iter()
            .find(|op| input.starts_with(op.0))
            .map(|op| (*op, op.0.len()))
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::match_prefix(s.trim()) {
            Some((op, len)) if len == s.trim().len() => Ok(op),
            _ => Err(Error::format(format!(
                "unknown operator '{}', supported: =, !=, <, <=, >, >=",
                s
            ))),
        }
    }
}
