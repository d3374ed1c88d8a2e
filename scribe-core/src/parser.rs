//! Normalization of the loosely-typed column, value, table and condition
//! inputs into canonical ordered lists.
//!
//! Every input shape accepted here (list, comma-delimited string, mapping)
//! normalizes to the same canonical form, so two requests that name the same
//! columns in different shapes compile to byte-identical SQL.

use crate::{Error, Fields, Literal, Operator, Result, Value};

/// Quote characters stripped from the ends of condition tokens
const QUOTES: [char; 3] = ['\'', '"', '`'];

/// Column names, as a list or a comma-delimited string
#[derive(Debug, Clone, PartialEq)]
pub enum Columns {
    List(Vec<String>),
    Delimited(String),
}

/// Values for INSERT/UPDATE: one row, a batch of rows, or a
/// comma-delimited string
#[derive(Debug, Clone, PartialEq)]
pub enum Values {
    Row(Vec<Value>),
    Batch(Vec<Vec<Value>>),
    Delimited(String),
}

/// Row filter: exact-match mapping or a `col OP value, ...` expression
#[derive(Debug, Clone, PartialEq)]
pub enum Conditions {
    Map(Fields),
    Expr(String),
}

/// One table, or two tables to be joined
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tables(Vec<String>);

/// A single AND-combined predicate produced by the condition tokenizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub column: String,
    pub operator: Operator,
    pub value: Literal,
}

impl Clause {
    /// Render as `` `column`OPvalue ``
    pub fn to_sql(&self) -> String {
        format!("{}{}{}", quote_identifier(&self.column), self.operator, self.value)
    }
}

impl Tables {
    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The first table, failing when none was given
    pub fn primary(&self) -> Result<&str> {
        self.0
            .first()
            .map(String::as_str)
            .ok_or_else(|| Error::validation("no table is specified"))
    }

    /// Trimmed table names; fails when the list is empty or a name is blank
    pub fn normalized(&self) -> Result<Vec<String>> {
        if self.0.is_empty() {
            return Err(Error::validation("no table is specified"));
        }
        self.0
            .iter()
            .map(|name| {
                let name = name.trim();
                if name.is_empty() {
                    Err(Error::validation("no table is specified"))
                } else {
                    Ok(name.to_string())
                }
            })
            .collect()
    }
}

impl Values {
    pub fn is_batch(&self) -> bool {
        matches!(self, Values::Batch(_))
    }
}

impl Conditions {
    /// Whether the conditions would compile to an empty predicate
    pub fn is_empty(&self) -> bool {
        match self {
            Conditions::Map(fields) => fields.is_empty(),
            Conditions::Expr(expr) => expr.trim().is_empty(),
        }
    }
}

/// Wrap an identifier in backticks, one dot-separated segment at a time.
///
/// `*` is passed through untouched.
pub fn quote_identifier(name: &str) -> String {
    if name == "*" {
        return name.to_string();
    }
    name.split('.')
        .map(|segment| {
            if segment == "*" {
                segment.to_string()
            } else {
                format!("`{}`", segment.trim())
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Normalize column input into trimmed identifier names
pub fn normalize_columns(columns: &Columns) -> Result<Vec<String>> {
    let names: Vec<String> = match columns {
        Columns::List(list) => list.iter().map(|c| c.trim().to_string()).collect(),
        Columns::Delimited(text) => {
            let text = strip_spaces(text);
            if text.is_empty() {
                return Ok(Vec::new());
            }
            text.split(',').map(str::to_string).collect()
        }
    };

    if let Some(pos) = names.iter().position(|n| n.is_empty()) {
        return Err(Error::format(format!(
            "empty column name at position {}",
            pos
        )));
    }
    Ok(names)
}

/// Normalize value input for a single row into literal fragments
pub fn normalize_values(values: &[Value]) -> Vec<Literal> {
    values.iter().map(Literal::from).collect()
}

/// Split a delimited value string into literal fragments.
///
/// Spaces are removed before splitting, so `"1, henn, now()"` yields three
/// fragments.
pub fn normalize_delimited_values(text: &str) -> Vec<Literal> {
    let text = strip_spaces(text);
    if text.is_empty() {
        return Vec::new();
    }
    text.split(',').map(Literal::from_text).collect()
}

/// Normalize any `Values` shape into rows of literal fragments
pub fn normalize_rows(values: &Values) -> Vec<Vec<Literal>> {
    match values {
        Values::Row(row) => vec![normalize_values(row)],
        Values::Batch(rows) => rows.iter().map(|row| normalize_values(row)).collect(),
        Values::Delimited(text) => vec![normalize_delimited_values(text)],
    }
}

/// Compile conditions into AND-combined clauses
pub fn parse_conditions(conditions: &Conditions) -> Result<Vec<Clause>> {
    match conditions {
        Conditions::Map(fields) => fields
            .iter()
            .map(|(column, value)| {
                // `col`=NULL never matches
                if value.is_null() {
                    return Err(Error::format(format!(
                        "null value for condition column '{}'",
                        column
                    )));
                }
                Ok(Clause {
                    column: column.clone(),
                    operator: Operator::EQ,
                    value: Literal::from(value),
                })
            })
            .collect(),
        Conditions::Expr(expr) => parse_condition_expr(expr),
    }
}

/// Render clauses as a WHERE predicate (without the keyword)
pub fn render_conditions(clauses: &[Clause]) -> String {
    clauses
        .iter()
        .map(Clause::to_sql)
        .collect::<Vec<_>>()
        .join(" AND ")
}

/// Tokenize `col OP value (, col OP value)*`.
///
/// Commas and operator characters inside quotes are part of the token.
fn parse_condition_expr(expr: &str) -> Result<Vec<Clause>> {
    if expr.trim().is_empty() {
        return Ok(Vec::new());
    }

    split_outside_quotes(expr)?
        .into_iter()
        .map(|clause| parse_clause(&clause))
        .collect()
}

fn parse_clause(clause: &str) -> Result<Clause> {
    let operators = find_operators(clause)?;
    let (start, operator, len) = match operators.as_slice() {
        [single] => *single,
        [] => {
            return Err(Error::format(format!(
                "no operator found in condition '{}'",
                clause.trim()
            )))
        }
        _ => {
            return Err(Error::format(format!(
                "expected exactly one operator in condition '{}', found {}",
                clause.trim(),
                operators.len()
            )))
        }
    };

    let column = strip_quotes(&clause[..start]);
    if column.is_empty() {
        return Err(Error::format(format!(
            "missing column in condition '{}'",
            clause.trim()
        )));
    }
    let value = strip_quotes(&clause[start + len..]);

    Ok(Clause {
        column: column.to_string(),
        operator,
        value: Literal::from_text(value),
    })
}

/// Byte offsets of operators that sit outside quotes
fn find_operators(clause: &str) -> Result<Vec<(usize, Operator, usize)>> {
    let mut found = Vec::new();
    let mut quote: Option<char> = None;
    let mut skip_until = 0;

    for (i, ch) in clause.char_indices() {
        if i < skip_until {
            continue;
        }
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None if QUOTES.contains(&ch) => quote = Some(ch),
            None => {
                if let Some((op, len)) = Operator::match_prefix(&clause[i..]) {
                    found.push((i, op, len));
                    skip_until = i + len;
                }
            }
        }
    }
    match quote {
        Some(q) => Err(unterminated(q, clause)),
        None => Ok(found),
    }
}

fn split_outside_quotes(expr: &str) -> Result<Vec<String>> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for ch in expr.chars() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None if QUOTES.contains(&ch) => quote = Some(ch),
            None if ch == ',' => {
                parts.push(std::mem::take(&mut current));
                continue;
            }
            None => {}
        }
        current.push(ch);
    }
    if let Some(q) = quote {
        return Err(unterminated(q, expr));
    }
    parts.push(current);
    Ok(parts)
}

fn unterminated(quote: char, text: &str) -> Error {
    Error::format(format!(
        "unterminated quote {} in condition '{}'",
        quote,
        text.trim()
    ))
}

fn strip_quotes(token: &str) -> &str {
    token.trim().trim_matches(&QUOTES[..]).trim()
}

fn strip_spaces(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

impl From<&str> for Columns {
    fn from(text: &str) -> Self {
        Columns::Delimited(text.to_string())
    }
}

impl From<String> for Columns {
    fn from(text: String) -> Self {
        Columns::Delimited(text)
    }
}

impl From<Vec<String>> for Columns {
    fn from(list: Vec<String>) -> Self {
        Columns::List(list)
    }
}

impl From<Vec<&str>> for Columns {
    fn from(list: Vec<&str>) -> Self {
        Columns::List(list.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Columns {
    fn from(list: [&str; N]) -> Self {
        Columns::List(list.into_iter().map(str::to_string).collect())
    }
}

impl TryFrom<serde_json::Value> for Columns {
    type Error = Error;

    fn try_from(json: serde_json::Value) -> Result<Self> {
        match json {
            serde_json::Value::String(text) => Ok(Columns::Delimited(text)),
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    serde_json::Value::String(name) => Ok(name),
                    other => Err(Error::format(format!(
                        "invalid column name {}, accept list or string only",
                        other
                    ))),
                })
                .collect::<Result<Vec<_>>>()
                .map(Columns::List),
            other => Err(Error::format(format!(
                "invalid columns input {}, accept list or string only",
                other
            ))),
        }
    }
}

impl From<&str> for Values {
    fn from(text: &str) -> Self {
        Values::Delimited(text.to_string())
    }
}

impl From<String> for Values {
    fn from(text: String) -> Self {
        Values::Delimited(text)
    }
}

impl From<Vec<Value>> for Values {
    fn from(row: Vec<Value>) -> Self {
        Values::Row(row)
    }
}

impl From<Vec<&str>> for Values {
    fn from(row: Vec<&str>) -> Self {
        Values::Row(row.into_iter().map(Value::from).collect())
    }
}

impl From<Vec<String>> for Values {
    fn from(row: Vec<String>) -> Self {
        Values::Row(row.into_iter().map(Value::from).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Values {
    fn from(row: [&str; N]) -> Self {
        Values::Row(row.into_iter().map(Value::from).collect())
    }
}

impl From<Vec<Vec<Value>>> for Values {
    fn from(rows: Vec<Vec<Value>>) -> Self {
        Values::Batch(rows)
    }
}

impl From<Vec<Vec<&str>>> for Values {
    fn from(rows: Vec<Vec<&str>>) -> Self {
        Values::Batch(
            rows.into_iter()
                .map(|row| row.into_iter().map(Value::from).collect())
                .collect(),
        )
    }
}

impl<const M: usize, const N: usize> From<[[&str; M]; N]> for Values {
    fn from(rows: [[&str; M]; N]) -> Self {
        Values::Batch(
            rows.into_iter()
                .map(|row| row.into_iter().map(Value::from).collect())
                .collect(),
        )
    }
}

impl TryFrom<serde_json::Value> for Values {
    type Error = Error;

    fn try_from(json: serde_json::Value) -> Result<Self> {
        match json {
            serde_json::Value::String(text) => Ok(Values::Delimited(text)),
            serde_json::Value::Array(items) => {
                if matches!(items.first(), Some(serde_json::Value::Array(_))) {
                    items
                        .into_iter()
                        .map(|row| match row {
                            serde_json::Value::Array(cells) => cells
                                .into_iter()
                                .map(Value::try_from)
                                .collect::<Result<Vec<_>>>(),
                            other => Err(Error::format(format!(
                                "mixed batch rows: expected a list, got {}",
                                other
                            ))),
                        })
                        .collect::<Result<Vec<_>>>()
                        .map(Values::Batch)
                } else {
                    items
                        .into_iter()
                        .map(Value::try_from)
                        .collect::<Result<Vec<_>>>()
                        .map(Values::Row)
                }
            }
            other => Err(Error::format(format!(
                "invalid values input {}, accept list or string only",
                other
            ))),
        }
    }
}

impl From<&str> for Conditions {
    fn from(expr: &str) -> Self {
        Conditions::Expr(expr.to_string())
    }
}

impl From<String> for Conditions {
    fn from(expr: String) -> Self {
        Conditions::Expr(expr)
    }
}

impl From<Fields> for Conditions {
    fn from(fields: Fields) -> Self {
        Conditions::Map(fields)
    }
}

impl<V, const N: usize> From<[(&str, V); N]> for Conditions
where
    V: Into<Value>,
{
    fn from(pairs: [(&str, V); N]) -> Self {
        Conditions::Map(Fields::from(pairs))
    }
}

impl TryFrom<serde_json::Value> for Conditions {
    type Error = Error;

    fn try_from(json: serde_json::Value) -> Result<Self> {
        match json {
            serde_json::Value::String(expr) => Ok(Conditions::Expr(expr)),
            obj @ serde_json::Value::Object(_) => Fields::try_from(obj).map(Conditions::Map),
            other => Err(Error::format(format!(
                "invalid conditions input {}, accept mapping or string only",
                other
            ))),
        }
    }
}

impl From<&str> for Tables {
    fn from(name: &str) -> Self {
        Tables(vec![name.to_string()])
    }
}

impl From<String> for Tables {
    fn from(name: String) -> Self {
        Tables(vec![name])
    }
}

impl From<Vec<String>> for Tables {
    fn from(names: Vec<String>) -> Self {
        Tables(names)
    }
}

impl From<Vec<&str>> for Tables {
    fn from(names: Vec<&str>) -> Self {
        Tables(names.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Tables {
    fn from(names: [&str; N]) -> Self {
        Tables(names.into_iter().map(str::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(conditions: impl Into<Conditions>) -> Result<String> {
        parse_conditions(&conditions.into()).map(|c| render_conditions(&c))
    }

    #[test]
    fn test_column_shapes_normalize_identically() {
        let from_list = normalize_columns(&Columns::from(["id", " name ", "datetime"])).unwrap();
        let from_text = normalize_columns(&Columns::from("id, name,   datetime")).unwrap();
        assert_eq!(from_list, vec!["id", "name", "datetime"]);
        assert_eq!(from_list, from_text);
    }

    #[test]
    fn test_empty_column_name_fails() {
        let err = normalize_columns(&Columns::from("id,,name")).unwrap_err();
        assert!(matches!(err, Error::Format { .. }));
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("id"), "`id`");
        assert_eq!(quote_identifier("users.id"), "`users`.`id`");
        assert_eq!(quote_identifier("*"), "*");
        assert_eq!(quote_identifier("users.*"), "`users`.*");
    }

    #[test]
    fn test_delimited_values() {
        let literals = normalize_delimited_values("1, henn,   now()");
        assert_eq!(
            literals,
            vec![
                Literal::Text("1".into()),
                Literal::Text("henn".into()),
                Literal::Function("now()".into()),
            ]
        );
    }

    #[test]
    fn test_mapping_conditions() {
        let sql = render([("id", Value::from("1")), ("name", Value::from("chu henn"))]).unwrap();
        assert_eq!(sql, "`id`='1' AND `name`='chu henn'");
    }

    #[test]
    fn test_mapping_conditions_clause_count() {
        let fields: Fields = (0..5).map(|i| (format!("c{}", i), i)).collect();
        let sql = render(fields).unwrap();
        assert_eq!(sql.matches(" AND ").count(), 4);
        assert!(sql.starts_with("`c0`='0'"));
    }

    #[test]
    fn test_expression_conditions() {
        let sql = render(r#"name="chu henn", id > 12, datetime <= now()"#).unwrap();
        assert_eq!(sql, "`name`='chu henn' AND `id`>'12' AND `datetime`<=now()");
    }

    #[test]
    fn test_expression_operator_precedence() {
        let clauses = parse_conditions(&"a>=1, b<=2, c!=3, d=4, e<5, f>6".into()).unwrap();
        let ops: Vec<_> = clauses.iter().map(|c| c.operator).collect();
        assert_eq!(
            ops,
            vec![
                Operator::GTE,
                Operator::LTE,
                Operator::NEQ,
                Operator::EQ,
                Operator::LT,
                Operator::GT
            ]
        );
    }

    #[test]
    fn test_expression_quoted_comma_and_operator() {
        let sql = render("title='a, b', note=\"x=y\"").unwrap();
        assert_eq!(sql, "`title`='a, b' AND `note`='x=y'");
    }

    #[test]
    fn test_expression_without_operator_fails() {
        let err = render("id 12").unwrap_err();
        assert!(matches!(err, Error::Format { .. }));
    }

    #[test]
    fn test_expression_with_operator_mismatch_fails() {
        assert!(matches!(render("a=1=2").unwrap_err(), Error::Format { .. }));
        assert!(matches!(render("a=1,").unwrap_err(), Error::Format { .. }));
        assert!(matches!(render("=1").unwrap_err(), Error::Format { .. }));
    }

    #[test]
    fn test_expression_with_unterminated_quote_fails() {
        let err = render("name=O'Brien, id=1").unwrap_err();
        assert!(matches!(err, Error::Format { .. }));
        assert!(err.to_string().contains("unterminated quote"));

        assert!(matches!(render("note=\"open").unwrap_err(), Error::Format { .. }));
        assert!(matches!(
            parse_clause("title='a, b").unwrap_err(),
            Error::Format { .. }
        ));
    }

    #[test]
    fn test_mapping_condition_with_null_fails() {
        let err = render([("deleted_at", Value::Null)]).unwrap_err();
        assert!(matches!(err, Error::Format { .. }));
        assert!(err.to_string().contains("deleted_at"));

        let fields = Fields::new().with("user_id", 3).with("deleted_at", Value::Null);
        assert!(render(fields).is_err());
    }

    #[test]
    fn test_empty_expression_yields_no_clauses() {
        assert!(parse_conditions(&"   ".into()).unwrap().is_empty());
        assert!(Conditions::from("  ").is_empty());
    }

    #[test]
    fn test_json_shapes() {
        let columns = Columns::try_from(serde_json::json!(["id", "name"])).unwrap();
        assert_eq!(columns, Columns::from(["id", "name"]));
        assert!(Columns::try_from(serde_json::json!(42)).is_err());
        assert!(Columns::try_from(serde_json::json!([1, 2])).is_err());

        let values = Values::try_from(serde_json::json!([["1", "a"], ["2", "b"]])).unwrap();
        assert!(values.is_batch());
        let values = Values::try_from(serde_json::json!(["1", 2, true])).unwrap();
        assert_eq!(
            values,
            Values::Row(vec![Value::from("1"), Value::I64(2), Value::Bool(true)])
        );
        assert!(Values::try_from(serde_json::json!({"a": 1})).is_err());

        let conditions = Conditions::try_from(serde_json::json!({"id": 1})).unwrap();
        assert!(matches!(conditions, Conditions::Map(_)));
        assert!(Conditions::try_from(serde_json::json!(["id=1"])).is_err());
    }
}
