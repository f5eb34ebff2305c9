//! Common types and conversion traits shared by the statement builder

use std::fmt;

use indexmap::IndexMap;

use crate::{IntoOperator, Operator, Value};

/// The four statement shapes the builder can assemble
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatementKind::Select => write!(f, "SELECT"),
            StatementKind::Insert => write!(f, "INSERT"),
            StatementKind::Update => write!(f, "UPDATE"),
            StatementKind::Delete => write!(f, "DELETE"),
        }
    }
}

/// Trait to convert various types into raw SQL fragments
pub trait IntoFragments {
    fn into_fragments(self) -> Vec<String>;
}

impl IntoFragments for &str {
    fn into_fragments(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoFragments for String {
    fn into_fragments(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoFragments for &String {
    fn into_fragments(self) -> Vec<String> {
        vec![self.clone()]
    }
}

impl IntoFragments for Vec<String> {
    fn into_fragments(self) -> Vec<String> {
        self
    }
}

impl IntoFragments for Vec<&str> {
    fn into_fragments(self) -> Vec<String> {
        self.into_iter().map(|s| s.to_string()).collect()
    }
}

impl IntoFragments for &[&str] {
    fn into_fragments(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl<const N: usize> IntoFragments for [&str; N] {
    fn into_fragments(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

// For tuples
impl IntoFragments for (&str, &str) {
    fn into_fragments(self) -> Vec<String> {
        vec![self.0.to_string(), self.1.to_string()]
    }
}

impl IntoFragments for (&str, &str, &str) {
    fn into_fragments(self) -> Vec<String> {
        vec![self.0.to_string(), self.1.to_string(), self.2.to_string()]
    }
}

impl IntoFragments for (&str, &str, &str, &str) {
    fn into_fragments(self) -> Vec<String> {
        vec![
            self.0.to_string(),
            self.1.to_string(),
            self.2.to_string(),
            self.3.to_string(),
        ]
    }
}

/// Trait for values pushed onto the parameter stack.
///
/// A scalar becomes one parameter, a sequence contributes its elements in
/// order, and `()` / `None` contribute nothing.
pub trait IntoParams {
    fn into_params(self) -> Vec<Value>;
}

macro_rules! scalar_params {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoParams for $ty {
                fn into_params(self) -> Vec<Value> {
                    vec![Value::from(self)]
                }
            }
        )*
    };
}

scalar_params!(bool, i32, i64, u32, u64, f32, f64, String, &str, &String, serde_json::Value);

// An array contributes its elements, like any other sequence
impl IntoParams for Value {
    fn into_params(self) -> Vec<Value> {
        match self {
            Value::Array(items) => items,
            scalar => vec![scalar],
        }
    }
}

impl IntoParams for () {
    fn into_params(self) -> Vec<Value> {
        Vec::new()
    }
}

impl<T> IntoParams for Option<T>
where
    T: IntoParams,
{
    fn into_params(self) -> Vec<Value> {
        self.map(IntoParams::into_params).unwrap_or_default()
    }
}

impl<T> IntoParams for Vec<T>
where
    T: Into<Value>,
{
    fn into_params(self) -> Vec<Value> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<T> IntoParams for &[T]
where
    T: Clone + Into<Value>,
{
    fn into_params(self) -> Vec<Value> {
        self.iter().cloned().map(Into::into).collect()
    }
}

impl<T, const N: usize> IntoParams for [T; N]
where
    T: Into<Value>,
{
    fn into_params(self) -> Vec<Value> {
        self.into_iter().map(Into::into).collect()
    }
}

/// Trait for ordered `field => value` data given to INSERT and UPDATE.
///
/// Only insertion-ordered containers are accepted; the field order is the
/// column order of the generated SQL.
pub trait IntoAssignments {
    fn into_assignments(self) -> Vec<(String, Value)>;
}

impl<K, V> IntoAssignments for Vec<(K, V)>
where
    K: Into<String>,
    V: Into<Value>,
{
    fn into_assignments(self) -> Vec<(String, Value)> {
        self.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
    }
}

impl<K, V, const N: usize> IntoAssignments for [(K, V); N]
where
    K: Into<String>,
    V: Into<Value>,
{
    fn into_assignments(self) -> Vec<(String, Value)> {
        self.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
    }
}

impl<K, V> IntoAssignments for IndexMap<K, V>
where
    K: Into<String>,
    V: Into<Value>,
{
    fn into_assignments(self) -> Vec<(String, Value)> {
        self.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
    }
}

/// Trait for typed conditions that can be used in WHERE clauses
pub trait IntoCondition {
    fn into_condition(self) -> (String, Operator, Value);
}

// Implementation for shorthand equality: where_cond(("age", 18))
impl<T> IntoCondition for (&str, T)
where
    T: Into<Value>,
{
    fn into_condition(self) -> (String, Operator, Value) {
        (self.0.to_string(), Operator::EQ, self.1.into())
    }
}

// Implementation for explicit operators: where_cond(("age", op::GT, 18)) or where_cond(("age", ">", 18))
impl<T, O> IntoCondition for (&str, O, T)
where
    T: Into<Value>,
    O: IntoOperator,
{
    fn into_condition(self) -> (String, Operator, Value) {
        (self.0.to_string(), self.1.into_operator(), self.2.into())
    }
}

/// JOIN keyword variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinType {
    /// Bare `JOIN`
    #[default]
    Plain,
    Inner,
    Left,
    Right,
    Cross,
    /// MySQL `STRAIGHT_JOIN`
    Straight,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinType::Plain => write!(f, "JOIN"),
            JoinType::Inner => write!(f, "INNER JOIN"),
            JoinType::Left => write!(f, "LEFT JOIN"),
            JoinType::Right => write!(f, "RIGHT JOIN"),
            JoinType::Cross => write!(f, "CROSS JOIN"),
            JoinType::Straight => write!(f, "STRAIGHT_JOIN"),
        }
    }
}

/// Sort direction for ORDER BY clauses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "ASC"),
            SortDirection::Desc => write!(f, "DESC"),
        }
    }
}
