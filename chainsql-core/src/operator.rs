//! Comparison operators and the logical connective for predicate lists

use std::fmt::{self, Display};

/// Comparison operator used by typed conditions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator(&'static str);

impl Operator {
    pub const GT: Self = Operator(">");
    pub const LT: Self = Operator("<");
    pub const EQ: Self = Operator("=");
    pub const NEQ: Self = Operator("!=");
    pub const GTE: Self = Operator(">=");
    pub const LTE: Self = Operator("<=");
    pub const LIKE: Self = Operator("LIKE");
    pub const NOT_LIKE: Self = Operator("NOT LIKE");
    pub const REGEXP: Self = Operator("REGEXP");
    pub const IS_NULL: Self = Operator("IS NULL");
    pub const IS_NOT_NULL: Self = Operator("IS NOT NULL");

    /// Create a custom operator for database-specific comparisons
    ///
    /// # Examples
    /// ```
    /// use chainsql_core::Operator;
    ///
    /// // MySQL NULL-safe equality
    /// let null_safe_eq = Operator::custom("<=>");
    /// assert_eq!(null_safe_eq.as_str(), "<=>");
    /// ```
    pub const fn custom(op: &'static str) -> Self {
        Operator(op)
    }

    /// Get the string representation of the operator
    pub fn as_str(&self) -> &str {
        self.0
    }

    /// Whether the operator compares against a bound value.
    /// `IS NULL` and `IS NOT NULL` are complete on their own.
    pub fn takes_value(&self) -> bool {
        *self != Operator::IS_NULL && *self != Operator::IS_NOT_NULL
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trait for types that can be converted to SQL operators
pub trait IntoOperator {
    fn into_operator(self) -> Operator;
}

impl IntoOperator for Operator {
    fn into_operator(self) -> Operator {
        self
    }
}

/// Allow string literals for common SQL operators
impl IntoOperator for &str {
    fn into_operator(self) -> Operator {
        match self {
            ">" => Operator::GT,
            "<" => Operator::LT,
            "=" => Operator::EQ,
            "!=" | "<>" => Operator::NEQ,
            ">=" => Operator::GTE,
            "<=" => Operator::LTE,
            "LIKE" | "like" => Operator::LIKE,
            "NOT LIKE" | "not like" => Operator::NOT_LIKE,
            "REGEXP" | "regexp" => Operator::REGEXP,
            "IS NULL" | "is null" => Operator::IS_NULL,
            "IS NOT NULL" | "is not null" => Operator::IS_NOT_NULL,
            _ => panic!(
                "Unknown operator '{}'. Use Operator::{} constants or Operator::custom(\"{}\") for custom operators.",
                self,
                self.to_uppercase().replace(' ', "_").replace('!', "N"),
                self
            ),
        }
    }
}

/// Convenience module for operator constants
pub mod op {
    use super::Operator;

    pub const GT: Operator = Operator::GT;
    pub const LT: Operator = Operator::LT;
    pub const EQ: Operator = Operator::EQ;
    pub const NEQ: Operator = Operator::NEQ;
    pub const GTE: Operator = Operator::GTE;
    pub const LTE: Operator = Operator::LTE;
    pub const LIKE: Operator = Operator::LIKE;
    pub const NOT_LIKE: Operator = Operator::NOT_LIKE;
    pub const REGEXP: Operator = Operator::REGEXP;
    pub const IS_NULL: Operator = Operator::IS_NULL;
    pub const IS_NOT_NULL: Operator = Operator::IS_NOT_NULL;
}

/// Logical operator joining WHERE and HAVING predicates.
///
/// One connective applies to the whole predicate list; it is not per
/// predicate. Anything other than `AND`/`OR` (e.g. `&&`, `XOR`) is kept
/// verbatim as [`Connective::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Connective {
    #[default]
    And,
    Or,
    Custom(String),
}

impl Connective {
    pub fn as_str(&self) -> &str {
        match self {
            Connective::And => "AND",
            Connective::Or => "OR",
            Connective::Custom(op) => op,
        }
    }
}

impl Display for Connective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Connective {
    fn from(op: &str) -> Self {
        match op.trim() {
            "AND" | "and" => Connective::And,
            "OR" | "or" => Connective::Or,
            other => Connective::Custom(other.to_string()),
        }
    }
}

impl From<String> for Connective {
    fn from(op: String) -> Self {
        Connective::from(op.as_str())
    }
}
