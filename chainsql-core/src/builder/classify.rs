//! Literal / placeholder / NULL classification for INSERT and UPDATE values

use std::fmt;

use indexmap::IndexMap;

use crate::escape::quote_literal;
use crate::Value;

/// A field value ready to be emitted into INSERT or UPDATE text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment {
    /// Quoted and escaped literal, embedded in the SQL text
    Literal(String),
    /// `?` or `:name`, bound by the driver at execution time
    Placeholder(String),
    /// The `NULL` keyword
    Null,
}

impl Assignment {
    /// Classify a caller-supplied value.
    ///
    /// `Null` and JSON `null` become `NULL`; the string `"?"` or any string
    /// starting with `':'` is a placeholder token left for the driver;
    /// everything else is embedded as a quoted literal. The matching bound values for
    /// placeholders must be supplied separately as parameters.
    pub fn classify(value: Value) -> Self {
        match value {
            Value::Null | Value::Json(serde_json::Value::Null) => Assignment::Null,
            Value::String(token) if is_placeholder_token(&token) => Assignment::Placeholder(token),
            other => Assignment::Literal(quote_literal(&other.sql_text())),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Assignment::Placeholder(_))
    }

    /// The text emitted into the statement
    pub fn as_sql(&self) -> &str {
        match self {
            Assignment::Literal(text) | Assignment::Placeholder(text) => text,
            Assignment::Null => "NULL",
        }
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

fn is_placeholder_token(text: &str) -> bool {
    text == "?" || text.starts_with(':')
}

/// Ordered `field => Assignment` map.
///
/// Fields keep the order in which they were first set; setting a field
/// again replaces its value without moving it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assignments {
    entries: IndexMap<String, Assignment>,
}

impl Assignments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.entries.insert(field.into(), Assignment::classify(value));
    }

    pub fn extend(&mut self, fields: Vec<(String, Value)>) {
        for (field, value) in fields {
            self.set(field, value);
        }
    }

    pub fn get(&self, field: &str) -> Option<&Assignment> {
        self.entries.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &Assignment> {
        self.entries.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Assignment)> {
        self.entries.iter().map(|(name, assignment)| (name.as_str(), assignment))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
