//! Chainsql Core - a fluent, parameter-tracking SQL statement builder
//!
//! This crate provides the statement builder itself: clause accumulation,
//! literal/placeholder classification, the parameter stack and text assembly
//! for MySQL-compatible SELECT, INSERT, UPDATE and DELETE statements.

pub mod builder;
pub mod error;
pub mod escape;
pub mod operator;
pub mod value;

// Re-export main types
pub use builder::{
    Assignment, Assignments, BuildState, IntoAssignments, IntoCondition, IntoFragments,
    IntoParams, JoinType, LimitSpec, ParamStack, Query, SortDirection, Statement, StatementKind,
};
pub use error::{Error, Result};
pub use escape::{add_slashes, like_pattern, quote_literal, LikeSide};
pub use operator::{op, Connective, IntoOperator, Operator};
pub use value::Value;

/// Start a SELECT over the given table
pub fn select_from(table: &str) -> Query {
    let mut query = Query::new();
    query.select_all().from(table);
    query
}
