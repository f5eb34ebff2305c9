//! Statement builder module

pub mod assemble;
pub mod classify;
pub mod common;
pub mod params;
pub mod query;

// Re-export types from submodules
pub use classify::{Assignment, Assignments};
pub use common::{
    IntoAssignments, IntoCondition, IntoFragments, IntoParams, JoinType, SortDirection,
    StatementKind,
};
pub use params::ParamStack;
pub use query::{BuildState, LimitSpec, Query, Statement};
