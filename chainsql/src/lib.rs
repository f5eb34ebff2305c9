//! Chainsql - a fluent SQL statement builder for MySQL-compatible databases
//!
//! Chainsql builds SQL text from chained clause calls and keeps the values
//! to bind on a separate parameter stack. This crate adds execution on top of
//! the builder: an async [`Executor`] interface (with a MySQL implementation
//! behind the `mysql` feature), transactions, connection configuration and a
//! small active-record layer.
//!
//! ```
//! use chainsql::{op, Query, Value};
//!
//! let mut query = Query::new();
//! query
//!     .select(["u.user_id", "u.email"])
//!     .from("users u")
//!     .join("posts p", "p.user_id = u.user_id")
//!     .where_cond(("u.age", op::GTE, 18))
//!     .where_in("u.status", ["active", "trial"])
//!     .order_by_desc("u.user_id")
//!     .limit(20);
//!
//! let statement = query.take_statement().unwrap();
//! assert_eq!(
//!     statement.sql,
//!     "SELECT u.user_id, u.email FROM users u JOIN posts p ON p.user_id = u.user_id \
//!      WHERE u.age >= ? AND u.status IN (?, ?) ORDER BY u.user_id DESC LIMIT 20"
//! );
//! assert_eq!(statement.params.len(), 3);
//! assert_eq!(statement.params[0], Value::I32(18));
//! ```

pub mod config;
pub mod executor;
pub mod record;

// Re-export the builder
pub use chainsql_core::{
    add_slashes, like_pattern, op, quote_literal, select_from, Assignment, Assignments,
    BuildState, Connective, Error, IntoAssignments, IntoCondition, IntoFragments, IntoOperator,
    IntoParams, JoinType, LikeSide, LimitSpec, Operator, ParamStack, Query, Result, SortDirection,
    Statement, StatementKind, Value,
};

pub use config::{ConnectionRegistry, DatabaseConfig, DEFAULT_CONNECTION};
pub use executor::{
    log_statement, transaction, ExecOutcome, Executor, QueryExt, Transaction,
    TransactionalExecutor, TxFuture,
};
pub use record::{Filter, Record};

#[cfg(feature = "mysql")]
pub use executor::mysql::{MySqlExecutor, MySqlTransaction};
