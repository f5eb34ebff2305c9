//! The fluent statement builder

use std::fmt;

use super::classify::Assignments;
use super::common::{
    IntoAssignments, IntoCondition, IntoFragments, IntoParams, JoinType, SortDirection,
    StatementKind,
};
use super::params::ParamStack;
use crate::{Connective, Value};

/// Where a [`Query`] is in its build cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildState {
    /// Nothing requested yet
    #[default]
    Idle,
    /// A verb was called; clauses are accumulating for this statement kind
    Building(StatementKind),
    /// SQL text was produced and the clause state cleared
    Built,
}

/// LIMIT specification: `count` or `offset, count`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitSpec {
    pub count: u64,
    pub offset: Option<u64>,
}

impl fmt::Display for LimitSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.offset {
            Some(offset) => write!(f, "{}, {}", offset, self.count),
            None => write!(f, "{}", self.count),
        }
    }
}

/// SQL text together with the parameters drained right after it
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub sql: String,
    pub params: Vec<Value>,
}

/// Stateful SQL statement builder.
///
/// Clauses accumulate through chained `&mut self` calls; [`Query::to_sql`]
/// turns them into text for whichever verb (`select`, `insert`, `update`,
/// `delete`) was called last and clears them. Bound values collect on a
/// separate parameter stack which only [`Query::take_params`] empties, so
/// drain the text first and the parameters second (or use
/// [`Query::take_statement`], which does both in that order).
///
/// ```
/// use chainsql_core::{Query, Value};
///
/// let mut query = Query::new();
/// query
///     .select(["id", "name"])
///     .from("users")
///     .where_("age > ?", 18)
///     .order_by("name")
///     .limit(10);
///
/// assert_eq!(
///     query.to_sql().unwrap(),
///     "SELECT id, name FROM users WHERE age > ? ORDER BY name LIMIT 10"
/// );
/// assert_eq!(query.take_params(), vec![Value::I32(18)]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub(crate) state: BuildState,
    pub(crate) connective: Connective,
    pub(crate) select: Vec<String>,
    pub(crate) from: Vec<String>,
    pub(crate) joins: Vec<String>,
    pub(crate) wheres: Vec<String>,
    pub(crate) havings: Vec<String>,
    pub(crate) group_by: Vec<String>,
    pub(crate) order_by: Vec<String>,
    pub(crate) limit: Option<LimitSpec>,
    pub(crate) insert: Assignments,
    pub(crate) update: Assignments,
    pub(crate) params: ParamStack,
}

impl Query {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    /// The statement kind currently being built, if any
    pub fn kind(&self) -> Option<StatementKind> {
        match self.state {
            BuildState::Building(kind) => Some(kind),
            BuildState::Idle | BuildState::Built => None,
        }
    }

    fn begin(&mut self, kind: StatementKind) {
        self.state = BuildState::Building(kind);
    }

    /// Set the logical operator joining WHERE and HAVING predicates.
    /// Survives `to_sql`; it is a builder setting, not clause state.
    pub fn set_operator(&mut self, connective: impl Into<Connective>) -> &mut Self {
        self.connective = connective.into();
        self
    }

    pub fn operator(&self) -> &Connective {
        &self.connective
    }

    /// Build a SELECT and add projection fragments
    pub fn select<F: IntoFragments>(&mut self, columns: F) -> &mut Self {
        self.begin(StatementKind::Select);
        self.select.extend(columns.into_fragments());
        self
    }

    /// Build a SELECT and add the `*` projection
    pub fn select_all(&mut self) -> &mut Self {
        self.select("*")
    }

    /// Build an INSERT from ordered `field => value` pairs.
    ///
    /// Values are classified as they arrive: `Null` becomes `NULL`, `"?"` and
    /// `":name"` stay as placeholders, anything else is embedded as a quoted
    /// literal. `params` are the bound values for the placeholders.
    pub fn insert<A, P>(&mut self, fields: A, params: P) -> &mut Self
    where
        A: IntoAssignments,
        P: IntoParams,
    {
        self.begin(StatementKind::Insert);
        self.insert.extend(fields.into_assignments());
        self.params.push(params);
        self
    }

    /// Build an UPDATE; classification as for [`Query::insert`]
    pub fn update<A, P>(&mut self, fields: A, params: P) -> &mut Self
    where
        A: IntoAssignments,
        P: IntoParams,
    {
        self.begin(StatementKind::Update);
        self.update.extend(fields.into_assignments());
        self.params.push(params);
        self
    }

    /// Build a DELETE
    pub fn delete(&mut self) -> &mut Self {
        self.begin(StatementKind::Delete);
        self
    }

    /// Add table fragments (`"users u"`, `["users u", "posts p"]`)
    pub fn from<F: IntoFragments>(&mut self, tables: F) -> &mut Self {
        self.from.extend(tables.into_fragments());
        self
    }

    /// Synonym of [`Query::from`], reads better after `insert`/`update`
    pub fn into<F: IntoFragments>(&mut self, tables: F) -> &mut Self {
        self.from(tables)
    }

    /// Add a bare `JOIN table ON on`; an empty `on` omits the ON part
    pub fn join(&mut self, table: &str, on: &str) -> &mut Self {
        self.join_with(JoinType::Plain, table, on)
    }

    /// Add a JOIN of the given type
    pub fn join_with(&mut self, join_type: JoinType, table: &str, on: &str) -> &mut Self {
        let clause = if on.is_empty() {
            format!("{join_type} {table}")
        } else {
            format!("{join_type} {table} ON {on}")
        };
        self.joins.push(clause);
        self
    }

    /// Add a WHERE predicate fragment and its bound values
    ///
    /// ```
    /// use chainsql_core::Query;
    ///
    /// let mut query = Query::new();
    /// query
    ///     .select_all()
    ///     .from("users u")
    ///     .where_("u.registered > ? AND (u.is_active = ? OR u.column IS NOT NULL)", ("2024-01-01", 1));
    /// # let _ = query;
    /// ```
    pub fn where_<P: IntoParams>(&mut self, predicate: impl Into<String>, params: P) -> &mut Self {
        self.wheres.push(predicate.into());
        self.params.push(params);
        self
    }

    /// Add `column IN (?, ..., ?)` with one placeholder per value and push
    /// the values
    pub fn where_in<P: IntoParams>(&mut self, column: &str, values: P) -> &mut Self {
        let values = values.into_params();
        self.wheres.push(in_predicate(column, values.len(), false));
        self.params.push(values);
        self
    }

    /// Add `column NOT IN (?, ..., ?)` with one placeholder per value.
    ///
    /// Unlike [`Query::where_in`] the values are **not** pushed onto the
    /// parameter stack; bind them with [`Query::add_params`].
    pub fn where_not_in<P: IntoParams>(&mut self, column: &str, values: P) -> &mut Self {
        let count = values.into_params().len();
        self.wheres.push(in_predicate(column, count, true));
        self
    }

    /// Add a typed comparison: `("age", op::GT, 18)` becomes `age > ?`
    /// with `18` pushed; `IS NULL`/`IS NOT NULL` push nothing.
    pub fn where_cond<C: IntoCondition>(&mut self, condition: C) -> &mut Self {
        let (column, operator, value) = condition.into_condition();
        if operator.takes_value() {
            self.wheres.push(format!("{column} {operator} ?"));
            self.params.push(value);
        } else {
            self.wheres.push(format!("{column} {operator}"));
        }
        self
    }

    /// Add a HAVING predicate fragment and its bound values
    pub fn having<P: IntoParams>(&mut self, predicate: impl Into<String>, params: P) -> &mut Self {
        self.havings.push(predicate.into());
        self.params.push(params);
        self
    }

    pub fn group_by<F: IntoFragments>(&mut self, columns: F) -> &mut Self {
        self.group_by.extend(columns.into_fragments());
        self
    }

    pub fn order_by<F: IntoFragments>(&mut self, columns: F) -> &mut Self {
        self.order_by.extend(columns.into_fragments());
        self
    }

    /// Add an ORDER BY entry with an explicit direction
    pub fn order_by_direction(&mut self, column: &str, direction: SortDirection) -> &mut Self {
        self.order_by.push(format!("{column} {direction}"));
        self
    }

    pub fn order_by_asc(&mut self, column: &str) -> &mut Self {
        self.order_by_direction(column, SortDirection::Asc)
    }

    pub fn order_by_desc(&mut self, column: &str) -> &mut Self {
        self.order_by_direction(column, SortDirection::Desc)
    }

    /// Set `LIMIT count`, replacing any earlier limit
    pub fn limit(&mut self, count: u64) -> &mut Self {
        self.limit = Some(LimitSpec {
            count,
            offset: None,
        });
        self
    }

    /// Set `LIMIT offset, count`, replacing any earlier limit
    pub fn limit_offset(&mut self, count: u64, offset: u64) -> &mut Self {
        self.limit = Some(LimitSpec {
            count,
            offset: Some(offset),
        });
        self
    }

    /// Push values onto the parameter stack
    pub fn add_params<P: IntoParams>(&mut self, params: P) -> &mut Self {
        self.params.push(params);
        self
    }

    /// Return all pending parameters and clear the stack
    pub fn take_params(&mut self) -> Vec<Value> {
        self.params.drain()
    }

    /// Pending parameters, without draining
    pub fn params(&self) -> &[Value] {
        self.params.as_slice()
    }
}

/// `column IN (?, ?, ?)` / `column NOT IN (?, ?, ?)`
fn in_predicate(column: &str, count: usize, negated: bool) -> String {
    let placeholders = vec!["?"; count].join(", ");
    let keyword = if negated { "NOT IN" } else { "IN" };
    format!("{column} {keyword} ({placeholders})")
}
