//! SQL text assembly for each statement kind

use super::common::StatementKind;
use super::query::{BuildState, Query, Statement};
use crate::{Connective, Error, Result};

impl Query {
    /// Produce the SQL text for the statement being built.
    ///
    /// On success every clause accumulator is cleared and the builder moves
    /// to [`BuildState::Built`]; the parameter stack and the connective are
    /// left as they are. On failure nothing is cleared, so the caller can add
    /// the missing clause and try again.
    ///
    /// ```
    /// use chainsql_core::{Error, Query};
    ///
    /// let mut query = Query::new();
    /// query.select_all().from("t");
    /// assert_eq!(query.to_sql().unwrap(), "SELECT * FROM t ");
    /// assert!(matches!(query.to_sql(), Err(Error::NoStatement)));
    /// ```
    pub fn to_sql(&mut self) -> Result<String> {
        let kind = self.kind().ok_or(Error::NoStatement)?;
        if self.from.is_empty() {
            return Err(Error::MissingTable { kind });
        }

        let sql = match kind {
            StatementKind::Select => self.select_sql(),
            StatementKind::Insert => self.insert_sql(),
            StatementKind::Update => self.update_sql()?,
            StatementKind::Delete => self.delete_sql(),
        };

        self.finish_build();
        tracing::trace!(
            target: "chainsql::query",
            kind = %kind,
            sql_len = sql.len(),
            pending_params = self.params.len(),
            "statement assembled"
        );
        Ok(sql)
    }

    /// Assemble the SQL text, then drain the parameter stack
    pub fn take_statement(&mut self) -> Result<Statement> {
        let kind = self.kind().ok_or(Error::NoStatement)?;
        let sql = self.to_sql()?;
        let params = self.take_params();
        Ok(Statement { kind, sql, params })
    }

    /// `Building -> Built`: drop all clause state, keep params and connective
    fn finish_build(&mut self) {
        self.select.clear();
        self.from.clear();
        self.joins.clear();
        self.wheres.clear();
        self.havings.clear();
        self.group_by.clear();
        self.order_by.clear();
        self.limit = None;
        self.insert.clear();
        self.update.clear();
        self.state = BuildState::Built;
    }

    fn select_sql(&self) -> String {
        let columns = if self.select.is_empty() {
            "*".to_string()
        } else {
            self.select.join(", ")
        };

        let mut sql = format!("SELECT {} FROM {} ", columns, self.from.join(", "));
        if !self.joins.is_empty() {
            sql.push_str(&self.joins.join(" "));
            sql.push(' ');
        }
        sql.push_str(&predicate_clause("WHERE", &self.wheres, &self.connective));
        sql.push_str(&list_clause("GROUP BY", &self.group_by));
        sql.push_str(&predicate_clause("HAVING", &self.havings, &self.connective));
        sql.push_str(&list_clause("ORDER BY", &self.order_by));
        if let Some(limit) = self.limit {
            sql.push_str(&format!("LIMIT {limit}"));
        }
        sql
    }

    fn insert_sql(&self) -> String {
        let fields: Vec<&str> = self.insert.fields().collect();
        let values: Vec<&str> = self.insert.values().map(|v| v.as_sql()).collect();
        format!(
            "INSERT INTO {}({}) VALUES ({});",
            self.from[0],
            fields.join(", "),
            values.join(", ")
        )
    }

    fn update_sql(&self) -> Result<String> {
        if self.update.is_empty() {
            return Err(Error::invalid_query("UPDATE requires at least one SET field"));
        }
        let sets: Vec<String> = self
            .update
            .iter()
            .map(|(field, value)| format!("{field} = {value}"))
            .collect();
        Ok(format!(
            "UPDATE {} SET {} {}",
            self.from.join(", "),
            sets.join(", "),
            predicate_clause("WHERE", &self.wheres, &self.connective)
        ))
    }

    fn delete_sql(&self) -> String {
        format!(
            "DELETE FROM {} {}",
            self.from.join(", "),
            predicate_clause("WHERE", &self.wheres, &self.connective)
        )
    }
}

/// `KEYWORD p1 <op> p2 ` or nothing
fn predicate_clause(keyword: &str, predicates: &[String], connective: &Connective) -> String {
    if predicates.is_empty() {
        return String::new();
    }
    let separator = format!(" {connective} ");
    format!("{keyword} {} ", predicates.join(&separator))
}

/// `KEYWORD a, b ` or nothing
fn list_clause(keyword: &str, items: &[String]) -> String {
    if items.is_empty() {
        return String::new();
    }
    format!("{keyword} {} ", items.join(", "))
}
