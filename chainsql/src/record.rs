//! Active-record style helper over a single table

use indexmap::IndexMap;
use serde::de::DeserializeOwned;

use crate::executor::Executor;
use crate::{Error, IntoParams, Query, Result, Statement, Value};

/// Extra predicate appended after the attribute predicates
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    predicate: String,
    params: Vec<Value>,
}

impl Filter {
    pub fn new<P: IntoParams>(predicate: impl Into<String>, params: P) -> Self {
        Self {
            predicate: predicate.into(),
            params: params.into_params(),
        }
    }
}

/// A row-shaped bag of attributes bound to one table.
///
/// Attributes set on the record act as `field = ?` filters for
/// [`Record::find_one`], [`Record::find_all`] and [`Record::delete`], and as
/// the column data for [`Record::save`] and [`Record::update`]. Every
/// operation consumes the attributes, so a record can be reused for the next
/// one straight away. Each operation builds its statement on a fresh
/// [`Query`].
///
/// ```
/// use chainsql::Record;
///
/// let mut user = Record::new("users");
/// user.set("email", "ann@example.com").set("name", "?");
///
/// let statement = user.save_statement("Ann").unwrap();
/// assert_eq!(
///     statement.sql,
///     "INSERT INTO users(email, name) VALUES ('ann@example.com', ?);"
/// );
/// assert_eq!(statement.params, vec![chainsql::Value::from("Ann")]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    table: String,
    attributes: IndexMap<String, Value>,
}

impl Record {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            attributes: IndexMap::new(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Set an attribute; setting it again keeps its original position
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.attributes.insert(field.into(), value.into());
        self
    }

    pub fn get_attr(&self, field: &str) -> Option<&Value> {
        self.attributes.get(field)
    }

    pub fn attributes(&self) -> &IndexMap<String, Value> {
        &self.attributes
    }

    pub fn clear(&mut self) {
        self.attributes.clear();
    }

    /// Drain the attributes into `field = ?` predicates
    fn filter_by_attributes(&mut self, query: &mut Query) {
        for (field, value) in std::mem::take(&mut self.attributes) {
            query.where_(format!("{field} = ?"), value);
        }
    }

    /// `SELECT * FROM table WHERE <attributes>`
    pub fn find_statement(&mut self) -> Result<Statement> {
        let mut query = Query::new();
        query.select_all().from(self.table.as_str());
        self.filter_by_attributes(&mut query);
        query.take_statement()
    }

    /// `DELETE FROM table WHERE <attributes> [AND filter]`
    pub fn delete_statement(&mut self, filter: Option<Filter>) -> Result<Statement> {
        let mut query = Query::new();
        query.delete().from(self.table.as_str());
        self.filter_by_attributes(&mut query);
        if let Some(filter) = filter {
            query.where_(filter.predicate, filter.params);
        }
        query.take_statement()
    }

    /// `UPDATE table SET <attributes> [WHERE filter]`
    pub fn update_statement(&mut self, filter: Option<Filter>) -> Result<Statement> {
        if self.attributes.is_empty() {
            return Err(Error::invalid_query(format!(
                "nothing to update on '{}': set at least one attribute",
                self.table
            )));
        }

        let mut query = Query::new();
        query
            .update(std::mem::take(&mut self.attributes), ())
            .from(self.table.as_str());
        if let Some(filter) = filter {
            query.where_(filter.predicate, filter.params);
        }
        query.take_statement()
    }

    /// `INSERT INTO table(<fields>) VALUES (<values>);` with `params` bound
    /// to the placeholder attributes
    pub fn save_statement<P: IntoParams>(&mut self, params: P) -> Result<Statement> {
        let mut query = Query::new();
        query
            .insert(std::mem::take(&mut self.attributes), ())
            .into(self.table.as_str())
            .add_params(params);
        query.take_statement()
    }

    /// First row matching the attributes
    pub async fn find_one<T, E>(&mut self, executor: &E) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send + Unpin,
        E: Executor,
    {
        let statement = self.find_statement()?;
        executor
            .fetch_optional(&statement.sql, &statement.params)
            .await
    }

    /// Every row matching the attributes
    pub async fn find_all<T, E>(&mut self, executor: &E) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Send + Unpin,
        E: Executor,
    {
        let statement = self.find_statement()?;
        executor.fetch_all(&statement.sql, &statement.params).await
    }

    /// Delete matching rows, returning how many were removed
    pub async fn delete<E: Executor>(&mut self, executor: &E, filter: Option<Filter>) -> Result<u64> {
        let statement = self.delete_statement(filter)?;
        let outcome = executor.execute(&statement.sql, &statement.params).await?;
        Ok(outcome.rows_affected)
    }

    /// Write the attributes to matching rows, returning how many changed
    pub async fn update<E: Executor>(&mut self, executor: &E, filter: Option<Filter>) -> Result<u64> {
        let statement = self.update_statement(filter)?;
        let outcome = executor.execute(&statement.sql, &statement.params).await?;
        Ok(outcome.rows_affected)
    }

    /// Insert the attributes as a new row, returning the generated id
    pub async fn save<E, P>(&mut self, executor: &E, params: P) -> Result<Option<u64>>
    where
        E: Executor,
        P: IntoParams,
    {
        let statement = self.save_statement(params)?;
        let outcome = executor.execute(&statement.sql, &statement.params).await?;
        Ok(outcome.last_insert_id)
    }
}
