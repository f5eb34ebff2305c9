//! Statement execution interface

use std::future::Future;
use std::pin::Pin;

use chainsql_core::{Error, Query, Result, Value};
use serde::de::DeserializeOwned;

#[cfg(feature = "mysql")]
pub mod mysql;

/// What a data-modifying statement reports back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecOutcome {
    pub rows_affected: u64,
    /// Id generated by an AUTO_INCREMENT column, if the statement produced one
    pub last_insert_id: Option<u64>,
}

/// Trait for anything that can run SQL text with positional parameters
pub trait Executor: Send + Sync + Clone {
    /// Execute a statement that returns no rows (INSERT, UPDATE, DELETE)
    fn execute(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<ExecOutcome>> + Send;

    /// Execute a query that returns multiple rows
    fn fetch_all<T>(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<Vec<T>>> + Send
    where
        T: DeserializeOwned + Send + Unpin;

    /// Execute a query that returns exactly one row
    fn fetch_one<T>(&self, sql: &str, params: &[Value]) -> impl Future<Output = Result<T>> + Send
    where
        T: DeserializeOwned + Send + Unpin;

    /// Execute a query that returns zero or one row
    fn fetch_optional<T>(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<Option<T>>> + Send
    where
        T: DeserializeOwned + Send + Unpin;
}

/// Trait for an open database transaction
pub trait Transaction: Send {
    fn execute(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<ExecOutcome>> + Send;

    fn fetch_all<T>(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<Vec<T>>> + Send
    where
        T: DeserializeOwned + Send + Unpin;

    fn fetch_one<T>(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<T>> + Send
    where
        T: DeserializeOwned + Send + Unpin;

    fn fetch_optional<T>(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<Option<T>>> + Send
    where
        T: DeserializeOwned + Send + Unpin;

    /// Commit the transaction
    fn commit(self) -> impl Future<Output = Result<()>> + Send
    where
        Self: Sized;

    /// Rollback the transaction
    fn rollback(self) -> impl Future<Output = Result<()>> + Send
    where
        Self: Sized;
}

/// Extension trait for executors that can open transactions
pub trait TransactionalExecutor: Executor {
    type Transaction: Transaction;

    fn begin(&self) -> impl Future<Output = Result<Self::Transaction>> + Send;
}

/// Boxed future borrowing an open transaction, returned by the closure given
/// to [`transaction`]
pub type TxFuture<'t, T> = Pin<Box<dyn Future<Output = T> + Send + 't>>;

/// Run `f` inside a transaction: commit on `Ok`, roll back on `Err`.
///
/// ```no_run
/// # async fn demo<E: chainsql::TransactionalExecutor>(executor: &E) -> chainsql::Result<()> {
/// use chainsql::{transaction, Error, Transaction, Value};
///
/// let moved = transaction(executor, |tx| {
///     Box::pin(async move {
///         let debit = tx
///             .execute("UPDATE accounts SET balance = balance - ? WHERE id = ?", &[Value::I32(100), Value::I32(1)])
///             .await?;
///         tx.execute("UPDATE accounts SET balance = balance + ? WHERE id = ?", &[Value::I32(100), Value::I32(2)])
///             .await?;
///         Ok::<_, Error>(debit.rows_affected)
///     })
/// })
/// .await?;
/// # let _ = moved;
/// # Ok(())
/// # }
/// ```
pub async fn transaction<E, F, T, Er>(executor: &E, f: F) -> Result<T>
where
    E: TransactionalExecutor,
    F: for<'t> FnOnce(&'t mut E::Transaction) -> TxFuture<'t, std::result::Result<T, Er>>,
    Er: Into<Error>,
{
    let mut tx = executor.begin().await?;

    match f(&mut tx).await {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(
                    target: "chainsql::sql",
                    error = %rollback_err,
                    "transaction rollback failed"
                );
            }
            Err(err.into())
        }
    }
}

/// Log a statement about to run (`chainsql::sql` target, DEBUG).
/// [`Executor`] implementations call this before handing SQL to the driver.
pub fn log_statement(sql: &str, params: &[Value]) {
    tracing::debug!(
        target: "chainsql::sql",
        sql = %sql,
        param_count = params.len(),
        "executing statement"
    );
}

/// Extension trait running the statement a [`Query`] has built.
///
/// Each call drains the SQL text first and the parameter stack second, then
/// hands both to the executor.
pub trait QueryExt {
    /// Execute the built statement and report affected rows / insert id
    fn exec<E>(&mut self, executor: &E) -> impl Future<Output = Result<ExecOutcome>> + Send
    where
        E: Executor;

    fn fetch_all<T, E>(&mut self, executor: &E) -> impl Future<Output = Result<Vec<T>>> + Send
    where
        E: Executor,
        T: DeserializeOwned + Send + Unpin;

    fn fetch_one<T, E>(&mut self, executor: &E) -> impl Future<Output = Result<T>> + Send
    where
        E: Executor,
        T: DeserializeOwned + Send + Unpin;

    fn fetch_optional<T, E>(
        &mut self,
        executor: &E,
    ) -> impl Future<Output = Result<Option<T>>> + Send
    where
        E: Executor,
        T: DeserializeOwned + Send + Unpin;

    /// Execute the built statement within a transaction
    fn exec_tx<Tx>(&mut self, tx: &mut Tx) -> impl Future<Output = Result<ExecOutcome>> + Send
    where
        Tx: Transaction;

    /// Fetch all rows within a transaction
    fn fetch_all_tx<T, Tx>(&mut self, tx: &mut Tx) -> impl Future<Output = Result<Vec<T>>> + Send
    where
        Tx: Transaction,
        T: DeserializeOwned + Send + Unpin;
}

impl QueryExt for Query {
    async fn exec<E>(&mut self, executor: &E) -> Result<ExecOutcome>
    where
        E: Executor,
    {
        let statement = self.take_statement()?;
        executor.execute(&statement.sql, &statement.params).await
    }

    async fn fetch_all<T, E>(&mut self, executor: &E) -> Result<Vec<T>>
    where
        E: Executor,
        T: DeserializeOwned + Send + Unpin,
    {
        let statement = self.take_statement()?;
        executor.fetch_all(&statement.sql, &statement.params).await
    }

    async fn fetch_one<T, E>(&mut self, executor: &E) -> Result<T>
    where
        E: Executor,
        T: DeserializeOwned + Send + Unpin,
    {
        let statement = self.take_statement()?;
        executor.fetch_one(&statement.sql, &statement.params).await
    }

    async fn fetch_optional<T, E>(&mut self, executor: &E) -> Result<Option<T>>
    where
        E: Executor,
        T: DeserializeOwned + Send + Unpin,
    {
        let statement = self.take_statement()?;
        executor.fetch_optional(&statement.sql, &statement.params).await
    }

    async fn exec_tx<Tx>(&mut self, tx: &mut Tx) -> Result<ExecOutcome>
    where
        Tx: Transaction,
    {
        let statement = self.take_statement()?;
        tx.execute(&statement.sql, &statement.params).await
    }

    async fn fetch_all_tx<T, Tx>(&mut self, tx: &mut Tx) -> Result<Vec<T>>
    where
        Tx: Transaction,
        T: DeserializeOwned + Send + Unpin,
    {
        let statement = self.take_statement()?;
        tx.fetch_all(&statement.sql, &statement.params).await
    }
}

/// In-memory executor recording every statement it receives
#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    pub(crate) struct MockExecutor {
        pub(crate) log: Arc<Mutex<Vec<(String, Vec<Value>)>>>,
        pub(crate) rows: serde_json::Value,
        pub(crate) outcome: ExecOutcome,
        pub(crate) fail_rollback: bool,
        pub(crate) finished: Arc<Mutex<Vec<&'static str>>>,
    }

    impl MockExecutor {
        pub(crate) fn with_rows(rows: serde_json::Value) -> Self {
            Self {
                rows,
                ..Self::default()
            }
        }

        pub(crate) fn with_outcome(rows_affected: u64, last_insert_id: Option<u64>) -> Self {
            Self {
                outcome: ExecOutcome {
                    rows_affected,
                    last_insert_id,
                },
                ..Self::default()
            }
        }

        pub(crate) fn statements(&self) -> Vec<(String, Vec<Value>)> {
            self.log.lock().unwrap().clone()
        }

        fn record(&self, sql: &str, params: &[Value]) {
            log_statement(sql, params);
            self.log.lock().unwrap().push((sql.to_string(), params.to_vec()));
        }

        fn rows<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
            match &self.rows {
                serde_json::Value::Null => Ok(Vec::new()),
                rows => Ok(serde_json::from_value(rows.clone())?),
            }
        }
    }

    impl Executor for MockExecutor {
        async fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecOutcome> {
            self.record(sql, params);
            Ok(self.outcome)
        }

        async fn fetch_all<T>(&self, sql: &str, params: &[Value]) -> Result<Vec<T>>
        where
            T: DeserializeOwned + Send + Unpin,
        {
            self.record(sql, params);
            self.rows()
        }

        async fn fetch_one<T>(&self, sql: &str, params: &[Value]) -> Result<T>
        where
            T: DeserializeOwned + Send + Unpin,
        {
            self.record(sql, params);
            self.rows()?
                .into_iter()
                .next()
                .ok_or(Error::Database(sqlx::Error::RowNotFound))
        }

        async fn fetch_optional<T>(&self, sql: &str, params: &[Value]) -> Result<Option<T>>
        where
            T: DeserializeOwned + Send + Unpin,
        {
            self.record(sql, params);
            Ok(self.rows()?.into_iter().next())
        }
    }

    pub(crate) struct MockTransaction {
        executor: MockExecutor,
    }

    impl Transaction for MockTransaction {
        async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<ExecOutcome> {
            self.executor.execute(sql, params).await
        }

        async fn fetch_all<T>(&mut self, sql: &str, params: &[Value]) -> Result<Vec<T>>
        where
            T: DeserializeOwned + Send + Unpin,
        {
            self.executor.fetch_all(sql, params).await
        }

        async fn fetch_one<T>(&mut self, sql: &str, params: &[Value]) -> Result<T>
        where
            T: DeserializeOwned + Send + Unpin,
        {
            self.executor.fetch_one(sql, params).await
        }

        async fn fetch_optional<T>(&mut self, sql: &str, params: &[Value]) -> Result<Option<T>>
        where
            T: DeserializeOwned + Send + Unpin,
        {
            self.executor.fetch_optional(sql, params).await
        }

        async fn commit(self) -> Result<()> {
            self.executor.finished.lock().unwrap().push("commit");
            Ok(())
        }

        async fn rollback(self) -> Result<()> {
            self.executor.finished.lock().unwrap().push("rollback");
            if self.executor.fail_rollback {
                return Err(Error::Database(sqlx::Error::PoolClosed));
            }
            Ok(())
        }
    }

    impl TransactionalExecutor for MockExecutor {
        type Transaction = MockTransaction;

        async fn begin(&self) -> Result<Self::Transaction> {
            Ok(MockTransaction {
                executor: self.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockExecutor;
    use super::*;
    use chainsql_core::op;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct User {
        id: i64,
        name: String,
    }

    #[tokio::test]
    async fn test_exec_drains_text_then_params() {
        let executor = MockExecutor::with_outcome(1, None);
        let mut query = Query::new();
        query
            .update([("name", "?")], "Ann")
            .from("users")
            .where_("id = ?", 3);

        let outcome = query.exec(&executor).await.unwrap();
        assert_eq!(outcome.rows_affected, 1);
        assert!(query.params().is_empty());
        assert_eq!(
            executor.statements(),
            vec![(
                "UPDATE users SET name = ? WHERE id = ? ".to_string(),
                vec![Value::from("Ann"), Value::I32(3)]
            )]
        );
    }

    #[tokio::test]
    async fn test_fetch_all_deserializes_rows() {
        let executor = MockExecutor::with_rows(serde_json::json!([
            {"id": 1, "name": "John"},
            {"id": 2, "name": "Jane"}
        ]));
        let mut query = Query::new();
        query.select(["id", "name"]).from("users").where_cond(("id", op::GT, 0));

        let users: Vec<User> = query.fetch_all(&executor).await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[1].name, "Jane");
    }

    #[tokio::test]
    async fn test_fetch_one_and_optional() {
        let executor = MockExecutor::with_rows(serde_json::json!([{"id": 7, "name": "Zed"}]));

        let mut query = Query::new();
        query.select_all().from("users").where_("id = ?", 7);
        let user: User = query.fetch_one(&executor).await.unwrap();
        assert_eq!(user, User { id: 7, name: "Zed".into() });

        let empty = MockExecutor::default();
        query.select_all().from("users").where_("id = ?", 8);
        let missing: Option<User> = query.fetch_optional(&empty).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_exec_without_statement_fails_before_io() {
        let executor = MockExecutor::default();
        let mut query = Query::new();
        query.from("users");

        let err = query.exec(&executor).await.unwrap_err();
        assert!(matches!(err, Error::NoStatement));
        assert!(executor.statements().is_empty());
    }

    #[tokio::test]
    async fn test_transaction_commits_on_ok() {
        let executor = MockExecutor::with_outcome(1, Some(42));

        let id = transaction(&executor, |tx| {
            Box::pin(async move {
                let mut query = Query::new();
                query.insert([("name", "?")], "Ann").into("users");
                let outcome = query.exec_tx(tx).await?;
                Ok::<_, Error>(outcome.last_insert_id)
            })
        })
        .await
        .unwrap();

        assert_eq!(id, Some(42));
        assert_eq!(*executor.finished.lock().unwrap(), vec!["commit"]);
        assert_eq!(executor.statements().len(), 1);
    }

    #[tokio::test]
    async fn test_transaction_rolls_back_on_err() {
        let executor = MockExecutor::default();

        let result: Result<()> = transaction(&executor, |_tx| {
            Box::pin(async move { Err(Error::invalid_query("Simulated error")) })
        })
        .await;

        assert!(matches!(result, Err(Error::InvalidQuery { .. })));
        assert_eq!(*executor.finished.lock().unwrap(), vec!["rollback"]);
    }

    #[tokio::test]
    async fn test_failed_rollback_keeps_original_error() {
        let executor = MockExecutor {
            fail_rollback: true,
            ..MockExecutor::default()
        };

        let result: Result<()> = transaction(&executor, |_tx| {
            Box::pin(async move { Err(Error::invalid_query("first")) })
        })
        .await;

        match result {
            Err(Error::InvalidQuery { message }) => assert_eq!(message, "first"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_all_tx() {
        let executor = MockExecutor::with_rows(serde_json::json!([{"id": 1, "name": "John"}]));

        let users: Vec<User> = transaction(&executor, |tx| {
            Box::pin(async move {
                let mut query = Query::new();
                query.select_all().from("users");
                query.fetch_all_tx(tx).await
            })
        })
        .await
        .unwrap();

        assert_eq!(users[0].id, 1);
    }
}
