use std::sync::{Arc, Mutex};

use chainsql::{
    like_pattern, transaction, ConnectionRegistry, Error, ExecOutcome, Executor, Filter, LikeSide,
    Query, QueryExt, Record, Result, Transaction, TransactionalExecutor, Value,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Executor that records statements and serves fixed rows
#[derive(Clone, Default)]
struct Recorder {
    statements: Arc<Mutex<Vec<(String, Vec<Value>)>>>,
    rows: Vec<serde_json::Value>,
    committed: Arc<Mutex<bool>>,
}

impl Recorder {
    fn with_rows(rows: Vec<serde_json::Value>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    fn push(&self, sql: &str, params: &[Value]) {
        chainsql::log_statement(sql, params);
        self.statements
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
    }

    fn last(&self) -> (String, Vec<Value>) {
        self.statements.lock().unwrap().last().cloned().unwrap()
    }

    fn decode<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.rows
            .iter()
            .map(|row| serde_json::from_value(row.clone()).map_err(Error::from))
            .collect()
    }
}

impl Executor for Recorder {
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecOutcome> {
        self.push(sql, params);
        Ok(ExecOutcome {
            rows_affected: 1,
            last_insert_id: Some(100),
        })
    }

    async fn fetch_all<T>(&self, sql: &str, params: &[Value]) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Send + Unpin,
    {
        self.push(sql, params);
        self.decode()
    }

    async fn fetch_one<T>(&self, sql: &str, params: &[Value]) -> Result<T>
    where
        T: DeserializeOwned + Send + Unpin,
    {
        self.push(sql, params);
        self.decode()?
            .into_iter()
            .next()
            .ok_or(Error::Database(sqlx::Error::RowNotFound))
    }

    async fn fetch_optional<T>(&self, sql: &str, params: &[Value]) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send + Unpin,
    {
        self.push(sql, params);
        Ok(self.decode()?.into_iter().next())
    }
}

struct RecorderTx(Recorder);

impl Transaction for RecorderTx {
    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<ExecOutcome> {
        self.0.execute(sql, params).await
    }

    async fn fetch_all<T>(&mut self, sql: &str, params: &[Value]) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Send + Unpin,
    {
        self.0.fetch_all(sql, params).await
    }

    async fn fetch_one<T>(&mut self, sql: &str, params: &[Value]) -> Result<T>
    where
        T: DeserializeOwned + Send + Unpin,
    {
        self.0.fetch_one(sql, params).await
    }

    async fn fetch_optional<T>(&mut self, sql: &str, params: &[Value]) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send + Unpin,
    {
        self.0.fetch_optional(sql, params).await
    }

    async fn commit(self) -> Result<()> {
        *self.0.committed.lock().unwrap() = true;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        Ok(())
    }
}

impl TransactionalExecutor for Recorder {
    type Transaction = RecorderTx;

    async fn begin(&self) -> Result<Self::Transaction> {
        Ok(RecorderTx(self.clone()))
    }
}

#[derive(Debug, Deserialize, PartialEq)]
struct Product {
    id: i64,
    name: String,
}

#[test]
fn search_with_like_pattern() {
    let recorder = Recorder::with_rows(vec![serde_json::json!({"id": 3, "name": "50% off"})]);

    let products: Vec<Product> = tokio_test::block_on(async {
        let mut query = Query::new();
        query
            .select(["id", "name"])
            .from("products")
            .where_("name LIKE ?", like_pattern("50%", LikeSide::Right));
        query.fetch_all(&recorder).await
    })
    .unwrap();

    assert_eq!(products, vec![Product { id: 3, name: "50% off".into() }]);
    let (sql, params) = recorder.last();
    assert_eq!(sql, "SELECT id, name FROM products WHERE name LIKE ? ");
    assert_eq!(params, vec![Value::from("50\\%%")]);
}

#[tokio::test]
async fn record_lifecycle() {
    let recorder = Recorder::default();
    let mut product = Record::new("products");

    product.set("name", "?").set("price", "9.90").set("note", Value::Null);
    let id = product.save(&recorder, "Lamp").await.unwrap();
    assert_eq!(id, Some(100));
    assert_eq!(
        recorder.last(),
        (
            "INSERT INTO products(name, price, note) VALUES (?, '9.90', NULL);".to_string(),
            vec![Value::from("Lamp")]
        )
    );

    product.set("price", "12.00");
    let changed = product
        .update(&recorder, Some(Filter::new("id = ?", 100)))
        .await
        .unwrap();
    assert_eq!(changed, 1);
    assert_eq!(
        recorder.last().0,
        "UPDATE products SET price = '12.00' WHERE id = ? "
    );

    product.set("id", 100);
    product.delete(&recorder, None).await.unwrap();
    assert_eq!(
        recorder.last(),
        (
            "DELETE FROM products WHERE id = ? ".to_string(),
            vec![Value::I32(100)]
        )
    );
}

#[tokio::test]
async fn transaction_runs_statements_and_commits() {
    let recorder = Recorder::default();

    let rows = transaction(&recorder, |tx| {
        Box::pin(async move {
            let mut debit = Query::new();
            debit
                .update([("balance", "?")], 50)
                .from("accounts")
                .where_("id = ?", 1);
            let first = debit.exec_tx(tx).await?;

            let mut credit = Query::new();
            credit
                .update([("balance", "?")], 150)
                .from("accounts")
                .where_("id = ?", 2);
            let second = credit.exec_tx(tx).await?;

            Ok::<_, Error>(first.rows_affected + second.rows_affected)
        })
    })
    .await
    .unwrap();

    assert_eq!(rows, 2);
    assert!(*recorder.committed.lock().unwrap());
    assert_eq!(
        recorder.last().1,
        vec![Value::I32(150), Value::I32(2)]
    );
}

#[tokio::test]
async fn precondition_failure_never_reaches_executor() {
    let recorder = Recorder::default();
    let mut query = Query::new();
    query.where_("id = ?", 1);

    let err = query.exec(&recorder).await.unwrap_err();
    assert!(err.is_precondition());
    assert!(recorder.statements.lock().unwrap().is_empty());
    // the failed build left the pending parameter in place
    assert_eq!(query.params(), &[Value::I32(1)]);
}

#[test]
fn registry_from_toml() {
    let registry = ConnectionRegistry::from_toml_str(
        r#"
        [connections.default]
        url = "mysql://localhost:3306/shop"

        [connections.archive]
        url = "mysql://archive:3306/shop"
        username = "reader"
        acquire_timeout_secs = 5
        "#,
    )
    .unwrap();

    let archive = registry.get("archive").unwrap();
    assert_eq!(archive.username.as_deref(), Some("reader"));
    assert_eq!(archive.acquire_timeout_secs, 5);
    assert_eq!(registry.get(chainsql::DEFAULT_CONNECTION).unwrap().max_connections, 5);
}
