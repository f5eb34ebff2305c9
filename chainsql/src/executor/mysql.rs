//! MySQL executor over an sqlx pool

use std::str::FromStr;
use std::time::Duration;

use serde::de::DeserializeOwned;
use sqlx::mysql::{
    MySqlArguments, MySqlColumn, MySqlConnectOptions, MySqlPoolOptions, MySqlQueryResult, MySqlRow,
};
use sqlx::types::chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::{Column, MySql, MySqlPool, Row};

use super::{log_statement, ExecOutcome, Executor, Transaction, TransactionalExecutor};
use crate::config::DatabaseConfig;
use crate::{Result, Value};

type MySqlQuery<'q> = sqlx::query::Query<'q, MySql, MySqlArguments>;

/// MySQL connection pool wrapper
#[derive(Debug, Clone)]
pub struct MySqlExecutor {
    inner: MySqlPool,
}

impl MySqlExecutor {
    /// Open a pool sized and authenticated from `config`
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        config.validate()?;

        let mut options = MySqlConnectOptions::from_str(&config.url)?;
        if let Some(username) = &config.username {
            options = options.username(username);
        }
        if let Some(password) = &config.password {
            options = options.password(password);
        }

        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_with(options)
            .await?;

        tracing::info!(
            target: "chainsql::sql",
            max_connections = config.max_connections,
            "MySQL pool connected"
        );
        Ok(Self { inner: pool })
    }

    /// Open a pool with default sizing from a `mysql://` URL
    pub async fn connect_url(url: &str) -> Result<Self> {
        Self::connect(&DatabaseConfig::new(url)).await
    }

    /// Create from an existing MySqlPool
    pub fn from_pool(pool: MySqlPool) -> Self {
        Self { inner: pool }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.inner
    }
}

impl Executor for MySqlExecutor {
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecOutcome> {
        log_statement(sql, params);
        let result = bind_values(sqlx::query(sql), params)
            .execute(&self.inner)
            .await?;
        Ok(outcome(&result))
    }

    async fn fetch_all<T>(&self, sql: &str, params: &[Value]) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Send + Unpin,
    {
        log_statement(sql, params);
        let rows = bind_values(sqlx::query(sql), params)
            .fetch_all(&self.inner)
            .await?;
        decode_rows(rows)
    }

    async fn fetch_one<T>(&self, sql: &str, params: &[Value]) -> Result<T>
    where
        T: DeserializeOwned + Send + Unpin,
    {
        log_statement(sql, params);
        let row = bind_values(sqlx::query(sql), params)
            .fetch_one(&self.inner)
            .await?;
        decode_row(&row)
    }

    async fn fetch_optional<T>(&self, sql: &str, params: &[Value]) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send + Unpin,
    {
        log_statement(sql, params);
        let row = bind_values(sqlx::query(sql), params)
            .fetch_optional(&self.inner)
            .await?;
        row.as_ref().map(decode_row::<T>).transpose()
    }
}

/// MySQL transaction wrapper
pub struct MySqlTransaction {
    inner: sqlx::Transaction<'static, MySql>,
}

impl Transaction for MySqlTransaction {
    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<ExecOutcome> {
        log_statement(sql, params);
        let result = bind_values(sqlx::query(sql), params)
            .execute(&mut *self.inner)
            .await?;
        Ok(outcome(&result))
    }

    async fn fetch_all<T>(&mut self, sql: &str, params: &[Value]) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Send + Unpin,
    {
        log_statement(sql, params);
        let rows = bind_values(sqlx::query(sql), params)
            .fetch_all(&mut *self.inner)
            .await?;
        decode_rows(rows)
    }

    async fn fetch_one<T>(&mut self, sql: &str, params: &[Value]) -> Result<T>
    where
        T: DeserializeOwned + Send + Unpin,
    {
        log_statement(sql, params);
        let row = bind_values(sqlx::query(sql), params)
            .fetch_one(&mut *self.inner)
            .await?;
        decode_row(&row)
    }

    async fn fetch_optional<T>(&mut self, sql: &str, params: &[Value]) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send + Unpin,
    {
        log_statement(sql, params);
        let row = bind_values(sqlx::query(sql), params)
            .fetch_optional(&mut *self.inner)
            .await?;
        row.as_ref().map(decode_row::<T>).transpose()
    }

    async fn commit(self) -> Result<()> {
        self.inner.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.inner.rollback().await?;
        Ok(())
    }
}

impl TransactionalExecutor for MySqlExecutor {
    type Transaction = MySqlTransaction;

    async fn begin(&self) -> Result<Self::Transaction> {
        let tx = self.inner.begin().await?;
        Ok(MySqlTransaction { inner: tx })
    }
}

fn outcome(result: &MySqlQueryResult) -> ExecOutcome {
    let id = result.last_insert_id();
    ExecOutcome {
        rows_affected: result.rows_affected(),
        last_insert_id: (id != 0).then_some(id),
    }
}

/// Bind values positionally, in stack order
fn bind_values<'q>(mut query: MySqlQuery<'q>, params: &'q [Value]) -> MySqlQuery<'q> {
    for param in params {
        query = match param {
            Value::Null => query.bind(None::<String>),
            Value::Bool(b) => query.bind(*b),
            Value::I32(i) => query.bind(*i),
            Value::I64(i) => query.bind(*i),
            Value::U64(u) => query.bind(*u),
            Value::F32(f) => query.bind(*f),
            Value::F64(f) => query.bind(*f),
            Value::String(s) => query.bind(s.as_str()),
            Value::Bytes(b) => query.bind(b.as_slice()),
            // JSON columns accept their text form
            Value::Json(j) => query.bind(j.to_string()),
            Value::Array(_) => query.bind(param.sql_text()),
        };
    }
    query
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<MySqlRow>) -> Result<Vec<T>> {
    rows.iter().map(decode_row::<T>).collect()
}

fn decode_row<T: DeserializeOwned>(row: &MySqlRow) -> Result<T> {
    Ok(serde_json::from_value(row_to_json(row)?)?)
}

/// Convert a row into a JSON object keyed by column name
fn row_to_json(row: &MySqlRow) -> Result<serde_json::Value> {
    let mut object = serde_json::Map::with_capacity(row.columns().len());
    for column in row.columns() {
        object.insert(column.name().to_string(), column_to_json(row, column)?);
    }
    Ok(serde_json::Value::Object(object))
}

fn column_to_json(row: &MySqlRow, column: &MySqlColumn) -> Result<serde_json::Value> {
    use serde_json::Value as Json;
    let index = column.ordinal();

    // NULL decodes as None for any target type
    if let Ok(value) = row.try_get::<Option<i64>, _>(index) {
        return Ok(value.map(Json::from).unwrap_or(Json::Null));
    }
    if let Ok(value) = row.try_get::<u64, _>(index) {
        return Ok(Json::from(value));
    }
    if let Ok(value) = row.try_get::<f64, _>(index) {
        return Ok(Json::from(value));
    }
    if let Ok(value) = row.try_get::<f32, _>(index) {
        return Ok(Json::from(f64::from(value)));
    }
    if let Ok(value) = row.try_get::<String, _>(index) {
        return Ok(Json::String(value));
    }
    if let Ok(value) = row.try_get::<Vec<u8>, _>(index) {
        return Ok(match String::from_utf8(value) {
            Ok(text) => Json::String(text),
            Err(err) => Json::from(err.into_bytes()),
        });
    }
    // temporal types are packed binary in prepared-statement results
    if let Ok(value) = row.try_get::<NaiveDateTime, _>(index) {
        return Ok(Json::String(format_datetime(value)));
    }
    if let Ok(value) = row.try_get::<NaiveDate, _>(index) {
        return Ok(Json::String(value.format(DATE_FORMAT).to_string()));
    }
    if let Ok(value) = row.try_get::<NaiveTime, _>(index) {
        return Ok(Json::String(value.format(TIME_FORMAT).to_string()));
    }
    // DECIMAL is sent as text
    if let Ok(value) = row.try_get_unchecked::<String, _>(index) {
        return Ok(Json::String(value));
    }

    Err(sqlx::Error::ColumnDecode {
        index: format!("{:?}", column.name()),
        source: format!("cannot convert MySQL type {} to JSON", column.type_info()).into(),
    }
    .into())
}

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S%.f";

/// `YYYY-MM-DD HH:MM:SS[.ffffff]`, the form MySQL itself prints
fn format_datetime(value: NaiveDateTime) -> String {
    value.format("%Y-%m-%d %H:%M:%S%.f").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_accepts_every_value_kind() {
        let params = vec![
            Value::Null,
            Value::Bool(true),
            Value::I32(42),
            Value::I64(123456),
            Value::U64(7),
            Value::F32(1.5),
            Value::F64(2.25),
            Value::String("hello".to_string()),
            Value::Bytes(vec![1, 2, 3]),
            Value::Json(serde_json::json!({"key": "value"})),
            Value::Array(vec![Value::I32(1), Value::I32(2)]),
        ];
        let _bound = bind_values(sqlx::query("SELECT ?"), &params);
    }

    #[test]
    fn test_datetime_formatting() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();

        let whole = date.and_hms_opt(14, 30, 0).unwrap();
        assert_eq!(format_datetime(whole), "2024-03-05 14:30:00");

        let fractional = date.and_hms_micro_opt(14, 30, 0, 123456).unwrap();
        assert_eq!(format_datetime(fractional), "2024-03-05 14:30:00.123456");

        assert_eq!(date.format(DATE_FORMAT).to_string(), "2024-03-05");
        let time = NaiveTime::from_hms_opt(8, 5, 9).unwrap();
        assert_eq!(time.format(TIME_FORMAT).to_string(), "08:05:09");
    }
}
