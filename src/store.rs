//! Store contract consumed by the engine, and its PostgreSQL implementation.

use crate::error::StoreError;
use crate::sql::{PgBindValue, QueryBuf};
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::PgRow;
use sqlx::PgPool;

/// Rows returned by one statement, each row a JSON object keyed by column name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StoreRows {
    pub rows: Vec<Value>,
    pub row_count: u64,
}

impl StoreRows {
    pub fn into_first(self) -> Option<Value> {
        self.rows.into_iter().next()
    }
}

/// Single parameterized round-trip. Implementations must bind `params` positionally
/// (`$1`, `$2`, ...) and never interpolate them into `sql`.
#[async_trait]
pub trait Store: Send + Sync {
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<StoreRows, StoreError>;

    async fn run(&self, q: &QueryBuf) -> Result<StoreRows, StoreError> {
        self.execute(&q.sql, &q.params).await
    }
}

/// Pool-backed store. Each call acquires a connection for one statement.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<StoreRows, StoreError> {
        tracing::debug!(sql = %sql, params = ?params, "query");
        let mut query = sqlx::query(sql);
        for p in params {
            query = PgBindValue::from_json(p).bind(query);
        }
        let rows = query.fetch_all(&self.pool).await?;
        let rows: Vec<Value> = rows.iter().map(row_to_json).collect();
        let row_count = rows.len() as u64;
        Ok(StoreRows { rows, row_count })
    }
}

fn row_to_json(row: &PgRow) -> Value {
    use sqlx::Column;
    use sqlx::Row;
    let mut map = Map::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    Value::Object(map)
}

/// Decode one cell by trying the column types the content tables use.
fn cell_to_value(row: &PgRow, name: &str) -> Value {
    use sqlx::{Row, ValueRef};
    if let Ok(Some(n)) = row.try_get::<Option<i16>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f32>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(f64::from(n)) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(d)) = row.try_get::<Option<rust_decimal::Decimal>, _>(name) {
        return decimal_to_value(d);
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
    }
    if let Ok(Some(u)) = row.try_get::<Option<uuid::Uuid>, _>(name) {
        return Value::String(u.to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        return Value::String(d.to_rfc3339());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDateTime>, _>(name) {
        return Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDate>, _>(name) {
        return Value::String(d.format("%Y-%m-%d").to_string());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<Value>, _>(name) {
        return j;
    }
    if let Some(list) = array_to_value(row, name) {
        return list;
    }
    if !row.try_get_raw(name).map(|v| v.is_null()).unwrap_or(true) {
        tracing::warn!(column = name, "unsupported column type decoded as null");
    }
    Value::Null
}

/// Exact decimal text when it fits a JSON number, otherwise the text itself.
fn decimal_to_value(d: rust_decimal::Decimal) -> Value {
    let text = d.normalize().to_string();
    text.parse::<serde_json::Number>()
        .map(Value::Number)
        .unwrap_or(Value::String(text))
}

/// One-dimensional arrays of the element types the content tables use.
fn array_to_value(row: &PgRow, name: &str) -> Option<Value> {
    use sqlx::Row;
    if let Ok(Some(v)) = row.try_get::<Option<Vec<String>>, _>(name) {
        return Some(Value::from(v));
    }
    if let Ok(Some(v)) = row.try_get::<Option<Vec<i16>>, _>(name) {
        return Some(Value::from(v));
    }
    if let Ok(Some(v)) = row.try_get::<Option<Vec<i32>>, _>(name) {
        return Some(Value::from(v));
    }
    if let Ok(Some(v)) = row.try_get::<Option<Vec<i64>>, _>(name) {
        return Some(Value::from(v));
    }
    if let Ok(Some(v)) = row.try_get::<Option<Vec<f64>>, _>(name) {
        return Some(Value::from(v));
    }
    if let Ok(Some(v)) = row.try_get::<Option<Vec<bool>>, _>(name) {
        return Some(Value::from(v));
    }
    if let Ok(Some(v)) = row.try_get::<Option<Vec<rust_decimal::Decimal>>, _>(name) {
        return Some(Value::Array(v.into_iter().map(decimal_to_value).collect()));
    }
    if let Ok(Some(v)) = row.try_get::<Option<Vec<uuid::Uuid>>, _>(name) {
        return Some(Value::Array(
            v.into_iter().map(|u| Value::String(u.to_string())).collect(),
        ));
    }
    None
}
