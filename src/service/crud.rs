//! Generic CRUD execution against the store.

use crate::config::{Field, ResourceConfig};
use crate::error::{AppError, StoreError};
use crate::query::{total_pages, QueryRequest};
use crate::service::validation::{coerce_for_write, project};
use crate::sql::{count, delete, insert, select_by_id, select_page, update};
use crate::store::Store;
use serde::Serialize;
use serde_json::{Map, Value};

/// One page of rows plus the metadata needed to render pagination.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPage {
    pub rows: Vec<Value>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
}

pub struct CrudService;

fn describe_id(resource: &ResourceConfig, id: &Value) -> String {
    match id {
        Value::String(s) => format!("{} {}", resource.key, s),
        other => format!("{} {}", resource.key, other),
    }
}

/// Declared fields of `payload`, converted to their field types.
fn writable_values<'a>(
    resource: &'a ResourceConfig,
    payload: &Map<String, Value>,
) -> Result<Vec<(&'a Field, Value)>, AppError> {
    let values = project(resource, payload);
    if values.is_empty() {
        return Err(AppError::Validation(format!(
            "no writable fields supplied for {}",
            resource.key
        )));
    }
    values
        .into_iter()
        .map(|(f, v)| {
            coerce_for_write(f, v)
                .map(|v| (f, v))
                .map_err(AppError::Validation)
        })
        .collect()
}

impl CrudService {
    /// Filtered, sorted page. Count and data queries share one predicate.
    pub async fn list(
        store: &dyn Store,
        resource: &ResourceConfig,
        req: &QueryRequest,
    ) -> Result<ListPage, AppError> {
        let total = store
            .run(&count(resource, req))
            .await?
            .into_first()
            .and_then(|row| row.get("total").and_then(Value::as_u64))
            .unwrap_or(0);
        let rows = store.run(&select_page(resource, req)).await?.rows;
        Ok(ListPage {
            rows,
            total,
            page: req.page,
            limit: req.limit,
            total_pages: total_pages(total, req.limit),
        })
    }

    pub async fn get(
        store: &dyn Store,
        resource: &ResourceConfig,
        id: &Value,
    ) -> Result<Value, AppError> {
        store
            .run(&select_by_id(resource, id.clone()))
            .await?
            .into_first()
            .ok_or_else(|| AppError::RowNotFound(describe_id(resource, id)))
    }

    /// Insert the declared fields of `payload`; returns the row as stored.
    pub async fn create(
        store: &dyn Store,
        resource: &ResourceConfig,
        payload: &Map<String, Value>,
    ) -> Result<Value, AppError> {
        let values = writable_values(resource, payload)?;
        let row = store
            .run(&insert(resource, &values))
            .await?
            .into_first()
            .ok_or_else(|| StoreError::Backend("insert returned no row".into()))?;
        tracing::info!(resource = %resource.key, "row created");
        Ok(row)
    }

    pub async fn update(
        store: &dyn Store,
        resource: &ResourceConfig,
        id: &Value,
        payload: &Map<String, Value>,
    ) -> Result<Value, AppError> {
        let values = writable_values(resource, payload)?;
        store
            .run(&update(resource, id.clone(), &values))
            .await?
            .into_first()
            .ok_or_else(|| AppError::RowNotFound(describe_id(resource, id)))
    }

    /// Delete by primary key. Deleting an absent id is `RowNotFound`, not a no-op.
    pub async fn delete(
        store: &dyn Store,
        resource: &ResourceConfig,
        id: &Value,
    ) -> Result<Value, AppError> {
        let row = store
            .run(&delete(resource, id.clone()))
            .await?
            .into_first()
            .ok_or_else(|| AppError::RowNotFound(describe_id(resource, id)))?;
        let deleted_id = row
            .get(resource.primary_key.as_str())
            .cloned()
            .unwrap_or_else(|| id.clone());
        tracing::info!(resource = %resource.key, id = %deleted_id, "row deleted");
        Ok(serde_json::json!({ "id": deleted_id }))
    }
}
