//! Resource handlers: list, read, create, update, delete, import, export, plus registry metadata.

use crate::config::{PkType, ResourceConfig};
use crate::error::AppError;
use crate::query::QueryRequest;
use crate::response::{success_many, success_one, success_one_ok};
use crate::service::{CrudService, ExportFormat, ExportService, ImportService};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::{Map, Value};
use std::collections::HashMap;

fn parse_id(resource: &ResourceConfig, id_str: &str) -> Result<Value, AppError> {
    Ok(match resource.primary_key_type {
        PkType::Uuid => {
            let u = uuid::Uuid::parse_str(id_str).map_err(|_| AppError::BadRequest("invalid uuid".into()))?;
            Value::String(u.to_string())
        }
        PkType::Int => {
            let n: i64 = id_str.parse().map_err(|_| AppError::BadRequest("invalid id".into()))?;
            Value::Number(n.into())
        }
        PkType::Text => Value::String(id_str.to_string()),
    })
}

fn body_to_map(value: Value) -> Result<Map<String, Value>, AppError> {
    match value {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::BadRequest("body must be a JSON object".into())),
    }
}

/// Registry metadata for the UI: every resource with its columns and fields.
pub async fn list_resources(State(state): State<AppState>) -> impl IntoResponse {
    success_many(state.registry.resources().to_vec())
}

pub async fn list(
    State(state): State<AppState>,
    Path(resource_key): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let resource = state.registry.resolve(&resource_key)?;
    let req = QueryRequest::from_params(&params);
    let page = CrudService::list(state.store.as_ref(), resource, &req).await?;
    Ok((StatusCode::OK, Json(page)))
}

pub async fn read(
    State(state): State<AppState>,
    Path((resource_key, id_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let resource = state.registry.resolve(&resource_key)?;
    let id = parse_id(resource, &id_str)?;
    let row = CrudService::get(state.store.as_ref(), resource, &id).await?;
    Ok(success_one_ok(row))
}

pub async fn create(
    State(state): State<AppState>,
    Path(resource_key): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let resource = state.registry.resolve(&resource_key)?;
    let body = body_to_map(body)?;
    let row = CrudService::create(state.store.as_ref(), resource, &body).await?;
    Ok(success_one(row))
}

pub async fn update(
    State(state): State<AppState>,
    Path((resource_key, id_str)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let resource = state.registry.resolve(&resource_key)?;
    let id = parse_id(resource, &id_str)?;
    let body = body_to_map(body)?;
    let row = CrudService::update(state.store.as_ref(), resource, &id, &body).await?;
    Ok(success_one_ok(row))
}

pub async fn delete(
    State(state): State<AppState>,
    Path((resource_key, id_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let resource = state.registry.resolve(&resource_key)?;
    let id = parse_id(resource, &id_str)?;
    let deleted = CrudService::delete(state.store.as_ref(), resource, &id).await?;
    Ok(success_one_ok(deleted))
}

pub async fn import(
    State(state): State<AppState>,
    Path(resource_key): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let resource = state.registry.resolve(&resource_key)?;
    let report = ImportService::import_value(
        state.store.as_ref(),
        resource,
        body,
        state.settings.import_max_rows,
    )
    .await?;
    Ok((StatusCode::OK, Json(report)))
}

pub async fn export(
    State(state): State<AppState>,
    Path(resource_key): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let resource = state.registry.resolve(&resource_key)?;
    let format = ExportFormat::parse(params.get("format").map(String::as_str))?;
    let req = QueryRequest::from_params(&params);
    let file = ExportService::export(state.store.as_ref(), resource, &req, format).await?;
    let disposition = format!("attachment; filename=\"{}\"", file.filename);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    ))
}
