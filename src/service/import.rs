//! Bulk import: each row is validated, de-duplicated and inserted on its own.
//! A failing row is recorded in the report and never stops the rows after it.

use crate::config::{Field, ResourceConfig};
use crate::error::AppError;
use crate::service::validation::{coerce, is_blank, missing_required};
use crate::sql::{insert, select_by_unique};
use crate::store::Store;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowStatus {
    Success,
    Skipped,
    Error,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    /// 1-based position in the submitted batch.
    pub row_number: usize,
    pub status: RowStatus,
    pub message: String,
    pub row: Value,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub success_count: usize,
    pub skipped_count: usize,
    pub failed_count: usize,
    pub details: Vec<ImportResult>,
}

impl ImportReport {
    fn record(&mut self, result: ImportResult) {
        match result.status {
            RowStatus::Success => self.success_count += 1,
            RowStatus::Skipped => self.skipped_count += 1,
            RowStatus::Error => self.failed_count += 1,
        }
        self.details.push(result);
    }
}

/// Text form of a unique-key value for report messages.
fn display_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn trim_text(field: &Field, v: Value) -> Value {
    match v {
        Value::String(s) if field.value_type.is_textual() => Value::String(s.trim().to_string()),
        other => other,
    }
}

pub struct ImportService;

impl ImportService {
    /// Accepts a JSON array of rows, or `{"rows": [...]}`.
    pub async fn import_value(
        store: &dyn Store,
        resource: &ResourceConfig,
        body: Value,
        max_rows: usize,
    ) -> Result<ImportReport, AppError> {
        let rows = match body {
            Value::Array(rows) => rows,
            Value::Object(mut obj) => match obj.remove("rows") {
                Some(Value::Array(rows)) => rows,
                _ => {
                    return Err(AppError::Validation(
                        "import body must be an array of rows".into(),
                    ))
                }
            },
            _ => {
                return Err(AppError::Validation(
                    "import body must be an array of rows".into(),
                ))
            }
        };
        Self::import_rows(store, resource, &rows, max_rows).await
    }

    /// Runs every row in input order; the report has exactly one entry per row.
    pub async fn import_rows(
        store: &dyn Store,
        resource: &ResourceConfig,
        rows: &[Value],
        max_rows: usize,
    ) -> Result<ImportReport, AppError> {
        if rows.is_empty() {
            return Err(AppError::Validation("no rows supplied to import".into()));
        }
        if rows.len() > max_rows {
            return Err(AppError::Validation(format!(
                "import limited to {} rows, got {}",
                max_rows,
                rows.len()
            )));
        }

        let mut report = ImportReport {
            details: Vec::with_capacity(rows.len()),
            ..ImportReport::default()
        };
        for (i, raw) in rows.iter().enumerate() {
            let (status, message) = Self::import_one(store, resource, raw).await;
            if status == RowStatus::Error {
                tracing::warn!(resource = %resource.key, row = i + 1, error = %message, "import row failed");
            }
            report.record(ImportResult {
                row_number: i + 1,
                status,
                message,
                row: raw.clone(),
            });
        }
        tracing::info!(
            resource = %resource.key,
            success = report.success_count,
            skipped = report.skipped_count,
            failed = report.failed_count,
            "import finished"
        );
        Ok(report)
    }

    async fn import_one(
        store: &dyn Store,
        resource: &ResourceConfig,
        raw: &Value,
    ) -> (RowStatus, String) {
        let Some(row) = raw.as_object() else {
            return (RowStatus::Error, "row must be an object".into());
        };

        let missing = missing_required(resource, row);
        if !missing.is_empty() {
            return (
                RowStatus::Error,
                format!("missing required fields: {}", missing.join(", ")),
            );
        }

        let values = Self::row_values(resource, row);
        if values.is_empty() {
            return (RowStatus::Error, "row has no importable fields".into());
        }

        // Probe with the exact value the insert would write.
        if let Some(unique) = &resource.unique_key {
            if let Some((field, v)) = values.iter().find(|(f, _)| f.key == *unique) {
                match store.run(&select_by_unique(resource, field, v.clone())).await {
                    Ok(found) if !found.rows.is_empty() => {
                        return (
                            RowStatus::Skipped,
                            format!("duplicate {}: {}", unique, display_text(v)),
                        );
                    }
                    Ok(_) => {}
                    Err(e) => return (RowStatus::Error, e.message()),
                }
            }
        }

        match store.run(&insert(resource, &values)).await {
            Ok(_) => (RowStatus::Success, "imported".into()),
            Err(e) => (RowStatus::Error, e.message()),
        }
    }

    /// Sparse projection: declared fields present with a non-blank value, coerced to the
    /// field type. Text cells are trimmed.
    fn row_values<'a>(
        resource: &'a ResourceConfig,
        row: &Map<String, Value>,
    ) -> Vec<(&'a Field, Value)> {
        resource
            .fields
            .iter()
            .filter_map(|f| {
                row.get(f.key.as_str())
                    .filter(|v| !is_blank(v))
                    .map(|v| (f, trim_text(f, coerce(f, v.clone()))))
            })
            .collect()
    }
}
