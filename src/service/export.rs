//! Full-dataset export. The filtered result is materialized once, so memory use
//! grows with the size of the exported table.

use crate::config::ResourceConfig;
use crate::error::AppError;
use crate::query::QueryRequest;
use crate::sql::select_export;
use crate::store::Store;
use crate::tabular::{write_csv, write_xlsx, Table};
use serde_json::Value;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn parse(s: Option<&str>) -> Result<Self, AppError> {
        match s.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") | Some("csv") => Ok(ExportFormat::Csv),
            Some("xlsx") | Some("excel") => Ok(ExportFormat::Xlsx),
            Some(other) => Err(AppError::BadRequest(format!(
                "unsupported export format: {} (expected csv or xlsx)",
                other
            ))),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExportFile {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
    pub row_count: usize,
}

pub struct ExportService;

impl ExportService {
    pub async fn export(
        store: &dyn Store,
        resource: &ResourceConfig,
        req: &QueryRequest,
        format: ExportFormat,
    ) -> Result<ExportFile, AppError> {
        let rows = store.run(&select_export(resource, req)).await?.rows;
        let table = Self::table(resource, &rows);
        let bytes = match format {
            ExportFormat::Csv => write_csv(&table),
            ExportFormat::Xlsx => write_xlsx(&table),
        }
        .map_err(|e| AppError::Export(e.to_string()))?;
        tracing::info!(
            resource = %resource.key,
            rows = rows.len(),
            bytes = bytes.len(),
            format = format.extension(),
            "export written"
        );
        Ok(ExportFile {
            filename: format!("{}_export_all.{}", resource.key, format.extension()),
            content_type: format.content_type(),
            bytes,
            row_count: rows.len(),
        })
    }

    /// Project rows onto the display columns, in configured order.
    fn table(resource: &ResourceConfig, rows: &[Value]) -> Table {
        Table {
            sheet_name: resource.label.clone(),
            headers: resource.columns.iter().map(|c| c.label.clone()).collect(),
            rows: rows
                .iter()
                .map(|row| {
                    resource
                        .columns
                        .iter()
                        .map(|c| row.get(c.key.as_str()).cloned().unwrap_or(Value::Null))
                        .collect()
                })
                .collect(),
        }
    }
}
