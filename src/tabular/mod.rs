//! Tabular serialization of result rows: delimited text and spreadsheet workbooks.

mod csv;
mod xlsx;

pub use self::csv::write_csv;
pub use self::xlsx::write_xlsx;

use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TabularError {
    #[error("csv: {0}")]
    Csv(String),
    #[error("xlsx: {0}")]
    Xlsx(String),
}

/// Header labels and row cells in display-column order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    pub sheet_name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Text rendering of one cell: null is empty, structured values are compact JSON.
pub fn cell_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => v.to_string(),
    }
}
