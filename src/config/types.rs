//! Raw resource definitions as they appear in the registry JSON.

use serde::{Deserialize, Serialize};

/// Value type of a column or field. Drives filter semantics, search scope and import coercion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    #[default]
    Text,
    Textarea,
    Number,
    Boolean,
    Select,
    Json,
    Date,
    Datetime,
}

impl ValueType {
    /// PostgreSQL cast applied to a bound parameter when writing this type.
    pub fn write_cast(self) -> Option<&'static str> {
        match self {
            ValueType::Date => Some("date"),
            ValueType::Datetime => Some("timestamptz"),
            _ => None,
        }
    }

    pub fn is_textual(self) -> bool {
        matches!(self, ValueType::Text | ValueType::Textarea | ValueType::Select)
    }
}

/// Primary key type for parsing path ids.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PkType {
    #[default]
    Int,
    Uuid,
    Text,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ColumnDef {
    pub key: String,
    pub label: String,
    #[serde(rename = "type", default)]
    pub type_: ValueType,
    /// Allowed values for `select` columns (display only).
    #[serde(default)]
    pub options: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldDef {
    pub key: String,
    pub label: String,
    #[serde(rename = "type", default)]
    pub type_: ValueType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDef {
    pub key: String,
    #[serde(default)]
    pub label: Option<String>,
    pub table: String,
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    #[serde(default)]
    pub primary_key_type: PkType,
    pub columns: Vec<ColumnDef>,
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub unique_key: Option<String>,
    /// Column stamped with NOW() on every update when the payload does not set it.
    #[serde(default)]
    pub updated_at_column: Option<String>,
}

fn default_primary_key() -> String {
    "id".into()
}
