//! Resolved resource model: definitions validated and flattened for runtime use.

use crate::config::{PkType, ValueType};
use crate::error::AppError;
use crate::sql::Ident;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Clone, Debug, Serialize)]
pub struct Column {
    pub key: Ident,
    pub label: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Field {
    pub key: Ident,
    pub label: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    pub required: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceConfig {
    pub key: String,
    pub label: String,
    pub table: Ident,
    pub primary_key: Ident,
    pub primary_key_type: PkType,
    pub columns: Vec<Column>,
    pub fields: Vec<Field>,
    pub unique_key: Option<Ident>,
    pub updated_at_column: Option<Ident>,
}

impl ResourceConfig {
    pub fn column(&self, key: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.key == *key)
    }

    pub fn field(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.key == *key)
    }

    /// Look up a declared column or field by request-supplied name. Columns win over fields.
    pub fn declared(&self, key: &str) -> Option<(&Ident, ValueType)> {
        if let Some(c) = self.column(key) {
            return Some((&c.key, c.value_type));
        }
        self.field(key).map(|f| (&f.key, f.value_type))
    }

    /// Display columns included in free-text search: everything except identity,
    /// timestamp-like and non-textual columns.
    pub fn search_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(move |c| {
            c.key != self.primary_key
                && !c.key.as_str().ends_with("_at")
                && !matches!(
                    c.value_type,
                    ValueType::Date | ValueType::Datetime | ValueType::Boolean | ValueType::Json
                )
        })
    }
}

/// Immutable key → config lookup built once at startup.
#[derive(Clone, Debug, Default)]
pub struct ResourceRegistry {
    resources: Vec<ResourceConfig>,
    by_key: HashMap<String, usize>,
}

impl ResourceRegistry {
    pub(crate) fn from_resources(resources: Vec<ResourceConfig>) -> Self {
        let by_key = resources
            .iter()
            .enumerate()
            .map(|(i, r)| (r.key.clone(), i))
            .collect();
        ResourceRegistry { resources, by_key }
    }

    pub fn get(&self, key: &str) -> Option<&ResourceConfig> {
        self.by_key.get(key).map(|&i| &self.resources[i])
    }

    /// Resolve a resource key or fail the request before any store access.
    pub fn resolve(&self, key: &str) -> Result<&ResourceConfig, AppError> {
        self.get(key)
            .ok_or_else(|| AppError::ResourceNotFound(key.to_string()))
    }

    pub fn resources(&self) -> &[ResourceConfig] {
        &self.resources
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
