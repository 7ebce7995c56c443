//! Load resource definitions from the built-in registry or a JSON file, and resolve them.

use crate::config::resolved::{Column, Field, ResourceConfig, ResourceRegistry};
use crate::config::{validate, ResourceDef};
use crate::error::ConfigError;
use crate::sql::Ident;
use std::path::Path;

const BUILTIN_RESOURCES: &str = include_str!("../../resources/default.json");

/// Build the registry from definitions (validates first).
pub fn resolve(defs: &[ResourceDef]) -> Result<ResourceRegistry, ConfigError> {
    validate(defs)?;
    let mut resources = Vec::with_capacity(defs.len());
    for def in defs {
        let columns = def
            .columns
            .iter()
            .map(|c| {
                Ok(Column {
                    key: Ident::parse(&c.key)?,
                    label: c.label.clone(),
                    value_type: c.type_,
                    options: c.options.clone(),
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        let fields = def
            .fields
            .iter()
            .map(|f| {
                Ok(Field {
                    key: Ident::parse(&f.key)?,
                    label: f.label.clone(),
                    value_type: f.type_,
                    required: f.required,
                    options: f.options.clone(),
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        resources.push(ResourceConfig {
            key: def.key.clone(),
            label: def.label.clone().unwrap_or_else(|| def.key.clone()),
            table: Ident::parse(&def.table)?,
            primary_key: Ident::parse(&def.primary_key)?,
            primary_key_type: def.primary_key_type,
            columns,
            fields,
            unique_key: def.unique_key.as_deref().map(Ident::parse).transpose()?,
            updated_at_column: def.updated_at_column.as_deref().map(Ident::parse).transpose()?,
        });
    }
    Ok(ResourceRegistry::from_resources(resources))
}

pub fn parse_definitions(json: &str) -> Result<Vec<ResourceDef>, ConfigError> {
    serde_json::from_str(json).map_err(|e| ConfigError::Load(e.to_string()))
}

/// Definitions shipped with the crate for the content database.
pub fn builtin_definitions() -> Result<Vec<ResourceDef>, ConfigError> {
    parse_definitions(BUILTIN_RESOURCES)
}

pub async fn load_from_path(path: impl AsRef<Path>) -> Result<Vec<ResourceDef>, ConfigError> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    parse_definitions(&raw)
}

/// Registry from `path` when given, otherwise the built-in definitions.
pub async fn load_registry(path: Option<&Path>) -> Result<ResourceRegistry, ConfigError> {
    let defs = match path {
        Some(p) => load_from_path(p).await?,
        None => builtin_definitions()?,
    };
    let registry = resolve(&defs)?;
    tracing::info!(resources = registry.len(), "resource registry loaded");
    Ok(registry)
}
