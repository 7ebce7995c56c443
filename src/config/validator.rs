//! Registry validation: identifier shape and internal consistency of each definition.

use crate::config::ResourceDef;
use crate::error::ConfigError;
use crate::sql::Ident;
use std::collections::HashSet;

pub fn validate(defs: &[ResourceDef]) -> Result<(), ConfigError> {
    let mut keys = HashSet::new();
    for def in defs {
        Ident::parse(&def.key)?;
        if !keys.insert(def.key.as_str()) {
            return Err(ConfigError::DuplicateResource(def.key.clone()));
        }
        validate_resource(def)?;
    }
    Ok(())
}

fn resource_error(def: &ResourceDef, message: impl Into<String>) -> ConfigError {
    ConfigError::Resource {
        resource: def.key.clone(),
        message: message.into(),
    }
}

fn validate_resource(def: &ResourceDef) -> Result<(), ConfigError> {
    Ident::parse(&def.table)?;
    Ident::parse(&def.primary_key)?;

    if def.columns.is_empty() {
        return Err(resource_error(def, "at least one column required"));
    }

    let mut column_keys = HashSet::new();
    for c in &def.columns {
        Ident::parse(&c.key)?;
        if !column_keys.insert(c.key.as_str()) {
            return Err(resource_error(def, format!("duplicate column '{}'", c.key)));
        }
    }

    let mut field_keys = HashSet::new();
    for f in &def.fields {
        Ident::parse(&f.key)?;
        if !field_keys.insert(f.key.as_str()) {
            return Err(resource_error(def, format!("duplicate field '{}'", f.key)));
        }
    }

    if let Some(unique) = &def.unique_key {
        Ident::parse(unique)?;
        if !field_keys.contains(unique.as_str()) {
            return Err(resource_error(
                def,
                format!("unique key '{}' must be a declared field", unique),
            ));
        }
    }

    if let Some(col) = &def.updated_at_column {
        Ident::parse(col)?;
        if field_keys.contains(col.as_str()) {
            return Err(resource_error(
                def,
                format!("updated_at column '{}' must not be writable", col),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ColumnDef, FieldDef, PkType, ValueType};

    fn kanji() -> ResourceDef {
        ResourceDef {
            key: "kanji".into(),
            label: None,
            table: "kanji".into(),
            primary_key: "id".into(),
            primary_key_type: PkType::Int,
            columns: vec![ColumnDef {
                key: "character".into(),
                label: "Character".into(),
                type_: ValueType::Text,
                options: vec![],
            }],
            fields: vec![FieldDef {
                key: "character".into(),
                label: "Character".into(),
                type_: ValueType::Text,
                required: true,
                options: vec![],
            }],
            unique_key: Some("character".into()),
            updated_at_column: None,
        }
    }

    #[test]
    fn accepts_well_formed_definition() {
        assert!(validate(&[kanji()]).is_ok());
    }

    #[test]
    fn rejects_duplicate_resource_keys() {
        let err = validate(&[kanji(), kanji()]).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateResource(k) if k == "kanji"));
    }

    #[test]
    fn rejects_unsafe_table_name() {
        let mut def = kanji();
        def.table = "kanji; drop table kanji".into();
        assert!(matches!(
            validate(&[def]),
            Err(ConfigError::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn rejects_unique_key_outside_fields() {
        let mut def = kanji();
        def.unique_key = Some("meaning_en".into());
        assert!(matches!(validate(&[def]), Err(ConfigError::Resource { .. })));
    }

    #[test]
    fn rejects_resource_without_columns() {
        let mut def = kanji();
        def.columns.clear();
        assert!(validate(&[def]).is_err());
    }

    #[test]
    fn rejects_writable_updated_at_column() {
        let mut def = kanji();
        def.updated_at_column = Some("character".into());
        assert!(validate(&[def]).is_err());
    }
}
