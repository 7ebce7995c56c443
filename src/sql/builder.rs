//! Builds parameterized SELECT, COUNT, INSERT, UPDATE, DELETE from a resolved resource.
//! Identifiers come from the registry only; every request value is a bound parameter.

use crate::config::{Field, PkType, ResourceConfig, ValueType};
use crate::query::QueryRequest;
use crate::sql::Ident;
use serde_json::Value;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf::default()
    }

    fn push_param(&mut self, v: Value) -> usize {
        self.params.push(v);
        self.params.len()
    }
}

/// Placeholder for the primary key, cast when the column type needs it.
fn pk_placeholder(resource: &ResourceConfig, n: usize) -> String {
    match resource.primary_key_type {
        PkType::Uuid => format!("${}::uuid", n),
        PkType::Int | PkType::Text => format!("${}", n),
    }
}

/// Bound placeholder for a written value. NULL is emitted as a keyword so an untyped
/// null never meets a typed column as TEXT.
fn write_value(q: &mut QueryBuf, value_type: ValueType, value: &Value) -> String {
    if value.is_null() {
        return "NULL".to_string();
    }
    let n = q.push_param(value.clone());
    write_placeholder(value_type, n)
}

fn write_placeholder(value_type: ValueType, n: usize) -> String {
    value_type
        .write_cast()
        .map(|t| format!("${}::{}", n, t))
        .unwrap_or_else(|| format!("${}", n))
}

/// Filter values arrive as query-string text; booleans accept `true`/`1`.
pub fn parse_bool_text(s: &str) -> bool {
    let s = s.trim();
    s.eq_ignore_ascii_case("true") || s == "1"
}

/// WHERE clause shared by the page, count and export queries. Pushes its params into `q`.
fn where_clause(resource: &ResourceConfig, req: &QueryRequest, q: &mut QueryBuf) -> String {
    let mut parts = Vec::new();

    if let Some(term) = req.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let columns: Vec<String> = resource
            .search_columns()
            .map(|c| c.key.quoted())
            .collect();
        if !columns.is_empty() {
            // One bound value shared by every ORed column predicate.
            let n = q.push_param(Value::String(format!("%{}%", term)));
            let ors: Vec<String> = columns
                .iter()
                .map(|col| format!("{}::text ILIKE ${}", col, n))
                .collect();
            parts.push(format!("({})", ors.join(" OR ")));
        }
    }

    for (key, raw) in &req.filters {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let Some((ident, value_type)) = resource.declared(key) else {
            continue;
        };
        let predicate = match value_type {
            ValueType::Boolean => {
                let n = q.push_param(Value::Bool(parse_bool_text(raw)));
                format!("{} = ${}", ident.quoted(), n)
            }
            ValueType::Select | ValueType::Number => {
                let n = q.push_param(Value::String(raw.to_string()));
                format!("{}::text = ${}", ident.quoted(), n)
            }
            _ => {
                let n = q.push_param(Value::String(format!("%{}%", raw)));
                format!("{}::text ILIKE ${}", ident.quoted(), n)
            }
        };
        parts.push(predicate);
    }

    if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    }
}

/// ORDER BY a declared column or field; unknown sort keys fall back to the primary key.
fn order_clause(resource: &ResourceConfig, req: &QueryRequest) -> String {
    let column: &Ident = req
        .sort
        .as_deref()
        .and_then(|s| resource.declared(s))
        .map(|(ident, _)| ident)
        .unwrap_or(&resource.primary_key);
    format!(" ORDER BY {} {}", column.quoted(), req.order.as_sql())
}

/// Paginated list: `LIMIT`/`OFFSET` are bound after the filter params.
pub fn select_page(resource: &ResourceConfig, req: &QueryRequest) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(resource, req, &mut q);
    let order_sql = order_clause(resource, req);
    let limit_n = q.push_param(Value::from(u64::from(req.limit)));
    let offset_n = q.push_param(Value::from(req.offset()));
    q.sql = format!(
        "SELECT * FROM {}{}{} LIMIT ${} OFFSET ${}",
        resource.table.quoted(),
        where_sql,
        order_sql,
        limit_n,
        offset_n
    );
    q
}

/// COUNT with the same predicate as [`select_page`].
pub fn count(resource: &ResourceConfig, req: &QueryRequest) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(resource, req, &mut q);
    q.sql = format!(
        "SELECT COUNT(*) AS total FROM {}{}",
        resource.table.quoted(),
        where_sql
    );
    q
}

/// Unpaginated list for export; `page`/`limit` are ignored.
pub fn select_export(resource: &ResourceConfig, req: &QueryRequest) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(resource, req, &mut q);
    let order_sql = order_clause(resource, req);
    q.sql = format!(
        "SELECT * FROM {}{}{}",
        resource.table.quoted(),
        where_sql,
        order_sql
    );
    q
}

pub fn select_by_id(resource: &ResourceConfig, id: Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(id);
    q.sql = format!(
        "SELECT * FROM {} WHERE {} = {}",
        resource.table.quoted(),
        resource.primary_key.quoted(),
        pk_placeholder(resource, n)
    );
    q
}

/// Existence probe used for import de-duplication. `value` must already have the
/// field's type; the column is compared uncast so its unique index applies.
pub fn select_by_unique(resource: &ResourceConfig, field: &Field, value: Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(value);
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = {} LIMIT 1",
        resource.primary_key.quoted(),
        resource.table.quoted(),
        field.key.quoted(),
        write_placeholder(field.value_type, n)
    );
    q
}

/// INSERT of projected fields only; columns the caller omitted keep their DB defaults.
pub fn insert(resource: &ResourceConfig, values: &[(&Field, Value)]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::with_capacity(values.len());
    let mut placeholders = Vec::with_capacity(values.len());
    for (field, value) in values {
        cols.push(field.key.quoted());
        placeholders.push(write_value(&mut q, field.value_type, value));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING *",
        resource.table.quoted(),
        cols.join(", "),
        placeholders.join(", ")
    );
    q
}

/// UPDATE by id: SET only the projected fields, plus the resource's updated-at stamp.
pub fn update(resource: &ResourceConfig, id: Value, values: &[(&Field, Value)]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::with_capacity(values.len() + 1);
    for (field, value) in values {
        let rhs = write_value(&mut q, field.value_type, value);
        sets.push(format!("{} = {}", field.key.quoted(), rhs));
    }
    if let Some(stamp) = &resource.updated_at_column {
        sets.push(format!("{} = NOW()", stamp.quoted()));
    }
    let id_n = q.push_param(id);
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {} RETURNING *",
        resource.table.quoted(),
        sets.join(", "),
        resource.primary_key.quoted(),
        pk_placeholder(resource, id_n)
    );
    q
}

pub fn delete(resource: &ResourceConfig, id: Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(id);
    q.sql = format!(
        "DELETE FROM {} WHERE {} = {} RETURNING {}",
        resource.table.quoted(),
        resource.primary_key.quoted(),
        pk_placeholder(resource, n),
        resource.primary_key.quoted()
    );
    q
}
