//! In-memory store for engine and HTTP tests.
//!
//! Understands the statement shapes the SQL builder emits (insert, update, delete,
//! select by id, unique probe, count, list) and keeps rows per table. List, count and
//! export predicates (`ILIKE`, `::text =`, `=`) are evaluated; ORDER BY is not.

#![allow(dead_code)]

use async_trait::async_trait;
use lexicon_admin::config::{builtin_definitions, resolve, ResourceConfig, ResourceRegistry};
use lexicon_admin::{StoreError, Store, StoreRows};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

pub fn registry() -> ResourceRegistry {
    let defs = builtin_definitions().expect("builtin definitions parse");
    resolve(&defs).expect("builtin definitions resolve")
}

pub fn resource<'a>(registry: &'a ResourceRegistry, key: &str) -> &'a ResourceConfig {
    registry.get(key).expect("resource registered")
}

/// A statement as the store received it.
#[derive(Clone, Debug)]
pub struct Executed {
    pub sql: String,
    pub params: Vec<Value>,
}

struct Failure {
    table: String,
    column: String,
    value: Value,
    message: String,
}

#[derive(Default)]
struct Tables {
    rows: HashMap<String, Vec<Map<String, Value>>>,
    next_id: HashMap<String, i64>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    log: Mutex<Vec<Executed>>,
    failures: Mutex<Vec<Failure>>,
}

fn re(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("test regex"))
}

fn insert_re() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    re(&R, r#"^INSERT INTO "(\w+)" \((.*)\) VALUES \((.*)\) RETURNING \*$"#)
}

fn update_re() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    re(&R, r#"^UPDATE "(\w+)" SET (.*) WHERE "(\w+)" = \$(\d+)(?:::uuid)? RETURNING \*$"#)
}

fn delete_re() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    re(&R, r#"^DELETE FROM "(\w+)" WHERE "(\w+)" = \$(\d+)(?:::uuid)? RETURNING "(\w+)"$"#)
}

fn by_id_re() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    re(&R, r#"^SELECT \* FROM "(\w+)" WHERE "(\w+)" = \$(\d+)(?:::uuid)?$"#)
}

fn unique_re() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    re(&R, r#"^SELECT "(\w+)" FROM "(\w+)" WHERE "(\w+)" = \$(\d+)(?:::\w+)? LIMIT 1$"#)
}

fn count_re() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    re(&R, r#"^SELECT COUNT\(\*\) AS total FROM "(\w+)""#)
}

fn predicate_re() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    re(&R, r#"^"(\w+)"(::text)? (ILIKE|=) \$(\d+)$"#)
}

fn list_re() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    re(&R, r#"^SELECT \* FROM "(\w+)".*?(?: LIMIT \$(\d+) OFFSET \$(\d+))?$"#)
}

fn cell_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `$3`, `$3::date` or `NULL` resolved against the bound params.
fn resolve_placeholder(token: &str, params: &[Value]) -> Result<Value, StoreError> {
    let token = token.trim();
    if token == "NULL" {
        return Ok(Value::Null);
    }
    if token == "NOW()" {
        return Ok(Value::String("now".into()));
    }
    let digits: String = token
        .trim_start_matches('$')
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    let n: usize = digits
        .parse()
        .map_err(|_| StoreError::Backend(format!("bad placeholder {}", token)))?;
    params
        .get(n - 1)
        .cloned()
        .ok_or_else(|| StoreError::Backend(format!("missing param ${}", n)))
}

/// Text between ` WHERE ` and ` ORDER BY ` (or the end of the statement).
fn where_text(sql: &str) -> Option<&str> {
    let start = sql.find(" WHERE ")? + " WHERE ".len();
    let rest = &sql[start..];
    Some(rest.find(" ORDER BY ").map(|end| &rest[..end]).unwrap_or(rest))
}

fn predicate_matches(row: &Map<String, Value>, predicate: &str, params: &[Value]) -> bool {
    let Some(c) = predicate_re().captures(predicate) else {
        return false;
    };
    let Some(cell) = row.get(&c[1]).filter(|v| !v.is_null()) else {
        return false;
    };
    let param = param_at(params, &c[4]);
    match (&c[3], c.get(2).is_some()) {
        ("ILIKE", _) => {
            let needle = cell_text(&param).trim_matches('%').to_lowercase();
            cell_text(cell).to_lowercase().contains(&needle)
        }
        (_, true) => cell_text(cell) == cell_text(&param),
        (_, false) => *cell == param,
    }
}

/// Conjunction of terms; a parenthesized term is a disjunction.
fn where_matches(row: &Map<String, Value>, sql: &str, params: &[Value]) -> bool {
    let Some(clause) = where_text(sql) else {
        return true;
    };
    clause.split(" AND ").all(|term| {
        term.trim_start_matches('(')
            .trim_end_matches(')')
            .split(" OR ")
            .any(|p| predicate_matches(row, p, params))
    })
}

fn param_at(params: &[Value], n: &str) -> Value {
    n.parse::<usize>()
        .ok()
        .and_then(|n| params.get(n - 1).cloned())
        .unwrap_or(Value::Null)
}

fn same_id(row: &Map<String, Value>, pk: &str, id: &Value) -> bool {
    row.get(pk).map(cell_text) == Some(cell_text(id))
}

fn rows(rows: Vec<Map<String, Value>>) -> StoreRows {
    let row_count = rows.len() as u64;
    StoreRows {
        rows: rows.into_iter().map(Value::Object).collect(),
        row_count,
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts into `table` whose `column` equals `value` fail with `message`.
    pub fn fail_inserts_where(&self, table: &str, column: &str, value: Value, message: &str) {
        self.failures.lock().unwrap().push(Failure {
            table: table.into(),
            column: column.into(),
            value,
            message: message.into(),
        });
    }

    /// Pre-populate a table; ids are assigned as for inserts.
    pub fn seed(&self, table: &str, seeded: Vec<Value>) {
        let mut tables = self.tables.lock().unwrap();
        for row in seeded {
            let Value::Object(mut row) = row else { continue };
            let next = tables.next_id.entry(table.into()).or_insert(0);
            *next += 1;
            row.entry("id").or_insert(Value::from(*next));
            tables.rows.entry(table.into()).or_default().push(row);
        }
    }

    pub fn rows(&self, table: &str) -> Vec<Map<String, Value>> {
        self.tables
            .lock()
            .unwrap()
            .rows
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn executed(&self) -> Vec<Executed> {
        self.log.lock().unwrap().clone()
    }

    fn insert(&self, table: &str, row: Map<String, Value>) -> Result<StoreRows, StoreError> {
        for f in self.failures.lock().unwrap().iter() {
            if f.table == table && row.get(&f.column) == Some(&f.value) {
                return Err(StoreError::Backend(f.message.clone()));
            }
        }
        let mut tables = self.tables.lock().unwrap();
        let next = tables.next_id.entry(table.into()).or_insert(0);
        *next += 1;
        let mut stored = row;
        stored.insert("id".into(), Value::from(*next));
        stored
            .entry("created_at")
            .or_insert(Value::String("2026-01-01T00:00:00Z".into()));
        tables
            .rows
            .entry(table.into())
            .or_default()
            .push(stored.clone());
        Ok(rows(vec![stored]))
    }

    fn dispatch(&self, sql: &str, params: &[Value]) -> Result<StoreRows, StoreError> {
        if sql == "SELECT 1" {
            let mut one = Map::new();
            one.insert("?column?".into(), Value::from(1));
            return Ok(rows(vec![one]));
        }

        if let Some(c) = insert_re().captures(sql) {
            let cols: Vec<&str> = c[2].split(", ").map(|s| s.trim_matches('"')).collect();
            let mut row = Map::new();
            for (col, token) in cols.iter().zip(c[3].split(", ")) {
                row.insert((*col).to_string(), resolve_placeholder(token, params)?);
            }
            return self.insert(&c[1], row);
        }

        if let Some(c) = update_re().captures(sql) {
            let id = param_at(params, &c[4]);
            let mut sets = Vec::new();
            for pair in c[2].split(", ") {
                let (col, rhs) = pair
                    .split_once(" = ")
                    .ok_or_else(|| StoreError::Backend(format!("bad SET {}", pair)))?;
                sets.push((col.trim_matches('"').to_string(), resolve_placeholder(rhs, params)?));
            }
            let mut tables = self.tables.lock().unwrap();
            let table = tables.rows.entry(c[1].to_string()).or_default();
            let updated = table.iter_mut().find(|r| same_id(r, &c[3], &id)).map(|r| {
                for (col, v) in sets {
                    r.insert(col, v);
                }
                r.clone()
            });
            return Ok(rows(updated.into_iter().collect()));
        }

        if let Some(c) = delete_re().captures(sql) {
            let id = param_at(params, &c[3]);
            let mut tables = self.tables.lock().unwrap();
            let table = tables.rows.entry(c[1].to_string()).or_default();
            let Some(pos) = table.iter().position(|r| same_id(r, &c[2], &id)) else {
                return Ok(StoreRows::default());
            };
            let removed = table.remove(pos);
            let mut returned = Map::new();
            returned.insert(c[4].to_string(), removed.get(&c[4]).cloned().unwrap_or(Value::Null));
            return Ok(rows(vec![returned]));
        }

        let tables = self.tables.lock().unwrap();
        let table_rows = |name: &str| tables.rows.get(name).cloned().unwrap_or_default();

        if let Some(c) = by_id_re().captures(sql) {
            let id = param_at(params, &c[3]);
            let found = table_rows(&c[1]).into_iter().filter(|r| same_id(r, &c[2], &id));
            return Ok(rows(found.take(1).collect()));
        }

        if let Some(c) = unique_re().captures(sql) {
            let needle = cell_text(&param_at(params, &c[4]));
            let found = table_rows(&c[2])
                .into_iter()
                .filter(|r| r.get(&c[3]).map(cell_text).as_deref() == Some(needle.as_str()))
                .map(|r| {
                    let mut pk = Map::new();
                    pk.insert(c[1].to_string(), r.get(&c[1]).cloned().unwrap_or(Value::Null));
                    pk
                });
            return Ok(rows(found.take(1).collect()));
        }

        if let Some(c) = count_re().captures(sql) {
            let mut total = Map::new();
            let matching = table_rows(&c[1])
                .iter()
                .filter(|r| where_matches(r, sql, params))
                .count();
            total.insert("total".into(), Value::from(matching as i64));
            return Ok(rows(vec![total]));
        }

        if let Some(c) = list_re().captures(sql) {
            let all: Vec<_> = table_rows(&c[1])
                .into_iter()
                .filter(|r| where_matches(r, sql, params))
                .collect();
            let page = match (c.get(2), c.get(3)) {
                (Some(l), Some(o)) => {
                    let limit = param_at(params, l.as_str()).as_u64().unwrap_or(0) as usize;
                    let offset = param_at(params, o.as_str()).as_u64().unwrap_or(0) as usize;
                    all.into_iter().skip(offset).take(limit).collect()
                }
                _ => all,
            };
            return Ok(rows(page));
        }

        Err(StoreError::Backend(format!("unsupported statement: {}", sql)))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<StoreRows, StoreError> {
        self.log.lock().unwrap().push(Executed {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        self.dispatch(sql, params)
    }
}
