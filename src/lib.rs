//! Lexicon admin: registry-driven resource engine (list, CRUD, bulk import, export) over PostgreSQL.

pub mod config;
pub mod error;
pub mod handlers;
pub mod query;
pub mod response;
pub mod routes;
pub mod service;
pub mod settings;
pub mod sql;
pub mod state;
pub mod store;
pub mod tabular;

pub use config::{load_registry, resolve, ResourceConfig, ResourceDef, ResourceRegistry};
pub use error::{AppError, ConfigError, StoreError};
pub use query::QueryRequest;
pub use response::{success_many, success_one};
pub use routes::{app, common_routes, resource_routes};
pub use service::{CrudService, ExportFormat, ExportService, ImportReport, ImportService, ListPage};
pub use settings::Settings;
pub use state::AppState;
pub use store::{PgStore, Store, StoreRows};
