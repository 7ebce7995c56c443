//! Resource engine operations: CRUD, bulk import and bulk export over the store.

mod crud;
mod export;
mod import;
pub mod validation;
pub use crud::{CrudService, ListPage};
pub use export::{ExportFile, ExportFormat, ExportService};
pub use import::{ImportReport, ImportResult, ImportService, RowStatus};
