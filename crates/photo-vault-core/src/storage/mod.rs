pub mod models;
mod queries;
pub mod sqlite;

pub use models::{FileRecord, NewFileRecord};
pub use sqlite::Ledger;
