//! SQLite persistence for sessions and their move ledgers.

mod error;
mod models;
mod schema;
mod store;

pub use error::DbError;
pub use store::{DEFAULT_BUSY_TIMEOUT_MS, MIGRATIONS, SqliteStore};
