pub mod filter;
pub mod postgres;
pub mod sql;
pub mod sqlite;
pub mod store;

pub use filter::{Dialect, MythFilter};
pub use postgres::PgStore;
pub use sqlite::SqliteStore;
pub use store::{connect_store, is_quota_exhausted, MythStore};
