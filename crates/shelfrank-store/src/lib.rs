//! SQLite persistence adapters for the Shelfrank catalog.

mod book_repository;
mod mutation;
mod review_repository;
mod util;

pub use book_repository::SqliteBookStore;
pub use mutation::BookMutationService;
pub use review_repository::SqliteReviewStore;
pub use util::{create_sqlite_pool, run_migrations};

/// Embedded SQL migrations for the catalog database.
pub const MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
