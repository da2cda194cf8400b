pub mod app_config;
pub mod database;
pub mod guide_repo;
pub mod booking_repo;

pub use database::DbClient;
pub use guide_repo::PgGuideDirectory;
pub use booking_repo::{PgBookingDatabase, PgBookingTransaction};

use huntbook_core::StoreError;

/// Translate a driver error into the store taxonomy. Only unique-key violations keep
/// their identity; everything else is an opaque database failure.
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::UniqueViolation {
                constraint: db_err.constraint().unwrap_or_default().to_string(),
            };
        }
    }
    StoreError::Database(err.to_string())
}
