pub mod models;
pub mod repository;
pub mod coordinator;
pub mod memory;

pub use models::{Booking, ConfirmedBooking, Guide, NewBooking};
pub use repository::{
    BookingDatabase, BookingStore, BookingTransaction, GuideDirectory, GuideStore,
    UNIQUE_GUIDE_DATE_CONSTRAINT,
};
pub use coordinator::BookingCoordinator;
pub use memory::InMemoryBookingDatabase;

/// Failures reported by the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },
    #[error("Database error: {0}")]
    Database(String),
}

impl StoreError {
    /// True when the storage layer rejected a second booking for the same guide and date.
    pub fn is_double_booking(&self) -> bool {
        matches!(self, StoreError::UniqueViolation { constraint } if constraint == UNIQUE_GUIDE_DATE_CONSTRAINT)
    }
}

/// Outcome categories of a booking attempt. Callers switch on the variant
/// to pick a status code and the offending field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BookingError {
    #[error("Guide not found.")]
    GuideNotFound,
    #[error("The selected guide is not currently active.")]
    GuideInactive,
    #[error("The selected guide is not available on this date.")]
    GuideUnavailable,
    #[error("Unable to create booking. Please try again later.")]
    Internal,
}

impl BookingError {
    /// Request field the client should correct, if the failure is a business-rule violation.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            BookingError::GuideInactive => Some("guide_id"),
            BookingError::GuideUnavailable => Some("date"),
            BookingError::GuideNotFound | BookingError::Internal => None,
        }
    }
}

pub type BookingResult<T> = Result<T, BookingError>;
