use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{Booking, Guide, NewBooking};
use crate::StoreError;

/// Name of the storage-level constraint enforcing one booking per guide and date.
pub const UNIQUE_GUIDE_DATE_CONSTRAINT: &str = "unique_guide_date_booking";

/// Guide reads performed inside a booking transaction.
#[async_trait]
pub trait GuideStore: Send {
    /// Fetch the guide and take an exclusive row lock held until the transaction ends.
    /// Concurrent callers locking the same guide block here.
    async fn lock_and_get(&mut self, guide_id: i64) -> Result<Option<Guide>, StoreError>;

    /// Whether the guide already holds a booking on `date`, seen through this transaction.
    async fn has_booking_on(&mut self, guide_id: i64, date: NaiveDate) -> Result<bool, StoreError>;
}

/// Booking writes performed inside a booking transaction.
#[async_trait]
pub trait BookingStore: Send {
    /// Insert the booking. Must report `StoreError::UniqueViolation` when the
    /// `(guide_id, date)` constraint rejects the row.
    async fn insert(&mut self, booking: &NewBooking) -> Result<Booking, StoreError>;
}

/// One atomic unit of work. Dropping it without committing rolls it back.
#[async_trait]
pub trait BookingTransaction: GuideStore + BookingStore {
    async fn commit(&mut self) -> Result<(), StoreError>;
    async fn rollback(&mut self) -> Result<(), StoreError>;
}

/// Source of booking transactions.
#[async_trait]
pub trait BookingDatabase: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn BookingTransaction>, StoreError>;
}

/// Read-only guide lookups outside any booking transaction.
#[async_trait]
pub trait GuideDirectory: Send + Sync {
    async fn find(&self, guide_id: i64) -> Result<Option<Guide>, StoreError>;

    /// Active guides, optionally with at least `min_experience` years,
    /// most experienced first.
    async fn list_active(&self, min_experience: Option<i32>) -> Result<Vec<Guide>, StoreError>;
}
