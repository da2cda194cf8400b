use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tracing::{error, info, warn};

use crate::models::{ConfirmedBooking, NewBooking};
use crate::repository::{BookingDatabase, BookingTransaction};
use crate::{BookingError, BookingResult, StoreError};

pub const DEFAULT_TRANSACTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Creates bookings inside a single transaction serialized on the guide row.
///
/// The guide lock is the only serialization point: every invariant check and the
/// insert for a given guide happen while it is held. The storage-level
/// `(guide_id, date)` constraint stays in place as a backstop, and a violation of it
/// is reported exactly like a failed availability check.
pub struct BookingCoordinator {
    db: Arc<dyn BookingDatabase>,
    transaction_timeout: Duration,
}

impl BookingCoordinator {
    pub fn new(db: Arc<dyn BookingDatabase>) -> Self {
        Self {
            db,
            transaction_timeout: DEFAULT_TRANSACTION_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.transaction_timeout = timeout;
        self
    }

    /// Book a guide for a date. Any failure leaves no persisted trace.
    pub async fn create_booking(&self, input: NewBooking) -> BookingResult<ConfirmedBooking> {
        match AssertUnwindSafe(self.run(&input)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => {
                error!(
                    guide_id = input.guide_id,
                    date = %input.date,
                    tour_name = %input.tour_name,
                    hunter_name = %input.hunter_name,
                    participants = input.participants_count,
                    error = panic_message(&*panic),
                    "Unexpected error during booking creation"
                );
                Err(BookingError::Internal)
            }
        }
    }

    async fn run(&self, input: &NewBooking) -> BookingResult<ConfirmedBooking> {
        let (mut tx, confirmed) =
            match tokio::time::timeout(self.transaction_timeout, self.lock_and_book(input)).await {
                Ok(locked) => locked?,
                Err(_) => {
                    error!(
                        guide_id = input.guide_id,
                        date = %input.date,
                        timeout_ms = self.transaction_timeout.as_millis() as u64,
                        "Unexpected error during booking creation: transaction timed out"
                    );
                    return Err(BookingError::Internal);
                }
            };

        // Not bounded by the timeout: a COMMIT abandoned in flight may still be durable.
        tx.commit().await.map_err(|e| storage_failure(input, e))?;

        info!(
            booking_id = confirmed.booking.id,
            guide_id = confirmed.guide.id,
            date = %confirmed.booking.date,
            participants = confirmed.booking.participants_count,
            "Booking created successfully"
        );
        Ok(confirmed)
    }

    /// Everything up to, but not including, the commit. On error the transaction
    /// has already been rolled back.
    async fn lock_and_book(
        &self,
        input: &NewBooking,
    ) -> BookingResult<(Box<dyn BookingTransaction>, ConfirmedBooking)> {
        let mut tx = self
            .db
            .begin()
            .await
            .map_err(|e| storage_failure(input, e))?;

        match book_under_lock(tx.as_mut(), input).await {
            Ok(confirmed) => Ok((tx, confirmed)),
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(
                        guide_id = input.guide_id,
                        date = %input.date,
                        error = %rollback_err,
                        "Rollback failed after booking error"
                    );
                }
                Err(err)
            }
        }
    }
}

async fn book_under_lock(
    tx: &mut dyn BookingTransaction,
    input: &NewBooking,
) -> BookingResult<ConfirmedBooking> {
    let guide = match tx
        .lock_and_get(input.guide_id)
        .await
        .map_err(|e| storage_failure(input, e))?
    {
        Some(guide) => guide,
        None => {
            warn!(guide_id = input.guide_id, date = %input.date, "Guide not found");
            return Err(BookingError::GuideNotFound);
        }
    };

    if !guide.is_active {
        warn!(guide_id = guide.id, date = %input.date, "Attempt to book inactive guide");
        return Err(BookingError::GuideInactive);
    }

    let taken = tx
        .has_booking_on(guide.id, input.date)
        .await
        .map_err(|e| storage_failure(input, e))?;
    if taken {
        info!(guide_id = guide.id, date = %input.date, "Guide not available");
        return Err(BookingError::GuideUnavailable);
    }

    let booking = tx.insert(input).await.map_err(|e| storage_failure(input, e))?;

    Ok(ConfirmedBooking { booking, guide })
}

fn storage_failure(input: &NewBooking, err: StoreError) -> BookingError {
    if err.is_double_booking() {
        warn!(
            guide_id = input.guide_id,
            date = %input.date,
            error = %err,
            "Duplicate booking attempt (unique constraint)"
        );
        return BookingError::GuideUnavailable;
    }

    error!(
        guide_id = input.guide_id,
        date = %input.date,
        tour_name = %input.tour_name,
        hunter_name = %input.hunter_name,
        participants = input.participants_count,
        error = %err,
        "Database error during booking creation"
    );
    BookingError::Internal
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "panic"
    }
}
