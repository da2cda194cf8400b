use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::models::{Booking, Guide, NewBooking};
use crate::repository::{
    BookingDatabase, BookingStore, BookingTransaction, GuideDirectory, GuideStore,
    UNIQUE_GUIDE_DATE_CONSTRAINT,
};
use crate::StoreError;

#[derive(Default)]
struct MemoryState {
    guides: BTreeMap<i64, Guide>,
    bookings: Vec<Booking>,
    next_guide_id: i64,
    next_booking_id: i64,
}

impl MemoryState {
    fn is_taken(&self, guide_id: i64, date: NaiveDate) -> bool {
        self.bookings
            .iter()
            .any(|b| b.guide_id == guide_id && b.date == date)
    }
}

/// In-process booking backend with per-guide row locks, staged writes and the
/// `(guide_id, date)` uniqueness constraint. Used by tests and local runs.
#[derive(Clone, Default)]
pub struct InMemoryBookingDatabase {
    state: Arc<Mutex<MemoryState>>,
    guide_locks: Arc<Mutex<HashMap<i64, Arc<Mutex<()>>>>>,
}

impl InMemoryBookingDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_guide(&self, name: &str, experience_years: i32, is_active: bool) -> Guide {
        let mut state = self.state.lock().await;
        state.next_guide_id += 1;
        let guide = Guide {
            id: state.next_guide_id,
            name: name.to_string(),
            experience_years,
            is_active,
        };
        state.guides.insert(guide.id, guide.clone());
        guide
    }

    pub async fn set_active(&self, guide_id: i64, is_active: bool) {
        if let Some(guide) = self.state.lock().await.guides.get_mut(&guide_id) {
            guide.is_active = is_active;
        }
    }

    /// Delete a guide together with its bookings. Waits for any transaction
    /// holding the guide's row lock to finish first.
    pub async fn remove_guide(&self, guide_id: i64) -> bool {
        let _row_lock = self.guide_lock(guide_id).await.lock_owned().await;
        let mut state = self.state.lock().await;
        let removed = state.guides.remove(&guide_id).is_some();
        state.bookings.retain(|b| b.guide_id != guide_id);
        removed
    }

    /// Committed bookings in insertion order.
    pub async fn bookings(&self) -> Vec<Booking> {
        self.state.lock().await.bookings.clone()
    }

    async fn guide_lock(&self, guide_id: i64) -> Arc<Mutex<()>> {
        self.guide_locks
            .lock()
            .await
            .entry(guide_id)
            .or_default()
            .clone()
    }
}

#[async_trait]
impl BookingDatabase for InMemoryBookingDatabase {
    async fn begin(&self) -> Result<Box<dyn BookingTransaction>, StoreError> {
        Ok(Box::new(InMemoryTransaction {
            db: self.clone(),
            held: HashMap::new(),
            pending: Vec::new(),
            finished: false,
        }))
    }
}

#[async_trait]
impl GuideDirectory for InMemoryBookingDatabase {
    async fn find(&self, guide_id: i64) -> Result<Option<Guide>, StoreError> {
        Ok(self.state.lock().await.guides.get(&guide_id).cloned())
    }

    async fn list_active(&self, min_experience: Option<i32>) -> Result<Vec<Guide>, StoreError> {
        let state = self.state.lock().await;
        let mut guides: Vec<Guide> = state
            .guides
            .values()
            .filter(|g| g.is_active)
            .filter(|g| min_experience.map_or(true, |min| g.experience_years >= min))
            .cloned()
            .collect();
        guides.sort_by(|a, b| b.experience_years.cmp(&a.experience_years).then(a.id.cmp(&b.id)));
        Ok(guides)
    }
}

/// Transaction over [`InMemoryBookingDatabase`]. Writes stay private until commit;
/// guide locks are released on commit, rollback or drop.
pub struct InMemoryTransaction {
    db: InMemoryBookingDatabase,
    held: HashMap<i64, OwnedMutexGuard<()>>,
    pending: Vec<Booking>,
    finished: bool,
}

impl InMemoryTransaction {
    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.finished {
            return Err(StoreError::Database("transaction already finished".to_string()));
        }
        Ok(())
    }

    fn release(&mut self) {
        self.pending.clear();
        self.held.clear();
        self.finished = true;
    }
}

fn guide_date_violation() -> StoreError {
    StoreError::UniqueViolation {
        constraint: UNIQUE_GUIDE_DATE_CONSTRAINT.to_string(),
    }
}

#[async_trait]
impl GuideStore for InMemoryTransaction {
    async fn lock_and_get(&mut self, guide_id: i64) -> Result<Option<Guide>, StoreError> {
        self.ensure_open()?;

        if !self.db.state.lock().await.guides.contains_key(&guide_id) {
            return Ok(None);
        }

        if !self.held.contains_key(&guide_id) {
            let lock = self.db.guide_lock(guide_id).await;
            let guard = lock.lock_owned().await;
            self.held.insert(guide_id, guard);
        }

        // Re-read under the lock so the caller sees the latest committed row.
        Ok(self.db.state.lock().await.guides.get(&guide_id).cloned())
    }

    async fn has_booking_on(&mut self, guide_id: i64, date: NaiveDate) -> Result<bool, StoreError> {
        self.ensure_open()?;
        let staged = self
            .pending
            .iter()
            .any(|b| b.guide_id == guide_id && b.date == date);
        Ok(staged || self.db.state.lock().await.is_taken(guide_id, date))
    }
}

#[async_trait]
impl BookingStore for InMemoryTransaction {
    async fn insert(&mut self, booking: &NewBooking) -> Result<Booking, StoreError> {
        self.ensure_open()?;

        let mut state = self.db.state.lock().await;
        if !state.guides.contains_key(&booking.guide_id) {
            return Err(StoreError::Database(format!(
                "foreign key violation: guide {} does not exist",
                booking.guide_id
            )));
        }

        let staged = self
            .pending
            .iter()
            .any(|b| b.guide_id == booking.guide_id && b.date == booking.date);
        if staged || state.is_taken(booking.guide_id, booking.date) {
            return Err(guide_date_violation());
        }

        state.next_booking_id += 1;
        let row = booking.clone().into_booking(state.next_booking_id, Utc::now());
        drop(state);

        self.pending.push(row.clone());
        Ok(row)
    }
}

#[async_trait]
impl BookingTransaction for InMemoryTransaction {
    async fn commit(&mut self) -> Result<(), StoreError> {
        self.ensure_open()?;

        let shared = self.db.state.clone();
        let mut state = shared.lock().await;
        let orphan = self
            .pending
            .iter()
            .find(|row| !state.guides.contains_key(&row.guide_id))
            .map(|row| row.guide_id);
        if let Some(guide_id) = orphan {
            self.release();
            return Err(StoreError::Database(format!(
                "foreign key violation: guide {guide_id} does not exist"
            )));
        }
        if self.pending.iter().any(|row| state.is_taken(row.guide_id, row.date)) {
            self.release();
            return Err(guide_date_violation());
        }
        state.bookings.append(&mut self.pending);
        drop(state);

        self.release();
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        self.ensure_open()?;
        self.release();
        Ok(())
    }
}
