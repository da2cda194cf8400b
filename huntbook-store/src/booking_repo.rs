use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use huntbook_core::{
    Booking, BookingDatabase, BookingStore, BookingTransaction, Guide, GuideStore, NewBooking,
    StoreError,
};
use sqlx::{PgPool, Postgres, Transaction};

use crate::guide_repo::GuideRow;
use crate::map_sqlx_error;

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: i64,
    tour_name: String,
    hunter_name: String,
    guide_id: i64,
    date: NaiveDate,
    participants_count: i32,
    created_at: DateTime<Utc>,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Booking {
            id: row.id,
            tour_name: row.tour_name,
            hunter_name: row.hunter_name,
            guide_id: row.guide_id,
            date: row.date,
            participants_count: row.participants_count,
            created_at: row.created_at,
        }
    }
}

/// Opens Postgres transactions for the booking coordinator.
#[derive(Clone)]
pub struct PgBookingDatabase {
    pool: PgPool,
}

impl PgBookingDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Committed bookings for a guide, ordered by date.
    pub async fn bookings_for_guide(&self, guide_id: i64) -> Result<Vec<Booking>, StoreError> {
        let rows = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT id, tour_name, hunter_name, guide_id, date, participants_count, created_at
            FROM hunting_bookings
            WHERE guide_id = $1
            ORDER BY date ASC
            "#,
        )
        .bind(guide_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Booking::from).collect())
    }
}

#[async_trait]
impl BookingDatabase for PgBookingDatabase {
    async fn begin(&self) -> Result<Box<dyn BookingTransaction>, StoreError> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(Box::new(PgBookingTransaction { tx: Some(tx) }))
    }
}

/// A booking unit of work on one pooled connection. Dropping it before commit
/// rolls back and releases every row lock it holds.
pub struct PgBookingTransaction {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgBookingTransaction {
    fn open(&mut self) -> Result<&mut Transaction<'static, Postgres>, StoreError> {
        self.tx
            .as_mut()
            .ok_or_else(|| StoreError::Database("transaction already finished".to_string()))
    }

    fn take(&mut self) -> Result<Transaction<'static, Postgres>, StoreError> {
        self.tx
            .take()
            .ok_or_else(|| StoreError::Database("transaction already finished".to_string()))
    }
}

#[async_trait]
impl GuideStore for PgBookingTransaction {
    async fn lock_and_get(&mut self, guide_id: i64) -> Result<Option<Guide>, StoreError> {
        let tx = self.open()?;
        let row = sqlx::query_as::<_, GuideRow>(
            r#"
            SELECT id, name, experience_years, is_active
            FROM guides
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(guide_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Guide::from))
    }

    async fn has_booking_on(&mut self, guide_id: i64, date: NaiveDate) -> Result<bool, StoreError> {
        let tx = self.open()?;
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM hunting_bookings WHERE guide_id = $1 AND date = $2)",
        )
        .bind(guide_id)
        .bind(date)
        .fetch_one(&mut **tx)
        .await
        .map_err(map_sqlx_error)
    }
}

#[async_trait]
impl BookingStore for PgBookingTransaction {
    async fn insert(&mut self, booking: &NewBooking) -> Result<Booking, StoreError> {
        let tx = self.open()?;
        let row = sqlx::query_as::<_, BookingRow>(
            r#"
            INSERT INTO hunting_bookings (tour_name, hunter_name, guide_id, date, participants_count, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, now(), now())
            RETURNING id, tour_name, hunter_name, guide_id, date, participants_count, created_at
            "#,
        )
        .bind(&booking.tour_name)
        .bind(&booking.hunter_name)
        .bind(booking.guide_id)
        .bind(booking.date)
        .bind(booking.participants_count)
        .fetch_one(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }
}

#[async_trait]
impl BookingTransaction for PgBookingTransaction {
    async fn commit(&mut self) -> Result<(), StoreError> {
        self.take()?.commit().await.map_err(map_sqlx_error)
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        self.take()?.rollback().await.map_err(map_sqlx_error)
    }
}
