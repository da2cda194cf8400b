use chrono::SecondsFormat;
use huntbook_core::{ConfirmedBooking, Guide};
use serde::Serialize;

/// Response envelope, `{"data": ...}`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

#[derive(Debug, Serialize)]
pub struct GuideResource {
    pub id: i64,
    pub name: String,
    pub experience_years: i32,
    pub is_active: bool,
}

impl From<Guide> for GuideResource {
    fn from(guide: Guide) -> Self {
        Self {
            id: guide.id,
            name: guide.name,
            experience_years: guide.experience_years,
            is_active: guide.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BookingResource {
    pub id: i64,
    pub tour_name: String,
    pub hunter_name: String,
    pub guide: GuideResource,
    /// `YYYY-MM-DD`
    pub date: String,
    pub participants_count: i32,
    /// RFC 3339, UTC, microsecond precision
    pub created_at: String,
}

impl From<ConfirmedBooking> for BookingResource {
    fn from(confirmed: ConfirmedBooking) -> Self {
        let ConfirmedBooking { booking, guide } = confirmed;
        Self {
            id: booking.id,
            tour_name: booking.tour_name,
            hunter_name: booking.hunter_name,
            guide: guide.into(),
            date: booking.date.format("%Y-%m-%d").to_string(),
            participants_count: booking.participants_count,
            created_at: booking
                .created_at
                .to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }
}
