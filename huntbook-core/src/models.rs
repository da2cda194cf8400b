use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A tour operator who can be booked for at most one hunt per calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guide {
    pub id: i64,
    pub name: String,
    pub experience_years: i32,
    pub is_active: bool,
}

/// A persisted reservation of one guide on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub tour_name: String,
    pub hunter_name: String,
    pub guide_id: i64,
    pub date: NaiveDate,
    pub participants_count: i32,
    pub created_at: DateTime<Utc>,
}

/// Shape-validated booking input, not yet checked against guide state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBooking {
    pub tour_name: String,
    pub hunter_name: String,
    pub guide_id: i64,
    pub date: NaiveDate,
    pub participants_count: i32,
}

/// A committed booking joined with the guide it was locked against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmedBooking {
    pub booking: Booking,
    pub guide: Guide,
}

impl NewBooking {
    /// Materialise the row the storage layer would write.
    pub fn into_booking(self, id: i64, created_at: DateTime<Utc>) -> Booking {
        Booking {
            id,
            tour_name: self.tour_name,
            hunter_name: self.hunter_name,
            guide_id: self.guide_id,
            date: self.date,
            participants_count: self.participants_count,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_booking_deserialization() {
        let json = r#"
            {
                "tour_name": "Elk Mountain Hunt",
                "hunter_name": "Jane Doe",
                "guide_id": 3,
                "date": "2030-09-14",
                "participants_count": 4
            }
        "#;
        let input: NewBooking = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(input.guide_id, 3);
        assert_eq!(input.date, NaiveDate::from_ymd_opt(2030, 9, 14).unwrap());

        let created_at = Utc::now();
        let booking = input.into_booking(7, created_at);
        assert_eq!(booking.id, 7);
        assert_eq!(booking.tour_name, "Elk Mountain Hunt");
        assert_eq!(booking.created_at, created_at);
    }
}
