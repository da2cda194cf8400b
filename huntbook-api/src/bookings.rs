use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde_json::Value;

use crate::error::AppError;
use crate::resources::{BookingResource, Envelope};
use crate::state::AppState;
use crate::validation::validate_booking;

pub fn routes() -> Router<AppState> {
    Router::new().route("/bookings", post(create_booking))
}

/// POST /bookings
/// Validate the request, then book the guide through the coordinator.
async fn create_booking(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Envelope<BookingResource>>), AppError> {
    // Malformed JSON is validated as an empty object.
    let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    let today = Utc::now().date_naive();
    let input = validate_booking(&payload, today, state.guides.as_ref()).await?;

    let confirmed = state.coordinator.create_booking(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::new(BookingResource::from(confirmed))),
    ))
}
