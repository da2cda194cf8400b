use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use huntbook_core::{BookingError, StoreError};
use serde_json::json;

use crate::validation::ValidationErrors;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{}", .0.summary())]
    Validation(ValidationErrors),
    #[error(transparent)]
    Booking(#[from] BookingError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "message": errors.summary(),
                    "errors": errors.to_json(),
                }),
            ),
            AppError::Booking(err) => match err.field() {
                Some(field) => {
                    let status = match err {
                        BookingError::GuideUnavailable => StatusCode::CONFLICT,
                        _ => StatusCode::UNPROCESSABLE_ENTITY,
                    };
                    let message = err.to_string();
                    (
                        status,
                        json!({
                            "message": message.clone(),
                            "errors": { field: [message] },
                        }),
                    )
                }
                None => {
                    tracing::error!(error = ?err, "Booking creation failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        json!({ "message": BookingError::Internal.to_string() }),
                    )
                }
            },
            AppError::Store(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "message": "Server Error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
