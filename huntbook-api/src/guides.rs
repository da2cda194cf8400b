use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::error::AppError;
use crate::resources::{Envelope, GuideResource};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GuideFilter {
    pub min_experience: Option<String>,
}

impl GuideFilter {
    /// A present but non-numeric value counts as zero.
    pub fn min_experience(&self) -> Option<i32> {
        self.min_experience
            .as_deref()
            .map(|raw| raw.trim().parse().unwrap_or(0))
    }
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/guides", get(list_guides))
}

/// GET /guides?min_experience=N
/// Active guides, most experienced first.
async fn list_guides(
    State(state): State<AppState>,
    Query(filter): Query<GuideFilter>,
) -> Result<Json<Envelope<Vec<GuideResource>>>, AppError> {
    let guides = state.guides.list_active(filter.min_experience()).await?;

    Ok(Json(Envelope::new(
        guides.into_iter().map(GuideResource::from).collect(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_experience_parsing() {
        let filter = |raw: Option<&str>| GuideFilter {
            min_experience: raw.map(str::to_string),
        };
        assert_eq!(filter(None).min_experience(), None);
        assert_eq!(filter(Some("5")).min_experience(), Some(5));
        assert_eq!(filter(Some("lots")).min_experience(), Some(0));
        assert_eq!(filter(Some("")).min_experience(), Some(0));
    }
}
