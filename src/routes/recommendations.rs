use axum::{extract::State, Json};
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    services::recommendations::{self, Recommendations},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    #[serde(default, alias = "viewingHistory")]
    pub viewing_history: Vec<String>,
}

/// Handler for recommendations endpoint
pub async fn recommend(
    State(state): State<AppState>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<Recommendations>> {
    let Some(client) = state.recommender.clone() else {
        return Err(AppError::ExternalApi(
            "Recommendation service is not configured".to_string(),
        ));
    };

    let recommendations = recommendations::get_recommendations(
        client.as_ref(),
        state.catalog.clone(),
        request.viewing_history,
    )
    .await?;
    Ok(Json(recommendations))
}
