use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{normalize_top_limit, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct TopShowsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct TopShowItem {
    id: i64,
    name: String,
    language: Option<String>,
    genres: Vec<String>,
    premiered: Option<NaiveDate>,
    rating_average: Option<f64>,
    processed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct MultiCharacterActorItem {
    person_id: i64,
    person_name: Option<String>,
    character_count: i64,
}

pub(super) async fn list_top_shows(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    query: Result<Query<TopShowsQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<TopShowItem>>>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::validation(req_id.clone(), e.body_text()))?;
    let rows = showpipe_db::list_top_shows(&state.pool, normalize_top_limit(query.limit))
        .await
        .map_err(|e| ApiError::internal(req_id.clone(), "failed to fetch top shows", &e))?;

    let data = rows
        .into_iter()
        .map(|row| TopShowItem {
            id: row.id,
            name: row.name,
            language: row.language,
            genres: row
                .genres
                .split(',')
                .filter(|g| !g.is_empty())
                .map(str::to_owned)
                .collect(),
            premiered: row.premiered,
            rating_average: row.rating_average,
            processed_at: row.processed_at,
        })
        .collect();

    Ok(ApiResponse::new(data, req_id))
}

pub(super) async fn list_multi_character_actors(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<MultiCharacterActorItem>>>, ApiError> {
    let rows = showpipe_db::list_multi_character_actors(&state.pool)
        .await
        .map_err(|e| {
            ApiError::internal(req_id.clone(), "failed to fetch multi-character actors", &e)
        })?;

    let data = rows
        .into_iter()
        .map(|row| MultiCharacterActorItem {
            person_id: row.person_id,
            person_name: row.person_name,
            character_count: row.character_count,
        })
        .collect();

    Ok(ApiResponse::new(data, req_id))
}
