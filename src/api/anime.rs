use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{
    AnimeDto, AnimeSummaryDto, AnimeWithEpisodesDto, ApiError, ApiResponse, CombinedSearchData,
    EpisodeDto, TitleDto, TitleSearchData, UpstreamSearchData,
};
use crate::api::validation::{validate_limit, validate_search_query};
use crate::services::search::SearchOutcome;
use crate::state::AppState;

const SOURCE_DATABASE: &str = "database";
const SOURCE_API: &str = "api";

/// Pick the right status for a search-flow failure: transport errors
/// from the upstream call are a bad gateway, storage errors are a
/// database error, the rest stays internal.
fn map_search_err(e: anyhow::Error) -> ApiError {
    if e.downcast_ref::<reqwest::Error>().is_some() {
        ApiError::anilist_error(e.to_string())
    } else if e.downcast_ref::<sea_orm::DbErr>().is_some() {
        ApiError::DatabaseError(e.to_string())
    } else {
        ApiError::internal(e.to_string())
    }
}

#[derive(Deserialize)]
pub struct TitleQuery {
    #[serde(default)]
    pub query: String,
}

#[derive(Deserialize)]
pub struct UpstreamQuery {
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_page_u32")]
    pub page: u32,
    #[serde(rename = "perPage", default = "default_per_page")]
    pub per_page: u32,
}

#[derive(Deserialize)]
pub struct CombinedQuery {
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_page_u64")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

const fn default_page_u32() -> u32 {
    1
}

const fn default_per_page() -> u32 {
    10
}

const fn default_page_u64() -> u64 {
    1
}

const fn default_limit() -> u64 {
    10
}

/// `GET /anime/search-titles` — cache-only lookup across the three
/// title columns. Deliberately never falls back to the upstream
/// service; an empty result carries a pointer to `/anime/search-api`.
pub async fn search_titles(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TitleQuery>,
) -> Result<Json<ApiResponse<TitleSearchData>>, ApiError> {
    let query = validate_search_query(&params.query)?;

    let rows = state
        .search_service
        .search_titles(query)
        .await
        .map_err(map_search_err)?;

    let message = if rows.is_empty() {
        Some(
            "No cached titles matched. Use /anime/search-api to search the upstream catalog."
                .to_string(),
        )
    } else {
        None
    };

    Ok(Json(ApiResponse::success(TitleSearchData {
        source: SOURCE_DATABASE.to_string(),
        results: rows.into_iter().map(AnimeDto::from).collect(),
        message,
    })))
}

/// `GET /anime/search-api` — paginated upstream search. Ids and titles
/// of every match are cached on the way out.
pub async fn search_api(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UpstreamQuery>,
) -> Result<Json<ApiResponse<UpstreamSearchData>>, ApiError> {
    let query = validate_search_query(&params.query)?;
    let page = params.page.max(1);

    let matches = state
        .search_service
        .search_upstream(query, page, params.per_page)
        .await
        .map_err(map_search_err)?;

    if matches.is_empty() {
        return Err(ApiError::not_found(format!(
            "No anime found for '{}' on page {}",
            query, page
        )));
    }

    Ok(Json(ApiResponse::success(UpstreamSearchData {
        source: SOURCE_API.to_string(),
        results: matches
            .into_iter()
            .map(|m| AnimeSummaryDto {
                id: m.id,
                title: TitleDto {
                    romaji: m.title.romaji,
                    english: m.title.english,
                    native: m.title.native,
                },
            })
            .collect(),
    })))
}

/// `GET /anime/name` — the primary cache-or-fetch flow with episodes.
pub async fn search_name(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CombinedQuery>,
) -> Result<Json<ApiResponse<CombinedSearchData>>, ApiError> {
    let query = validate_search_query(&params.query)?;
    let page = params.page.max(1);
    let limit = validate_limit(params.limit)?;

    let outcome = state
        .search_service
        .search_with_episodes(query, page, limit)
        .await
        .map_err(map_search_err)?
        .ok_or_else(|| ApiError::not_found(format!("No anime found for '{}'", query)))?;

    let (source, results) = match outcome {
        SearchOutcome::Cached(entries) => (
            SOURCE_DATABASE,
            entries.into_iter().map(to_dto).collect::<Vec<_>>(),
        ),
        SearchOutcome::Fetched(entry) => (SOURCE_API, vec![to_dto(entry)]),
    };

    Ok(Json(ApiResponse::success(CombinedSearchData {
        source: source.to_string(),
        results,
        page,
        limit,
    })))
}

fn to_dto(entry: crate::services::search::AnimeWithEpisodes) -> AnimeWithEpisodesDto {
    AnimeWithEpisodesDto {
        anime: AnimeDto::from(entry.anime),
        episodes: entry.episodes.into_iter().map(EpisodeDto::from).collect(),
    }
}
