use serde::{Deserialize, Serialize};

use crate::entities::{anime, anime_episode};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TitleDto {
    pub romaji: Option<String>,
    pub english: Option<String>,
    pub native: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnimeDto {
    pub id: i32,
    pub title: TitleDto,
    pub description: Option<String>,
    pub genres: Option<String>,
    pub cover_image: Option<String>,
    pub banner_image: Option<String>,
    pub episodes: i32,
}

impl From<anime::Model> for AnimeDto {
    fn from(m: anime::Model) -> Self {
        Self {
            id: m.id,
            title: TitleDto {
                romaji: m.title_romaji,
                english: m.title_english,
                native: m.title_native,
            },
            description: m.description,
            genres: m.genres,
            cover_image: m.cover_image,
            banner_image: m.banner_image,
            episodes: m.episodes,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EpisodeDto {
    pub episode_number: i32,
    pub title_romaji: Option<String>,
    pub title_translated: String,
    pub thumbnail_image: Option<String>,
}

impl From<anime_episode::Model> for EpisodeDto {
    fn from(m: anime_episode::Model) -> Self {
        Self {
            episode_number: m.episode_number,
            title_romaji: m.title_romaji,
            title_translated: m.title_translated,
            thumbnail_image: m.thumbnail_image,
        }
    }
}

/// Lightweight match from the paginated upstream search.
#[derive(Debug, Serialize, Deserialize)]
pub struct AnimeSummaryDto {
    pub id: i32,
    pub title: TitleDto,
}

/// Payload of the title-only cache lookup.
#[derive(Debug, Serialize, Deserialize)]
pub struct TitleSearchData {
    pub source: String,
    pub results: Vec<AnimeDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Payload of the upstream paginated search.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpstreamSearchData {
    pub source: String,
    pub results: Vec<AnimeSummaryDto>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnimeWithEpisodesDto {
    pub anime: AnimeDto,
    pub episodes: Vec<EpisodeDto>,
}

/// Payload of the combined detail lookup.
#[derive(Debug, Serialize, Deserialize)]
pub struct CombinedSearchData {
    pub source: String,
    pub results: Vec<AnimeWithEpisodesDto>,
    pub page: u64,
    pub limit: u64,
}
