use crate::models::anime::{AnimeDetail, AnimeSummary, AnimeTitle, StreamingEpisode};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

pub const ANILIST_API: &str = "https://graphql.anilist.co";

/// Upstream media-search contract. The orchestrator only sees this
/// trait so tests can swap the GraphQL client out.
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    /// Single best match with full detail including the streaming
    /// episode listing. `Ok(None)` when upstream has no match.
    async fn fetch_best_match(&self, query: &str) -> Result<Option<AnimeDetail>>;

    /// One page of lightweight matches (ids and titles only).
    async fn fetch_page(&self, query: &str, page: u32, per_page: u32)
    -> Result<Vec<AnimeSummary>>;
}

#[derive(Serialize)]
struct GraphQLRequest<'a, V: Serialize> {
    query: &'a str,
    variables: V,
}

#[derive(Deserialize)]
struct Title {
    romaji: Option<String>,
    english: Option<String>,
    native: Option<String>,
}

impl From<Title> for AnimeTitle {
    fn from(t: Title) -> Self {
        Self {
            romaji: t.romaji,
            english: t.english,
            native: t.native,
        }
    }
}

#[derive(Deserialize)]
struct CoverImage {
    #[serde(rename = "extraLarge")]
    extra_large: Option<String>,
    large: Option<String>,
}

#[derive(Deserialize)]
struct MediaEpisode {
    title: Option<String>,
    thumbnail: Option<String>,
}

#[derive(Deserialize)]
struct Media {
    id: i32,
    title: Title,
    description: Option<String>,
    genres: Option<Vec<String>>,
    episodes: Option<i32>,
    #[serde(rename = "coverImage")]
    cover_image: Option<CoverImage>,
    #[serde(rename = "bannerImage")]
    banner_image: Option<String>,
    #[serde(rename = "streamingEpisodes", default)]
    streaming_episodes: Vec<MediaEpisode>,
}

#[derive(Deserialize)]
struct PageMedia {
    id: i32,
    title: Title,
}

#[derive(Clone)]
pub struct AnilistClient {
    client: Client,
    api_url: String,
}

impl AnilistClient {
    #[must_use]
    pub fn with_shared_client(client: Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
        }
    }

    fn map_media(m: Media) -> AnimeDetail {
        AnimeDetail {
            id: m.id,
            title: m.title.into(),
            description: m.description,
            genres: m.genres.unwrap_or_default(),
            episode_count: m.episodes,
            cover_image: m.cover_image.and_then(|c| c.extra_large.or(c.large)),
            banner_image: m.banner_image,
            streaming_episodes: m
                .streaming_episodes
                .into_iter()
                .map(|e| StreamingEpisode {
                    title: e.title,
                    thumbnail: e.thumbnail,
                })
                .collect(),
        }
    }
}

#[async_trait]
impl MetadataFetcher for AnilistClient {
    async fn fetch_best_match(&self, query: &str) -> Result<Option<AnimeDetail>> {
        let gql_query = r#"
            query ($search: String) {
                Media(search: $search, type: ANIME) {
                    id
                    title { romaji english native }
                    description(asHtml: false)
                    genres
                    episodes
                    coverImage { extraLarge large }
                    bannerImage
                    streamingEpisodes { title thumbnail }
                }
            }
        "#;

        #[derive(Serialize)]
        struct SearchVar<'a> {
            search: &'a str,
        }

        #[derive(Deserialize)]
        struct MediaResponse {
            data: Option<MediaWrapper>,
        }

        #[derive(Deserialize)]
        struct MediaWrapper {
            #[serde(rename = "Media")]
            media: Option<Media>,
        }

        let request_body = GraphQLRequest {
            query: gql_query,
            variables: SearchVar { search: query },
        };

        let response = self
            .client
            .post(&self.api_url)
            .json(&request_body)
            .send()
            .await?;

        // AniList answers a missing Media lookup with a 404 and a null
        // data payload rather than an empty page.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response: MediaResponse = response.error_for_status()?.json().await?;

        Ok(response
            .data
            .and_then(|d| d.media)
            .map(Self::map_media))
    }

    async fn fetch_page(
        &self,
        query: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<AnimeSummary>> {
        let gql_query = r#"
            query ($search: String, $page: Int, $perPage: Int) {
                Page(page: $page, perPage: $perPage) {
                    media(search: $search, type: ANIME) {
                        id
                        title { romaji english native }
                    }
                }
            }
        "#;

        #[derive(Serialize)]
        struct PageVars<'a> {
            search: &'a str,
            page: u32,
            #[serde(rename = "perPage")]
            per_page: u32,
        }

        #[derive(Deserialize)]
        struct PageResponse {
            data: Option<PageWrapper>,
        }

        #[derive(Deserialize)]
        struct PageWrapper {
            #[serde(rename = "Page")]
            page: Page,
        }

        #[derive(Deserialize)]
        struct Page {
            media: Vec<PageMedia>,
        }

        let request_body = GraphQLRequest {
            query: gql_query,
            variables: PageVars {
                search: query,
                page,
                per_page,
            },
        };

        let response: PageResponse = self
            .client
            .post(&self.api_url)
            .json(&request_body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let matches = response
            .data
            .map(|d| {
                d.page
                    .media
                    .into_iter()
                    .map(|m| AnimeSummary {
                        id: m.id,
                        title: m.title.into(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(matches)
    }
}
