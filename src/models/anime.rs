/// Titles in up to three scripts, all optional upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnimeTitle {
    pub romaji: Option<String>,
    pub english: Option<String>,
    pub native: Option<String>,
}

/// Lightweight match returned by the paginated upstream search.
#[derive(Debug, Clone)]
pub struct AnimeSummary {
    pub id: i32,
    pub title: AnimeTitle,
}

/// Full upstream record used to populate the cache on a miss.
#[derive(Debug, Clone)]
pub struct AnimeDetail {
    pub id: i32,
    pub title: AnimeTitle,
    pub description: Option<String>,
    pub genres: Vec<String>,
    pub episode_count: Option<i32>,
    pub cover_image: Option<String>,
    pub banner_image: Option<String>,
    pub streaming_episodes: Vec<StreamingEpisode>,
}

/// Streaming-episode entry as listed upstream. Carries no episode
/// number; numbering is assigned by listing position.
#[derive(Debug, Clone)]
pub struct StreamingEpisode {
    pub title: Option<String>,
    pub thumbnail: Option<String>,
}
