use std::sync::Arc;

use anyhow::Result;
use futures::future::{join_all, try_join_all};
use sea_orm::IntoActiveModel;

use crate::clients::{MetadataFetcher, Translator};
use crate::db::Store;
use crate::entities::{anime, anime_episode};
use crate::models::anime::AnimeDetail;
use crate::services::sanitize::strip_markup;

/// Stored episode title when translation plus sanitization leaves
/// nothing usable.
pub const NO_TITLE_FALLBACK: &str = "no title";

/// The title-only lookup is unpaginated; cap it so a one-letter query
/// cannot drag the whole table across the wire.
const TITLE_RESULT_CAP: u64 = 100;

/// One cached anime with its episode rows in episode-number order.
#[derive(Debug, Clone)]
pub struct AnimeWithEpisodes {
    pub anime: anime::Model,
    pub episodes: Vec<anime_episode::Model>,
}

/// Where the combined lookup got its answer from.
#[derive(Debug)]
pub enum SearchOutcome {
    /// Served from the cache tables.
    Cached(Vec<AnimeWithEpisodes>),
    /// Cache miss; fetched upstream, translated and persisted.
    Fetched(AnimeWithEpisodes),
}

/// Drop every character outside the Unicode letter/number/whitespace
/// classes. Non-Latin scripts pass through; SQL LIKE wildcards and
/// other punctuation do not.
#[must_use]
pub fn normalize_query(query: &str) -> String {
    query
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .trim()
        .to_string()
}

/// The cache-or-fetch decision flow behind the three search endpoints.
pub struct SearchService {
    store: Store,
    fetcher: Arc<dyn MetadataFetcher>,
    translator: Arc<dyn Translator>,
    target_lang: String,
}

impl SearchService {
    #[must_use]
    pub fn new(
        store: Store,
        fetcher: Arc<dyn MetadataFetcher>,
        translator: Arc<dyn Translator>,
        target_lang: impl Into<String>,
    ) -> Self {
        Self {
            store,
            fetcher,
            translator,
            target_lang: target_lang.into(),
        }
    }

    /// Cache-only title lookup. Never calls upstream; an empty result
    /// set is the caller's cue to use the upstream search instead.
    pub async fn search_titles(&self, query: &str) -> Result<Vec<anime::Model>> {
        let normalized = normalize_query(query);
        if normalized.is_empty() {
            return Ok(Vec::new());
        }

        self.store
            .find_anime_by_title(&normalized, TITLE_RESULT_CAP, 0)
            .await
    }

    /// Paginated upstream search. Always fetches; every returned match
    /// gets its id and titles upserted so later title lookups hit.
    pub async fn search_upstream(
        &self,
        query: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<crate::models::anime::AnimeSummary>> {
        let matches = self.fetcher.fetch_page(query, page, per_page).await?;

        for m in &matches {
            self.store
                .upsert_anime_titles(
                    m.id,
                    m.title.romaji.clone(),
                    m.title.english.clone(),
                    m.title.native.clone(),
                )
                .await?;
        }

        Ok(matches)
    }

    /// Combined detail lookup: cache first, upstream on a miss.
    /// `Ok(None)` means the upstream had no match either.
    pub async fn search_with_episodes(
        &self,
        query: &str,
        page: u64,
        limit: u64,
    ) -> Result<Option<SearchOutcome>> {
        let offset = page.saturating_sub(1) * limit;
        let matches = self
            .store
            .find_anime_by_title(query.trim(), limit, offset)
            .await?;

        if !matches.is_empty() {
            let ids: Vec<i32> = matches.iter().map(|a| a.id).collect();

            // Rows written by the titles-only upsert have no episodes.
            // Treating those as a hit would shadow the full record
            // forever, so they count as a miss and get backfilled.
            if self.store.count_episodes_for_animes(&ids).await? > 0 {
                let episode_lists = try_join_all(
                    matches.iter().map(|a| self.store.get_episodes_for_anime(a.id)),
                )
                .await?;

                let results = matches
                    .into_iter()
                    .zip(episode_lists)
                    .map(|(anime, episodes)| AnimeWithEpisodes { anime, episodes })
                    .collect();

                return Ok(Some(SearchOutcome::Cached(results)));
            }
        }

        let Some(detail) = self.fetcher.fetch_best_match(query).await? else {
            return Ok(None);
        };

        let result = self.populate_from_upstream(detail).await?;
        Ok(Some(SearchOutcome::Fetched(result)))
    }

    /// Translate, sanitize and persist one upstream record together
    /// with its streaming-episode listing.
    async fn populate_from_upstream(&self, detail: AnimeDetail) -> Result<AnimeWithEpisodes> {
        let raw_description = detail.description.clone().unwrap_or_default();
        let description = if raw_description.trim().is_empty() {
            String::new()
        } else {
            let translated = self
                .translator
                .translate(&raw_description, &self.target_lang)
                .await;
            strip_markup(&translated)
        };

        // Per-episode translations are independent; fire them all and
        // wait. join_all keeps listing order, so each result lands in
        // its own episode slot.
        let translated_titles = join_all(detail.streaming_episodes.iter().map(|ep| {
            let translator = Arc::clone(&self.translator);
            let lang = self.target_lang.clone();
            async move {
                let source = ep.title.as_deref().unwrap_or_default();
                if source.trim().is_empty() {
                    return NO_TITLE_FALLBACK.to_string();
                }
                let clean = strip_markup(&translator.translate(source, &lang).await);
                if clean.is_empty() {
                    NO_TITLE_FALLBACK.to_string()
                } else {
                    clean
                }
            }
        }))
        .await;

        let anime = anime::Model {
            id: detail.id,
            title_romaji: detail.title.romaji,
            title_english: detail.title.english,
            title_native: detail.title.native,
            description: Some(description),
            genres: Some(detail.genres.join(", ")),
            cover_image: detail.cover_image,
            banner_image: detail.banner_image,
            episodes: detail.episode_count.unwrap_or(0),
            updated_at: chrono::Utc::now().to_rfc3339(),
        };

        let episodes: Vec<anime_episode::Model> = detail
            .streaming_episodes
            .iter()
            .zip(translated_titles)
            .enumerate()
            .map(|(idx, (ep, title_translated))| anime_episode::Model {
                anime_id: detail.id,
                episode_number: idx as i32 + 1,
                title_romaji: ep.title.clone(),
                title_translated,
                thumbnail_image: ep.thumbnail.clone(),
            })
            .collect();

        // Anime row first, then the episode batch. No transaction: the
        // flow is idempotent and a later miss re-fetches both.
        self.store
            .upsert_anime(anime.clone().into_active_model())
            .await?;
        self.store
            .upsert_episodes(
                episodes
                    .iter()
                    .map(|e| e.clone().into_active_model())
                    .collect(),
            )
            .await?;

        Ok(AnimeWithEpisodes { anime, episodes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::deepl::TRANSLATION_FALLBACK;
    use crate::models::anime::{AnimeSummary, AnimeTitle, StreamingEpisode};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockFetcher {
        detail: Option<AnimeDetail>,
        page: Vec<AnimeSummary>,
        calls: AtomicUsize,
    }

    impl MockFetcher {
        fn with_detail(detail: Option<AnimeDetail>) -> Self {
            Self {
                detail,
                page: Vec::new(),
                calls: AtomicUsize::new(0),
            }
        }

        fn with_page(page: Vec<AnimeSummary>) -> Self {
            Self {
                detail: None,
                page,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MetadataFetcher for MockFetcher {
        async fn fetch_best_match(&self, _query: &str) -> Result<Option<AnimeDetail>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.detail.clone())
        }

        async fn fetch_page(
            &self,
            _query: &str,
            _page: u32,
            _per_page: u32,
        ) -> Result<Vec<AnimeSummary>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.page.clone())
        }
    }

    /// Echoes input with a marker, or degrades to the fallback string
    /// like the real adapter does on failure.
    struct MockTranslator {
        failing: bool,
    }

    #[async_trait]
    impl Translator for MockTranslator {
        async fn translate(&self, text: &str, _target_lang: &str) -> String {
            if self.failing {
                TRANSLATION_FALLBACK.to_string()
            } else if text.is_empty() {
                String::new()
            } else {
                format!("{text} [en]")
            }
        }
    }

    fn naruto_detail(episodes: usize) -> AnimeDetail {
        AnimeDetail {
            id: 20,
            title: AnimeTitle {
                romaji: Some("Naruto".to_string()),
                english: Some("Naruto".to_string()),
                native: Some("ナルト".to_string()),
            },
            description: Some("<i>A ninja story.</i>".to_string()),
            genres: vec!["Action".to_string(), "Adventure".to_string()],
            episode_count: Some(220),
            cover_image: Some("https://img.example/cover.png".to_string()),
            banner_image: None,
            streaming_episodes: (1..=episodes)
                .map(|n| StreamingEpisode {
                    title: Some(format!("Episode {n} - Enter the ninja")),
                    thumbnail: Some(format!("https://img.example/ep{n}.png")),
                })
                .collect(),
        }
    }

    // A single pooled connection keeps every query on the same
    // in-memory database.
    async fn memory_store() -> Store {
        Store::with_pool_options("sqlite::memory:", 1, 1).await.unwrap()
    }

    async fn service_with(
        fetcher: MockFetcher,
        translator: MockTranslator,
    ) -> (SearchService, Store) {
        let store = memory_store().await;
        let service = SearchService::new(
            store.clone(),
            Arc::new(fetcher),
            Arc::new(translator),
            "EN",
        );
        (service, store)
    }

    #[test]
    fn test_normalize_query() {
        assert_eq!(normalize_query("  Naruto!  "), "Naruto");
        assert_eq!(normalize_query("Re:Zero"), "ReZero");
        assert_eq!(normalize_query("進撃の巨人"), "進撃の巨人");
        assert_eq!(normalize_query("%_'\""), "");
        assert_eq!(normalize_query("Dr. Stone 2"), "Dr Stone 2");
    }

    #[tokio::test]
    async fn test_miss_populates_and_numbers_episodes() {
        let (service, store) = service_with(
            MockFetcher::with_detail(Some(naruto_detail(2))),
            MockTranslator { failing: false },
        )
        .await;

        let outcome = service
            .search_with_episodes("Naruto", 1, 10)
            .await
            .unwrap()
            .expect("upstream match");

        let SearchOutcome::Fetched(result) = outcome else {
            panic!("expected an upstream fetch on a cold cache");
        };

        assert_eq!(result.anime.id, 20);
        assert_eq!(result.anime.description.as_deref(), Some("A ninja story. [en]"));
        assert_eq!(result.anime.genres.as_deref(), Some("Action, Adventure"));
        assert_eq!(result.episodes.len(), 2);
        assert_eq!(
            result.episodes.iter().map(|e| e.episode_number).collect::<Vec<_>>(),
            vec![1, 2]
        );

        // Persisted, not just returned.
        let stored = store.get_anime(20).await.unwrap().expect("row persisted");
        assert_eq!(stored.episodes, 220);
        let stored_eps = store.get_episodes_for_anime(20).await.unwrap();
        assert_eq!(stored_eps.len(), 2);
        assert_eq!(stored_eps[0].title_translated, "Episode 1 - Enter the ninja [en]");
    }

    #[tokio::test]
    async fn test_hit_serves_from_cache_without_upstream_call() {
        let (service, _store) = service_with(
            MockFetcher::with_detail(Some(naruto_detail(2))),
            MockTranslator { failing: false },
        )
        .await;

        // First call populates, second must be served from the cache.
        service.search_with_episodes("Naruto", 1, 10).await.unwrap();

        let outcome = service
            .search_with_episodes("Naruto", 1, 10)
            .await
            .unwrap()
            .expect("cached match");

        let SearchOutcome::Cached(results) = outcome else {
            panic!("expected a cache hit on the second lookup");
        };
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].episodes.len(), 2);
        assert_eq!(
            results[0].episodes.iter().map(|e| e.episode_number).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[tokio::test]
    async fn test_title_only_rows_are_backfilled_not_hit() {
        let (service, store) = service_with(
            MockFetcher::with_detail(Some(naruto_detail(1))),
            MockTranslator { failing: false },
        )
        .await;

        // Simulate the lightweight upsert from the paginated search:
        // titles only, no description, no episodes.
        store
            .upsert_anime_titles(20, Some("Naruto".to_string()), None, None)
            .await
            .unwrap();

        let outcome = service
            .search_with_episodes("Naruto", 1, 10)
            .await
            .unwrap()
            .expect("match");

        assert!(
            matches!(outcome, SearchOutcome::Fetched(_)),
            "a title-only row with zero episodes must trigger a backfill"
        );
        let stored = store.get_anime(20).await.unwrap().unwrap();
        assert!(stored.description.is_some());
        assert_eq!(store.get_episodes_for_anime(20).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upstream_miss_is_none() {
        let (service, _store) = service_with(
            MockFetcher::with_detail(None),
            MockTranslator { failing: false },
        )
        .await;

        let outcome = service.search_with_episodes("does not exist", 1, 10).await.unwrap();
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn test_translation_failure_degrades_to_fallback() {
        let (service, store) = service_with(
            MockFetcher::with_detail(Some(naruto_detail(1))),
            MockTranslator { failing: true },
        )
        .await;

        let outcome = service
            .search_with_episodes("Naruto", 1, 10)
            .await
            .unwrap()
            .expect("match");

        let SearchOutcome::Fetched(result) = outcome else {
            panic!("expected fetch");
        };
        assert_eq!(result.anime.description.as_deref(), Some(TRANSLATION_FALLBACK));

        let stored = store.get_anime(20).await.unwrap().unwrap();
        assert_eq!(stored.description.as_deref(), Some(TRANSLATION_FALLBACK));
    }

    #[tokio::test]
    async fn test_untitled_episode_gets_no_title_marker() {
        let mut detail = naruto_detail(1);
        detail.streaming_episodes[0].title = None;

        let (service, _store) = service_with(
            MockFetcher::with_detail(Some(detail)),
            MockTranslator { failing: false },
        )
        .await;

        let outcome = service
            .search_with_episodes("Naruto", 1, 10)
            .await
            .unwrap()
            .expect("match");

        let SearchOutcome::Fetched(result) = outcome else {
            panic!("expected fetch");
        };
        assert_eq!(result.episodes[0].title_translated, NO_TITLE_FALLBACK);
        assert_eq!(result.episodes[0].title_romaji, None);
    }

    #[tokio::test]
    async fn test_title_lookup_never_calls_upstream() {
        let fetcher = MockFetcher::with_detail(Some(naruto_detail(1)));
        let store = memory_store().await;
        let fetcher = Arc::new(fetcher);
        let service = SearchService::new(
            store.clone(),
            fetcher.clone(),
            Arc::new(MockTranslator { failing: false }),
            "EN",
        );

        store
            .upsert_anime_titles(20, Some("Naruto".to_string()), None, None)
            .await
            .unwrap();

        let results = service.search_titles("naru").await.unwrap();
        assert_eq!(results.len(), 1);

        let empty = service.search_titles("nothing cached").await.unwrap();
        assert!(empty.is_empty());

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_upstream_search_upserts_titles() {
        let summaries = vec![
            AnimeSummary {
                id: 1,
                title: AnimeTitle {
                    romaji: Some("One".to_string()),
                    english: None,
                    native: None,
                },
            },
            AnimeSummary {
                id: 2,
                title: AnimeTitle {
                    romaji: Some("Two".to_string()),
                    english: Some("Two (EN)".to_string()),
                    native: None,
                },
            },
        ];

        let (service, store) = service_with(
            MockFetcher::with_page(summaries),
            MockTranslator { failing: false },
        )
        .await;

        let results = service.search_upstream("o", 1, 10).await.unwrap();
        assert_eq!(results.len(), 2);

        let row = store.get_anime(2).await.unwrap().expect("titles upserted");
        assert_eq!(row.title_english.as_deref(), Some("Two (EN)"));
        assert_eq!(row.description, None);
        assert_eq!(row.episodes, 0);
    }
}
