use crate::entities::{anime, anime_episode};
use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn anime_repo(&self) -> repositories::anime::AnimeRepository {
        repositories::anime::AnimeRepository::new(self.conn.clone())
    }

    fn episode_repo(&self) -> repositories::episode::EpisodeRepository {
        repositories::episode::EpisodeRepository::new(self.conn.clone())
    }

    pub async fn find_anime_by_title(
        &self,
        fragment: &str,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<anime::Model>> {
        self.anime_repo().find_by_title(fragment, limit, offset).await
    }

    pub async fn get_anime(&self, id: i32) -> Result<Option<anime::Model>> {
        self.anime_repo().get(id).await
    }

    pub async fn upsert_anime(&self, model: anime::ActiveModel) -> Result<()> {
        self.anime_repo().upsert(model).await
    }

    pub async fn upsert_anime_titles(
        &self,
        id: i32,
        romaji: Option<String>,
        english: Option<String>,
        native: Option<String>,
    ) -> Result<()> {
        self.anime_repo()
            .upsert_titles(id, romaji, english, native)
            .await
    }

    pub async fn get_episodes_for_anime(
        &self,
        anime_id: i32,
    ) -> Result<Vec<anime_episode::Model>> {
        self.episode_repo().get_for_anime(anime_id).await
    }

    pub async fn count_episodes_for_animes(&self, anime_ids: &[i32]) -> Result<u64> {
        self.episode_repo().count_for_animes(anime_ids).await
    }

    pub async fn upsert_episodes(
        &self,
        episodes: Vec<anime_episode::ActiveModel>,
    ) -> Result<()> {
        self.episode_repo().upsert_many(episodes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::IntoActiveModel;

    async fn memory_store() -> Store {
        Store::with_pool_options("sqlite::memory:", 1, 1).await.unwrap()
    }

    fn sample_anime(id: i32, romaji: &str) -> anime::Model {
        anime::Model {
            id,
            title_romaji: Some(romaji.to_string()),
            title_english: None,
            title_native: None,
            description: Some("a description".to_string()),
            genres: Some("Action".to_string()),
            cover_image: None,
            banner_image: None,
            episodes: 12,
            updated_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    fn sample_episode(anime_id: i32, number: i32, title: &str) -> anime_episode::Model {
        anime_episode::Model {
            anime_id,
            episode_number: number,
            title_romaji: Some(title.to_string()),
            title_translated: title.to_string(),
            thumbnail_image: None,
        }
    }

    #[tokio::test]
    async fn test_upsert_anime_is_idempotent() {
        let store = memory_store().await;

        let mut first = sample_anime(100, "Frieren");
        store.upsert_anime(first.clone().into_active_model()).await.unwrap();

        first.description = Some("updated description".to_string());
        first.episodes = 28;
        store.upsert_anime(first.into_active_model()).await.unwrap();

        let rows = store.find_anime_by_title("Frieren", 10, 0).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].description.as_deref(), Some("updated description"));
        assert_eq!(rows[0].episodes, 28);
    }

    #[tokio::test]
    async fn test_fuzzy_find_matches_any_title_column() {
        let store = memory_store().await;

        let mut m = sample_anime(1, "Shingeki no Kyojin");
        m.title_english = Some("Attack on Titan".to_string());
        m.title_native = Some("進撃の巨人".to_string());
        store.upsert_anime(m.into_active_model()).await.unwrap();

        assert_eq!(store.find_anime_by_title("shingeki", 10, 0).await.unwrap().len(), 1);
        assert_eq!(store.find_anime_by_title("Titan", 10, 0).await.unwrap().len(), 1);
        assert_eq!(store.find_anime_by_title("巨人", 10, 0).await.unwrap().len(), 1);
        assert!(store.find_anime_by_title("Naruto", 10, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fuzzy_find_paginates_in_id_order() {
        let store = memory_store().await;

        for id in [3, 1, 2] {
            store
                .upsert_anime(sample_anime(id, &format!("Gundam {id}")).into_active_model())
                .await
                .unwrap();
        }

        let first_page = store.find_anime_by_title("Gundam", 2, 0).await.unwrap();
        assert_eq!(first_page.iter().map(|a| a.id).collect::<Vec<_>>(), vec![1, 2]);

        let second_page = store.find_anime_by_title("Gundam", 2, 2).await.unwrap();
        assert_eq!(second_page.iter().map(|a| a.id).collect::<Vec<_>>(), vec![3]);
    }

    #[tokio::test]
    async fn test_fuzzy_find_matches_like_wildcards_literally() {
        let store = memory_store().await;

        store
            .upsert_anime(sample_anime(1, "100% Pascal-sensei").into_active_model())
            .await
            .unwrap();
        store
            .upsert_anime(sample_anime(2, "100 Meters").into_active_model())
            .await
            .unwrap();

        // A literal percent sign must not act as a wildcard.
        let rows = store.find_anime_by_title("100%", 10, 0).await.unwrap();
        assert_eq!(rows.iter().map(|a| a.id).collect::<Vec<_>>(), vec![1]);

        assert_eq!(store.find_anime_by_title("100", 10, 0).await.unwrap().len(), 2);

        // Same for underscore as a single-character wildcard.
        assert!(store.find_anime_by_title("P_scal", 10, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_titles_upsert_preserves_full_record() {
        let store = memory_store().await;

        store
            .upsert_anime(sample_anime(7, "Monster").into_active_model())
            .await
            .unwrap();

        store
            .upsert_anime_titles(7, Some("Monster".to_string()), Some("Monster (EN)".to_string()), None)
            .await
            .unwrap();

        let row = store.get_anime(7).await.unwrap().unwrap();
        assert_eq!(row.title_english.as_deref(), Some("Monster (EN)"));
        // Title refresh must not wipe the enriched fields.
        assert_eq!(row.description.as_deref(), Some("a description"));
        assert_eq!(row.episodes, 12);
    }

    #[tokio::test]
    async fn test_episode_upsert_and_ordering() {
        let store = memory_store().await;

        store
            .upsert_anime(sample_anime(5, "Bleach").into_active_model())
            .await
            .unwrap();

        let episodes = vec![
            sample_episode(5, 2, "second").into_active_model(),
            sample_episode(5, 1, "first").into_active_model(),
        ];
        store.upsert_episodes(episodes).await.unwrap();

        // Conflicting row updates in place.
        store
            .upsert_episodes(vec![sample_episode(5, 1, "first (revised)").into_active_model()])
            .await
            .unwrap();

        let rows = store.get_episodes_for_anime(5).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].episode_number, 1);
        assert_eq!(rows[0].title_translated, "first (revised)");
        assert_eq!(rows[1].episode_number, 2);

        assert_eq!(store.count_episodes_for_animes(&[5]).await.unwrap(), 2);
        assert_eq!(store.count_episodes_for_animes(&[]).await.unwrap(), 0);
    }
}
