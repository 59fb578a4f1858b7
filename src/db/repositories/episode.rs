use crate::entities::{anime_episode, prelude::*};
use anyhow::Result;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};

/// Repository for cached episode rows.
pub struct EpisodeRepository {
    conn: DatabaseConnection,
}

impl EpisodeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_for_anime(&self, anime_id: i32) -> Result<Vec<anime_episode::Model>> {
        let rows = AnimeEpisode::find()
            .filter(anime_episode::Column::AnimeId.eq(anime_id))
            .order_by_asc(anime_episode::Column::EpisodeNumber)
            .all(&self.conn)
            .await?;

        Ok(rows)
    }

    pub async fn count_for_animes(&self, anime_ids: &[i32]) -> Result<u64> {
        if anime_ids.is_empty() {
            return Ok(0);
        }

        let count = AnimeEpisode::find()
            .filter(anime_episode::Column::AnimeId.is_in(anime_ids.iter().copied()))
            .count(&self.conn)
            .await?;

        Ok(count)
    }

    /// Batch insert-or-update keyed on (anime_id, episode_number).
    pub async fn upsert_many(&self, episodes: Vec<anime_episode::ActiveModel>) -> Result<()> {
        if episodes.is_empty() {
            return Ok(());
        }

        // SQLite caps bind parameters per statement; 100 rows of 5
        // columns stays well under the limit.
        for chunk in episodes.chunks(100) {
            AnimeEpisode::insert_many(chunk.to_vec())
                .on_conflict(
                    OnConflict::columns([
                        anime_episode::Column::AnimeId,
                        anime_episode::Column::EpisodeNumber,
                    ])
                    .update_columns([
                        anime_episode::Column::TitleRomaji,
                        anime_episode::Column::TitleTranslated,
                        anime_episode::Column::ThumbnailImage,
                    ])
                    .to_owned(),
                )
                .exec(&self.conn)
                .await?;
        }

        Ok(())
    }
}
