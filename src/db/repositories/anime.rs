use crate::entities::{anime, prelude::*};
use anyhow::Result;
use sea_orm::sea_query::{LikeExpr, OnConflict};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Set,
};

/// Escape LIKE metacharacters so user input always matches literally.
fn escape_like(fragment: &str) -> String {
    fragment
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Repository for cached anime rows.
pub struct AnimeRepository {
    conn: DatabaseConnection,
}

impl AnimeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Case-insensitive substring match across the three title columns,
    /// ordered by id for stable pagination. Wildcards in the fragment
    /// are matched literally.
    pub async fn find_by_title(
        &self,
        fragment: &str,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<anime::Model>> {
        let pattern = format!("%{}%", escape_like(fragment));
        let rows = Anime::find()
            .filter(
                Condition::any()
                    .add(anime::Column::TitleRomaji.like(LikeExpr::new(&pattern).escape('\\')))
                    .add(anime::Column::TitleEnglish.like(LikeExpr::new(&pattern).escape('\\')))
                    .add(anime::Column::TitleNative.like(LikeExpr::new(&pattern).escape('\\'))),
            )
            .order_by_asc(anime::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(&self.conn)
            .await?;

        Ok(rows)
    }

    pub async fn get(&self, id: i32) -> Result<Option<anime::Model>> {
        Ok(Anime::find_by_id(id).one(&self.conn).await?)
    }

    /// Insert-or-update on the upstream id. Re-fetching the same id must
    /// never duplicate the row.
    pub async fn upsert(&self, model: anime::ActiveModel) -> Result<()> {
        Anime::insert(model)
            .on_conflict(
                OnConflict::column(anime::Column::Id)
                    .update_columns([
                        anime::Column::TitleRomaji,
                        anime::Column::TitleEnglish,
                        anime::Column::TitleNative,
                        anime::Column::Description,
                        anime::Column::Genres,
                        anime::Column::CoverImage,
                        anime::Column::BannerImage,
                        anime::Column::Episodes,
                        anime::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    /// Lightweight upsert used by the paginated upstream search: touches
    /// only the title columns so an existing full record keeps its
    /// description, images and episode count.
    pub async fn upsert_titles(
        &self,
        id: i32,
        romaji: Option<String>,
        english: Option<String>,
        native: Option<String>,
    ) -> Result<()> {
        let model = anime::ActiveModel {
            id: Set(id),
            title_romaji: Set(romaji),
            title_english: Set(english),
            title_native: Set(native),
            description: Set(None),
            genres: Set(None),
            cover_image: Set(None),
            banner_image: Set(None),
            episodes: Set(0),
            updated_at: Set(chrono::Utc::now().to_rfc3339()),
        };

        Anime::insert(model)
            .on_conflict(
                OnConflict::column(anime::Column::Id)
                    .update_columns([
                        anime::Column::TitleRomaji,
                        anime::Column::TitleEnglish,
                        anime::Column::TitleNative,
                        anime::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.conn)
            .await?;
        Ok(())
    }
}
