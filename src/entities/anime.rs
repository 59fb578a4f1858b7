use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Cached anime record. The id is the upstream catalog id and is never
/// generated locally; re-fetching the same id updates the row in place.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "animes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub title_romaji: Option<String>,
    pub title_english: Option<String>,
    pub title_native: Option<String>,
    pub description: Option<String>,
    pub genres: Option<String>, // comma-joined list
    pub cover_image: Option<String>,
    pub banner_image: Option<String>,
    pub episodes: i32,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::anime_episode::Entity")]
    AnimeEpisode,
}

impl Related<super::anime_episode::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AnimeEpisode.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
