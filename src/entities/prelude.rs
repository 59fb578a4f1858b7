pub use super::anime::Entity as Anime;
pub use super::anime_episode::Entity as AnimeEpisode;
