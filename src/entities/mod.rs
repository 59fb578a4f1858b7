pub mod prelude;

pub mod anime;
pub mod anime_episode;
