pub mod anilist;
pub mod deepl;

pub use anilist::{AnilistClient, MetadataFetcher};
pub use deepl::{DeepLClient, Translator};
