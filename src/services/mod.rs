pub mod sanitize;
pub mod search;

pub use search::SearchService;
