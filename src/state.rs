use std::sync::Arc;

use crate::clients::{AnilistClient, DeepLClient, MetadataFetcher, Translator};
use crate::config::Config;
use crate::db::Store;
use crate::services::SearchService;

/// Build a shared HTTP client with one timeout policy for every
/// outbound call. Reusing it across clients enables connection pooling
/// and avoids socket exhaustion.
fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent(concat!("anicache/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    pub store: Store,

    pub search_service: Arc<SearchService>,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let http_client = build_shared_http_client(config.general.request_timeout_seconds)?;

        let fetcher: Arc<dyn MetadataFetcher> = Arc::new(AnilistClient::with_shared_client(
            http_client.clone(),
            config.anilist.api_url.clone(),
        ));

        let translator: Arc<dyn Translator> = Arc::new(DeepLClient::with_shared_client(
            http_client,
            config.translation.api_url.clone(),
            config.translation.api_key.clone(),
        ));

        let search_service = Arc::new(SearchService::new(
            store.clone(),
            fetcher,
            translator,
            config.translation.target_lang.clone(),
        ));

        Ok(Self {
            config: Arc::new(config),
            store,
            search_service,
        })
    }
}
