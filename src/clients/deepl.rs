use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

/// Returned in place of translated text whenever the translation
/// service cannot be reached or answers with a non-success status.
pub const TRANSLATION_FALLBACK: &str = "translation unavailable";

/// Best-effort text translation. Implementations never return an
/// error: a failed call degrades to [`TRANSLATION_FALLBACK`] so that
/// translation trouble can never abort a search request.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target_lang: &str) -> String;
}

#[derive(Deserialize)]
struct TranslationResponse {
    translations: Vec<Translation>,
}

#[derive(Deserialize)]
struct Translation {
    text: String,
}

#[derive(Clone)]
pub struct DeepLClient {
    client: Client,
    api_url: String,
    api_key: String,
}

impl DeepLClient {
    #[must_use]
    pub fn with_shared_client(
        client: Client,
        api_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
        }
    }

    async fn request(&self, text: &str, target_lang: &str) -> anyhow::Result<String> {
        let form = [("text", text), ("target_lang", target_lang)];

        let mut request = self.client.post(&self.api_url).form(&form);
        if !self.api_key.is_empty() {
            request = request.header(
                reqwest::header::AUTHORIZATION,
                format!("DeepL-Auth-Key {}", self.api_key),
            );
        }

        let response: TranslationResponse =
            request.send().await?.error_for_status()?.json().await?;

        response
            .translations
            .into_iter()
            .next()
            .map(|t| t.text)
            .ok_or_else(|| anyhow::anyhow!("empty translations array"))
    }
}

#[async_trait]
impl Translator for DeepLClient {
    async fn translate(&self, text: &str, target_lang: &str) -> String {
        match self.request(text, target_lang).await {
            Ok(translated) => translated,
            Err(e) => {
                warn!("Translation request failed, using fallback: {e}");
                TRANSLATION_FALLBACK.to_string()
            }
        }
    }
}
