//! Gemini content client -- fruit facts and break activities via the
//! Generative Language `generateContent` REST endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use super::{BreakActivity, ContentService};
use crate::error::ContentError;
use crate::reward::FruitKind;
use crate::storage::config::ContentConfig;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

const API_KEY_ENV: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];
const KEYRING_KEY: &str = "gemini_api_key";

/// Thin wrapper around the OS keyring for the API key.
pub mod keyring_store {
    const SERVICE: &str = "focusforest";

    pub fn get(key: &str) -> Result<Option<String>, keyring::Error> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.get_password() {
            Ok(pw) => Ok(Some(pw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn set(key: &str, value: &str) -> Result<(), keyring::Error> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        entry.set_password(value)
    }

    pub fn delete(key: &str) -> Result<(), keyring::Error> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Store the API key in the OS keyring.
pub fn store_api_key(key: &str) -> Result<(), keyring::Error> {
    keyring_store::set(KEYRING_KEY, key)
}

/// Remove the stored API key.
pub fn forget_api_key() -> Result<(), keyring::Error> {
    keyring_store::delete(KEYRING_KEY)
}

/// Environment first, then the keyring.
fn lookup_api_key() -> Option<String> {
    API_KEY_ENV
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|v| !v.trim().is_empty())
        .or_else(|| keyring_store::get(KEYRING_KEY).ok().flatten())
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    endpoint: Url,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(
        endpoint: &str,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ContentError> {
        let endpoint = if endpoint.ends_with('/') {
            Url::parse(endpoint)?
        } else {
            Url::parse(&format!("{endpoint}/"))?
        };
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    /// Build from configuration, resolving the API key from the environment
    /// or the OS keyring.
    pub fn from_config(config: &ContentConfig) -> Result<Self, ContentError> {
        if !config.enabled {
            return Err(ContentError::Disabled);
        }
        let api_key = lookup_api_key().ok_or(ContentError::MissingApiKey)?;
        Self::new(
            &config.endpoint,
            config.model.clone(),
            api_key,
            Duration::from_secs(config.timeout_secs.max(1)),
        )
    }

    fn generate_url(&self) -> Result<Url, ContentError> {
        Ok(self
            .endpoint
            .join(&format!("models/{}:generateContent", self.model))?)
    }

    /// POST a prompt and return the first candidate's text.
    async fn generate(&self, body: Value) -> Result<String, ContentError> {
        let resp = self
            .client
            .post(self.generate_url()?)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ContentError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = resp.json().await?;
        parsed.first_text().ok_or(ContentError::EmptyResponse)
    }
}

#[async_trait]
impl ContentService for GeminiClient {
    async fn fruit_fact(&self, fruit: FruitKind) -> Result<String, ContentError> {
        let prompt = format!(
            "Give me a one-sentence fun fact about a {} for a child.",
            fruit.name()
        );
        self.generate(json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        }))
        .await
    }

    async fn break_activity(&self, subject: &str) -> Result<BreakActivity, ContentError> {
        let prompt = format!(
            "Suggest a fun, safe, and short (5 minute) break activity for a kid who just \
             finished studying {subject}. Return a JSON object with title, description, and an emoji."
        );
        let text = self
            .generate(json!({
                "contents": [{ "parts": [{ "text": prompt }] }],
                "generationConfig": {
                    "responseMimeType": "application/json",
                    "responseSchema": {
                        "type": "OBJECT",
                        "properties": {
                            "title": { "type": "STRING" },
                            "description": { "type": "STRING" },
                            "emoji": { "type": "STRING" }
                        },
                        "required": ["title", "description", "emoji"]
                    }
                }
            }))
            .await?;
        serde_json::from_str(&text).map_err(|e| ContentError::Malformed(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateResponse {
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .find(|t| !t.trim().is_empty())
    }
}
