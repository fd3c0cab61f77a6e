//! Thin client for the Gemini `generateContent` endpoint.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::GeminiError;
use crate::util::strip_code_fences;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";
const TEMPERATURE: f64 = 0.2;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    response_mime_type: &'static str,
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
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Client for a single Gemini model.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: Url,
}

impl GeminiClient {
    /// Creates a client pointed at the production Gemini API.
    ///
    /// # Errors
    ///
    /// Returns [`GeminiError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(api_key: &str, model: &str, timeout_secs: u64) -> Result<Self, GeminiError> {
        Self::with_base_url(api_key, model, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`GeminiError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`GeminiError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, GeminiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("kaitori/0.1 (site-scoring)")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| GeminiError::InvalidBaseUrl(format!("{base_url}: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            base_url,
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends `prompt` as a single user turn and returns the first candidate's
    /// text.
    ///
    /// # Errors
    ///
    /// - [`GeminiError::Http`] on network failure.
    /// - [`GeminiError::UnexpectedStatus`] on a non-2xx response.
    /// - [`GeminiError::Deserialize`] if the response envelope is malformed.
    /// - [`GeminiError::EmptyResponse`] if no candidate carries text.
    pub async fn generate(&self, prompt: &str) -> Result<String, GeminiError> {
        let url = self.generate_url()?;
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                response_mime_type: "application/json",
            },
        };

        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "Gemini request");

        let response = self.client.post(url).json(&request).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(GeminiError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&body).map_err(|e| GeminiError::Deserialize {
                context: "generateContent response".to_string(),
                source: e,
            })?;

        parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .find_map(|p| p.text.filter(|t| !t.trim().is_empty()))
            .ok_or(GeminiError::EmptyResponse)
    }

    /// Like [`generate`](Self::generate), then strips any code fence and
    /// parses the text as `T`.
    ///
    /// # Errors
    ///
    /// Everything [`generate`](Self::generate) returns, plus
    /// [`GeminiError::Deserialize`] when the model text is not valid JSON
    /// for `T`.
    pub async fn generate_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        context: &str,
    ) -> Result<T, GeminiError> {
        let text = self.generate(prompt).await?;
        serde_json::from_str(strip_code_fences(&text)).map_err(|e| GeminiError::Deserialize {
            context: context.to_string(),
            source: e,
        })
    }

    /// `{base}/models/{model}:generateContent?key=...`
    fn generate_url(&self) -> Result<Url, GeminiError> {
        let mut url = self
            .base_url
            .join(&format!("models/{}:generateContent", self.model))
            .map_err(|e| GeminiError::InvalidBaseUrl(format!("{}: {e}", self.base_url)))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }
}
