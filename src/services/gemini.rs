// src/services/gemini.rs
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AppConfig;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("no API key configured")]
    MissingApiKey,
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("provider returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("failed to parse response: {0}")]
    Decode(#[from] serde_json::Error),
}

// ---- request ----

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn text(role: Option<&str>, text: impl Into<String>) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part { text: text.into() }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Tool {
    GoogleSearch {},
    GoogleMaps {},
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalConfig {
    pub lat_lng: LatLng,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolConfig {
    pub retrieval_config: RetrievalConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub system_instruction: Content,
    pub contents: Vec<Content>,
    pub tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_config: Option<ToolConfig>,
}

// ---- response ----

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidatePart {
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Vec<RawGroundingChunk>,
}

/// Chunk as it appears on the wire: each kind is an optional key.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawGroundingChunk {
    pub web: Option<GroundingSource>,
    pub maps: Option<GroundingSource>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GroundingSource {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub uri: String,
}

/// A citation returned by one of the retrieval tools.
#[derive(Debug, Clone, PartialEq)]
pub enum GroundingChunk {
    Web { title: String, uri: String },
    Maps { title: String, uri: String },
}

impl RawGroundingChunk {
    /// Web before maps when a chunk carries both; unknown kinds yield nothing.
    pub fn into_chunks(self) -> impl Iterator<Item = GroundingChunk> {
        let web = self
            .web
            .map(|s| GroundingChunk::Web { title: s.title, uri: s.uri });
        let maps = self
            .maps
            .map(|s| GroundingChunk::Maps { title: s.title, uri: s.uri });
        web.into_iter().chain(maps)
    }
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, `None` when there is none.
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.is_empty() { None } else { Some(text) }
    }

    pub fn grounding_chunks(&self) -> Vec<GroundingChunk> {
        self.candidates
            .first()
            .and_then(|c| c.grounding_metadata.as_ref())
            .map(|meta| {
                meta.grounding_chunks
                    .iter()
                    .cloned()
                    .flat_map(RawGroundingChunk::into_chunks)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Anything able to answer a `generateContent` call.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ProviderError>;
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(base_url: &str, model: &str, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.gemini_base_url, &config.gemini_model, config.api_key.clone())
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl ContentGenerator for GeminiClient {
    async fn generate(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or(ProviderError::MissingApiKey)?;

        tracing::debug!(model = %self.model, turns = request.contents.len(), "calling generateContent");
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ProviderError::Status { status, body });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_serializes_in_provider_shape() {
        let request = GenerateContentRequest {
            system_instruction: Content::text(None, "persona"),
            contents: vec![Content::text(Some("user"), "hi")],
            tools: vec![Tool::GoogleSearch {}, Tool::GoogleMaps {}],
            tool_config: Some(ToolConfig {
                retrieval_config: RetrievalConfig {
                    lat_lng: LatLng { latitude: 40.5, longitude: -73.25 },
                },
            }),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "systemInstruction": { "parts": [{ "text": "persona" }] },
                "contents": [{ "role": "user", "parts": [{ "text": "hi" }] }],
                "tools": [{ "googleSearch": {} }, { "googleMaps": {} }],
                "toolConfig": {
                    "retrievalConfig": { "latLng": { "latitude": 40.5, "longitude": -73.25 } }
                }
            })
        );
    }

    #[test]
    fn tool_config_is_omitted_when_absent() {
        let request = GenerateContentRequest {
            system_instruction: Content::text(None, "persona"),
            contents: vec![],
            tools: vec![],
            tool_config: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("toolConfig").is_none());
    }

    #[test]
    fn response_text_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "Hello " }, { "text": "there" }] } }]
        }))
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("Hello there"));
    }

    #[test]
    fn response_without_candidates_has_no_text() {
        let response: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(response.text(), None);
        assert!(response.grounding_chunks().is_empty());
    }

    #[test]
    fn grounding_chunks_keep_provider_order() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "ok" }] },
                "groundingMetadata": { "groundingChunks": [
                    { "maps": { "title": "Park", "uri": "https://maps.example/park" } },
                    { "retrievedContext": { "uri": "ignored" } },
                    { "web": { "title": "News", "uri": "https://news.example" } },
                    { "web": { "title": "News", "uri": "https://news.example" } }
                ] }
            }]
        }))
        .unwrap();

        assert_eq!(
            response.grounding_chunks(),
            vec![
                GroundingChunk::Maps { title: "Park".into(), uri: "https://maps.example/park".into() },
                GroundingChunk::Web { title: "News".into(), uri: "https://news.example".into() },
                GroundingChunk::Web { title: "News".into(), uri: "https://news.example".into() },
            ]
        );
    }

    #[test]
    fn chunk_with_both_kinds_yields_web_first() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "groundingMetadata": { "groundingChunks": [
                    { "maps": { "title": "M", "uri": "m" }, "web": { "title": "W", "uri": "w" } }
                ] }
            }]
        }))
        .unwrap();

        assert_eq!(
            response.grounding_chunks(),
            vec![
                GroundingChunk::Web { title: "W".into(), uri: "w".into() },
                GroundingChunk::Maps { title: "M".into(), uri: "m".into() },
            ]
        );
    }

    #[tokio::test]
    async fn missing_key_fails_before_network() {
        let client = GeminiClient::new("http://127.0.0.1:9", "gemini-2.5-flash", None);
        let request = GenerateContentRequest {
            system_instruction: Content::text(None, "persona"),
            contents: vec![],
            tools: vec![],
            tool_config: None,
        };
        let err = client.generate(&request).await.unwrap_err();
        assert!(matches!(err, ProviderError::MissingApiKey));
    }
}
