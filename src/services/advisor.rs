// src/services/advisor.rs
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::gemini::{
    Content, ContentGenerator, GenerateContentRequest, GroundingChunk, LatLng, RetrievalConfig,
    Tool, ToolConfig,
};
use super::session_manager::{ChatMessage, MessageRole};

pub const SYSTEM_INSTRUCTION: &str = "You are EstateAI, a world-class real estate advisor. \
You help users find properties, understand market trends, calculate mortgages, and analyze neighborhoods. \
Use Google Search and Google Maps tools to provide factual, up-to-date information. \
When suggesting locations, refer to local amenities, schools, and transit. \
Always be professional, objective, and helpful.";

pub const EMPTY_REPLY_TEXT: &str = "I'm sorry, I couldn't generate a response.";
pub const FALLBACK_ERROR_TEXT: &str =
    "I encountered an error while processing your request. Please try again later.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationLink {
    pub title: String,
    pub uri: String,
}

impl From<GroundingChunk> for CitationLink {
    fn from(chunk: GroundingChunk) -> Self {
        match chunk {
            GroundingChunk::Web { title, uri } | GroundingChunk::Maps { title, uri } => {
                Self { title, uri }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnOutcome {
    Answered,
    Empty,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvisorReply {
    pub reply_text: String,
    pub links: Vec<CitationLink>,
    #[serde(skip)]
    pub outcome: TurnOutcome,
}

impl AdvisorReply {
    fn failed() -> Self {
        Self {
            reply_text: FALLBACK_ERROR_TEXT.to_string(),
            links: Vec::new(),
            outcome: TurnOutcome::Failed,
        }
    }
}

/// Shuttles one user turn at a time to the generative provider.
#[derive(Clone)]
pub struct AdvisorClient {
    generator: Arc<dyn ContentGenerator>,
}

impl AdvisorClient {
    pub fn new(generator: Arc<dyn ContentGenerator>) -> Self {
        Self { generator }
    }

    pub fn build_request(
        transcript: &[ChatMessage],
        new_user_text: &str,
        location: Option<GeoCoordinate>,
    ) -> GenerateContentRequest {
        let mut contents: Vec<Content> = transcript
            .iter()
            .map(|m| {
                let role = match m.role {
                    MessageRole::User => "user",
                    MessageRole::Assistant => "model",
                };
                Content::text(Some(role), m.content.clone())
            })
            .collect();
        contents.push(Content::text(Some("user"), new_user_text));

        GenerateContentRequest {
            system_instruction: Content::text(None, SYSTEM_INSTRUCTION),
            contents,
            tools: vec![Tool::GoogleSearch {}, Tool::GoogleMaps {}],
            tool_config: location.map(|loc| ToolConfig {
                retrieval_config: RetrievalConfig {
                    lat_lng: LatLng {
                        latitude: loc.latitude,
                        longitude: loc.longitude,
                    },
                },
            }),
        }
    }

    /// Send one turn. Provider failures come back as a fixed apology, never as an error.
    pub async fn send_turn(
        &self,
        transcript: &[ChatMessage],
        new_user_text: &str,
        location: Option<GeoCoordinate>,
    ) -> AdvisorReply {
        let request = Self::build_request(transcript, new_user_text, location);

        let response = match self.generator.generate(&request).await {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(error = %err, "advisor provider call failed");
                return AdvisorReply::failed();
            }
        };

        let links: Vec<CitationLink> = response
            .grounding_chunks()
            .into_iter()
            .map(CitationLink::from)
            .collect();

        match response.text() {
            Some(text) => AdvisorReply {
                reply_text: text,
                links,
                outcome: TurnOutcome::Answered,
            },
            None => {
                tracing::warn!("provider returned no text");
                AdvisorReply {
                    reply_text: EMPTY_REPLY_TEXT.to_string(),
                    links,
                    outcome: TurnOutcome::Empty,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::gemini::{GenerateContentResponse, ProviderError};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct Canned {
        body: serde_json::Value,
        seen: Mutex<Vec<GenerateContentRequest>>,
    }

    #[async_trait]
    impl ContentGenerator for Canned {
        async fn generate(
            &self,
            request: &GenerateContentRequest,
        ) -> Result<GenerateContentResponse, ProviderError> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(serde_json::from_value(self.body.clone())?)
        }
    }

    struct Broken;

    #[async_trait]
    impl ContentGenerator for Broken {
        async fn generate(
            &self,
            _request: &GenerateContentRequest,
        ) -> Result<GenerateContentResponse, ProviderError> {
            Err(ProviderError::MissingApiKey)
        }
    }

    fn canned(body: serde_json::Value) -> Arc<Canned> {
        Arc::new(Canned { body, seen: Mutex::new(Vec::new()) })
    }

    #[test]
    fn history_maps_to_provider_roles() {
        let transcript = vec![
            ChatMessage::new(MessageRole::User, "Is Austin pricey?"),
            ChatMessage::new(MessageRole::Assistant, "Somewhat."),
        ];
        let request = AdvisorClient::build_request(&transcript, "What about Dallas?", None);

        let roles: Vec<_> = request.contents.iter().map(|c| c.role.as_deref().unwrap()).collect();
        assert_eq!(roles, ["user", "model", "user"]);
        assert_eq!(request.contents[2].parts[0].text, "What about Dallas?");
        assert_eq!(request.tools, vec![Tool::GoogleSearch {}, Tool::GoogleMaps {}]);
        assert!(request.tool_config.is_none());
    }

    #[test]
    fn location_becomes_retrieval_bias() {
        let loc = GeoCoordinate { latitude: 30.27, longitude: -97.74 };
        let request = AdvisorClient::build_request(&[], "schools nearby?", Some(loc));
        let lat_lng = request.tool_config.unwrap().retrieval_config.lat_lng;
        assert_eq!(lat_lng, LatLng { latitude: 30.27, longitude: -97.74 });
    }

    #[tokio::test]
    async fn plain_answer_has_no_links() {
        let provider = canned(json!({
            "candidates": [{ "content": { "parts": [{ "text": "Prices rose 4%." }] } }]
        }));
        let client = AdvisorClient::new(provider.clone());

        let reply = client.send_turn(&[], "How is the market?", None).await;
        assert_eq!(reply.reply_text, "Prices rose 4%.");
        assert!(reply.links.is_empty());
        assert_eq!(reply.outcome, TurnOutcome::Answered);
        assert_eq!(provider.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn web_and_maps_citations_flatten_in_order() {
        let provider = canned(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "See these." }] },
                "groundingMetadata": { "groundingChunks": [
                    { "web": { "title": "Zillow", "uri": "https://zillow.example" } },
                    { "maps": { "title": "Zilker Park", "uri": "https://maps.example/zilker" } },
                    { "web": { "title": "Zillow", "uri": "https://zillow.example" } }
                ] }
            }]
        }));
        let client = AdvisorClient::new(provider);

        let reply = client.send_turn(&[], "parks?", None).await;
        let titles: Vec<_> = reply.links.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, ["Zillow", "Zilker Park", "Zillow"]);
    }

    #[tokio::test]
    async fn missing_text_uses_apology() {
        let client = AdvisorClient::new(canned(json!({ "candidates": [] })));
        let reply = client.send_turn(&[], "hello", None).await;
        assert_eq!(reply.reply_text, EMPTY_REPLY_TEXT);
        assert_eq!(reply.outcome, TurnOutcome::Empty);
    }

    #[tokio::test]
    async fn provider_failure_is_absorbed() {
        let client = AdvisorClient::new(Arc::new(Broken));
        let reply = client.send_turn(&[], "hello", None).await;
        assert_eq!(reply.reply_text, FALLBACK_ERROR_TEXT);
        assert!(reply.links.is_empty());
        assert_eq!(reply.outcome, TurnOutcome::Failed);
    }
}
