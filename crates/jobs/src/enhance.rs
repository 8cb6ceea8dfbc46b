//! Prompt enhancement through a hosted language model.
//!
//! Sends the enhancement instruction, plus the input image and mask when
//! given, to a Gemini `generateContent` endpoint and cleans the answer
//! with [`clean_enhanced_prompt`].

use std::time::Duration;

use atelier_core::prompt::{build_enhancement_instruction, clean_enhanced_prompt, MASK_NOTE};
use atelier_core::request::WorkflowMode;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// Model used when none is configured.
pub const DEFAULT_ENHANCE_MODEL: &str = "gemini-1.5-flash-002";
/// Base URL of the generative language API.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
/// MIME type declared for inlined images.
const INLINE_IMAGE_MIME: &str = "image/jpeg";
/// HTTP timeout for model calls and image downloads.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors from prompt enhancement.
#[derive(Debug, thiserror::Error)]
pub enum EnhanceError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Model API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Model returned no text")]
    EmptyResponse,
}

/// What to enhance.
#[derive(Debug, Clone, Copy)]
pub struct EnhanceInput<'a> {
    pub current_prompt: &'a str,
    pub style: &'a str,
    pub mode: WorkflowMode,
    pub image_url: Option<&'a str>,
    pub mask_url: Option<&'a str>,
}

// ---- wire types ----

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    Inline { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: &'static str,
    data: String,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<TextPart>,
}

#[derive(Debug, Default, Deserialize)]
struct TextPart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Enhancer
// ---------------------------------------------------------------------------

/// Client for the enhancement model.
pub struct PromptEnhancer {
    client: reqwest::Client,
    api_key: String,
    model: String,
    api_base: String,
}

impl PromptEnhancer {
    pub fn new(api_key: String) -> Result<Self, EnhanceError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self::with_client(client, api_key))
    }

    pub fn with_client(client: reqwest::Client, api_key: String) -> Self {
        Self {
            client,
            api_key,
            model: DEFAULT_ENHANCE_MODEL.to_string(),
            api_base: GEMINI_API_BASE.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Endpoint for the configured model.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        )
    }

    /// Produce a cleaned, comma-separated prompt for `input`.
    pub async fn enhance(&self, input: &EnhanceInput<'_>) -> Result<String, EnhanceError> {
        let has_mask = input.mask_url.is_some();
        let mut parts = vec![Part::Text {
            text: build_enhancement_instruction(
                input.current_prompt,
                input.style,
                input.mode,
                has_mask,
            ),
        }];

        for url in [input.image_url, input.mask_url].into_iter().flatten() {
            match self.fetch_inline(url).await {
                Ok(data) => parts.push(Part::Inline {
                    inline_data: InlineData {
                        mime_type: INLINE_IMAGE_MIME,
                        data,
                    },
                }),
                Err(e) => {
                    tracing::warn!(url, error = %e, "Skipping image for prompt enhancement");
                }
            }
        }

        if has_mask {
            parts.push(Part::Text {
                text: MASK_NOTE.to_string(),
            });
        }

        let body = GenerateContentRequest {
            contents: vec![Content { parts }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(EnhanceError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let raw = response.json::<GenerateContentResponse>().await?.text();
        if raw.trim().is_empty() {
            return Err(EnhanceError::EmptyResponse);
        }

        let cleaned = clean_enhanced_prompt(&raw, input.current_prompt, has_mask);
        if cleaned.is_empty() {
            return Err(EnhanceError::EmptyResponse);
        }

        tracing::debug!(model = %self.model, prompt = %cleaned, "Prompt enhanced");
        Ok(cleaned)
    }

    /// Download an image and return it base64-encoded.
    async fn fetch_inline(&self, url: &str) -> Result<String, reqwest::Error> {
        let bytes = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(BASE64.encode(&bytes))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn endpoint_names_model() {
        let enhancer = PromptEnhancer::with_client(reqwest::Client::new(), "k".into())
            .with_model("gemini-test");
        assert_eq!(
            enhancer.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-test:generateContent"
        );
    }

    #[test]
    fn request_parts_serialize_untagged() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text { text: "hi".into() },
                    Part::Inline {
                        inline_data: InlineData {
                            mime_type: INLINE_IMAGE_MIME,
                            data: "AAAA".into(),
                        },
                    },
                ],
            }],
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"contents": [{"parts": [
                {"text": "hi"},
                {"inline_data": {"mime_type": "image/jpeg", "data": "AAAA"}}
            ]}]})
        );
    }

    #[test]
    fn response_text_joins_first_candidate_parts() {
        let resp: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                {"content": {"parts": [{"text": "modern, "}, {"text": "oak floor"}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        }))
        .unwrap();
        assert_eq!(resp.text(), "modern, oak floor");
    }

    #[test]
    fn empty_response_has_no_text() {
        let resp: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(resp.text(), "");
    }
}
