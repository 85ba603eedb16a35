//! HTTP client for the Gemini generateContent and models endpoints.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::catalog::{build_catalog, ModelCatalog, ModelMetadata};
use super::prompt::{build_text_prompt, build_vision_prompt};
use super::response::parse_reply_text;
use super::{GeminiReply, ModelExtractor, Result};
use crate::config::Settings;
use crate::error::GeminiError;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Embedded text is clipped to this many characters before prompting.
pub const TEXT_CLIP_CHARS: usize = 60_000;

/// Gemini API client. Built once per pipeline and reused for the
/// calls of a single run; not shared across invocations.
pub struct GeminiClient {
    api_key: String,
    model: String,
    locale: String,
    http: reqwest::Client,
}

impl GeminiClient {
    /// Build a client from resolved settings. Fails fast when no API
    /// key is configured.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_key = settings
            .gemini_api_key
            .clone()
            .ok_or(GeminiError::MissingApiKey)?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .map_err(|e| GeminiError::Request(e.to_string()))?;

        Ok(Self {
            api_key,
            model: settings.model.clone(),
            locale: settings.locale.clone(),
            http,
        })
    }

    /// List available models as a filtered, sorted catalog.
    pub async fn list_models(
        &self,
        only_gemini: bool,
        name_contains: Option<&str>,
    ) -> Result<ModelCatalog> {
        let mut models: Vec<ModelMetadata> = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .http
                .get(format!("{API_BASE}/models"))
                .header("x-goog-api-key", &self.api_key)
                .query(&[("pageSize", "200")]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let page: ModelsListResponse = self.send_json(request).await?;
            models.extend(page.models);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!(count = models.len(), "fetched model list");
        Ok(build_catalog(models, only_gemini, name_contains))
    }

    async fn generate(&self, parts: Vec<RequestPart>) -> Result<String> {
        let body = GenerateRequest {
            contents: vec![RequestContent { parts }],
            generation_config: GenerationConfig {
                temperature: 0.1,
                response_mime_type: "application/json",
            },
        };

        let request = self
            .http
            .post(format!("{API_BASE}/models/{}:generateContent", self.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body);

        let reply: GenerateResponse = self.send_json(request).await?;
        reply.first_text().ok_or(GeminiError::EmptyReply)
    }

    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let response = request
            .send()
            .await
            .map_err(|e| GeminiError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeminiError::Request(format!("{status}: {body}")));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| GeminiError::Request(e.to_string()))
    }
}

impl ModelExtractor for GeminiClient {
    async fn extract_from_text(&self, text: &str) -> Result<GeminiReply> {
        let clipped = clip_chars(text, TEXT_CLIP_CHARS);
        let payload = format!(
            "{}\n\nINVOICE_TEXT_START\n{}\nINVOICE_TEXT_END\n",
            build_text_prompt(&self.locale),
            clipped
        );

        debug!(chars = clipped.chars().count(), "requesting text extraction");
        let reply_text = self.generate(vec![RequestPart::text(payload)]).await?;
        parse_reply_text(&reply_text)
    }

    async fn extract_from_images(&self, images: &[Vec<u8>]) -> Result<GeminiReply> {
        if images.is_empty() {
            return Err(GeminiError::NoImages);
        }

        let mut parts = vec![RequestPart::text(build_vision_prompt(&self.locale))];
        parts.extend(images.iter().map(|data| RequestPart::png(data)));

        debug!(images = images.len(), "requesting vision extraction");
        let reply_text = self.generate(parts).await?;
        parse_reply_text(&reply_text)
    }
}

/// Clip to a character count without splitting a code point.
fn clip_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

// ---- wire types -----------------------------------------------------------

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

impl RequestPart {
    fn text(text: String) -> Self {
        RequestPart::Text { text }
    }

    fn png(data: &[u8]) -> Self {
        RequestPart::InlineData {
            inline_data: InlineData {
                mime_type: "image/png".to_string(),
                data: BASE64.encode(data),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
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

impl GenerateResponse {
    /// First non-blank text part across all candidates.
    fn first_text(&self) -> Option<String> {
        self.candidates
            .iter()
            .flat_map(|candidate| candidate.content.iter())
            .flat_map(|content| content.parts.iter())
            .filter_map(|part| part.text.as_deref())
            .find(|text| !text.trim().is_empty())
            .map(str::to_string)
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelsListResponse {
    #[serde(default)]
    models: Vec<ModelMetadata>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_clip_chars_respects_boundaries() {
        assert_eq!(clip_chars("abcdef", 3), "abc");
        assert_eq!(clip_chars("ab", 3), "ab");
        // Multi-byte characters are never split.
        assert_eq!(clip_chars("łóżko", 2), "łó");
    }

    #[test]
    fn test_missing_api_key_fails_fast() {
        let settings = Settings::default();
        let err = GeminiClient::from_settings(&settings).err();
        assert!(matches!(err, Some(GeminiError::MissingApiKey)));
    }

    #[test]
    fn test_request_parts_serialize_to_gemini_wire_shape() {
        let text = serde_json::to_value(RequestPart::text("hi".to_string())).unwrap();
        assert_eq!(text["text"], "hi");

        let image = serde_json::to_value(RequestPart::png(&[1, 2, 3])).unwrap();
        assert_eq!(image["inlineData"]["mimeType"], "image/png");
        assert_eq!(image["inlineData"]["data"], BASE64.encode([1, 2, 3]));
    }

    #[test]
    fn test_first_text_skips_blank_parts() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates": [
                {"content": {"parts": [{"text": "  "}]}},
                {"content": {"parts": [{"text": "payload"}]}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(response.first_text().as_deref(), Some("payload"));
    }

    #[test]
    fn test_empty_candidates_yield_no_text() {
        let response: GenerateResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(response.first_text(), None);
    }
}
