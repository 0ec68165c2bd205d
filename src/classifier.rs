use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use camino::Utf8Path;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::DexError;

pub const IDENTIFY_PROMPT: &str = "What Pokémon is in this image? Provide only the Pokémon's name, or 'Unknown' if you cannot identify it. Do not include any other text or punctuation.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImagePayload {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn from_path(path: &Utf8Path) -> Result<Self, DexError> {
        let mime_type = mime_for_extension(path.extension().unwrap_or_default())
            .ok_or_else(|| DexError::InvalidImage(format!("unsupported image type: {path}")))?;
        let bytes =
            std::fs::read(path).map_err(|err| DexError::InvalidImage(format!("{path}: {err}")))?;
        if bytes.is_empty() {
            return Err(DexError::InvalidImage(format!("{path} is empty")));
        }
        Ok(Self::new(mime_type, bytes))
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

fn mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Names the subject of an image as free text. The label is opaque: callers
/// reconcile it against the catalog by exact name only.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, image: &ImagePayload) -> Result<String, DexError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: [Value; 2],
}

#[derive(Clone)]
pub struct GeminiClassifier {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiClassifier {
    pub fn new(
        endpoint: &str,
        model: &str,
        api_key: String,
        timeout: Duration,
    ) -> Result<Self, DexError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("pokedex-finder/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| DexError::ClassificationFailed(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| DexError::ClassificationFailed(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
        })
    }

    fn generate_url(&self) -> String {
        format!("{}/{}:generateContent", self.endpoint, self.model)
    }
}

fn request_body(image: &ImagePayload) -> GenerateRequest<'_> {
    GenerateRequest {
        contents: [Content {
            role: "user",
            parts: [
                json!({ "text": IDENTIFY_PROMPT }),
                json!({
                    "inlineData": {
                        "mimeType": image.mime_type,
                        "data": image.to_base64(),
                    }
                }),
            ],
        }],
    }
}

/// Extracts `candidates[0].content.parts[0].text`, trimmed.
pub fn extract_label(payload: &Value) -> Result<String, DexError> {
    payload
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .map(|text| text.trim().to_string())
        .ok_or_else(|| {
            DexError::ClassificationFailed("response carried no candidate text".to_string())
        })
}

#[async_trait]
impl Classifier for GeminiClassifier {
    async fn classify(&self, image: &ImagePayload) -> Result<String, DexError> {
        debug!(model = %self.model, bytes = image.bytes.len(), "classifier.request");
        let response = self
            .client
            .post(self.generate_url())
            .query(&[("key", self.api_key.as_str())])
            .json(&request_body(image))
            .send()
            .await
            .map_err(|err| DexError::ClassificationFailed(err.to_string()))?;

        let status = response.status();
        let payload: Value = response
            .json()
            .await
            .map_err(|err| DexError::ClassificationFailed(err.to_string()))?;
        if !status.is_success() {
            let message = payload
                .pointer("/error/message")
                .and_then(Value::as_str)
                .unwrap_or("Unknown error");
            return Err(DexError::ClassificationFailed(format!(
                "status {}: {message}",
                status.as_u16()
            )));
        }

        let label = extract_label(&payload)?;
        debug!(%label, "classifier.response");
        Ok(label)
    }
}
