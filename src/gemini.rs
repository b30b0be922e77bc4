use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::media::{encode_image, EncodedMedia};
use crate::models::{GeneratedBatch, ImageUpload, ProductData, ProductPatch};
use crate::prompts;
use crate::schema::persona_batch_schema;

/// Fast extraction variant with search grounding.
const ANALYSIS_MODEL: &str = "gemini-2.5-flash";
/// Reasoning/creative-writing variant for the persona batch.
const PERSONA_MODEL: &str = "gemini-3-pro-preview";
/// Image synthesis variant.
const VISUAL_MODEL: &str = "gemini-2.5-flash-image";

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("GEMINI_API_KEY is not configured")]
    Configuration,
    #[error("image encoding failed: {0}")]
    Encoding(String),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("could not parse model response: {0}")]
    ResponseFormat(String),
    #[error("model returned no usable content")]
    EmptyResponse,
    #[error("no image data in generated content")]
    NoContentGenerated,
}

/// Explicit client configuration. Reading it happens once at construction
/// (`from_env`) or wherever the caller decides; the client itself holds no
/// hidden global state and is reentrant.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub api_key: Option<String>,
    pub base_url: String,
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        GatewayConfig {
            api_key: std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()),
            base_url: std::env::var("GEMINI_API_BASE")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        }
    }
}

pub struct GeminiClient {
    client: Client,
    config: GatewayConfig,
}

impl GeminiClient {
    pub fn new(config: GatewayConfig) -> Self {
        Self { client: Client::new(), config }
    }

    fn credential(&self) -> Result<&str, GatewayError> {
        self.config.api_key.as_deref().ok_or(GatewayError::Configuration)
    }

    async fn generate_content(
        &self,
        model: &str,
        body: serde_json::Value,
    ) -> Result<GeminiResponse, GatewayError> {
        let key = self.credential()?;
        let url = format!("{}/models/{}:generateContent?key={}", self.config.base_url, model, key);
        info!("🔗 {} request to {}", model, url.replace(key, "***"));

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Http(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::Http(e.to_string()))?;
        if !status.is_success() {
            error!("❌ Gemini API error: status={} body={}", status, text);
            return Err(GatewayError::Http(format!("status={} body={}", status, text)));
        }

        info!("📥 {} response: {}", model, loggable_response(&text));
        serde_json::from_str(&text)
            .map_err(|e| GatewayError::ResponseFormat(format!("response envelope: {e}")))
    }

    /// Extract product details from a URL (and optionally an image) via a
    /// search-grounded call. Any subset of the five analysis keys is a
    /// valid result; absent keys mean the model found nothing for them.
    pub async fn analyze(
        &self,
        url: &str,
        image: Option<&ImageUpload>,
    ) -> Result<ProductPatch, GatewayError> {
        let prompt = prompts::analysis_prompt(url);
        let media = image
            .map(|i| encode_image(&i.bytes, i.content_type.as_deref()))
            .transpose()?;
        let body = json!({
            "contents": [{ "role": "user", "parts": content_parts(prompt, media.as_ref()) }],
            "tools": [{ "googleSearch": {} }],
        });

        let response = self.generate_content(ANALYSIS_MODEL, body).await?;
        let text = response.first_text().unwrap_or_else(|| "{}".to_string());
        // Search-grounded calls are not schema-constrained, so tolerate
        // markdown fencing around the JSON.
        let cleaned = strip_code_fences(&text);
        match serde_json::from_str::<ProductPatch>(&cleaned) {
            Ok(patch) => Ok(patch),
            Err(e) => {
                error!("❌ Failed to parse analysis JSON ({}), raw text: {}", e, text);
                Err(GatewayError::ResponseFormat(e.to_string()))
            }
        }
    }

    /// Generate the 4-persona batch. Structured-output mode constrains the
    /// model to the response schema; the batch is still validated locally
    /// and rejected wholesale on any violation.
    pub async fn generate_personas(
        &self,
        product: &ProductData,
    ) -> Result<GeneratedBatch, GatewayError> {
        let prompt = prompts::persona_prompt(product);
        let media = product
            .image
            .as_ref()
            .map(|i| encode_image(&i.bytes, i.content_type.as_deref()))
            .transpose()?;
        let body = json!({
            "contents": [{ "role": "user", "parts": content_parts(prompt, media.as_ref()) }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": persona_batch_schema(),
                // Slightly higher for copy variety
                "temperature": 0.8,
            },
        });

        let response = self.generate_content(PERSONA_MODEL, body).await?;
        let text = response.first_text().ok_or(GatewayError::EmptyResponse)?;
        let batch: GeneratedBatch = serde_json::from_str(&text).map_err(|e| {
            error!("❌ Failed to parse persona JSON ({}), raw text: {}", e, text);
            GatewayError::ResponseFormat(e.to_string())
        })?;
        validate_batch(&batch)?;
        Ok(batch)
    }

    /// Synthesize a square ad creative from a persona's generation prompt.
    /// Returns the first inline image of the response as a data URI.
    pub async fn generate_visual(&self, creative_prompt: &str) -> Result<String, GatewayError> {
        let prompt = prompts::visual_prompt(creative_prompt);
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "imageConfig": { "aspectRatio": "1:1" },
            },
        });

        let response = self.generate_content(VISUAL_MODEL, body).await?;
        response
            .first_inline_image()
            .map(|(mime_type, data)| format!("data:{};base64,{}", mime_type, data))
            .ok_or(GatewayError::NoContentGenerated)
    }
}

/// Text part first, then at most one inline-data part.
fn content_parts(prompt: String, media: Option<&EncodedMedia>) -> Vec<serde_json::Value> {
    let mut parts = vec![json!({ "text": prompt })];
    if let Some(media) = media {
        parts.push(json!({
            "inlineData": { "data": media.data, "mimeType": media.mime_type }
        }));
    }
    parts
}

fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// Local defense against a misbehaving remote: no partial acceptance, so a
/// batch with no personas or colliding ids fails as a whole.
fn validate_batch(batch: &GeneratedBatch) -> Result<(), GatewayError> {
    if batch.generated_personas.is_empty() {
        return Err(GatewayError::EmptyResponse);
    }
    let mut seen = std::collections::HashSet::new();
    for persona in &batch.generated_personas {
        if !seen.insert(persona.persona_id.as_str()) {
            return Err(GatewayError::ResponseFormat(format!(
                "duplicate persona_id {:?} in batch",
                persona.persona_id
            )));
        }
    }
    if batch.generated_personas.len() != 4 {
        warn!(
            "⚠️ Expected 4 personas, model returned {}",
            batch.generated_personas.len()
        );
    }
    Ok(())
}

/// Cut at most `max` bytes off the front of `s`, backing down to the
/// nearest char boundary so multibyte text from the remote cannot panic
/// the slice.
fn truncate_to_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Shrink inline base64 payloads before the response hits the log.
fn loggable_response(text: &str) -> String {
    if text.len() <= 1000 {
        return text.to_string();
    }
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(mut value) => {
            truncate_data_fields(&mut value);
            serde_json::to_string(&value)
                .unwrap_or_else(|_| format!("{}...", truncate_to_boundary(text, 1000)))
        }
        Err(_) => format!("{}...", truncate_to_boundary(text, 1000)),
    }
}

fn truncate_data_fields(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, val) in map.iter_mut() {
                if key == "data" {
                    if let serde_json::Value::String(s) = val {
                        if s.len() > 100 {
                            let head = truncate_to_boundary(s, 50);
                            *val = serde_json::Value::String(format!(
                                "{}...[truncated {} chars]",
                                head,
                                s.len() - head.len()
                            ));
                        }
                    }
                } else {
                    truncate_data_fields(val);
                }
            }
        }
        serde_json::Value::Array(arr) => {
            for val in arr.iter_mut() {
                truncate_data_fields(val);
            }
        }
        _ => {}
    }
}

// --- Response envelope ---

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

#[derive(Debug, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Part {
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text {
        text: String,
    },
    Other(serde_json::Value),
}

#[derive(Debug, Deserialize)]
struct InlineData {
    data: String,
    #[serde(rename = "mimeType")]
    mime_type: String,
}

impl GeminiResponse {
    fn first_text(&self) -> Option<String> {
        for candidate in &self.candidates {
            for part in &candidate.content.parts {
                if let Part::Text { text } = part {
                    return Some(text.clone());
                }
            }
        }
        None
    }

    fn first_inline_image(&self) -> Option<(&str, &str)> {
        for candidate in &self.candidates {
            for part in &candidate.content.parts {
                if let Part::Inline { inline_data } = part {
                    return Some((&inline_data.mime_type, &inline_data.data));
                }
            }
        }
        None
    }
}

#[cfg(test)]
pub(crate) mod stubs {
    use std::sync::Arc;

    use axum::Json;
    use parking_lot::Mutex;

    use crate::models::{CreativeConcept, GeneratedBatch, MetaAdAssets, Persona};

    pub(crate) type SeenRequests = Arc<Mutex<Vec<serde_json::Value>>>;

    /// Minimal Gemini stand-in: answers every generateContent POST with the
    /// given envelope and records the request bodies it saw.
    pub(crate) async fn spawn_stub(response: serde_json::Value) -> (String, SeenRequests) {
        let seen: SeenRequests = Arc::new(Mutex::new(Vec::new()));
        let recorded = seen.clone();
        let app = axum::Router::new().route(
            "/models/:model",
            axum::routing::post(move |Json(body): Json<serde_json::Value>| {
                let recorded = recorded.clone();
                let response = response.clone();
                async move {
                    recorded.lock().push(body);
                    Json(response)
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), seen)
    }

    pub(crate) fn text_envelope(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": text }] } }]
        })
    }

    pub(crate) fn sample_batch() -> GeneratedBatch {
        let persona = |id: &str, name: &str, concept: CreativeConcept| Persona {
            persona_id: id.to_string(),
            name: name.to_string(),
            emotional_trigger: "Fear of lifting causing client complaints".into(),
            pain_points: vec!["Gel pops off after a week".into()],
            tone_style: "Direct, no fluff".into(),
            targeting_suggestions: vec!["Interest: Young Nails".into()],
            meta_ad_assets: MetaAdAssets {
                primary_texts: vec!["Hook.\nBody.\nCTA.".into()],
                headlines: vec!["No More Chipping".into()],
                call_to_action: "Shop Now".into(),
                landing_page_headline: "Gel that stays put".into(),
                creative_concept: concept,
            },
        };
        GeneratedBatch {
            generated_personas: vec![
                persona(
                    "TECH-FREE",
                    "Freelance Fiona",
                    CreativeConcept::Image { prompt_for_imagen: "Macro texture shot, soft ring light".into() },
                ),
                persona(
                    "TECH-SALON",
                    "Salon Sam",
                    CreativeConcept::Image { prompt_for_imagen: "Split screen, old way vs new way".into() },
                ),
                persona(
                    "OWNER",
                    "Owner Olivia",
                    CreativeConcept::Video {
                        prompt_for_imagen: "UGC style, salon counter".into(),
                        video_script_draft: Some("Scene 1: the morning rush...".into()),
                    },
                ),
                persona(
                    "DIY",
                    "Home Hannah",
                    CreativeConcept::Image { prompt_for_imagen: "Cozy desk flat lay, harsh flash".into() },
                ),
            ],
        }
    }
}
