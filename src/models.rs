use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

/// Raw product image as uploaded by the form layer. Kept out of the JSON
/// representation; it only travels as a multipart field and as an inline
/// part of a Gemini request.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: bytes::Bytes,
    pub content_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ProductData {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub key_features: Vec<String>,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub brand_voice: String,
    #[serde(skip)]
    pub image: Option<ImageUpload>,
}

impl ProductData {
    /// Apply an analysis patch, leaving fields the model did not return
    /// (and any manual input already in them) untouched.
    pub fn merge_patch(&mut self, patch: ProductPatch) {
        if let Some(title) = patch.title { self.title = title; }
        if let Some(description) = patch.description { self.description = description; }
        if let Some(features) = patch.key_features { self.key_features = features; }
        if let Some(price) = patch.price { self.price = price; }
        if let Some(voice) = patch.brand_voice { self.brand_voice = voice; }
    }
}

/// Partial result of the analysis call. Any subset of the five keys is
/// valid; key names match what the analysis prompt asks the model for.
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct ProductPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "keyFeatures")]
    pub key_features: Option<Vec<String>>,
    pub price: Option<String>,
    #[serde(rename = "brandVoice")]
    pub brand_voice: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Persona {
    pub persona_id: String,
    pub name: String,
    pub emotional_trigger: String,
    pub pain_points: Vec<String>,
    pub tone_style: String,
    pub targeting_suggestions: Vec<String>,
    pub meta_ad_assets: MetaAdAssets,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MetaAdAssets {
    pub primary_texts: Vec<String>,
    pub headlines: Vec<String>,
    pub call_to_action: String,
    pub landing_page_headline: String,
    pub creative_concept: CreativeConcept,
}

/// Visual direction for a persona's ad creative. A VIDEO concept may carry
/// a script draft; an IMAGE concept structurally cannot.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum CreativeConcept {
    #[serde(rename = "IMAGE")]
    Image {
        prompt_for_imagen: String,
    },
    #[serde(rename = "VIDEO")]
    Video {
        prompt_for_imagen: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        video_script_draft: Option<String>,
    },
}

impl CreativeConcept {
    pub fn prompt_for_imagen(&self) -> &str {
        match self {
            CreativeConcept::Image { prompt_for_imagen } => prompt_for_imagen,
            CreativeConcept::Video { prompt_for_imagen, .. } => prompt_for_imagen,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GeneratedBatch {
    pub generated_personas: Vec<Persona>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadingState {
    Idle,
    Analyzing,
    GeneratingPersonas,
    GeneratingImage,
    Success,
    Error,
}

#[derive(Debug, Serialize, Clone)]
pub struct Session {
    pub id: Uuid,
    pub product: ProductData,
    pub state: LoadingState,
    pub personas: Vec<Persona>,
    /// persona_id -> data URI of the generated creative
    pub creatives: HashMap<String, String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: Uuid) -> Self {
        let now = Utc::now();
        Session {
            id,
            product: ProductData::default(),
            state: LoadingState::Idle,
            personas: Vec::new(),
            creatives: HashMap::new(),
            error: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VisualRequest {
    pub persona_id: String,
    pub prompt: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn creative_concept_image_round_trips_without_script() {
        let json = r#"{"type":"IMAGE","prompt_for_imagen":"macro shot of glossy gel"}"#;
        let concept: CreativeConcept = serde_json::from_str(json).unwrap();
        assert_eq!(
            concept,
            CreativeConcept::Image { prompt_for_imagen: "macro shot of glossy gel".into() }
        );
        let back = serde_json::to_value(&concept).unwrap();
        assert_eq!(back["type"], "IMAGE");
        assert!(back.get("video_script_draft").is_none());
    }

    #[test]
    fn creative_concept_video_carries_script() {
        let json = r#"{"type":"VIDEO","prompt_for_imagen":"fast cuts","video_script_draft":"Scene 1: ..."}"#;
        let concept: CreativeConcept = serde_json::from_str(json).unwrap();
        match concept {
            CreativeConcept::Video { video_script_draft, .. } => {
                assert_eq!(video_script_draft.as_deref(), Some("Scene 1: ..."));
            }
            other => panic!("expected VIDEO, got {:?}", other),
        }
    }

    #[test]
    fn creative_concept_image_tolerates_stray_script_field() {
        // Structured output mode may still emit the optional field; it is
        // dropped rather than failing the whole batch.
        let json = r#"{"type":"IMAGE","prompt_for_imagen":"flat lay","video_script_draft":""}"#;
        let concept: CreativeConcept = serde_json::from_str(json).unwrap();
        assert_eq!(concept, CreativeConcept::Image { prompt_for_imagen: "flat lay".into() });
    }

    #[test]
    fn creative_concept_rejects_unknown_tag() {
        let json = r#"{"type":"CAROUSEL","prompt_for_imagen":"x"}"#;
        assert!(serde_json::from_str::<CreativeConcept>(json).is_err());
    }

    #[test]
    fn merge_patch_leaves_absent_fields_untouched() {
        let mut product = ProductData {
            description: "Hand-written notes".into(),
            key_features: vec!["durable".into()],
            brand_voice: "Playful".into(),
            ..Default::default()
        };
        product.merge_patch(ProductPatch {
            title: Some("Widget".into()),
            price: Some("R99.00".into()),
            ..Default::default()
        });
        assert_eq!(product.title, "Widget");
        assert_eq!(product.price, "R99.00");
        assert_eq!(product.description, "Hand-written notes");
        assert_eq!(product.key_features, vec!["durable".to_string()]);
        assert_eq!(product.brand_voice, "Playful");
    }

    #[test]
    fn product_patch_accepts_any_subset_of_keys() {
        let patch: ProductPatch = serde_json::from_str(r#"{"title":"Widget","price":"R99.00"}"#).unwrap();
        assert_eq!(patch.title.as_deref(), Some("Widget"));
        assert_eq!(patch.price.as_deref(), Some("R99.00"));
        assert_eq!(patch.description, None);
        assert_eq!(patch.key_features, None);
        assert_eq!(patch.brand_voice, None);
    }

    #[test]
    fn loading_state_serializes_screaming_snake() {
        assert_eq!(
            serde_json::to_value(LoadingState::GeneratingPersonas).unwrap(),
            serde_json::json!("GENERATING_PERSONAS")
        );
    }
}
