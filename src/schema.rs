use serde_json::{json, Value};

/// Declarative shape of the persona batch, sent as Gemini `responseSchema`
/// so structured-output mode constrains what the model may emit. Mirrors
/// the types in `models.rs`; the decoder still re-validates because the
/// remote service is untrusted input.
pub fn persona_batch_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "generated_personas": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "persona_id": { "type": "STRING" },
                        "name": { "type": "STRING" },
                        "emotional_trigger": { "type": "STRING" },
                        "pain_points": { "type": "ARRAY", "items": { "type": "STRING" } },
                        "tone_style": { "type": "STRING" },
                        "targeting_suggestions": { "type": "ARRAY", "items": { "type": "STRING" } },
                        "meta_ad_assets": {
                            "type": "OBJECT",
                            "properties": {
                                "primary_texts": { "type": "ARRAY", "items": { "type": "STRING" } },
                                "headlines": { "type": "ARRAY", "items": { "type": "STRING" } },
                                "call_to_action": { "type": "STRING" },
                                "landing_page_headline": { "type": "STRING" },
                                "creative_concept": {
                                    "type": "OBJECT",
                                    "properties": {
                                        "type": { "type": "STRING", "enum": ["IMAGE", "VIDEO"] },
                                        "prompt_for_imagen": { "type": "STRING" },
                                        "video_script_draft": { "type": "STRING" },
                                    },
                                    "required": ["type", "prompt_for_imagen"],
                                },
                            },
                            "required": [
                                "primary_texts",
                                "headlines",
                                "call_to_action",
                                "creative_concept",
                                "landing_page_headline",
                            ],
                        },
                    },
                    "required": [
                        "persona_id",
                        "name",
                        "emotional_trigger",
                        "pain_points",
                        "tone_style",
                        "targeting_suggestions",
                        "meta_ad_assets",
                    ],
                },
            },
        },
        "required": ["generated_personas"],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn top_level_requires_the_persona_array() {
        let schema = persona_batch_schema();
        assert_eq!(schema["required"], json!(["generated_personas"]));
        assert_eq!(schema["properties"]["generated_personas"]["type"], "ARRAY");
    }

    #[test]
    fn creative_concept_type_is_enumerated() {
        let schema = persona_batch_schema();
        let concept = &schema["properties"]["generated_personas"]["items"]["properties"]
            ["meta_ad_assets"]["properties"]["creative_concept"];
        assert_eq!(concept["properties"]["type"]["enum"], json!(["IMAGE", "VIDEO"]));
        assert_eq!(concept["required"], json!(["type", "prompt_for_imagen"]));
        // The script draft is deliberately not required: only VIDEO concepts carry one.
        assert!(concept["properties"]["video_script_draft"].is_object());
    }

    #[test]
    fn persona_items_require_every_field_of_the_model() {
        let schema = persona_batch_schema();
        let required = schema["properties"]["generated_personas"]["items"]["required"]
            .as_array()
            .unwrap();
        for field in [
            "persona_id",
            "name",
            "emotional_trigger",
            "pain_points",
            "tone_style",
            "targeting_suggestions",
            "meta_ad_assets",
        ] {
            assert!(required.contains(&json!(field)), "missing required field {field}");
        }
    }
}
