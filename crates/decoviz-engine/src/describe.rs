use std::time::Instant;

use decoviz_contracts::image::ImagePayload;
use decoviz_contracts::proposal::DescriptiveContent;
use tracing::info;

use crate::config::EngineConfig;
use crate::error::{Operation, RedesignError, Result};
use crate::gateway::{ModelGateway, StructuredTextRequest};
use crate::json::parse_model_json;
use crate::prompts;

/// Asks for the description and the two object lists of a redesigned image.
/// All three fields must be present and non-blank.
pub fn generate_description(
    gateway: &dyn ModelGateway,
    config: &EngineConfig,
    image: &ImagePayload,
    style_label: &str,
    room_type: &str,
    instructions: &str,
) -> Result<DescriptiveContent> {
    let started = Instant::now();
    let text = gateway.generate_json(&StructuredTextRequest {
        operation: Operation::Description,
        style: Some(style_label.to_string()),
        model: config.text_model.clone(),
        image: Some(image.clone()),
        prompt: prompts::description(style_label, room_type, instructions),
    })?;
    let raw: DescriptiveContent =
        parse_model_json(&text, Operation::Description, Some(style_label))?;
    let content = DescriptiveContent {
        description: raw.description.trim().to_string(),
        objects_used: raw.objects_used.trim().to_string(),
        furniture_recommendation: raw.furniture_recommendation.trim().to_string(),
    };
    for (field, value) in [
        ("description", &content.description),
        ("objectsUsed", &content.objects_used),
        ("furnitureRecommendation", &content.furniture_recommendation),
    ] {
        if value.is_empty() {
            return Err(RedesignError::malformed(
                Operation::Description,
                Some(style_label),
                format!("field `{field}` is empty"),
            ));
        }
    }
    info!(
        operation = %Operation::Description,
        style = style_label,
        model = %config.text_model,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "description generated"
    );
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::scripted::{Call, ScriptedGateway};

    type Tags = Vec<(Operation, Option<String>)>;

    fn describe(
        reply: &'static str,
        instructions: &str,
    ) -> (Result<DescriptiveContent>, Vec<Call>, Tags) {
        let gateway = ScriptedGateway::new().on_text(move |_| Ok(reply.to_string()));
        let result = generate_description(
            &gateway,
            &EngineConfig::default(),
            &ImagePayload::new("image/png", "AAAA"),
            "Modern",
            "living room",
            instructions,
        );
        (result, gateway.calls(), gateway.tags())
    }

    #[test]
    fn fenced_json_is_parsed_and_trimmed() -> anyhow::Result<()> {
        let (result, calls, tags) = describe(
            "```json\n{\"description\": \" Bright and calm. \", \"objectsUsed\": \"Sofa\\nRug\\n\", \"furnitureRecommendation\": \"Lamp\\nShelf\"}\n```",
            "more plants",
        );
        let content = result?;
        assert_eq!(content.description, "Bright and calm.");
        assert_eq!(content.objects_used, "Sofa\nRug");
        assert_eq!(content.furniture_recommendation, "Lamp\nShelf");

        match calls.as_slice() {
            [Call::Text { model, prompt }] => {
                assert_eq!(model, "gemini-2.5-flash");
                assert!(prompt.contains("\"more plants\""));
                assert!(prompt.contains("living room"));
            }
            other => panic!("unexpected calls: {other:?}"),
        }
        assert_eq!(tags, vec![(Operation::Description, Some("Modern".to_string()))]);
        Ok(())
    }

    #[test]
    fn missing_field_is_malformed_and_names_style() {
        let (result, _, _) = describe("{\"description\": \"Nice\", \"objectsUsed\": \"Sofa\"}", "");
        match result {
            Err(err @ RedesignError::MalformedResponse { .. }) => {
                assert!(err.user_message().contains("'Modern'"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn blank_field_and_invalid_json_are_malformed() {
        let (blank, _, _) = describe(
            "{\"description\": \"  \", \"objectsUsed\": \"Sofa\", \"furnitureRecommendation\": \"Lamp\"}",
            "",
        );
        assert!(matches!(
            blank,
            Err(RedesignError::MalformedResponse {
                operation: Operation::Description,
                ..
            })
        ));
        let (garbage, _, _) = describe("Here is your description!", "");
        assert!(matches!(garbage, Err(RedesignError::MalformedResponse { .. })));
    }
}
