use std::time::Instant;

use decoviz_contracts::image::ImagePayload;
use decoviz_contracts::styles::Style;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::error::{Operation, RedesignError, Result};
use crate::gateway::{EditOutcome, ImageEditRequest, ModelGateway};
use crate::prompts;

const FILTERED_FINISH_REASONS: [&str; 2] = ["SAFETY", "RECITATION"];

/// Maps an edit that produced no image onto the error taxonomy.
pub fn classify_missing_image(
    operation: Operation,
    style: Option<&str>,
    finish_reason: Option<&str>,
    candidate_count: usize,
) -> RedesignError {
    let filtered = candidate_count == 0
        || finish_reason
            .map(|reason| {
                FILTERED_FINISH_REASONS
                    .iter()
                    .any(|blocked| reason.eq_ignore_ascii_case(blocked))
            })
            .unwrap_or(false);
    let style = style.map(str::to_string);
    if filtered {
        RedesignError::ContentFiltered { operation, style }
    } else {
        RedesignError::GenerationFailed { operation, style }
    }
}

fn run_edit(gateway: &dyn ModelGateway, request: ImageEditRequest) -> Result<ImagePayload> {
    let operation = request.operation;
    let style = request.style.as_deref();
    let started = Instant::now();
    let outcome = gateway.edit_image(&request)?;
    let elapsed_ms = started.elapsed().as_millis() as u64;
    match outcome {
        EditOutcome::Image(image) if !image.is_empty() => {
            info!(
                operation = %operation,
                style = style.unwrap_or_default(),
                model = %request.model,
                elapsed_ms,
                "image edited"
            );
            Ok(image)
        }
        EditOutcome::Image(_) => Err(classify_missing_image(operation, style, None, 1)),
        EditOutcome::NoImage {
            finish_reason,
            candidate_count,
        } => {
            warn!(
                operation = %operation,
                style = style.unwrap_or_default(),
                model = %request.model,
                elapsed_ms,
                finish_reason = finish_reason.as_deref().unwrap_or_default(),
                candidate_count,
                "edit returned no image"
            );
            Err(classify_missing_image(
                operation,
                style,
                finish_reason.as_deref(),
                candidate_count,
            ))
        }
    }
}

/// Restyles the original photo, keeping camera and structure, replacing the
/// furnishings.
pub fn generate_redesign(
    gateway: &dyn ModelGateway,
    config: &EngineConfig,
    original: &ImagePayload,
    style: &Style,
    room_type: &str,
    instructions: &str,
) -> Result<ImagePayload> {
    let request = ImageEditRequest {
        operation: Operation::Redesign,
        style: Some(style.label().to_string()),
        model: config.edit_model.clone(),
        image: original.clone(),
        prompt: prompts::redesign(style, room_type, instructions),
    };
    run_edit(gateway, request)
}

/// Applies a localized edit to an already redesigned image.
pub fn refine_image(
    gateway: &dyn ModelGateway,
    config: &EngineConfig,
    current: &ImagePayload,
    instructions: &str,
) -> Result<ImagePayload> {
    let request = ImageEditRequest {
        operation: Operation::Refinement,
        style: None,
        model: config.edit_model.clone(),
        image: current.clone(),
        prompt: prompts::refinement(instructions),
    };
    run_edit(gateway, request)
}

#[cfg(test)]
mod tests {
    use decoviz_contracts::styles::PresetStyle;

    use super::*;
    use crate::gateway::scripted::{Call, ScriptedGateway};

    fn no_image(reason: Option<&str>, count: usize) -> ScriptedGateway {
        let reason = reason.map(str::to_string);
        ScriptedGateway::new().on_edit(move |_| {
            Ok(EditOutcome::NoImage {
                finish_reason: reason.clone(),
                candidate_count: count,
            })
        })
    }

    fn redesign_with(gateway: &ScriptedGateway) -> Result<ImagePayload> {
        generate_redesign(
            gateway,
            &EngineConfig::default(),
            &ImagePayload::new("image/png", "AAAA"),
            &Style::from(PresetStyle::Scandinavian),
            "bedroom",
            "",
        )
    }

    #[test]
    fn redesign_uses_edit_model_and_style_prompt() -> anyhow::Result<()> {
        let gateway = ScriptedGateway::new();
        let image = redesign_with(&gateway)?;
        assert!(!image.is_empty());
        match gateway.calls().as_slice() {
            [Call::Edit { model, prompt }] => {
                assert_eq!(model, "gemini-2.5-flash-image");
                assert!(prompt.contains("STYLE GUIDELINES (Scandinavian)"));
            }
            other => panic!("unexpected calls: {other:?}"),
        }
        assert_eq!(
            gateway.tags(),
            vec![(Operation::Redesign, Some("Scandinavian".to_string()))]
        );
        Ok(())
    }

    #[test]
    fn safety_and_empty_responses_are_content_filtered() {
        for gateway in [
            no_image(Some("SAFETY"), 1),
            no_image(Some("RECITATION"), 1),
            no_image(None, 0),
        ] {
            match redesign_with(&gateway) {
                Err(RedesignError::ContentFiltered { operation, style }) => {
                    assert_eq!(operation, Operation::Redesign);
                    assert_eq!(style.as_deref(), Some("Scandinavian"));
                }
                other => panic!("unexpected result: {other:?}"),
            }
        }
    }

    #[test]
    fn other_finish_reasons_are_generation_failures() {
        assert!(matches!(
            redesign_with(&no_image(Some("STOP"), 1)),
            Err(RedesignError::GenerationFailed {
                operation: Operation::Redesign,
                ..
            })
        ));
        assert!(matches!(
            redesign_with(&no_image(None, 2)),
            Err(RedesignError::GenerationFailed { .. })
        ));
    }

    #[test]
    fn refinement_failures_carry_no_style() {
        let gateway = no_image(Some("SAFETY"), 1);
        let result = refine_image(
            &gateway,
            &EngineConfig::default(),
            &ImagePayload::new("image/png", "AAAA"),
            "swap the sofa",
        );
        assert!(matches!(
            result,
            Err(RedesignError::ContentFiltered {
                operation: Operation::Refinement,
                style: None,
            })
        ));
        match gateway.calls().as_slice() {
            [Call::Edit { prompt, .. }] => assert!(prompt.contains("\"swap the sofa\"")),
            other => panic!("unexpected calls: {other:?}"),
        }
        assert_eq!(gateway.tags(), vec![(Operation::Refinement, None)]);
    }
}
