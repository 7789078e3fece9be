use std::time::Instant;

use decoviz_contracts::image::ImagePayload;
use tracing::info;

use crate::config::EngineConfig;
use crate::error::{Operation, RedesignError, Result};
use crate::gateway::{ImageSynthesisRequest, ModelGateway};
use crate::prompts;

pub fn generate_mood_board(
    gateway: &dyn ModelGateway,
    config: &EngineConfig,
    style_label: &str,
) -> Result<ImagePayload> {
    let started = Instant::now();
    let images = gateway.synthesize_image(&ImageSynthesisRequest {
        operation: Operation::MoodBoard,
        style: Some(style_label.to_string()),
        model: config.image_model.clone(),
        prompt: prompts::mood_board(style_label),
        count: 1,
        mime_type: config.mood_board_mime_type.clone(),
        aspect_ratio: config.mood_board_aspect_ratio.clone(),
    })?;
    let board = images
        .into_iter()
        .find(|image| !image.is_empty())
        .ok_or_else(|| RedesignError::GenerationFailed {
            operation: Operation::MoodBoard,
            style: Some(style_label.to_string()),
        })?;
    info!(
        operation = %Operation::MoodBoard,
        style = style_label,
        model = %config.image_model,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "mood board generated"
    );
    Ok(board)
}
