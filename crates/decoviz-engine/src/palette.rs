use std::time::Instant;

use decoviz_contracts::image::ImagePayload;
use serde::Deserialize;
use tracing::info;

use crate::config::EngineConfig;
use crate::error::{Operation, RedesignError, Result};
use crate::gateway::{ModelGateway, StructuredTextRequest};
use crate::json::parse_model_json;
use crate::prompts;

#[derive(Debug, Deserialize)]
struct PaletteReply {
    colors: Vec<String>,
}

/// `#` followed by exactly three or six hex digits.
pub fn is_hex_color(value: &str) -> bool {
    let Some(digits) = value.strip_prefix('#') else {
        return false;
    };
    matches!(digits.len(), 3 | 6) && digits.chars().all(|ch| ch.is_ascii_hexdigit())
}

/// Extracts the dominant colors of a redesigned image. Any non-conforming
/// entry fails the whole palette; nothing is substituted.
pub fn extract_palette(
    gateway: &dyn ModelGateway,
    config: &EngineConfig,
    image: &ImagePayload,
    style_label: &str,
) -> Result<Vec<String>> {
    let started = Instant::now();
    let text = gateway.generate_json(&StructuredTextRequest {
        operation: Operation::Palette,
        style: Some(style_label.to_string()),
        model: config.text_model.clone(),
        image: Some(image.clone()),
        prompt: prompts::palette(style_label),
    })?;
    let reply: PaletteReply = parse_model_json(&text, Operation::Palette, Some(style_label))?;
    if let Some(bad) = reply.colors.iter().find(|color| !is_hex_color(color)) {
        return Err(RedesignError::malformed(
            Operation::Palette,
            Some(style_label),
            format!("'{bad}' is not a hex color"),
        ));
    }
    info!(
        operation = %Operation::Palette,
        style = style_label,
        model = %config.text_model,
        elapsed_ms = started.elapsed().as_millis() as u64,
        colors = reply.colors.len(),
        "palette extracted"
    );
    Ok(reply.colors)
}
