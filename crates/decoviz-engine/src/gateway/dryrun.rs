use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use decoviz_contracts::image::ImagePayload;
use image::{ImageFormat, Rgb, RgbImage};
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::{
    EditOutcome, ImageEditRequest, ImageSynthesisRequest, ModelGateway, StructuredTextRequest,
};
use crate::error::{RedesignError, Result};

const DRYRUN_WIDTH: u32 = 64;
const DRYRUN_HEIGHT: u32 = 48;
const DRYRUN_PALETTE_SIZE: usize = 5;

/// Offline gateway. Output depends only on the request, so repeated runs give
/// identical proposals.
#[derive(Debug, Clone, Default)]
pub struct DryrunGateway;

impl DryrunGateway {
    pub fn new() -> Self {
        Self
    }
}

impl ModelGateway for DryrunGateway {
    fn name(&self) -> &str {
        "dryrun"
    }

    fn edit_image(&self, request: &ImageEditRequest) -> Result<EditOutcome> {
        let digest = digest_of(&[request.prompt.as_bytes(), request.image.data.as_bytes()]);
        debug!(model = %request.model, "dryrun edit");
        Ok(EditOutcome::Image(solid_image(&digest, "image/png")?))
    }

    fn synthesize_image(&self, request: &ImageSynthesisRequest) -> Result<Vec<ImagePayload>> {
        (0..request.count.max(1))
            .map(|idx| {
                let digest = digest_of(&[request.prompt.as_bytes(), &idx.to_be_bytes()[..]]);
                solid_image(&digest, &request.mime_type)
            })
            .collect()
    }

    fn generate_json(&self, request: &StructuredTextRequest) -> Result<String> {
        let prompt = request.prompt.as_str();
        let image_data = request
            .image
            .as_ref()
            .map(|image| image.data.as_str())
            .unwrap_or_default();

        if prompt.contains("\"isValid\"") {
            return Ok(json!({
                "isValid": true,
                "lowQuality": false,
                "roomType": "living room",
            })
            .to_string());
        }

        if prompt.contains("\"colors\"") {
            let digest = digest_of(&[image_data.as_bytes()]);
            let colors: Vec<String> = digest
                .chunks(3)
                .take(DRYRUN_PALETTE_SIZE)
                .map(|rgb| format!("#{}", hex::encode_upper(rgb)))
                .collect();
            return Ok(json!({ "colors": colors }).to_string());
        }

        if prompt.contains("\"furnitureRecommendation\"") {
            let tag = hex::encode(&digest_of(&[prompt.as_bytes(), image_data.as_bytes()])[..4]);
            let body = json!({
                "description": format!("Dry-run rendition {tag}: balanced layout, soft light and a calm material mix."),
                "objectsUsed": "Low linen sofa\nOak coffee table\nWool area rug",
                "furnitureRecommendation": "Brass floor lamp\nRattan side chair\nCeramic table vase",
            });
            return Ok(format!("```json\n{body}\n```"));
        }

        Ok("{}".to_string())
    }
}

fn digest_of(chunks: &[&[u8]]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    for chunk in chunks {
        hasher.update(chunk);
    }
    hasher.finalize().to_vec()
}

fn solid_image(digest: &[u8], mime_type: &str) -> Result<ImagePayload> {
    let (format, mime) = if mime_type.eq_ignore_ascii_case("image/jpeg") {
        (ImageFormat::Jpeg, "image/jpeg")
    } else {
        (ImageFormat::Png, "image/png")
    };
    let color = Rgb([digest[0], digest[1], digest[2]]);
    let image = RgbImage::from_pixel(DRYRUN_WIDTH, DRYRUN_HEIGHT, color);
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, format)
        .map_err(|err| RedesignError::InvalidImage(err.to_string()))?;
    Ok(ImagePayload::new(mime, BASE64.encode(out.into_inner())))
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::error::Operation;
    use crate::json::strip_code_fence;

    fn edit(prompt: &str) -> anyhow::Result<ImagePayload> {
        let outcome = DryrunGateway::new().edit_image(&ImageEditRequest {
            operation: Operation::Redesign,
            style: Some("Modern".to_string()),
            model: "dryrun".to_string(),
            image: ImagePayload::new("image/png", "AAAA"),
            prompt: prompt.to_string(),
        })?;
        match outcome {
            EditOutcome::Image(image) => Ok(image),
            other => anyhow::bail!("expected an image, got {other:?}"),
        }
    }

    #[test]
    fn edits_are_deterministic_per_prompt() -> anyhow::Result<()> {
        let first = edit("modern")?;
        assert_eq!(first, edit("modern")?);
        assert_ne!(first, edit("industrial")?);
        let bytes = BASE64.decode(first.data.as_bytes())?;
        assert_eq!(image::guess_format(&bytes)?, ImageFormat::Png);
        Ok(())
    }

    #[test]
    fn synthesis_honours_count_and_mime() -> anyhow::Result<()> {
        let images = DryrunGateway::new().synthesize_image(&ImageSynthesisRequest {
            operation: Operation::MoodBoard,
            style: Some("Modern".to_string()),
            model: "dryrun".to_string(),
            prompt: "mood".to_string(),
            count: 2,
            mime_type: "image/jpeg".to_string(),
            aspect_ratio: "4:3".to_string(),
        })?;
        assert_eq!(images.len(), 2);
        assert_ne!(images[0], images[1]);
        let bytes = BASE64.decode(images[0].data.as_bytes())?;
        assert_eq!(image::guess_format(&bytes)?, ImageFormat::Jpeg);
        Ok(())
    }

    #[test]
    fn structured_answers_follow_the_prompt_keys() -> anyhow::Result<()> {
        let gateway = DryrunGateway::new();
        let ask = |prompt: &str| {
            gateway.generate_json(&StructuredTextRequest {
                operation: Operation::Analysis,
                style: None,
                model: "dryrun".to_string(),
                image: Some(ImagePayload::new("image/png", "AAAA")),
                prompt: prompt.to_string(),
            })
        };

        let analysis: Value = serde_json::from_str(&ask("reply with \"isValid\"")?)?;
        assert_eq!(analysis["isValid"], Value::Bool(true));

        let palette: Value = serde_json::from_str(&ask("reply with \"colors\"")?)?;
        let colors = palette["colors"].as_array().cloned().unwrap_or_default();
        assert_eq!(colors.len(), DRYRUN_PALETTE_SIZE);

        let fenced = ask("reply with \"furnitureRecommendation\"")?;
        assert!(fenced.starts_with("```json"));
        let description: Value = serde_json::from_str(&strip_code_fence(&fenced))?;
        assert!(description["objectsUsed"].as_str().unwrap_or("").contains('\n'));

        assert_eq!(ask("anything else")?, "{}");
        Ok(())
    }
}
