use std::time::Instant;

use decoviz_contracts::image::ImagePayload;
use serde::Deserialize;
use tracing::info;

use crate::config::EngineConfig;
use crate::error::{Operation, RedesignError, Result};
use crate::gateway::{ModelGateway, StructuredTextRequest};
use crate::json::parse_model_json;
use crate::prompts;

/// Used when the photo is valid but the model did not name the room.
pub const DEFAULT_ROOM_TYPE: &str = "space";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomAnalysis {
    pub is_valid: bool,
    #[serde(default)]
    pub low_quality: bool,
    #[serde(default)]
    pub room_type: Option<String>,
}

impl RoomAnalysis {
    /// Room type for an accepted photo. A low-quality flag fails the photo
    /// whatever `isValid` said.
    pub fn accepted_room_type(&self) -> Result<String> {
        if self.low_quality {
            return Err(RedesignError::LowQuality);
        }
        if !self.is_valid {
            return Err(RedesignError::InvalidRoom);
        }
        Ok(self
            .room_type
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_ROOM_TYPE)
            .to_string())
    }
}

/// Classifies the upload and returns the detected room type.
pub fn analyze_room(
    gateway: &dyn ModelGateway,
    config: &EngineConfig,
    image: &ImagePayload,
) -> Result<String> {
    let started = Instant::now();
    let text = gateway.generate_json(&StructuredTextRequest {
        operation: Operation::Analysis,
        style: None,
        model: config.text_model.clone(),
        image: Some(image.clone()),
        prompt: prompts::room_analysis(),
    })?;
    let analysis: RoomAnalysis = parse_model_json(&text, Operation::Analysis, None)?;
    let room_type = analysis.accepted_room_type();
    info!(
        operation = %Operation::Analysis,
        model = %config.text_model,
        elapsed_ms = started.elapsed().as_millis() as u64,
        is_valid = analysis.is_valid,
        low_quality = analysis.low_quality,
        "room analyzed"
    );
    room_type
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::scripted::ScriptedGateway;
    use crate::gateway::{EditOutcome, ImageEditRequest, ImageSynthesisRequest};

    struct CannedText(&'static str);

    impl ModelGateway for CannedText {
        fn name(&self) -> &str {
            "canned"
        }

        fn edit_image(&self, _request: &ImageEditRequest) -> Result<EditOutcome> {
            Err(RedesignError::Configuration("unused".to_string()))
        }

        fn synthesize_image(&self, _request: &ImageSynthesisRequest) -> Result<Vec<ImagePayload>> {
            Err(RedesignError::Configuration("unused".to_string()))
        }

        fn generate_json(&self, _request: &StructuredTextRequest) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    fn analyze(reply: &'static str) -> Result<String> {
        analyze_room(
            &CannedText(reply),
            &EngineConfig::default(),
            &ImagePayload::new("image/png", "AAAA"),
        )
    }

    #[test]
    fn valid_room_returns_type() {
        let room = analyze(r#"{"isValid": true, "lowQuality": false, "roomType": "Bedroom"}"#);
        assert_eq!(room.ok().as_deref(), Some("Bedroom"));
    }

    #[test]
    fn missing_room_type_uses_placeholder() {
        let room = analyze(r#"```json
{"isValid": true, "lowQuality": false, "roomType": null}
```"#);
        assert_eq!(room.ok().as_deref(), Some(DEFAULT_ROOM_TYPE));
        let blank = analyze(r#"{"isValid": true, "roomType": "  "}"#);
        assert_eq!(blank.ok().as_deref(), Some(DEFAULT_ROOM_TYPE));
    }

    #[test]
    fn invalid_and_low_quality_are_rejected() {
        assert!(matches!(
            analyze(r#"{"isValid": false, "lowQuality": false, "roomType": null}"#),
            Err(RedesignError::InvalidRoom)
        ));
        assert!(matches!(
            analyze(r#"{"isValid": true, "lowQuality": true, "roomType": "Kitchen"}"#),
            Err(RedesignError::LowQuality)
        ));
        assert!(matches!(
            analyze(r#"{"isValid": false, "lowQuality": true, "roomType": null}"#),
            Err(RedesignError::LowQuality)
        ));
    }

    #[test]
    fn analysis_request_is_tagged_without_style() -> anyhow::Result<()> {
        let gateway = ScriptedGateway::new();
        let room = analyze_room(
            &gateway,
            &EngineConfig::default(),
            &ImagePayload::new("image/png", "AAAA"),
        )?;
        assert_eq!(room, "living room");
        assert_eq!(gateway.tags(), vec![(Operation::Analysis, None)]);
        Ok(())
    }

    #[test]
    fn malformed_analysis_is_reported() {
        assert!(matches!(
            analyze("the room looks nice"),
            Err(RedesignError::MalformedResponse {
                operation: Operation::Analysis,
                ..
            })
        ));
        assert!(matches!(
            analyze(r#"{"lowQuality": false}"#),
            Err(RedesignError::MalformedResponse { .. })
        ));
    }
}
