mod dryrun;
mod gemini;
#[cfg(test)]
pub(crate) mod scripted;

pub use dryrun::DryrunGateway;
pub use gemini::GeminiGateway;

use decoviz_contracts::image::ImagePayload;

use crate::config::{EngineConfig, GatewayKind};
use crate::error::{Operation, Result};

// `operation` and `style` name the caller, so a backend can attribute its
// own failures.
#[derive(Debug, Clone)]
pub struct ImageEditRequest {
    pub operation: Operation,
    pub style: Option<String>,
    pub model: String,
    pub image: ImagePayload,
    pub prompt: String,
}

#[derive(Debug, Clone)]
pub struct ImageSynthesisRequest {
    pub operation: Operation,
    pub style: Option<String>,
    pub model: String,
    pub prompt: String,
    pub count: u32,
    pub mime_type: String,
    pub aspect_ratio: String,
}

#[derive(Debug, Clone)]
pub struct StructuredTextRequest {
    pub operation: Operation,
    pub style: Option<String>,
    pub model: String,
    pub image: Option<ImagePayload>,
    pub prompt: String,
}

/// What an edit request produced. A missing image is not an error at this
/// layer; callers decide how to classify it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Image(ImagePayload),
    NoImage {
        finish_reason: Option<String>,
        candidate_count: usize,
    },
}

pub trait ModelGateway: Send + Sync {
    fn name(&self) -> &str;
    fn edit_image(&self, request: &ImageEditRequest) -> Result<EditOutcome>;
    fn synthesize_image(&self, request: &ImageSynthesisRequest) -> Result<Vec<ImagePayload>>;
    /// Raw text of the first candidate; it may still be wrapped in a code fence.
    fn generate_json(&self, request: &StructuredTextRequest) -> Result<String>;
}

pub fn gateway_for(config: &EngineConfig) -> Result<Box<dyn ModelGateway>> {
    let gateway: Box<dyn ModelGateway> = match config.gateway {
        GatewayKind::Gemini => Box::new(GeminiGateway::new(&config.api_base)?),
        GatewayKind::Dryrun => Box::new(DryrunGateway::new()),
    };
    Ok(gateway)
}
