use std::sync::Mutex;

use decoviz_contracts::image::ImagePayload;

use super::{
    DryrunGateway, EditOutcome, ImageEditRequest, ImageSynthesisRequest, ModelGateway,
    StructuredTextRequest,
};
use crate::error::{Operation, Result};

type EditFn = Box<dyn Fn(&ImageEditRequest) -> Result<EditOutcome> + Send + Sync>;
type SynthFn = Box<dyn Fn(&ImageSynthesisRequest) -> Result<Vec<ImagePayload>> + Send + Sync>;
type TextFn = Box<dyn Fn(&StructuredTextRequest) -> Result<String> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Edit { model: String, prompt: String },
    Synthesize { model: String, prompt: String },
    Text { model: String, prompt: String },
}

#[derive(Default)]
pub(crate) struct ScriptedGateway {
    edit: Option<EditFn>,
    synth: Option<SynthFn>,
    text: Option<TextFn>,
    calls: Mutex<Vec<Call>>,
    tags: Mutex<Vec<(Operation, Option<String>)>>,
    fallback: DryrunGateway,
}

impl ScriptedGateway {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on_edit<F>(mut self, f: F) -> Self
    where
        F: Fn(&ImageEditRequest) -> Result<EditOutcome> + Send + Sync + 'static,
    {
        self.edit = Some(Box::new(f));
        self
    }

    pub(crate) fn on_synthesize<F>(mut self, f: F) -> Self
    where
        F: Fn(&ImageSynthesisRequest) -> Result<Vec<ImagePayload>> + Send + Sync + 'static,
    {
        self.synth = Some(Box::new(f));
        self
    }

    pub(crate) fn on_text<F>(mut self, f: F) -> Self
    where
        F: Fn(&StructuredTextRequest) -> Result<String> + Send + Sync + 'static,
    {
        self.text = Some(Box::new(f));
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Operation and style of every request, in call order.
    pub(crate) fn tags(&self) -> Vec<(Operation, Option<String>)> {
        self.tags
            .lock()
            .map(|tags| tags.clone())
            .unwrap_or_default()
    }

    fn record(&self, call: Call, operation: Operation, style: &Option<String>) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        if let Ok(mut tags) = self.tags.lock() {
            tags.push((operation, style.clone()));
        }
    }
}

impl ModelGateway for ScriptedGateway {
    fn name(&self) -> &str {
        "scripted"
    }

    fn edit_image(&self, request: &ImageEditRequest) -> Result<EditOutcome> {
        self.record(
            Call::Edit {
                model: request.model.clone(),
                prompt: request.prompt.clone(),
            },
            request.operation,
            &request.style,
        );
        match self.edit.as_ref() {
            Some(f) => f(request),
            None => self.fallback.edit_image(request),
        }
    }

    fn synthesize_image(&self, request: &ImageSynthesisRequest) -> Result<Vec<ImagePayload>> {
        self.record(
            Call::Synthesize {
                model: request.model.clone(),
                prompt: request.prompt.clone(),
            },
            request.operation,
            &request.style,
        );
        match self.synth.as_ref() {
            Some(f) => f(request),
            None => self.fallback.synthesize_image(request),
        }
    }

    fn generate_json(&self, request: &StructuredTextRequest) -> Result<String> {
        self.record(
            Call::Text {
                model: request.model.clone(),
                prompt: request.prompt.clone(),
            },
            request.operation,
            &request.style,
        );
        match self.text.as_ref() {
            Some(f) => f(request),
            None => self.fallback.generate_json(request),
        }
    }
}
