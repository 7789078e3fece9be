use std::time::{Duration, Instant};

use decoviz_contracts::image::ImagePayload;
use reqwest::blocking::{Client as HttpClient, Response as HttpResponse};
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{
    EditOutcome, ImageEditRequest, ImageSynthesisRequest, ModelGateway, StructuredTextRequest,
};
use crate::config;
use crate::error::{Operation, RedesignError, Result};

const ERROR_BODY_MAX_CHARS: usize = 512;
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Blocking client for the Generative Language REST API.
pub struct GeminiGateway {
    api_base: String,
    http: HttpClient,
    api_key: fn() -> Result<String>,
}

impl GeminiGateway {
    pub fn new(api_base: &str) -> Result<Self> {
        Self::with_key_source(api_base, config::api_key)
    }

    fn with_key_source(api_base: &str, api_key: fn() -> Result<String>) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(None::<Duration>)
            .build()
            .map_err(transport)?;
        Ok(Self {
            api_base: api_base.trim().trim_end_matches('/').to_string(),
            http,
            api_key,
        })
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        let trimmed = model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:{}", self.api_base, model_path, method)
    }

    fn post(
        &self,
        operation: Operation,
        style: Option<&str>,
        model: &str,
        method: &str,
        payload: &Value,
    ) -> Result<Value> {
        let api_key = (self.api_key)()?;
        let endpoint = self.endpoint(model, method);
        let started = Instant::now();
        debug!(%endpoint, %operation, "posting model request");
        let response = self
            .http
            .post(&endpoint)
            .header(API_KEY_HEADER, api_key)
            .json(payload)
            .send()
            .map_err(transport)?;
        let parsed = response_json_or_error(operation, style, response);
        info!(
            %operation,
            method,
            model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            ok = parsed.is_ok(),
            "model request finished"
        );
        parsed
    }
}

impl ModelGateway for GeminiGateway {
    fn name(&self) -> &str {
        "gemini"
    }

    fn edit_image(&self, request: &ImageEditRequest) -> Result<EditOutcome> {
        let payload = json!({
            "contents": [{
                "role": "user",
                "parts": [inline_part(&request.image), { "text": request.prompt }],
            }],
            "generationConfig": {
                "responseModalities": ["IMAGE"],
            },
        });
        let response = self.post(
            request.operation,
            request.style.as_deref(),
            &request.model,
            "generateContent",
            &payload,
        )?;
        Ok(parse_edit_response(&response))
    }

    fn synthesize_image(&self, request: &ImageSynthesisRequest) -> Result<Vec<ImagePayload>> {
        let payload = json!({
            "instances": [{ "prompt": request.prompt }],
            "parameters": {
                "sampleCount": request.count.max(1),
                "outputMimeType": request.mime_type,
                "aspectRatio": request.aspect_ratio,
            },
        });
        let response = self.post(
            request.operation,
            request.style.as_deref(),
            &request.model,
            "predict",
            &payload,
        )?;
        Ok(parse_predict_response(&response, &request.mime_type))
    }

    fn generate_json(&self, request: &StructuredTextRequest) -> Result<String> {
        let mut parts = Vec::new();
        if let Some(image) = request.image.as_ref() {
            parts.push(inline_part(image));
        }
        parts.push(json!({ "text": request.prompt }));
        let payload = json!({
            "contents": [{ "role": "user", "parts": parts }],
            "generationConfig": {
                "responseMimeType": "application/json",
            },
        });
        let response = self.post(
            request.operation,
            request.style.as_deref(),
            &request.model,
            "generateContent",
            &payload,
        )?;
        Ok(parse_text_response(&response))
    }
}

fn inline_part(image: &ImagePayload) -> Value {
    json!({
        "inlineData": {
            "mimeType": image.mime_type,
            "data": image.data,
        }
    })
}

// Request URLs never leave this module inside an error.
fn transport(err: reqwest::Error) -> RedesignError {
    RedesignError::Transport(err.without_url())
}

fn response_json_or_error(
    operation: Operation,
    style: Option<&str>,
    response: HttpResponse,
) -> Result<Value> {
    let status = response.status();
    let body = response.text().map_err(transport)?;
    if !status.is_success() {
        return Err(RedesignError::Api {
            status: status.as_u16(),
            body: truncate_text(&body, ERROR_BODY_MAX_CHARS),
        });
    }
    serde_json::from_str(&body).map_err(|err| {
        RedesignError::malformed(operation, style, format!("invalid JSON payload: {err}"))
    })
}

fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}

fn candidates(response: &Value) -> Vec<Value> {
    response
        .get("candidates")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn candidate_parts(candidate: &Value) -> Vec<Value> {
    candidate
        .get("content")
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// First inline image of the first candidate, or why there was none.
pub(crate) fn parse_edit_response(response: &Value) -> EditOutcome {
    let candidates = candidates(response);
    let Some(first) = candidates.first() else {
        let block_reason = response
            .get("promptFeedback")
            .and_then(|feedback| feedback.get("blockReason"))
            .and_then(Value::as_str)
            .map(str::to_string);
        return EditOutcome::NoImage {
            finish_reason: block_reason,
            candidate_count: 0,
        };
    };

    for part in candidate_parts(first) {
        let Some(inline) = part
            .get("inlineData")
            .or_else(|| part.get("inline_data"))
            .and_then(Value::as_object)
        else {
            continue;
        };
        let data = inline
            .get("data")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if data.is_empty() {
            continue;
        }
        let mime_type = inline
            .get("mimeType")
            .or_else(|| inline.get("mime_type"))
            .and_then(Value::as_str)
            .unwrap_or("image/png");
        return EditOutcome::Image(ImagePayload::new(mime_type, data));
    }

    EditOutcome::NoImage {
        finish_reason: first
            .get("finishReason")
            .and_then(Value::as_str)
            .map(str::to_string),
        candidate_count: candidates.len(),
    }
}

pub(crate) fn parse_predict_response(response: &Value, default_mime: &str) -> Vec<ImagePayload> {
    response
        .get("predictions")
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .filter_map(|row| {
                    let data = row.get("bytesBase64Encoded").and_then(Value::as_str)?;
                    if data.is_empty() {
                        return None;
                    }
                    let mime = row
                        .get("mimeType")
                        .and_then(Value::as_str)
                        .unwrap_or(default_mime);
                    Some(ImagePayload::new(mime, data))
                })
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn parse_text_response(response: &Value) -> String {
    candidates(response)
        .first()
        .map(|candidate| {
            candidate_parts(candidate)
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect::<Vec<&str>>()
                .join("")
        })
        .unwrap_or_default()
}
