use serde::de::DeserializeOwned;

use crate::error::{Operation, RedesignError, Result};

/// Removes a surrounding Markdown code fence (with or without a `json` tag)
/// from model text output.
pub fn strip_code_fence(text: &str) -> String {
    let raw = text.trim();
    let Some(inner) = raw.strip_prefix("```") else {
        return raw.to_string();
    };
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    let mut body = inner.trim_start();
    if body
        .get(..4)
        .map(|tag| tag.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
    {
        body = &body[4..];
    }
    body.trim().to_string()
}

/// Strips the fence and decodes `text` as `T`, reporting failures against the
/// operation and style that asked for it.
pub fn parse_model_json<T: DeserializeOwned>(
    text: &str,
    operation: Operation,
    style: Option<&str>,
) -> Result<T> {
    let cleaned = strip_code_fence(text);
    serde_json::from_str(&cleaned)
        .map_err(|err| RedesignError::malformed(operation, style, err.to_string()))
}
