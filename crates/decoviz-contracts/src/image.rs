use serde::{Deserialize, Serialize};

pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";

/// Base64-encoded inline image, the shape every model request carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePayload {
    pub mime_type: String,
    pub data: String,
}

impl ImagePayload {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.trim().is_empty()
    }
}
