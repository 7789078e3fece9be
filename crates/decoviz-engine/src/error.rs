use std::fmt;

use decoviz_contracts::styles::StyleError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RedesignError>;

/// The model-backed step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Analysis,
    Redesign,
    Refinement,
    MoodBoard,
    Description,
    Palette,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Analysis => "analysis",
            Operation::Redesign => "redesign",
            Operation::Refinement => "refinement",
            Operation::MoodBoard => "mood_board",
            Operation::Description => "description",
            Operation::Palette => "palette",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn style_suffix(style: &Option<String>) -> String {
    match style {
        Some(style) => format!(" for style '{style}'"),
        None => String::new(),
    }
}

#[derive(Error, Debug)]
pub enum RedesignError {
    /// Missing credential or unusable settings; raised before any request.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("the uploaded image is not an interior space")]
    InvalidRoom,

    #[error("the uploaded image is too low quality to analyze")]
    LowQuality,

    #[error("{operation} blocked by content filtering{}", style_suffix(.style))]
    ContentFiltered {
        operation: Operation,
        style: Option<String>,
    },

    #[error("{operation} produced no usable output{}", style_suffix(.style))]
    GenerationFailed {
        operation: Operation,
        style: Option<String>,
    },

    #[error("malformed {operation} response{}: {detail}", style_suffix(.style))]
    MalformedResponse {
        operation: Operation,
        style: Option<String>,
        detail: String,
    },

    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// A refinement was requested without saying what to change.
    #[error("refinement instructions are empty")]
    EmptyInstructions,

    #[error("invalid style: {0}")]
    InvalidStyle(#[from] StyleError),

    #[error("model API request failed ({status}): {body}")]
    Api { status: u16, body: String },

    /// Built with the request URL stripped.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RedesignError {
    pub fn malformed(
        operation: Operation,
        style: Option<&str>,
        detail: impl Into<String>,
    ) -> Self {
        RedesignError::MalformedResponse {
            operation,
            style: style.map(str::to_string),
            detail: detail.into(),
        }
    }

    /// The operation the error is attributed to, when there is one.
    pub fn operation(&self) -> Option<Operation> {
        match self {
            RedesignError::ContentFiltered { operation, .. }
            | RedesignError::GenerationFailed { operation, .. }
            | RedesignError::MalformedResponse { operation, .. } => Some(*operation),
            RedesignError::InvalidRoom | RedesignError::LowQuality => Some(Operation::Analysis),
            _ => None,
        }
    }

    /// Whether the user has to pick a different photo to continue.
    pub fn requires_new_upload(&self) -> bool {
        matches!(
            self,
            RedesignError::InvalidRoom | RedesignError::LowQuality | RedesignError::InvalidImage(_)
        )
    }

    /// The single notice shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            RedesignError::Configuration(detail) => {
                format!("The service is not configured: {detail}")
            }
            RedesignError::InvalidRoom => "No interior space was detected. Please upload a photo \
                 of the room you want to transform."
                .to_string(),
            RedesignError::LowQuality => "We could not analyze the image. Try a sharper photo \
                 or one with better lighting."
                .to_string(),
            RedesignError::ContentFiltered {
                operation: Operation::Refinement,
                ..
            } => "The image could not be refined because of safety filters or an empty model \
                  response. Please try a different instruction."
                .to_string(),
            RedesignError::ContentFiltered { style, .. } => format!(
                "The image could not be generated{} because of safety filters or an empty model \
                 response. Please try again with another image or a different style.",
                style_suffix(style)
            ),
            RedesignError::GenerationFailed {
                operation: Operation::Refinement,
                ..
            } => "Failed to refine the image.".to_string(),
            RedesignError::GenerationFailed {
                operation: Operation::MoodBoard,
                style,
            } => format!("Failed to generate the mood board{}.", style_suffix(style)),
            RedesignError::GenerationFailed { style, .. } => {
                format!("Failed to generate the redesigned image{}.", style_suffix(style))
            }
            RedesignError::MalformedResponse {
                operation: Operation::Palette,
                style,
                ..
            } => format!("Could not extract the color palette{}.", style_suffix(style)),
            RedesignError::MalformedResponse {
                operation: Operation::Description,
                style,
                ..
            } => format!(
                "Could not read the description or objects{}. The model response was not valid JSON.",
                style_suffix(style)
            ),
            RedesignError::MalformedResponse { operation, .. } => {
                format!("The model returned an unreadable {operation} response. Please try again.")
            }
            RedesignError::InvalidImage(detail) => {
                format!("Please upload a valid image file ({detail}).")
            }
            RedesignError::EmptyInstructions => {
                "Describe the change you want before refining.".to_string()
            }
            RedesignError::InvalidStyle(err) => format!("Please choose another style name: {err}."),
            RedesignError::Api { status, .. } => {
                format!("The model service rejected the request (HTTP {status}). Please try again.")
            }
            RedesignError::Transport(_) => {
                "Could not reach the model service. Check your connection and try again."
                    .to_string()
            }
            RedesignError::Io(err) => format!("A local file operation failed: {err}"),
            RedesignError::Json(err) => format!("Could not write the export summary: {err}"),
        }
    }
}
