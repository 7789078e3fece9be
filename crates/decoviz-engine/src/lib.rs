pub mod analyzer;
pub mod codec;
pub mod config;
pub mod describe;
pub mod error;
pub mod export;
pub mod gateway;
pub mod json;
pub mod moodboard;
pub mod orchestrator;
pub mod palette;
pub mod prompts;
pub mod redesign;

pub use config::{ConfigOverrides, EngineConfig, GatewayKind};
pub use error::{Operation, RedesignError, Result};
pub use gateway::{gateway_for, ModelGateway};
pub use orchestrator::{InitialBatch, RedesignEngine};
