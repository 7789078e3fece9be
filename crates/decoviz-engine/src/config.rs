use std::env;

use decoviz_contracts::models::{Capability, ModelSelector};
use tracing::warn;

use crate::error::{RedesignError, Result};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const MOOD_BOARD_ASPECT_RATIO: &str = "4:3";
pub const MOOD_BOARD_MIME_TYPE: &str = "image/jpeg";

/// Checked in order; the first non-blank value wins.
pub const API_KEY_VARS: [&str; 3] = ["GEMINI_API_KEY", "GOOGLE_API_KEY", "API_KEY"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GatewayKind {
    #[default]
    Gemini,
    Dryrun,
}

impl GatewayKind {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "gemini" => Some(GatewayKind::Gemini),
            "dryrun" | "dry-run" | "offline" => Some(GatewayKind::Dryrun),
            _ => None,
        }
    }
}

/// Values given on the command line; they win over the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub dryrun: bool,
    pub edit_model: Option<String>,
    pub image_model: Option<String>,
    pub text_model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub api_base: String,
    pub gateway: GatewayKind,
    pub edit_model: String,
    pub image_model: String,
    pub text_model: String,
    pub mood_board_aspect_ratio: String,
    pub mood_board_mime_type: String,
    /// Model fallbacks taken while resolving, already logged.
    pub warnings: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::resolve_with(|_| None, &ConfigOverrides::default())
    }
}

impl EngineConfig {
    pub fn from_env(overrides: &ConfigOverrides) -> Self {
        Self::resolve_with(non_empty_env, overrides)
    }

    /// Builds the config from `lookup` instead of the process environment.
    pub fn resolve_with<F>(lookup: F, overrides: &ConfigOverrides) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut warnings = Vec::new();

        let api_base = lookup("GEMINI_API_BASE")
            .map(|value| value.trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let gateway = if overrides.dryrun {
            GatewayKind::Dryrun
        } else {
            match lookup("DECOVIZ_GATEWAY") {
                Some(raw) => GatewayKind::parse(&raw).unwrap_or_else(|| {
                    let message = format!("Unknown gateway '{raw}'; using gemini.");
                    warn!(gateway = %raw, "{message}");
                    warnings.push(message);
                    GatewayKind::Gemini
                }),
                None => GatewayKind::Gemini,
            }
        };

        let selector = ModelSelector::new(None);
        let mut pick = |flag: &Option<String>, var: &str, capability: Capability| {
            let requested = flag
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
                .or_else(|| lookup(var));
            match selector.select(requested.as_deref(), capability) {
                Ok(selection) => {
                    if let Some(reason) = selection.fallback_reason {
                        warn!(
                            capability = %capability,
                            model = %selection.model.name,
                            "{reason}"
                        );
                        warnings.push(reason);
                    }
                    selection.model.name
                }
                Err(reason) => {
                    warn!(capability = %capability, "{reason}");
                    warnings.push(reason);
                    requested.unwrap_or_default()
                }
            }
        };
        let edit_model = pick(&overrides.edit_model, "DECOVIZ_EDIT_MODEL", Capability::Edit);
        let image_model = pick(&overrides.image_model, "DECOVIZ_IMAGE_MODEL", Capability::Image);
        let text_model = pick(&overrides.text_model, "DECOVIZ_TEXT_MODEL", Capability::Text);

        Self {
            api_base,
            gateway,
            edit_model,
            image_model,
            text_model,
            mood_board_aspect_ratio: MOOD_BOARD_ASPECT_RATIO.to_string(),
            mood_board_mime_type: MOOD_BOARD_MIME_TYPE.to_string(),
            warnings,
        }
    }
}

pub(crate) fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Reads the credential at call time. It is never cached on the config.
pub fn api_key() -> Result<String> {
    api_key_with(non_empty_env)
}

pub fn api_key_with<F>(lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    API_KEY_VARS
        .iter()
        .find_map(|key| lookup(key).filter(|value| !value.trim().is_empty()))
        .ok_or_else(|| {
            RedesignError::Configuration(format!("{} not set", API_KEY_VARS.join(" or ")))
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_use_catalog_models() {
        let config = EngineConfig::default();
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.gateway, GatewayKind::Gemini);
        assert_eq!(config.edit_model, "gemini-2.5-flash-image");
        assert_eq!(config.image_model, "imagen-4.0-generate-001");
        assert_eq!(config.text_model, "gemini-2.5-flash");
        assert_eq!(config.mood_board_aspect_ratio, "4:3");
        assert_eq!(config.mood_board_mime_type, "image/jpeg");
        assert!(config.warnings.is_empty());
    }

    #[test]
    fn environment_and_flags_are_layered() {
        let lookup = lookup_from(&[
            ("GEMINI_API_BASE", "http://localhost:9000/v1/ "),
            ("DECOVIZ_GATEWAY", "dryrun"),
            ("DECOVIZ_TEXT_MODEL", "gemini-2.5-pro"),
            ("DECOVIZ_IMAGE_MODEL", "imagen-4.0-fast-generate-001"),
        ]);
        let overrides = ConfigOverrides {
            text_model: Some("gemini-2.5-flash-lite".to_string()),
            ..ConfigOverrides::default()
        };
        let config = EngineConfig::resolve_with(lookup, &overrides);
        assert_eq!(config.api_base, "http://localhost:9000/v1");
        assert_eq!(config.gateway, GatewayKind::Dryrun);
        assert_eq!(config.text_model, "gemini-2.5-flash-lite");
        assert_eq!(config.image_model, "imagen-4.0-fast-generate-001");
    }

    #[test]
    fn unknown_or_mismatched_models_fall_back_with_warning() {
        let lookup = lookup_from(&[
            ("DECOVIZ_EDIT_MODEL", "imagen-4.0-generate-001"),
            ("DECOVIZ_GATEWAY", "carrier-pigeon"),
        ]);
        let config = EngineConfig::resolve_with(lookup, &ConfigOverrides::default());
        assert_eq!(config.edit_model, "gemini-2.5-flash-image");
        assert_eq!(config.gateway, GatewayKind::Gemini);
        assert_eq!(config.warnings.len(), 2);
        assert!(config.warnings.iter().any(|warning| warning.contains("capability 'edit'")));
    }

    #[test]
    fn blank_values_count_as_absent() {
        let lookup = lookup_from(&[("GEMINI_API_BASE", "   "), ("DECOVIZ_TEXT_MODEL", "")]);
        let config = EngineConfig::resolve_with(lookup, &ConfigOverrides::default());
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.text_model, "gemini-2.5-flash");
        assert!(config.warnings.is_empty());
    }

    #[test]
    fn api_key_lookup_order() {
        let key = api_key_with(lookup_from(&[("API_KEY", "c"), ("GOOGLE_API_KEY", "b")]));
        assert_eq!(key.ok().as_deref(), Some("b"));

        let key = api_key_with(lookup_from(&[("GEMINI_API_KEY", " "), ("API_KEY", "c")]));
        assert_eq!(key.ok().as_deref(), Some("c"));

        let missing = api_key_with(lookup_from(&[]));
        assert!(matches!(missing, Err(RedesignError::Configuration(_))));
    }
}
