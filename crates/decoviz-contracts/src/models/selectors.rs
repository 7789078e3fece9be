use super::registry::{Capability, ModelRegistry, ModelSpec};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    pub model: ModelSpec,
    pub requested: Option<String>,
    pub fallback_reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ModelSelector {
    pub registry: ModelRegistry,
}

impl ModelSelector {
    pub fn new(registry: Option<ModelRegistry>) -> Self {
        Self {
            registry: registry.unwrap_or_default(),
        }
    }

    /// Picks `requested` when the catalog knows it for `capability`, otherwise the
    /// catalog default. A missing request is not a fallback.
    pub fn select(
        &self,
        requested: Option<&str>,
        capability: Capability,
    ) -> Result<ModelSelection, String> {
        let requested = requested.map(str::trim).filter(|value| !value.is_empty());
        let (fallback_reason, requested_text) = if let Some(requested_value) = requested {
            if let Some(model) = self.registry.ensure(requested_value, capability) {
                return Ok(ModelSelection {
                    model,
                    requested: Some(requested_value.to_string()),
                    fallback_reason: None,
                });
            }
            (
                Some(format!(
                    "Requested model '{requested_value}' unavailable for capability '{capability}'."
                )),
                Some(requested_value.to_string()),
            )
        } else {
            (None, None)
        };

        let candidates = self.registry.by_capability(capability);
        let Some(model) = candidates.first().cloned() else {
            return Err(format!(
                "No models available for capability '{capability}'."
            ));
        };
        Ok(ModelSelection {
            model,
            requested: requested_text,
            fallback_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use crate::models::{Capability, ModelRegistry, ModelSelector, ModelSpec};

    fn text_model(name: &str) -> ModelSpec {
        ModelSpec {
            name: name.to_string(),
            provider: "gemini".to_string(),
            capabilities: vec![Capability::Text],
        }
    }

    #[test]
    fn selector_falls_back_when_requested_model_unavailable() {
        let mut models = IndexMap::new();
        models.insert("text-default".to_string(), text_model("text-default"));
        let selection = ModelSelector::new(Some(ModelRegistry::new(Some(models))))
            .select(Some("missing"), Capability::Text)
            .unwrap();
        assert_eq!(selection.model.name, "text-default");
        assert_eq!(selection.requested.as_deref(), Some("missing"));
        assert_eq!(
            selection.fallback_reason.as_deref(),
            Some("Requested model 'missing' unavailable for capability 'text'.")
        );
    }

    #[test]
    fn selector_uses_default_silently_without_request() {
        let selection = ModelSelector::new(None)
            .select(Some("   "), Capability::Edit)
            .unwrap();
        assert_eq!(selection.model.name, "gemini-2.5-flash-image");
        assert!(selection.requested.is_none());
        assert!(selection.fallback_reason.is_none());
    }

    #[test]
    fn selector_honours_known_override() {
        let selection = ModelSelector::new(None)
            .select(Some("imagen-4.0-ultra-generate-001"), Capability::Image)
            .unwrap();
        assert_eq!(selection.model.name, "imagen-4.0-ultra-generate-001");
        assert!(selection.fallback_reason.is_none());
    }

    #[test]
    fn selector_errors_when_no_models_for_capability() {
        let mut models = IndexMap::new();
        models.insert("text-only".to_string(), text_model("text-only"));
        let err = ModelSelector::new(Some(ModelRegistry::new(Some(models))))
            .select(None, Capability::Image)
            .err()
            .unwrap_or_default();
        assert_eq!(err, "No models available for capability 'image'.");
    }
}
