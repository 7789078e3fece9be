use std::fmt;

use indexmap::IndexMap;

/// What a model is used for in the redesign pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Image in, image out (redesign and refinement).
    Edit,
    /// Prompt in, image out (mood boards).
    Image,
    /// Image and prompt in, JSON text out.
    Text,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::Edit => "edit",
            Capability::Image => "image",
            Capability::Text => "text",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub name: String,
    pub provider: String,
    pub capabilities: Vec<Capability>,
}

impl ModelSpec {
    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: IndexMap<String, ModelSpec>,
}

impl ModelRegistry {
    pub fn new(models: Option<IndexMap<String, ModelSpec>>) -> Self {
        Self {
            models: models.unwrap_or_else(default_models),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ModelSpec> {
        self.models.get(name)
    }

    pub fn by_capability(&self, capability: Capability) -> Vec<ModelSpec> {
        self.models
            .values()
            .filter(|model| model.supports(capability))
            .cloned()
            .collect()
    }

    pub fn ensure(&self, name: &str, capability: Capability) -> Option<ModelSpec> {
        let model = self.get(name)?;
        if model.supports(capability) {
            return Some(model.clone());
        }
        None
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new(None)
    }
}

// First entry per capability is the default.
fn default_models() -> IndexMap<String, ModelSpec> {
    let mut map = IndexMap::new();

    let mut insert = |name: &str, provider: &str, capabilities: &[Capability]| {
        map.insert(
            name.to_string(),
            ModelSpec {
                name: name.to_string(),
                provider: provider.to_string(),
                capabilities: capabilities.to_vec(),
            },
        );
    };

    insert("gemini-2.5-flash-image", "gemini", &[Capability::Edit]);
    insert("imagen-4.0-generate-001", "imagen", &[Capability::Image]);
    insert("gemini-2.5-flash", "gemini", &[Capability::Text]);
    insert("gemini-3-pro-image-preview", "gemini", &[Capability::Edit]);
    insert("imagen-4.0-ultra-generate-001", "imagen", &[Capability::Image]);
    insert("imagen-4.0-fast-generate-001", "imagen", &[Capability::Image]);
    insert("gemini-2.5-pro", "gemini", &[Capability::Text]);
    insert("gemini-2.5-flash-lite", "gemini", &[Capability::Text]);

    map
}

#[cfg(test)]
mod tests {
    use super::{Capability, ModelRegistry};

    #[test]
    fn defaults_cover_every_capability_in_pipeline_order() {
        let registry = ModelRegistry::default();
        assert_eq!(
            registry.by_capability(Capability::Edit)[0].name,
            "gemini-2.5-flash-image"
        );
        assert_eq!(
            registry.by_capability(Capability::Image)[0].name,
            "imagen-4.0-generate-001"
        );
        assert_eq!(
            registry.by_capability(Capability::Text)[0].name,
            "gemini-2.5-flash"
        );
    }

    #[test]
    fn ensure_checks_capability() {
        let registry = ModelRegistry::default();
        assert!(registry.ensure("gemini-2.5-pro", Capability::Text).is_some());
        assert!(registry.ensure("gemini-2.5-pro", Capability::Edit).is_none());
        assert!(registry.ensure("missing", Capability::Text).is_none());
    }
}
