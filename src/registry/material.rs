use super::Named;

slotmap::new_key_type! {
    /// Unique identifier for a material in a registry.
    pub struct MaterialId;
}

/// A physical substance, referenced by name only.
///
/// Names starting with `G4_` denote predefined NIST materials that the
/// simulation resolves on load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialData {
    pub name: String,
}

impl MaterialData {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    #[must_use]
    pub fn is_predefined(&self) -> bool {
        self.name.starts_with("G4_")
    }
}

impl Named for MaterialData {
    fn name(&self) -> &str {
        &self.name
    }
}
