// Flat, driver-owned registry of mutation units. Units are constructed and
// registered explicitly by the caller; nothing self-registers, so seeding
// stays fully caller-controlled.

use tracing::debug;

use super::{Category, Transformer};

/// Named collection of mutation units with category-indexed lookup
#[derive(Default)]
pub struct TransformerRegistry {
    entries: Vec<Box<dyn Transformer>>,
}

impl TransformerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unit. Duplicate registrations (same entry name, even the
    /// same configuration) are accepted and enumerated; the registry does
    /// not enforce uniqueness.
    pub fn register_transformer(&mut self, unit: Box<dyn Transformer>) {
        debug!(name = unit.name(), "registered transformer");
        self.entries.push(unit);
    }

    /// All registered units, in registration order
    pub fn transformers(&self) -> impl Iterator<Item = &dyn Transformer> {
        self.entries.iter().map(|unit| unit.as_ref())
    }

    /// Units carrying the given category tag, in registration order
    pub fn transformers_with_category(&self, category: Category) -> Vec<&dyn Transformer> {
        self.entries
            .iter()
            .filter(|unit| unit.categories().contains(&category))
            .map(|unit| unit.as_ref())
            .collect()
    }

    /// Indices of units carrying the category, for drivers that need
    /// mutable access to apply them
    pub fn indices_with_category(&self, category: Category) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, unit)| unit.categories().contains(&category))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut (dyn Transformer + 'static)> {
        self.entries.get_mut(index).map(|unit| unit.as_mut())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
