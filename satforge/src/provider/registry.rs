//! Composite recipe registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::traits::CompositeOp;

/// Registry of the composite recipes a backend provides.
///
/// Populated once at startup. Product configurations reference recipes by
/// identifier; an identifier the registry does not hold resolves to an
/// ordinary `None`, surfaced to callers as a typed per-product outcome.
#[derive(Default, Clone)]
pub struct CompositeRegistry {
    ops: HashMap<String, Arc<dyn CompositeOp>>,
}

impl CompositeRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a recipe under an identifier, replacing any previous
    /// recipe with the same identifier.
    pub fn register(&mut self, id: impl Into<String>, op: Arc<dyn CompositeOp>) {
        self.ops.insert(id.into(), op);
    }

    /// Looks up a recipe by identifier.
    pub fn get(&self, id: &str) -> Option<Arc<dyn CompositeOp>> {
        self.ops.get(id).cloned()
    }

    /// Whether the identifier resolves.
    pub fn contains(&self, id: &str) -> bool {
        self.ops.contains_key(id)
    }

    /// Number of registered recipes.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Registered identifiers, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.ops.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl fmt::Debug for CompositeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}
