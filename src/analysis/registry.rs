// Type registry: the per-pass set of extracted models

use crate::parser::TypeDefinition;
use indexmap::IndexMap;
use serde::Serialize;

/// Extracted models keyed by name, in first-seen order
///
/// A registry lives for exactly one pass. Re-inserting a name replaces the
/// definition but keeps the slot of its first occurrence, so rendering order
/// only depends on discovery order.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct TypeRegistry {
    types: IndexMap<String, TypeDefinition>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a definition, returning the one it replaced
    pub fn insert(&mut self, def: TypeDefinition) -> Option<TypeDefinition> {
        self.types.insert(def.name.clone(), def)
    }

    pub fn get(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut TypeDefinition> {
        self.types.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Iterate definitions in rendering order
    pub fn iter(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.types.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TypeDefinition> {
        self.types.values_mut()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
