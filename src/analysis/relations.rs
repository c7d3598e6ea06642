// Relationship inference across the whole registry
//
// Runs once per pass after every file has been extracted: a reference can
// only be promoted once its target is known to be a model.

use crate::analysis::TypeRegistry;
use crate::parser::{has_excluded_suffix, RelationshipKind, TypeDefinition};
use serde::Serialize;
use std::collections::HashSet;

/// Capitalized spellings of built-in types that are never relations
const BUILTIN_TYPES: &[&str] = &["String", "Number", "Boolean", "Date"];

/// Counts from one resolution run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolveStats {
    /// Candidates whose target is a known model
    pub promoted: usize,
    /// Candidates left as plain scalars because the target is unknown
    pub degraded: usize,
    /// One-to-many fields that found a back-reference
    pub paired: usize,
}

/// Detect relationship candidates and promote the ones that point at models
pub fn resolve(registry: &mut TypeRegistry, excluded_suffixes: &[String]) -> ResolveStats {
    mark_candidates(registry, excluded_suffixes);
    let mut stats = prune_unknown_targets(registry);
    stats.paired = pair_back_references(registry);

    tracing::debug!(
        promoted = stats.promoted,
        degraded = stats.degraded,
        paired = stats.paired,
        "resolved relationships"
    );
    stats
}

/// Classify a raw type spelling as a relationship candidate
pub fn detect_candidate(
    raw: &str,
    excluded_suffixes: &[String],
) -> Option<(RelationshipKind, String)> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();

    if let Some(element) = array_element(&compact) {
        if is_type_name(element) && !has_excluded_suffix(element, excluded_suffixes) {
            return Some((RelationshipKind::OneToMany, element.to_string()));
        }
        return None;
    }

    if is_type_name(&compact) && !BUILTIN_TYPES.contains(&compact.as_str()) {
        return Some((RelationshipKind::OneToOne, compact));
    }

    None
}

/// Pass 1: mark every property that looks like a reference
fn mark_candidates(registry: &mut TypeRegistry, excluded_suffixes: &[String]) {
    for def in registry.iter_mut() {
        for prop in &mut def.properties {
            prop.clear_relation();
            if let Some((kind, target)) = detect_candidate(&prop.raw_type, excluded_suffixes) {
                prop.relate(kind, &target);
            }
        }
    }
}

/// Pass 2a: candidates pointing outside the registry stay plain scalars
fn prune_unknown_targets(registry: &mut TypeRegistry) -> ResolveStats {
    let known: HashSet<String> = registry.names().map(str::to_string).collect();
    let mut stats = ResolveStats::default();

    for def in registry.iter_mut() {
        for prop in def.properties.iter_mut().filter(|p| p.is_relation()) {
            if known.contains(&prop.relates_to) {
                stats.promoted += 1;
            } else {
                tracing::debug!(
                    model = %def.name,
                    field = %prop.name,
                    target = %prop.relates_to,
                    "reference to unknown type kept as scalar"
                );
                prop.clear_relation();
                stats.degraded += 1;
            }
        }
    }

    stats
}

/// Pass 2b: link each one-to-many field with the field pointing back at its owner
fn pair_back_references(registry: &mut TypeRegistry) -> usize {
    let forward: Vec<(String, usize, String)> = registry
        .iter()
        .flat_map(|def| {
            def.properties
                .iter()
                .enumerate()
                .filter(|(_, p)| p.relationship == RelationshipKind::OneToMany)
                .map(|(i, p)| (def.name.clone(), i, p.relates_to.clone()))
        })
        .collect();

    let mut paired = 0;
    for (owner, index, target) in forward {
        let back_index = match registry.get(&target).and_then(|t| find_back_reference(t, &owner)) {
            Some(i) => i,
            None => continue,
        };

        let forward_name = match registry.get(&owner) {
            Some(def) => def.properties[index].name.clone(),
            None => continue,
        };

        let back_name = match registry.get_mut(&target) {
            Some(def) => {
                let back = &mut def.properties[back_index];
                back.relate(RelationshipKind::ManyToOne, &owner);
                back.relationship_field = Some(forward_name);
                back.name.clone()
            }
            None => continue,
        };

        if let Some(def) = registry.get_mut(&owner) {
            def.properties[index].relationship_field = Some(back_name);
            paired += 1;
        }
    }

    paired
}

/// Find the field on `target` named after `owner` or `owner + "Id"`
fn find_back_reference(target: &TypeDefinition, owner: &str) -> Option<usize> {
    let owner = owner.to_lowercase();
    let owner_id = format!("{}id", owner);

    target.properties.iter().position(|p| {
        let name = p.name.to_lowercase();
        (name == owner || name == owner_id)
            && matches!(p.relationship, RelationshipKind::None | RelationshipKind::OneToOne)
    })
}

/// `Name[]` or `Array<Name>`
fn array_element(compact: &str) -> Option<&str> {
    compact
        .strip_suffix("[]")
        .or_else(|| compact.strip_prefix("Array<").and_then(|s| s.strip_suffix('>')))
}

/// A single capitalized identifier: no unions, intersections or generics
fn is_type_name(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(|c| c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
