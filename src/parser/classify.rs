// Deciding which declared types are models
//
// The rule is a strategy so the naming heuristic can be swapped for an
// explicit opt-in marker without touching extraction or rendering.

use crate::config::{ClassifierKind, ModelConfig};

/// Decides whether a declaration should become a model block
pub trait ModelClassifier: Send {
    fn is_model(&self, name: &str, doc: Option<&str>) -> bool;
}

/// Accepts capitalized names that don't look like props, state or config types
#[derive(Debug, Clone)]
pub struct NamingHeuristic {
    pinned: Vec<String>,
    excluded_suffixes: Vec<String>,
}

impl NamingHeuristic {
    pub fn new(pinned: Vec<String>, excluded_suffixes: Vec<String>) -> Self {
        Self {
            pinned,
            excluded_suffixes,
        }
    }

    /// Whether a name ends with one of the non-model suffixes
    pub fn has_excluded_suffix(&self, name: &str) -> bool {
        has_excluded_suffix(name, &self.excluded_suffixes)
    }
}

impl Default for NamingHeuristic {
    fn default() -> Self {
        let models = ModelConfig::default();
        Self::new(models.pinned, models.excluded_suffixes)
    }
}

impl ModelClassifier for NamingHeuristic {
    fn is_model(&self, name: &str, _doc: Option<&str>) -> bool {
        if self.pinned.iter().any(|p| p == name) {
            return true;
        }

        let mut chars = name.chars();
        let first = match chars.next() {
            Some(c) => c,
            None => return false,
        };
        if !first.is_ascii_uppercase() {
            return false;
        }

        // IUser, IOrder: interface-prefix convention
        if first == 'I' && chars.next().is_some_and(|c| c.is_ascii_uppercase()) {
            return false;
        }

        !self.has_excluded_suffix(name)
    }
}

/// Accepts only declarations whose doc comment carries a marker tag
#[derive(Debug, Clone)]
pub struct MarkerComment {
    marker: String,
    pinned: Vec<String>,
}

impl MarkerComment {
    pub fn new(marker: impl Into<String>, pinned: Vec<String>) -> Self {
        Self {
            marker: marker.into(),
            pinned,
        }
    }
}

impl ModelClassifier for MarkerComment {
    fn is_model(&self, name: &str, doc: Option<&str>) -> bool {
        if self.pinned.iter().any(|p| p == name) {
            return true;
        }
        doc.is_some_and(|d| d.split_whitespace().any(|word| word == self.marker))
    }
}

/// Build the classifier selected in config
pub fn from_config(models: &ModelConfig) -> Box<dyn ModelClassifier> {
    match models.classifier {
        ClassifierKind::Naming => Box::new(NamingHeuristic::new(
            models.pinned.clone(),
            models.excluded_suffixes.clone(),
        )),
        ClassifierKind::Marker => Box::new(MarkerComment::new(
            models.marker.clone(),
            models.pinned.clone(),
        )),
    }
}

pub(crate) fn has_excluded_suffix(name: &str, suffixes: &[String]) -> bool {
    suffixes.iter().any(|s| name.ends_with(s.as_str()))
}
