// TypeScript model extraction using tree-sitter

use crate::analysis::{is_nullable, map_type, TypeRegistry};
use crate::error::{Error, Result};
use crate::parser::ast::*;
use crate::parser::classify::ModelClassifier;
use std::path::Path;
use tree_sitter::{Node, Parser};

/// Supported TypeScript grammars
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TsVariant {
    TypeScript,
    Tsx,
}

impl TsVariant {
    /// Detect variant from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "ts" | "mts" | "cts" => Some(Self::TypeScript),
            "tsx" => Some(Self::Tsx),
            _ => None,
        }
    }

    /// Detect variant from a path, defaulting to plain TypeScript
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
            .unwrap_or(Self::TypeScript)
    }
}

/// Extracts model declarations from TypeScript source files
pub struct TypeExtractor {
    ts_parser: Parser,
    tsx_parser: Parser,
    classifier: Box<dyn ModelClassifier>,
}

impl TypeExtractor {
    /// Create an extractor that keeps declarations accepted by `classifier`
    pub fn new(classifier: Box<dyn ModelClassifier>) -> Result<Self> {
        let mut ts_parser = Parser::new();
        let ts_language = tree_sitter_typescript::language_typescript();
        ts_parser.set_language(&ts_language).map_err(|e| {
            Error::parser(format!("Failed to set TypeScript language: {}", e))
        })?;

        let mut tsx_parser = Parser::new();
        let tsx_language = tree_sitter_typescript::language_tsx();
        tsx_parser.set_language(&tsx_language).map_err(|e| {
            Error::parser(format!("Failed to set TSX language: {}", e))
        })?;

        Ok(Self {
            ts_parser,
            tsx_parser,
            classifier,
        })
    }

    /// Extract models from one file into the registry
    ///
    /// Returns the names that replaced an earlier definition of the same name.
    pub fn extract_into(
        &mut self,
        path: &Path,
        source: &str,
        registry: &mut TypeRegistry,
    ) -> Result<Vec<String>> {
        let mut replaced = Vec::new();
        for def in self.extract(path, source)? {
            let name = def.name.clone();
            if let Some(previous) = registry.insert(def) {
                tracing::warn!(
                    model = %name,
                    previous = %previous.source_file.display(),
                    current = %path.display(),
                    "duplicate type name, later declaration wins"
                );
                replaced.push(name);
            }
        }
        Ok(replaced)
    }

    /// Extract models from one file's source text
    pub fn extract(&mut self, path: &Path, source: &str) -> Result<Vec<TypeDefinition>> {
        let parser = match TsVariant::from_path(path) {
            TsVariant::TypeScript => &mut self.ts_parser,
            TsVariant::Tsx => &mut self.tsx_parser,
        };

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| Error::file_read(path, "parser produced no syntax tree"))?;

        let root = tree.root_node();
        if root.has_error() {
            tracing::debug!(
                path = %path.display(),
                "syntax errors, extracting recognizable declarations only"
            );
        }

        let mut defs = Vec::new();
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            self.visit_node(&child, source.as_bytes(), path, &mut defs);
        }
        Ok(defs)
    }

    /// Visit a node and collect model declarations
    fn visit_node(&self, node: &Node, source: &[u8], path: &Path, defs: &mut Vec<TypeDefinition>) {
        match node.kind() {
            "interface_declaration" => {
                if let Some(def) = self.parse_interface(node, source, path) {
                    defs.push(def);
                }
            }
            "type_alias_declaration" => {
                if let Some(def) = self.parse_type_alias(node, source, path) {
                    defs.push(def);
                }
            }
            _ => {
                // export statements, namespaces and the like
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    self.visit_node(&child, source, path, defs);
                }
            }
        }
    }

    /// `interface Member { ... }`
    fn parse_interface(&self, node: &Node, source: &[u8], path: &Path) -> Option<TypeDefinition> {
        let mut def = self.accepted_declaration(node, source, path)?;
        let body = node.child_by_field_name("body")?;
        def.properties = parse_members(&body, source);
        Some(def)
    }

    /// `type Member = { ... }` or `type Customer = Member`
    fn parse_type_alias(&self, node: &Node, source: &[u8], path: &Path) -> Option<TypeDefinition> {
        let value = node.child_by_field_name("value")?;
        let properties = match value.kind() {
            "object_type" => parse_members(&value, source),
            // aliases are not followed, the target gets a placeholder key
            "type_identifier" => vec![PropertyDefinition::synthetic_id()],
            _ => return None,
        };

        let mut def = self.accepted_declaration(node, source, path)?;
        def.properties = properties;
        Some(def)
    }

    /// Name and doc of a declaration, if the classifier accepts it
    fn accepted_declaration(
        &self,
        node: &Node,
        source: &[u8],
        path: &Path,
    ) -> Option<TypeDefinition> {
        let name = node.child_by_field_name("name").map(|n| get_text(&n, source))?;
        let doc = leading_doc(node, source);

        if !self.classifier.is_model(name, doc.as_deref()) {
            tracing::trace!(name, "not a model");
            return None;
        }

        let mut def = TypeDefinition::new(name, path.to_path_buf());
        def.doc_comment = doc;
        Some(def)
    }
}

/// Parse the typed members of an interface or object type body
fn parse_members(body: &Node, source: &[u8]) -> Vec<PropertyDefinition> {
    let mut properties = Vec::new();

    let mut cursor = body.walk();
    for child in body.children(&mut cursor) {
        if child.kind() != "property_signature" {
            continue;
        }
        if let Some(prop) = parse_property(&child, source) {
            properties.push(prop);
        }
    }

    properties
}

/// Parse one `name?: Type` member; members without an annotation are skipped
fn parse_property(node: &Node, source: &[u8]) -> Option<PropertyDefinition> {
    let name = node
        .child_by_field_name("name")
        .map(|n| get_text(&n, source).trim_matches(|c| c == '"' || c == '\''))?;
    let annotation = node.child_by_field_name("type")?;

    let raw = normalize_type(get_text(&annotation, source));
    if raw.is_empty() {
        return None;
    }

    let mut prop = PropertyDefinition::new(name, &raw, map_type(&raw));
    prop.is_optional = has_optional_marker(node) || is_nullable(&raw);
    prop.doc_comment = leading_doc(node, source);
    Some(prop)
}

/// Whether a member is declared with `?`
fn has_optional_marker(node: &Node) -> bool {
    let mut cursor = node.walk();
    let optional = node.children(&mut cursor).any(|c| c.kind() == "?");
    optional
}

/// Annotation text without the colon, on one line
fn normalize_type(annotation: &str) -> String {
    let spelled = annotation.trim_start().trim_start_matches(':').trim();
    let spelled = spelled.trim_start_matches('|').trim();
    spelled.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// JSDoc block directly above a declaration or member
fn leading_doc(node: &Node, source: &[u8]) -> Option<String> {
    let anchor = match node.parent() {
        Some(parent) if parent.kind() == "export_statement" => parent,
        _ => *node,
    };

    let comment = anchor.prev_sibling()?;
    if comment.kind() != "comment" {
        return None;
    }

    // separated by a blank line
    if comment.end_position().row + 1 < anchor.start_position().row {
        return None;
    }

    // trailing comment of whatever came before
    if let Some(before) = comment.prev_sibling() {
        if before.end_position().row == comment.start_position().row {
            return None;
        }
    }

    let text = get_text(&comment, source);
    if !text.starts_with("/**") {
        return None;
    }

    let cleaned = clean_jsdoc(text);
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Get text content of a node
fn get_text<'a>(node: &Node, source: &'a [u8]) -> &'a str {
    std::str::from_utf8(&source[node.byte_range()]).unwrap_or("")
}

/// Strip JSDoc delimiters, keeping one line per non-empty source line
fn clean_jsdoc(comment: &str) -> String {
    comment
        .trim_start_matches("/**")
        .trim_end_matches("*/")
        .lines()
        .map(|line| line.trim().trim_start_matches('*').trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
