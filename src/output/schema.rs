// Schema document rendering
//
// Output depends only on the resolved registry, the preamble, the render
// options and the banner timestamp.

use crate::analysis::TypeRegistry;
use crate::error::{Error, Result};
use crate::output::templates::{TemplateEngine, GENERATED_AT_PREFIX};
use crate::parser::{MappedType, PropertyDefinition, RelationshipKind, ScalarType, TypeDefinition};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Renders a resolved registry as a Prisma schema
pub struct SchemaRenderer {
    templates: TemplateEngine,
    include_docs: bool,
}

impl SchemaRenderer {
    pub fn new(include_docs: bool) -> Result<Self> {
        Ok(Self {
            templates: TemplateEngine::new()?,
            include_docs,
        })
    }

    pub fn templates(&self) -> &TemplateEngine {
        &self.templates
    }

    /// Render the full document: preamble, banner, then one block per model
    pub fn render(
        &self,
        registry: &TypeRegistry,
        preamble: &str,
        generated_at: &DateTime<Utc>,
    ) -> Result<String> {
        let mut doc = String::new();
        doc.push_str(preamble.trim_end());
        doc.push_str("\n\n");
        doc.push_str(&self.templates.render_banner(generated_at)?);
        doc.push('\n');

        for def in registry.iter() {
            doc.push('\n');
            doc.push_str(&render_model(def, registry, self.include_docs));
            doc.push('\n');
        }

        Ok(finish(&doc))
    }
}

/// Render one `model` block
pub fn render_model(def: &TypeDefinition, registry: &TypeRegistry, include_docs: bool) -> String {
    let mut lines = Vec::new();
    if include_docs {
        push_doc(&mut lines, def.doc_comment.as_deref(), "");
    }
    lines.push(format!("model {} {{", def.name));

    let declared: HashSet<&str> = def.properties.iter().map(|p| p.name.as_str()).collect();
    let mut indexes = Vec::new();

    if !def.has_id() {
        lines.push("  id String @id @default(uuid())".to_string());
    }

    for prop in &def.properties {
        if include_docs {
            push_doc(&mut lines, prop.doc_comment.as_deref(), "  ");
        }

        match prop.relationship {
            RelationshipKind::None => lines.push(scalar_field(def, prop)),
            RelationshipKind::OneToMany => {
                lines.push(format!("  {} {}[]", prop.name, prop.relates_to));
            }
            RelationshipKind::OneToOne => {
                lines.push(format!("  {} {}{}", prop.name, prop.relates_to, optional_marker(prop)));
            }
            RelationshipKind::ManyToOne => {
                let fk = back_reference(prop, registry, &declared, &mut lines);
                indexes.push(fk);
            }
        }
    }

    if !indexes.is_empty() {
        lines.push(String::new());
        for fk in indexes {
            lines.push(format!("  @@index([{}])", fk));
        }
    }

    lines.push("}".to_string());
    lines.join("\n")
}

/// `name Type[?] @attributes` for a plain scalar
fn scalar_field(def: &TypeDefinition, prop: &PropertyDefinition) -> String {
    let ty = prop.mapped_type;
    let mut line = format!("  {} {}", prop.name, ty);
    if prop.is_optional && !prop.is_id && !ty.list {
        line.push('?');
    }

    let mut attributes = Vec::new();
    if prop.is_id {
        attributes.push("@id");
        match ty.scalar {
            ScalarType::String => attributes.push("@default(uuid())"),
            ScalarType::Int => attributes.push("@default(autoincrement())"),
            _ => {}
        }
    } else if is_unique_field(def, prop) {
        attributes.push("@unique");
    }

    if ty == MappedType::scalar(ScalarType::DateTime) {
        match prop.name.as_str() {
            "createdAt" => attributes.push("@default(now())"),
            "updatedAt" => attributes.push("@updatedAt"),
            _ => {}
        }
    }

    for attribute in attributes {
        line.push(' ');
        line.push_str(attribute);
    }
    line
}

/// Foreign key column plus relation field for a many-to-one back-reference
///
/// Returns the foreign key column name for the trailing index.
fn back_reference(
    prop: &PropertyDefinition,
    registry: &TypeRegistry,
    declared: &HashSet<&str>,
    lines: &mut Vec<String>,
) -> String {
    let (references, key_type) = match registry.get(&prop.relates_to) {
        Some(target) => target.id_field(),
        None => ("id", MappedType::scalar(ScalarType::String)),
    };
    let optional = optional_marker(prop);

    let (fk, relation) = match strip_id_suffix(&prop.name) {
        Some(base) => (prop.name.clone(), base.to_string()),
        None => (format!("{}Id", prop.name), prop.name.clone()),
    };

    // a separately declared field of that name renders itself
    if fk == prop.name || !declared.contains(fk.as_str()) {
        lines.push(format!("  {} {}{}", fk, key_type, optional));
    }

    let relation = if relation != prop.name && declared.contains(relation.as_str()) {
        format!("{}Relation", relation)
    } else {
        relation
    };

    lines.push(format!(
        "  {} {}{} @relation(fields: [{}], references: [{}])",
        relation, prop.relates_to, optional, fk, references
    ));

    fk
}

/// `memberId`, `memberID` and `memberid` all name the `member` key column
fn strip_id_suffix(name: &str) -> Option<&str> {
    let split = name.len().checked_sub(2).filter(|&at| at > 0 && name.is_char_boundary(at))?;
    name[split..].eq_ignore_ascii_case("id").then(|| &name[..split])
}

/// String fields that identify a record on their own
fn is_unique_field(def: &TypeDefinition, prop: &PropertyDefinition) -> bool {
    if prop.mapped_type.scalar != ScalarType::String || prop.mapped_type.list {
        return false;
    }

    match prop.name.as_str() {
        "email" | "phoneNumber" | "externalId" => true,
        name => name == format!("{}Id", lower_first(&def.name)),
    }
}

fn optional_marker(prop: &PropertyDefinition) -> &'static str {
    if prop.is_optional {
        "?"
    } else {
        ""
    }
}

fn push_doc(lines: &mut Vec<String>, doc: Option<&str>, indent: &str) {
    for line in doc.into_iter().flat_map(str::lines) {
        lines.push(format!("{}/// {}", indent, line));
    }
}

fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Trim trailing whitespace and end with exactly one newline
fn finish(doc: &str) -> String {
    let mut out: String = doc
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string();
    out.push('\n');
    out
}

/// Document text without the generation timestamp line
pub fn strip_generation_timestamp(text: &str) -> String {
    text.lines()
        .filter(|line| !line.starts_with(GENERATED_AT_PREFIX))
        .collect::<Vec<_>>()
        .join("\n")
}

/// SHA-256 of the document, ignoring the generation timestamp
pub fn fingerprint(text: &str) -> String {
    let digest = Sha256::digest(strip_generation_timestamp(text).as_bytes());
    format!("{:x}", digest)
}

/// Result of writing the schema file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteOutcome {
    Written,
    /// Same content as the file on disk, apart from the timestamp
    Unchanged,
}

/// Write the schema, replacing the file only once the new text is complete
///
/// On failure the previous file is left as it was.
pub fn write_schema(path: &Path, text: &str) -> Result<WriteOutcome> {
    if let Ok(existing) = fs::read_to_string(path) {
        if fingerprint(&existing) == fingerprint(text) {
            return Ok(WriteOutcome::Unchanged);
        }
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::output_write(path, e))?;
    }

    let staging = staging_path(path);
    fs::write(&staging, text).map_err(|e| Error::output_write(path, e))?;
    if let Err(e) = fs::rename(&staging, path) {
        let _ = fs::remove_file(&staging);
        return Err(Error::output_write(path, e));
    }

    Ok(WriteOutcome::Written)
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
