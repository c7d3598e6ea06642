// Model types extracted from TypeScript declarations
//
// These are owned by the type registry for the duration of one pass and are
// serializable so a resolved registry can be dumped for inspection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A model-shaped type declaration (interface or type alias)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TypeDefinition {
    /// Declared type name, also its registry key
    pub name: String,
    /// Members in declaration order
    pub properties: Vec<PropertyDefinition>,
    /// File the declaration was extracted from
    pub source_file: PathBuf,
    /// Leading JSDoc text without delimiters
    pub doc_comment: Option<String>,
}

impl TypeDefinition {
    pub fn new(name: &str, source_file: PathBuf) -> Self {
        Self {
            name: name.to_string(),
            properties: Vec::new(),
            source_file,
            doc_comment: None,
        }
    }

    /// Get a property by exact name
    pub fn property(&self, name: &str) -> Option<&PropertyDefinition> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Whether any property carries the id marker
    pub fn has_id(&self) -> bool {
        self.properties.iter().any(|p| p.is_id)
    }

    /// The primary key field name and its scalar type
    ///
    /// Models without an id property get a synthesized `id String` when
    /// rendered, so that is what references to them point at.
    pub fn id_field(&self) -> (&str, MappedType) {
        self.properties
            .iter()
            .find(|p| p.is_id)
            .map(|p| (p.name.as_str(), p.mapped_type))
            .unwrap_or(("id", MappedType::scalar(ScalarType::String)))
    }
}

/// A typed member of a model declaration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyDefinition {
    pub name: String,
    /// Type annotation as written in source
    pub raw_type: String,
    pub mapped_type: MappedType,
    pub is_optional: bool,
    pub is_id: bool,
    pub relationship: RelationshipKind,
    /// Related model name, empty when there is no relationship
    pub relates_to: String,
    /// Back-reference field on the related model, set by resolution
    pub relationship_field: Option<String>,
    pub doc_comment: Option<String>,
}

impl PropertyDefinition {
    pub fn new(name: &str, raw_type: &str, mapped_type: MappedType) -> Self {
        Self {
            name: name.to_string(),
            raw_type: raw_type.to_string(),
            mapped_type,
            is_optional: false,
            is_id: name == "id",
            relationship: RelationshipKind::None,
            relates_to: String::new(),
            relationship_field: None,
            doc_comment: None,
        }
    }

    /// Placeholder key for aliases that point at another type
    pub fn synthetic_id() -> Self {
        let mut prop = Self::new("id", "string", MappedType::scalar(ScalarType::String));
        prop.is_id = true;
        prop
    }

    pub fn is_relation(&self) -> bool {
        self.relationship != RelationshipKind::None
    }

    /// Mark as a relationship candidate (or promoted relationship)
    pub fn relate(&mut self, kind: RelationshipKind, target: &str) {
        self.relationship = kind;
        self.relates_to = target.to_string();
    }

    /// Drop any relationship marking, leaving a plain scalar
    pub fn clear_relation(&mut self) {
        self.relationship = RelationshipKind::None;
        self.relates_to.clear();
        self.relationship_field = None;
    }
}

/// How a property relates to another model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum RelationshipKind {
    #[default]
    None,
    OneToMany,
    OneToOne,
    ManyToOne,
}

/// Prisma scalar types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    String,
    Int,
    BigInt,
    Boolean,
    DateTime,
    Json,
    Bytes,
}

impl ScalarType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarType::String => "String",
            ScalarType::Int => "Int",
            ScalarType::BigInt => "BigInt",
            ScalarType::Boolean => "Boolean",
            ScalarType::DateTime => "DateTime",
            ScalarType::Json => "Json",
            ScalarType::Bytes => "Bytes",
        }
    }
}

/// A scalar type, possibly a list of that scalar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MappedType {
    pub scalar: ScalarType,
    pub list: bool,
}

impl MappedType {
    pub fn scalar(scalar: ScalarType) -> Self {
        Self { scalar, list: false }
    }

    pub fn list(scalar: ScalarType) -> Self {
        Self { scalar, list: true }
    }
}

impl fmt::Display for MappedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.list {
            write!(f, "{}[]", self.scalar.as_str())
        } else {
            f.write_str(self.scalar.as_str())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_named_id_is_id() {
        let prop = PropertyDefinition::new("id", "string", MappedType::scalar(ScalarType::String));
        assert!(prop.is_id);
        let prop = PropertyDefinition::new("memberId", "string", MappedType::scalar(ScalarType::String));
        assert!(!prop.is_id);
    }

    #[test]
    fn test_mapped_type_display() {
        assert_eq!(MappedType::scalar(ScalarType::DateTime).to_string(), "DateTime");
        assert_eq!(MappedType::list(ScalarType::Int).to_string(), "Int[]");
    }

    #[test]
    fn test_id_field_defaults_to_string() {
        let def = TypeDefinition::new("Member", PathBuf::from("member.ts"));
        let (name, ty) = def.id_field();
        assert_eq!(name, "id");
        assert_eq!(ty, MappedType::scalar(ScalarType::String));
    }

    #[test]
    fn test_id_field_uses_declared_key() {
        let mut def = TypeDefinition::new("Invoice", PathBuf::from("invoice.ts"));
        let mut key = PropertyDefinition::new("number", "number", MappedType::scalar(ScalarType::Int));
        key.is_id = true;
        def.properties.push(key);
        let (name, ty) = def.id_field();
        assert_eq!(name, "number");
        assert_eq!(ty.scalar, ScalarType::Int);
    }

    #[test]
    fn test_clear_relation() {
        let mut prop = PropertyDefinition::new("owner", "Person", MappedType::scalar(ScalarType::String));
        prop.relate(RelationshipKind::OneToOne, "Person");
        assert!(prop.is_relation());
        prop.clear_relation();
        assert!(!prop.is_relation());
        assert!(prop.relates_to.is_empty());
    }
}
