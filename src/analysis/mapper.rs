// Mapping TypeScript type spellings to Prisma scalars

use crate::parser::{MappedType, ScalarType};

/// Map a raw type annotation to a scalar type
///
/// Lookups ignore whitespace, so `Record<string,any>` and
/// `Record<string, any>` map the same way. Unions prefer String, then Int,
/// then fall back to Json; spellings nothing else recognizes become String.
pub fn map_type(raw: &str) -> MappedType {
    let compact = compact(raw);

    if let Some(mapped) = lookup(&compact) {
        return mapped;
    }

    let members = split_union(raw);
    if members.len() > 1 {
        return map_union(&members);
    }

    if is_container(&compact) {
        return MappedType::scalar(ScalarType::Json);
    }

    MappedType::scalar(ScalarType::String)
}

/// Whether a union spelling admits `null` or `undefined`
pub fn is_nullable(raw: &str) -> bool {
    let members = split_union(raw);
    members.len() > 1 && members.iter().any(|m| is_nullish(m))
}

/// Split a spelling on top-level `|`, ignoring pipes nested in brackets
pub fn split_union(raw: &str) -> Vec<&str> {
    split_top_level(raw, '|')
}

/// Split a spelling on a separator that is not nested in `<>`, `()`, `[]` or `{}`
pub(crate) fn split_top_level(raw: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;

    for (i, c) in raw.char_indices() {
        match c {
            '<' | '(' | '[' | '{' => depth += 1,
            // `=>` in function types is not a closing bracket
            '>' if raw[..i].ends_with('=') => {}
            '>' | ')' | ']' | '}' => depth -= 1,
            c if c == sep && depth == 0 => {
                parts.push(raw[start..i].trim());
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(raw[start..].trim());

    // a leading `|` in multi-line unions leaves an empty first member
    parts.into_iter().filter(|p| !p.is_empty()).collect()
}

fn map_union(members: &[&str]) -> MappedType {
    let present: Vec<&str> = members.iter().copied().filter(|m| !is_nullish(m)).collect();

    if present.len() == 1 {
        return map_type(present[0]);
    }

    if present.iter().any(|m| *m == "string" || is_string_literal(m)) {
        return MappedType::scalar(ScalarType::String);
    }

    if present.iter().any(|m| *m == "number" || is_numeric_literal(m)) {
        return MappedType::scalar(ScalarType::Int);
    }

    MappedType::scalar(ScalarType::Json)
}

fn lookup(compact: &str) -> Option<MappedType> {
    let scalar = match compact {
        "string" | "String" => ScalarType::String,
        "number" | "Number" => ScalarType::Int,
        "bigint" | "BigInt" => ScalarType::BigInt,
        "boolean" | "Boolean" => ScalarType::Boolean,
        "Date" | "DateTime" => ScalarType::DateTime,
        "Buffer" | "Uint8Array" | "ArrayBuffer" => ScalarType::Bytes,
        "any" | "object" | "Object" | "Record<string,any>" | "Record<string,unknown>"
        | "{[key:string]:any}" => ScalarType::Json,
        "unknown" => ScalarType::String,
        _ => return lookup_list(compact),
    };
    Some(MappedType::scalar(scalar))
}

fn lookup_list(compact: &str) -> Option<MappedType> {
    let element = compact
        .strip_suffix("[]")
        .or_else(|| compact.strip_prefix("Array<").and_then(|s| s.strip_suffix('>')))?;

    let scalar = match element {
        "string" => ScalarType::String,
        "number" => ScalarType::Int,
        "bigint" => ScalarType::BigInt,
        "boolean" => ScalarType::Boolean,
        "Date" => ScalarType::DateTime,
        _ => return None,
    };
    Some(MappedType::list(scalar))
}

/// Arrays, generics, tuples and inline object types
fn is_container(compact: &str) -> bool {
    compact.ends_with("[]")
        || compact.contains('<')
        || compact.starts_with('[')
        || compact.starts_with('{')
}

fn is_nullish(member: &str) -> bool {
    matches!(member, "null" | "undefined")
}

fn is_string_literal(member: &str) -> bool {
    let quoted = |q: char| member.len() >= 2 && member.starts_with(q) && member.ends_with(q);
    quoted('\'') || quoted('"') || quoted('`')
}

fn is_numeric_literal(member: &str) -> bool {
    member.trim_start_matches('-').parse::<f64>().is_ok()
}

fn compact(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}
