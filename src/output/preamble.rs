// Preamble recovery from a previously generated schema
//
// Only `generator` and `datasource` blocks are carried over, verbatim. This
// is a pattern match, not a parser for the schema language; the trait keeps
// it replaceable.

use crate::config::OutputConfig;
use crate::error::Result;
use crate::output::TemplateEngine;
use regex::Regex;
use serde::Serialize;
use std::path::Path;

/// Recovers the configuration blocks of an existing schema
pub trait PreambleSource {
    /// Configuration blocks of `existing`, or `None` if there are none
    fn recover(&self, existing: &str) -> Option<String>;
}

/// Finds `generator` / `datasource` blocks with a regular expression
#[derive(Debug, Clone)]
pub struct BlockPatternPreamble {
    pattern: Regex,
}

impl BlockPatternPreamble {
    pub fn new() -> Result<Self> {
        // block header at line start, closing brace back at column 0
        let pattern = Regex::new(r"(?ms)^(?:generator|datasource)\s+\w+\s*\{.*?^\}")?;
        Ok(Self { pattern })
    }
}

impl PreambleSource for BlockPatternPreamble {
    fn recover(&self, existing: &str) -> Option<String> {
        let blocks: Vec<&str> = self.pattern.find_iter(existing).map(|m| m.as_str()).collect();
        if blocks.is_empty() {
            return None;
        }
        Some(blocks.join("\n\n"))
    }
}

/// Where the preamble of a pass came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PreambleOrigin {
    /// Copied from the existing output file
    Preserved,
    /// Rendered from the configured provider
    Default,
}

/// Header text of the schema document
#[derive(Debug, Clone, PartialEq)]
pub struct Preamble {
    pub text: String,
    pub origin: PreambleOrigin,
}

/// Recover the preamble of the current output file, or synthesize one
pub fn load_preamble(
    output: &OutputConfig,
    source: &dyn PreambleSource,
    templates: &TemplateEngine,
) -> Result<Preamble> {
    if output.preserve_preamble {
        let recovered = read_existing(&output.path).and_then(|existing| source.recover(&existing));
        if let Some(text) = recovered {
            return Ok(Preamble {
                text,
                origin: PreambleOrigin::Preserved,
            });
        }
    }

    Ok(Preamble {
        text: templates.render_preamble(&output.provider, &output.url_env)?,
        origin: PreambleOrigin::Default,
    })
}

fn read_existing(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "cannot read existing schema, using default preamble"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const EXISTING: &str = r#"// hand-written header

generator client {
  provider        = "prisma-client-js"
  previewFeatures = ["fullTextSearch"]
}

datasource db {
  provider = "cockroachdb"
  url      = env("COCKROACH_URL")
}

// Generated at: 2024-01-01T00:00:00Z

model Member {
  id String @id @default(uuid())
}
"#;

    #[test]
    fn test_recover_blocks_verbatim() {
        let source = BlockPatternPreamble::new().unwrap();
        let recovered = source.recover(EXISTING).unwrap();

        assert!(recovered.starts_with("generator client {"));
        assert!(recovered.contains(r#"previewFeatures = ["fullTextSearch"]"#));
        assert!(recovered.contains(r#"provider = "cockroachdb""#));
        assert!(recovered.ends_with('}'));
        assert!(!recovered.contains("model Member"));
        assert!(!recovered.contains("hand-written"));
    }

    #[test]
    fn test_recover_miss() {
        let source = BlockPatternPreamble::new().unwrap();
        assert_eq!(source.recover("model Member {\n  id String @id\n}\n"), None);
        assert_eq!(source.recover(""), None);
    }

    fn output_in(dir: &TempDir) -> OutputConfig {
        OutputConfig {
            path: dir.path().join("schema.prisma"),
            provider: "mysql".to_string(),
            ..OutputConfig::default()
        }
    }

    #[test]
    fn test_load_preserves_existing_provider() {
        let dir = TempDir::new().unwrap();
        let output = output_in(&dir);
        fs::write(&output.path, EXISTING).unwrap();

        let templates = TemplateEngine::new().unwrap();
        let preamble = load_preamble(&output, &BlockPatternPreamble::new().unwrap(), &templates).unwrap();

        assert_eq!(preamble.origin, PreambleOrigin::Preserved);
        assert!(preamble.text.contains("cockroachdb"));
        assert!(!preamble.text.contains("mysql"));
    }

    #[test]
    fn test_load_default_when_missing() {
        let dir = TempDir::new().unwrap();
        let output = output_in(&dir);

        let templates = TemplateEngine::new().unwrap();
        let preamble = load_preamble(&output, &BlockPatternPreamble::new().unwrap(), &templates).unwrap();

        assert_eq!(preamble.origin, PreambleOrigin::Default);
        assert!(preamble.text.contains(r#"provider = "mysql""#));
        assert!(preamble.text.contains(r#"env("DATABASE_URL")"#));
    }

    #[test]
    fn test_load_ignores_existing_when_disabled() {
        let dir = TempDir::new().unwrap();
        let mut output = output_in(&dir);
        output.preserve_preamble = false;
        fs::write(&output.path, EXISTING).unwrap();

        let templates = TemplateEngine::new().unwrap();
        let preamble = load_preamble(&output, &BlockPatternPreamble::new().unwrap(), &templates).unwrap();

        assert_eq!(preamble.origin, PreambleOrigin::Default);
        assert!(preamble.text.contains("mysql"));
    }
}
