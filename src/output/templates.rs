// Template engine for the fixed parts of the schema document

use crate::error::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use tera::{Context, Tera};

/// First characters of the banner line carrying the generation time
pub const GENERATED_AT_PREFIX: &str = "// Generated at: ";

/// Template engine wrapping Tera with the embedded schema templates
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    /// Create a new template engine with embedded templates
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("preamble.prisma", include_str!("../../templates/preamble.prisma.tera")),
            ("banner.prisma", include_str!("../../templates/banner.prisma.tera")),
        ])?;

        Ok(Self { tera })
    }

    /// Render the default generator and datasource blocks
    pub fn render_preamble(&self, provider: &str, url_env: &str) -> Result<String> {
        let mut context = Context::new();
        context.insert("provider", provider);
        context.insert("url_env", url_env);

        Ok(self.tera.render("preamble.prisma", &context)?.trim_end().to_string())
    }

    /// Render the generated-file banner
    pub fn render_banner(&self, generated_at: &DateTime<Utc>) -> Result<String> {
        let mut context = Context::new();
        context.insert("tool", env!("CARGO_PKG_NAME"));
        context.insert(
            "generated_at",
            &generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        );

        Ok(self.tera.render("banner.prisma", &context)?.trim_end().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_render_preamble() {
        let engine = TemplateEngine::new().unwrap();
        let preamble = engine.render_preamble("sqlite", "APP_DB").unwrap();
        assert!(preamble.starts_with("generator client {"));
        assert!(preamble.contains(r#"provider = "sqlite""#));
        assert!(preamble.contains(r#"url      = env("APP_DB")"#));
        assert!(preamble.ends_with('}'));
    }

    #[test]
    fn test_render_banner() {
        let engine = TemplateEngine::new().unwrap();
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let banner = engine.render_banner(&at).unwrap();
        assert!(banner.contains("prisma-typegen"));
        // preamble-only documents must not look like they hold a model
        assert!(!banner.contains("model "));
        assert!(banner
            .lines()
            .any(|l| l == "// Generated at: 2024-03-01T12:30:00Z"));
    }
}
