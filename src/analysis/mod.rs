// Analysis module: one generation pass from sources to schema file

pub mod mapper;
pub mod registry;
pub mod relations;

pub use mapper::*;
pub use registry::*;
pub use relations::*;

use crate::config::Config;
use crate::error::Result;
use crate::output::{
    load_preamble, write_schema, BlockPatternPreamble, PreambleOrigin, PreambleSource,
    SchemaRenderer, WriteOutcome,
};
use crate::parser::{classify, TypeExtractor};
use crate::source::{DirectorySource, SourceProvider};
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;

/// Result of extracting and resolving one source set
#[derive(Debug, Serialize)]
pub struct Analysis {
    /// Resolved models in rendering order
    pub registry: TypeRegistry,
    /// Number of files handed to the extractor
    pub files_scanned: usize,
    /// Files that could not be read or parsed (path, error message)
    pub failures: Vec<(PathBuf, String)>,
    /// Type names declared more than once; the last declaration won
    pub duplicates: Vec<String>,
    pub relations: ResolveStats,
}

/// Rendered schema text for one pass
#[derive(Debug)]
pub struct Generated {
    pub analysis: Analysis,
    pub preamble: PreambleOrigin,
    pub text: String,
}

/// What a completed pass did
#[derive(Debug, Clone, Serialize)]
pub struct PassReport {
    pub files_scanned: usize,
    pub failures: Vec<(PathBuf, String)>,
    pub duplicates: Vec<String>,
    pub models_emitted: usize,
    pub preamble: PreambleOrigin,
    pub outcome: WriteOutcome,
    pub output: PathBuf,
}

impl PassReport {
    /// One-line summary for the terminal
    pub fn summary(&self) -> String {
        let action = match self.outcome {
            WriteOutcome::Written => "wrote",
            WriteOutcome::Unchanged => "unchanged",
        };
        let mut line = format!(
            "Scanned {} files, emitted {} models ({} {})",
            self.files_scanned,
            self.models_emitted,
            action,
            self.output.display()
        );
        if !self.failures.is_empty() {
            line.push_str(&format!(", {} files skipped", self.failures.len()));
        }
        line
    }
}

/// Drives extraction, resolution and rendering for a source set
pub struct Generator {
    config: Config,
    extractor: TypeExtractor,
    renderer: SchemaRenderer,
    preamble_source: Box<dyn PreambleSource>,
    verbose: bool,
}

impl Generator {
    /// Create a new generator with the given configuration
    pub fn new(config: Config) -> Result<Self> {
        let extractor = TypeExtractor::new(classify::from_config(&config.models))?;
        let renderer = SchemaRenderer::new(config.output.include_docs)?;
        let preamble_source = Box::new(BlockPatternPreamble::new()?);

        Ok(Self {
            config,
            extractor,
            renderer,
            preamble_source,
            verbose: false,
        })
    }

    /// Show a progress bar while extracting
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Replace the regex-based preamble recovery
    pub fn with_preamble_source(mut self, source: Box<dyn PreambleSource>) -> Self {
        self.preamble_source = source;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Extract every source into a fresh registry and resolve relationships
    pub fn analyze(&mut self, sources: &dyn SourceProvider) -> Analysis {
        let files = sources.discover();
        let mut registry = TypeRegistry::new();
        let mut failures = Vec::new();
        let mut duplicates = Vec::new();

        if files.is_empty() {
            tracing::warn!("no source files found, schema will hold the preamble only");
        }

        let progress = if self.verbose {
            let pb = ProgressBar::new(files.len() as u64);
            let style = ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-");
            pb.set_style(style);
            Some(pb)
        } else {
            None
        };

        for path in &files {
            if let Some(ref pb) = progress {
                let msg = path.file_name().unwrap_or_default().to_string_lossy().to_string();
                pb.set_message(msg);
                pb.inc(1);
            }

            let extracted = sources
                .read(path)
                .and_then(|text| self.extractor.extract_into(path, &text, &mut registry));

            match extracted {
                Ok(replaced) => duplicates.extend(replaced),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping file");
                    failures.push((path.clone(), e.to_string()));
                }
            }
        }

        if let Some(pb) = progress {
            pb.finish_with_message("Extraction complete");
        }

        let relations = resolve(&mut registry, &self.config.models.excluded_suffixes);

        Analysis {
            registry,
            files_scanned: files.len(),
            failures,
            duplicates,
            relations,
        }
    }

    /// Produce the schema text for a source set without writing it
    pub fn generate(
        &mut self,
        sources: &dyn SourceProvider,
        generated_at: DateTime<Utc>,
    ) -> Result<Generated> {
        let preamble = load_preamble(
            &self.config.output,
            self.preamble_source.as_ref(),
            self.renderer.templates(),
        )?;
        let analysis = self.analyze(sources);
        let text = self.renderer.render(&analysis.registry, &preamble.text, &generated_at)?;

        Ok(Generated {
            analysis,
            preamble: preamble.origin,
            text,
        })
    }

    /// Run one full pass and write the schema file
    pub fn run_pass(&mut self, sources: &dyn SourceProvider) -> Result<PassReport> {
        let generated = self.generate(sources, Utc::now())?;
        let output = self.config.output.path.clone();
        let outcome = write_schema(&output, &generated.text)?;

        let analysis = generated.analysis;
        Ok(PassReport {
            files_scanned: analysis.files_scanned,
            failures: analysis.failures,
            duplicates: analysis.duplicates,
            models_emitted: analysis.registry.len(),
            preamble: generated.preamble,
            outcome,
            output,
        })
    }

    /// Run one pass over the configured source directory
    pub fn run(&mut self) -> Result<PassReport> {
        let sources = DirectorySource::from_config(&self.config.source)?;
        self.run_pass(&sources)
    }
}
