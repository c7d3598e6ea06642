// Source discovery: which files feed a pass
//
// The generator only sees `(path, text)` pairs through `SourceProvider`;
// directory traversal and exclude rules live here.

use crate::config::{is_glob, SourceConfig};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Supplies candidate source files and their contents
pub trait SourceProvider {
    /// Candidate files, in a stable order
    fn discover(&self) -> Vec<PathBuf>;

    /// Read one discovered file
    fn read(&self, path: &Path) -> Result<String>;
}

/// One exclude entry from config
#[derive(Debug, Clone)]
enum ExcludeRule {
    Substring(String),
    Glob(glob::Pattern),
}

impl ExcludeRule {
    fn parse(pattern: &str) -> Result<Self> {
        if is_glob(pattern) {
            Ok(ExcludeRule::Glob(glob::Pattern::new(pattern)?))
        } else {
            Ok(ExcludeRule::Substring(pattern.to_string()))
        }
    }

    fn matches(&self, relative: &str) -> bool {
        match self {
            ExcludeRule::Substring(s) => relative.contains(s.as_str()),
            ExcludeRule::Glob(p) => p.matches(relative),
        }
    }
}

/// Walks a directory for TypeScript files
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    extensions: Vec<String>,
    exclude: Vec<ExcludeRule>,
}

impl DirectorySource {
    /// Create a source from the `[source]` config section
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        let exclude = config
            .exclude
            .iter()
            .map(|p| ExcludeRule::parse(p))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            root: config.root.clone(),
            extensions: config.extensions.clone(),
            exclude,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether a path would be picked up by discovery
    pub fn accepts(&self, path: &Path) -> bool {
        let recognized = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(ext)));

        recognized && !self.is_excluded(path)
    }

    /// Whether a path without an extension under the root could hold sources
    ///
    /// Used for directory events, where the path may no longer exist.
    pub fn may_contain(&self, path: &Path) -> bool {
        path.starts_with(&self.root)
            && path != self.root
            && path.extension().is_none()
            && !self.is_excluded(path)
    }

    /// Check if a path should be excluded based on config patterns
    fn is_excluded(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let relative_str = relative.to_string_lossy().replace('\\', "/");
        self.exclude.iter().any(|rule| rule.matches(&relative_str))
    }
}

impl SourceProvider for DirectorySource {
    fn discover(&self) -> Vec<PathBuf> {
        if !self.root.exists() {
            tracing::warn!(root = %self.root.display(), "source directory does not exist");
            return Vec::new();
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %Error::from(e), "skipping unreadable directory entry");
                    continue;
                }
            };

            if entry.file_type().is_file() && self.accepts(entry.path()) {
                files.push(entry.into_path());
            }
        }

        files.sort();
        files
    }

    fn read(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e.to_string()))
    }
}

/// Sources held in memory, discovered in insertion order
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: Vec<(PathBuf, String)>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file
    pub fn with_file(mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.files.push((path.into(), text.into()));
        self
    }
}

impl SourceProvider for MemorySource {
    fn discover(&self) -> Vec<PathBuf> {
        self.files.iter().map(|(p, _)| p.clone()).collect()
    }

    fn read(&self, path: &Path) -> Result<String> {
        self.files
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, text)| text.clone())
            .ok_or_else(|| Error::file_read(path, "no such in-memory file"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn source_for(root: &Path, exclude: &[&str]) -> DirectorySource {
        let config = SourceConfig {
            root: root.to_path_buf(),
            exclude: exclude.iter().map(|s| s.to_string()).collect(),
            ..SourceConfig::default()
        };
        DirectorySource::from_config(&config).unwrap()
    }

    #[test]
    fn test_discover_sorted_ts_files() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("models")).unwrap();
        fs::write(dir.path().join("models/visit.ts"), "").unwrap();
        fs::write(dir.path().join("models/member.ts"), "").unwrap();
        fs::write(dir.path().join("App.tsx"), "").unwrap();
        fs::write(dir.path().join("util.js"), "").unwrap();
        fs::write(dir.path().join("notes.md"), "").unwrap();

        let files = source_for(dir.path(), &[]).discover();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["App.tsx", "models/member.ts", "models/visit.ts"]);
    }

    #[test]
    fn test_discover_excludes_substrings() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        fs::write(dir.path().join("node_modules/pkg/index.d.ts"), "").unwrap();
        fs::write(dir.path().join("member.ts"), "").unwrap();

        let files = source_for(dir.path(), &["node_modules"]).discover();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("member.ts"));
    }

    #[test]
    fn test_discover_excludes_globs() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("member.ts"), "").unwrap();
        fs::write(dir.path().join("member.test.ts"), "").unwrap();

        let files = source_for(dir.path(), &["*.test.ts"]).discover();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("member.ts"));
    }

    #[test]
    fn test_missing_root_yields_nothing() {
        let source = source_for(Path::new("/nonexistent/prisma-typegen/src"), &[]);
        assert!(source.discover().is_empty());
    }

    #[test]
    fn test_accepts() {
        let source = source_for(Path::new("/app/src"), &["generated"]);
        assert!(source.accepts(Path::new("/app/src/member.ts")));
        assert!(source.accepts(Path::new("/app/src/Member.TSX")));
        assert!(!source.accepts(Path::new("/app/src/member.js")));
        assert!(!source.accepts(Path::new("/app/src/generated/member.ts")));
    }

    #[test]
    fn test_may_contain() {
        let source = source_for(Path::new("/app/src"), &["node_modules"]);
        assert!(source.may_contain(Path::new("/app/src/models")));
        assert!(source.may_contain(Path::new("/app/src/models/legacy")));
        assert!(!source.may_contain(Path::new("/app/src")));
        assert!(!source.may_contain(Path::new("/app/src/node_modules")));
        assert!(!source.may_contain(Path::new("/app/src/models/member.ts")));
        assert!(!source.may_contain(Path::new("/elsewhere/models")));
    }

    #[test]
    fn test_read_failure_names_path() {
        let dir = TempDir::new().unwrap();
        let source = source_for(dir.path(), &[]);
        let err = source.read(&dir.path().join("missing.ts")).unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
        assert!(err.to_string().contains("missing.ts"));
    }

    #[test]
    fn test_memory_source() {
        let source = MemorySource::new()
            .with_file("b.ts", "interface B {}")
            .with_file("a.ts", "interface A {}");
        assert_eq!(source.discover(), vec![PathBuf::from("b.ts"), PathBuf::from("a.ts")]);
        assert_eq!(source.read(Path::new("a.ts")).unwrap(), "interface A {}");
        assert!(source.read(Path::new("c.ts")).is_err());
    }
}
