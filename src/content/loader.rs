//! Content loader - reads content units from the source directory

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use super::FrontMatter;
use crate::error::{DocumentError, Report};
use crate::Site;

/// A content file with its front matter split from the body
#[derive(Debug, Clone)]
pub struct ContentUnit {
    /// Source file path relative to the content root, `/`-separated
    pub source: String,
    /// Full source file path
    pub full_source: PathBuf,
    pub front_matter: FrontMatter,
    pub body: String,
}

/// Units that loaded, in source path order, plus the files that did not
#[derive(Debug, Default)]
pub struct LoadedUnits {
    pub units: Vec<ContentUnit>,
    pub report: Report,
}

/// Loads content from the source directory
pub struct ContentLoader<'a> {
    site: &'a Site,
    excludes: Vec<glob::Pattern>,
}

impl<'a> ContentLoader<'a> {
    /// Create a new content loader
    pub fn new(site: &'a Site) -> Result<Self> {
        let excludes = site
            .config
            .exclude
            .iter()
            .map(|p| glob::Pattern::new(p).with_context(|| format!("Invalid exclude pattern {:?}", p)))
            .collect::<Result<_>>()?;
        Ok(Self { site, excludes })
    }

    /// Read every content file under the source directory.
    ///
    /// Fails only when the source directory itself cannot be read; bad
    /// individual files are recorded in the returned report.
    pub fn load(&self) -> Result<LoadedUnits> {
        let root = &self.site.source_dir;
        fs::read_dir(root).with_context(|| format!("Cannot read content directory {:?}", root))?;

        let mut loaded = LoadedUnits::default();

        let walker = WalkDir::new(root)
            .follow_links(self.site.config.follow_links)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e
                        .path()
                        .map(|p| self.relative_source(p))
                        .unwrap_or_else(|| root.to_string_lossy().to_string());
                    let io = e
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
                    loaded.report.record(DocumentError::io(path, &io));
                    continue;
                }
            };

            let path = entry.path();
            if !entry.file_type().is_file() || !self.is_content_file(path) {
                continue;
            }

            let source = self.relative_source(path);
            if self.is_excluded(&source) {
                tracing::debug!("Excluded: {}", source);
                continue;
            }

            match self.load_unit(path, source) {
                Ok(unit) => loaded.units.push(unit),
                Err(e) => loaded.report.record(e),
            }
        }

        loaded.units.sort_by(|a, b| a.source.cmp(&b.source));
        tracing::debug!(
            "Loaded {} content units from {:?} ({} failed)",
            loaded.units.len(),
            root,
            loaded.report.len()
        );

        Ok(loaded)
    }

    /// Load a single content unit from a file
    fn load_unit(&self, path: &Path, source: String) -> Result<ContentUnit, DocumentError> {
        let content = fs::read_to_string(path).map_err(|e| DocumentError::io(&source, &e))?;
        let (front_matter, body) =
            FrontMatter::parse(&content).map_err(|e| DocumentError::parse(&source, e.to_string()))?;

        tracing::debug!("Read {} ({} front-matter keys)", source, front_matter.len());

        Ok(ContentUnit {
            full_source: path.to_path_buf(),
            front_matter,
            body: body.to_string(),
            source,
        })
    }

    fn is_content_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| {
                self.site
                    .config
                    .extensions
                    .iter()
                    .any(|ext| ext.eq_ignore_ascii_case(e))
            })
            .unwrap_or(false)
    }

    fn is_excluded(&self, source: &str) -> bool {
        self.excludes.iter().any(|p| p.matches(source))
    }

    /// Path relative to the content root with `/` separators
    fn relative_source(&self, path: &Path) -> String {
        path.strip_prefix(&self.site.source_dir)
            .unwrap_or(path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}
