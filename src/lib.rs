//! postmill: load blog posts and drafts, and resolve near-duplicate
//! revisions into a canonical corpus
//!
//! The crate reads a directory of Markdown files with front matter, builds
//! a validated document model, clusters drafts and posts that are revisions
//! of the same article, and exports the canonical documents together with
//! their revision history for a static site generator to render.

pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod resolver;

use anyhow::Result;
use std::path::Path;

use content::Corpus;
use resolver::{Resolution, Resolver};

/// A blog site rooted at a directory
#[derive(Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: std::path::PathBuf,
    /// Source (content root) directory
    pub source_dir: std::path::PathBuf,
    /// Public (output) directory
    pub public_dir: std::path::PathBuf,
}

impl Site {
    /// Create a new site instance from a directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();

        let config = match config::SiteConfig::find(&base_dir) {
            Some(path) => config::SiteConfig::load(&path)?,
            None => config::SiteConfig::default(),
        };

        let source_dir = base_dir.join(&config.source_dir);
        let public_dir = base_dir.join(&config.public_dir);

        Ok(Self {
            config,
            base_dir,
            source_dir,
            public_dir,
        })
    }

    /// Load the corpus snapshot from the source directory
    pub fn load(&self) -> Result<Corpus> {
        Corpus::load(self)
    }

    /// Load and resolve the corpus
    pub fn resolve(&self) -> Result<(Corpus, Resolution)> {
        let corpus = self.load()?;
        let resolution = Resolver::new(&self.config.resolver).resolve(&corpus);
        Ok((corpus, resolution))
    }

    /// Initialize a new site in the base directory
    pub fn init(&self) -> Result<()> {
        commands::init::run(self)
    }

    /// Resolve and write the corpus export
    pub fn generate(&self) -> Result<()> {
        commands::resolve::run(self)
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }

    /// Create a new post or draft, optionally as a revision of `revision_of`
    pub fn new_post(
        &self,
        title: &str,
        layout: Option<&str>,
        path: Option<&str>,
        revision_of: Option<&str>,
    ) -> Result<std::path::PathBuf> {
        commands::new::run(self, title, layout, path, revision_of)
    }
}
