//! Site configuration (_config.yml or _config.toml)

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub author: String,

    // Directory
    pub source_dir: String,
    pub public_dir: String,
    /// Collection whose documents default to draft status
    pub drafts_dir: String,
    /// Collection new posts are written to
    pub posts_dir: String,
    #[serde(default)]
    pub exclude: Vec<String>,
    pub extensions: Vec<String>,
    pub follow_links: bool,

    // Writing
    pub new_post_name: String,
    pub default_layout: String,

    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub output: OutputConfig,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Blog".to_string(),
            author: String::new(),

            source_dir: "source".to_string(),
            public_dir: "public".to_string(),
            drafts_dir: "_drafts".to_string(),
            posts_dir: "_posts".to_string(),
            exclude: Vec::new(),
            extensions: vec!["md".to_string(), "markdown".to_string()],
            follow_links: true,

            new_post_name: ":title.md".to_string(),
            default_layout: "post".to_string(),

            resolver: ResolverConfig::default(),
            output: OutputConfig::default(),
            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a YAML or TOML file, chosen by extension
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config: SiteConfig = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&content)?,
            _ => serde_yaml::from_str(&content)?,
        };
        config.validate()?;
        tracing::debug!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Find `_config.yml`, `_config.yaml` or `_config.toml` in a directory
    pub fn find<P: AsRef<Path>>(base_dir: P) -> Option<std::path::PathBuf> {
        ["_config.yml", "_config.yaml", "_config.toml"]
            .iter()
            .map(|name| base_dir.as_ref().join(name))
            .find(|p| p.exists())
    }

    /// Reject settings the resolver cannot work with
    pub fn validate(&self) -> Result<()> {
        let threshold = self.resolver.threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            bail!(
                "resolver.threshold must be in (0, 1], got {}",
                self.resolver.threshold
            );
        }
        let ratio = self.resolver.min_size_ratio;
        if !(0.0..=1.0).contains(&ratio) {
            bail!("resolver.min_size_ratio must be in [0, 1], got {}", ratio);
        }
        if self.resolver.shingle_size == 0 {
            bail!("resolver.shingle_size must be at least 1");
        }
        if self.resolver.sample_rate == 0 {
            bail!("resolver.sample_rate must be at least 1");
        }
        if self.extensions.is_empty() {
            bail!("extensions must list at least one file extension");
        }
        for pattern in &self.exclude {
            if let Err(e) = glob::Pattern::new(pattern) {
                bail!("Invalid exclude pattern {:?}: {}", pattern, e);
            }
        }
        Ok(())
    }
}

/// How similar two bodies must be, and how a cluster picks its canonical member
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub threshold: f64,
    /// Words per shingle
    pub shingle_size: usize,
    pub metric: SimilarityMetric,
    /// Smaller fingerprint over the larger one; pairs below it never match
    pub min_size_ratio: f64,
    /// Keep one shingle hash in `sample_rate` as a candidate key
    pub sample_rate: u64,
    /// Corpora up to this size are compared pairwise without candidate keys
    pub exhaustive_limit: usize,
    pub canonical: CanonicalPolicy,
    /// Join documents linked through `revision_of` even when bodies diverge
    pub follow_revision_links: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            threshold: 0.8,
            shingle_size: 4,
            metric: SimilarityMetric::Containment,
            min_size_ratio: 0.5,
            sample_rate: 4,
            exhaustive_limit: 64,
            canonical: CanonicalPolicy::Latest,
            follow_revision_links: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SimilarityMetric {
    /// Shared shingles over the smaller set
    Containment,
    /// Shared shingles over the union
    Jaccard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CanonicalPolicy {
    /// Last member in revision order
    Latest,
    /// Last published member, or the last member when none is published
    PreferPublished,
}

/// Export settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub file: String,
    pub history: bool,
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file: "corpus.json".to_string(),
            history: true,
            pretty: true,
        }
    }
}
