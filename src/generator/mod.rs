//! Export of a resolved corpus for the site generator

use anyhow::{Context, Result};
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Serialize;
use serde_yaml::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use crate::content::{Corpus, Document, FrontMatter, Status};
use crate::error::Issue;
use crate::resolver::{Cluster, Resolution};
use crate::Site;

/// Front-matter keys rewritten by canonicalization
const REVISION_KEYS: [&str; 2] = ["revision_of", "revisionOf"];

/// A canonical document as handed to the site generator
#[derive(Debug, Clone, Serialize)]
pub struct ExportedDocument {
    pub id: String,
    pub status: Status,
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
    pub categories: BTreeSet<String>,
    pub tags: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    pub source: String,
    pub front_matter: FrontMatter,
    pub body: String,
}

/// The resolved corpus, as written to the output file
#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub documents: Vec<ExportedDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<IndexMap<String, Vec<String>>>,
    pub clusters: Vec<Cluster>,
    pub issues: Vec<Issue>,
}

impl Manifest {
    /// Assemble the export from a corpus and its resolution
    pub fn build(corpus: &Corpus, resolution: &Resolution, with_history: bool) -> Self {
        let documents = resolution
            .canonical_documents(corpus)
            .into_iter()
            .map(|doc| ExportedDocument {
                id: doc.id.clone(),
                status: doc.status,
                title: doc.title.clone(),
                date: doc.date,
                categories: doc.categories.clone(),
                tags: doc.tags.clone(),
                summary: doc.summary.clone(),
                layout: doc.layout.clone(),
                source: doc.source.clone(),
                front_matter: resolved_front_matter(doc, resolution),
                body: doc.body.clone(),
            })
            .collect();

        let mut issues = corpus.report().issues();
        issues.extend(resolution.report().issues());

        Self {
            documents,
            history: with_history.then(|| resolution.history()),
            clusters: resolution.clusters().to_vec(),
            issues,
        }
    }
}

/// A document's front matter after canonicalization: historical members
/// point at their canonical, canonical members drop any revision link.
/// Every other key is kept in its original position.
pub fn resolved_front_matter(doc: &Document, resolution: &Resolution) -> FrontMatter {
    let mut fm = doc.front_matter.clone();
    match resolution.revision_of(&doc.id) {
        Some(canonical) => {
            let key = REVISION_KEYS
                .iter()
                .find(|k| fm.contains_key(k))
                .copied()
                .unwrap_or(REVISION_KEYS[0]);
            for other in REVISION_KEYS.iter().filter(|k| **k != key) {
                fm.remove(other);
            }
            fm.insert(key, Value::String(canonical.to_string()));
        }
        None => {
            for key in REVISION_KEYS {
                fm.remove(key);
            }
        }
    }
    fm
}

/// Writes the resolved corpus to the public directory
pub struct Generator<'a> {
    site: &'a Site,
}

impl<'a> Generator<'a> {
    pub fn new(site: &'a Site) -> Self {
        Self { site }
    }

    /// Output file path
    pub fn output_path(&self) -> PathBuf {
        self.site.public_dir.join(&self.site.config.output.file)
    }

    /// Write the manifest, returning where it went
    pub fn generate(&self, corpus: &Corpus, resolution: &Resolution) -> Result<PathBuf> {
        let output = &self.site.config.output;
        let manifest = Manifest::build(corpus, resolution, output.history);

        let json = if output.pretty {
            serde_json::to_string_pretty(&manifest)?
        } else {
            serde_json::to_string(&manifest)?
        };

        fs::create_dir_all(&self.site.public_dir)
            .with_context(|| format!("Cannot create {:?}", self.site.public_dir))?;
        let path = self.output_path();
        fs::write(&path, json).with_context(|| format!("Cannot write {:?}", path))?;

        tracing::info!(
            "Wrote {} canonical documents to {:?}",
            manifest.documents.len(),
            path
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ResolverConfig, SiteConfig};
    use crate::content::loader::ContentUnit;
    use crate::resolver::Resolver;
    use std::path::PathBuf;

    const BODY: &str = "The naive solution builds the system under test inline in every test. \
        A factory method moves construction into one helper that each test calls \
        with only the arguments it cares about, keeping the rest as sensible defaults.\n";

    fn unit(source: &str, content: &str) -> ContentUnit {
        let (front_matter, body) = FrontMatter::parse(content).unwrap();
        ContentUnit {
            source: source.to_string(),
            full_source: PathBuf::from(source),
            front_matter,
            body: body.to_string(),
        }
    }

    fn resolved() -> (Corpus, Resolution) {
        let corpus = Corpus::from_units(
            vec![
                unit(
                    "_drafts/factory.md",
                    &format!("---\nlayout: post\nsummary: Draft summary\nrevisionOf: posts/factory\nreviewer: sam\n---\n{}", BODY),
                ),
                unit(
                    "_posts/factory.md",
                    &format!("---\nlayout: post\ntitle: Factory Methods\ncategory: testing\ntags: [csharp]\ndate: 2016-08-01\nseries: unit-testing\n---\n{}", BODY),
                ),
            ],
            &SiteConfig::default(),
        );
        let resolution = Resolver::new(&ResolverConfig::default()).resolve(&corpus);
        (corpus, resolution)
    }

    #[test]
    fn test_manifest_contains_canonical_documents_only() {
        let (corpus, resolution) = resolved();
        let manifest = Manifest::build(&corpus, &resolution, true);

        assert_eq!(manifest.documents.len(), 1);
        let doc = &manifest.documents[0];
        assert_eq!(doc.id, "posts/factory");
        assert_eq!(doc.title.as_deref(), Some("Factory Methods"));
        assert_eq!(
            manifest.history.as_ref().unwrap()["posts/factory"],
            vec!["drafts/factory"]
        );
        assert!(manifest.issues.is_empty());

        let json = serde_json::to_value(&manifest).unwrap();
        assert_eq!(json["documents"][0]["date"], "2016-08-01");
        assert_eq!(json["documents"][0]["status"], "published");
        assert_eq!(json["documents"][0]["front_matter"]["series"], "unit-testing");
        assert_eq!(json["clusters"][0]["canonical"], "posts/factory");
    }

    #[test]
    fn test_history_can_be_left_out() {
        let (corpus, resolution) = resolved();
        let manifest = Manifest::build(&corpus, &resolution, false);
        let json = serde_json::to_value(&manifest).unwrap();
        assert!(json.get("history").is_none());
    }

    #[test]
    fn test_front_matter_round_trip_keeps_unrelated_keys() {
        let (corpus, resolution) = resolved();

        for doc in corpus.documents() {
            let yaml = resolved_front_matter(doc, &resolution).to_yaml().unwrap();
            let (reparsed, _) = FrontMatter::parse(&yaml).unwrap();

            let original: Vec<_> = doc
                .front_matter
                .iter()
                .filter(|(k, _)| !REVISION_KEYS.contains(k))
                .collect();
            let round_tripped: Vec<_> = reparsed
                .iter()
                .filter(|(k, _)| !REVISION_KEYS.contains(k))
                .collect();
            assert_eq!(original, round_tripped, "{}", doc.id);
        }

        let draft = corpus.get("drafts/factory").unwrap();
        let fm = resolved_front_matter(draft, &resolution);
        assert_eq!(fm.revision_of(), Some("posts/factory".to_string()));
        assert!(fm.contains_key("revisionOf"));
        assert!(!fm.contains_key("revision_of"));

        let post = corpus.get("posts/factory").unwrap();
        assert_eq!(resolved_front_matter(post, &resolution).revision_of(), None);
    }

    #[test]
    fn test_generate_writes_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let site = Site::new(dir.path()).unwrap();
        let (corpus, resolution) = resolved();

        let path = Generator::new(&site).generate(&corpus, &resolution).unwrap();
        assert_eq!(path, dir.path().join("public/corpus.json"));

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["documents"].as_array().unwrap().len(), 1);
    }
}
