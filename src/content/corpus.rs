//! Corpus - the validated, immutable set of documents from one load

use anyhow::Result;
use std::collections::{HashMap, HashSet};

use super::loader::{ContentLoader, ContentUnit};
use super::Document;
use crate::config::SiteConfig;
use crate::error::{DocumentError, Report};
use crate::Site;

/// Every document that loaded and validated, in source path order.
///
/// A corpus is a snapshot: any source change means loading a new one.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    documents: Vec<Document>,
    index: HashMap<String, usize>,
    report: Report,
}

impl Corpus {
    /// Load and validate everything under the site's source directory
    pub fn load(site: &Site) -> Result<Self> {
        let loaded = ContentLoader::new(site)?.load()?;
        let mut corpus = Self::from_units(loaded.units, &site.config);

        let mut report = loaded.report;
        report.extend(std::mem::take(&mut corpus.report));
        corpus.report = report;

        tracing::info!(
            "Loaded {} documents ({} issues)",
            corpus.len(),
            corpus.report.len()
        );
        Ok(corpus)
    }

    /// Build a corpus from already-split content units
    pub fn from_units(units: Vec<ContentUnit>, config: &SiteConfig) -> Self {
        let mut report = Report::new();
        let mut seen = HashSet::new();
        let mut documents = Vec::new();

        for unit in &units {
            match Document::from_unit(unit, config) {
                Ok(doc) => {
                    if seen.insert(doc.id.clone()) {
                        documents.push(doc);
                    } else {
                        report.record(DocumentError::validation(
                            &unit.source,
                            format!("duplicate id {:?}", doc.id),
                        ));
                    }
                }
                Err(e) => report.record(e),
            }
        }

        // Dropping a document can leave another one's reference dangling
        loop {
            let ids: HashSet<&str> = documents.iter().map(|d| d.id.as_str()).collect();
            let rejected: Vec<DocumentError> = documents
                .iter()
                .filter_map(|doc| check_revision_link(doc, &ids).err())
                .collect();
            if rejected.is_empty() {
                break;
            }
            let rejected_sources: HashSet<String> = rejected.iter().map(|e| e.subject()).collect();
            documents.retain(|d| !rejected_sources.contains(&d.source));
            rejected.into_iter().for_each(|e| report.record(e));
        }

        let index = documents
            .iter()
            .enumerate()
            .map(|(i, d)| (d.id.clone(), i))
            .collect();

        Self {
            documents,
            index,
            report,
        }
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.index.get(id).map(|&i| &self.documents[i])
    }

    /// Position of a document in [`Corpus::documents`]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Issues recorded while loading and validating
    pub fn report(&self) -> &Report {
        &self.report
    }
}

fn check_revision_link(doc: &Document, ids: &HashSet<&str>) -> Result<(), DocumentError> {
    match doc.revision_of.as_deref() {
        Some(target) if target == doc.id => Err(DocumentError::validation(
            &doc.source,
            "document is marked as a revision of itself",
        )),
        Some(target) if !ids.contains(target) => Err(DocumentError::validation(
            &doc.source,
            format!("revision_of refers to unknown id {:?}", target),
        )),
        _ => Ok(()),
    }
}
