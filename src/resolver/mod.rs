//! Duplicate/draft resolution
//!
//! Groups documents whose bodies are near-identical into clusters, orders
//! each cluster from earliest to latest revision, and picks the canonical
//! member the site should publish. Every other member becomes a historical
//! revision of it.

mod fingerprint;
mod state;

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::config::{CanonicalPolicy, ResolverConfig};
use crate::content::{Corpus, Document, Status};
use crate::error::{DocumentError, Report};

pub use fingerprint::{candidate_pairs, Fingerprint};
pub use state::ResolutionState;

/// Two documents judged to be revisions of each other
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Link {
    pub from: String,
    pub to: String,
    /// Body similarity, or `None` for an explicit `revision_of` link
    pub similarity: Option<f64>,
}

/// Documents judged to be revisions of the same article
#[derive(Debug, Clone, Serialize)]
pub struct Cluster {
    /// Member ids in revision order, earliest first
    pub members: Vec<String>,
    /// `None` when the cluster is ambiguous
    pub canonical: Option<String>,
    pub ambiguous: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
}

impl Cluster {
    /// Members other than the canonical one, in revision order
    pub fn historical(&self) -> impl Iterator<Item = &str> {
        let canonical = self.canonical.as_deref();
        self.members
            .iter()
            .map(String::as_str)
            .filter(move |id| canonical.is_some() && Some(*id) != canonical)
    }

    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }
}

/// Result of resolving a corpus
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    clusters: Vec<Cluster>,
    states: HashMap<String, ResolutionState>,
    /// Member id to position in `clusters`
    membership: HashMap<String, usize>,
    report: Report,
}

impl Resolution {
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn state(&self, id: &str) -> Option<ResolutionState> {
        self.states.get(id).copied()
    }

    pub fn cluster_of(&self, id: &str) -> Option<&Cluster> {
        self.membership.get(id).map(|&i| &self.clusters[i])
    }

    /// Canonical ids, one per unambiguous cluster
    pub fn canonical_ids(&self) -> impl Iterator<Item = &str> {
        self.clusters.iter().filter_map(|c| c.canonical.as_deref())
    }

    pub fn is_canonical(&self, id: &str) -> bool {
        self.state(id) == Some(ResolutionState::Canonical)
    }

    /// Canonical documents in cluster order
    pub fn canonical_documents<'c>(&self, corpus: &'c Corpus) -> Vec<&'c Document> {
        self.canonical_ids().filter_map(|id| corpus.get(id)).collect()
    }

    /// Canonical id to its historical ids, earliest first
    pub fn history(&self) -> IndexMap<String, Vec<String>> {
        self.clusters
            .iter()
            .filter_map(|c| {
                let canonical = c.canonical.clone()?;
                Some((canonical, c.historical().map(String::from).collect()))
            })
            .collect()
    }

    /// The document a historical member is a revision of: its canonical.
    /// `None` for canonical documents and unresolved clusters.
    pub fn revision_of(&self, id: &str) -> Option<&str> {
        if self.state(id) != Some(ResolutionState::Historical) {
            return None;
        }
        self.cluster_of(id).and_then(|c| c.canonical.as_deref())
    }

    /// Ambiguity issues found while ordering clusters
    pub fn report(&self) -> &Report {
        &self.report
    }
}

/// Clusters and orders the documents of a corpus
pub struct Resolver<'a> {
    config: &'a ResolverConfig,
}

impl<'a> Resolver<'a> {
    pub fn new(config: &'a ResolverConfig) -> Self {
        Self { config }
    }

    /// Resolve a whole corpus. Runs after loading has finished, since
    /// cluster membership depends on every document.
    pub fn resolve(&self, corpus: &Corpus) -> Resolution {
        let docs = corpus.documents();
        let mut states = vec![ResolutionState::Unresolved; docs.len()];

        let fingerprints: Vec<Fingerprint> = docs
            .iter()
            .map(|d| Fingerprint::of(&d.body, self.config.shingle_size))
            .collect();

        let mut sets = DisjointSet::new(docs.len());
        let mut links = Vec::new();

        for (i, j) in candidate_pairs(&fingerprints, self.config) {
            // A short excerpt is contained in many bodies without being a revision
            if fingerprints[i].size_ratio(&fingerprints[j]) < self.config.min_size_ratio {
                continue;
            }
            let score = fingerprints[i].similarity(&fingerprints[j], self.config.metric);
            if score >= self.config.threshold {
                tracing::debug!(
                    "{} ~ {} (similarity {:.3})",
                    docs[i].id,
                    docs[j].id,
                    score
                );
                sets.union(i, j);
                links.push((i, j, Some(score)));
            }
        }

        if self.config.follow_revision_links {
            for (i, doc) in docs.iter().enumerate() {
                if let Some(j) = doc.revision_of.as_deref().and_then(|t| corpus.position(t)) {
                    sets.union(i, j);
                    links.push((i, j, None));
                }
            }
        }

        // Group by root, clusters ordered by their first member in the corpus
        let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for i in 0..docs.len() {
            groups.entry(sets.find(i)).or_default().push(i);
        }
        let mut groups: Vec<Vec<usize>> = groups.into_values().collect();
        groups.sort_by_key(|members| members[0]);

        for &i in groups.iter().flatten() {
            states[i].advance(ResolutionState::Clustered);
        }

        let mut report = Report::new();
        let mut clusters = Vec::with_capacity(groups.len());

        for mut members in groups {
            members.sort_by(|&a, &b| revision_order(&docs[a]).cmp(&revision_order(&docs[b])));

            let cluster_links = links
                .iter()
                .filter(|(i, _, _)| members.contains(i))
                .map(|&(i, j, similarity)| Link {
                    from: docs[i].id.clone(),
                    to: docs[j].id.clone(),
                    similarity,
                })
                .collect();
            let ids: Vec<String> = members.iter().map(|&i| docs[i].id.clone()).collect();

            if let Some(err) = check_dates(&members, docs) {
                report.record(err);
                clusters.push(Cluster {
                    members: ids,
                    canonical: None,
                    ambiguous: true,
                    links: cluster_links,
                });
                continue;
            }

            for &i in &members {
                states[i].advance(ResolutionState::Ordered);
            }

            let canonical = self.pick_canonical(&members, docs);
            for &i in &members {
                states[i].advance(if i == canonical {
                    ResolutionState::Canonical
                } else {
                    ResolutionState::Historical
                });
            }

            if members.len() > 1 {
                tracing::debug!(
                    "Cluster of {} resolved to {}",
                    members.len(),
                    docs[canonical].id
                );
            }

            clusters.push(Cluster {
                members: ids,
                canonical: Some(docs[canonical].id.clone()),
                ambiguous: false,
                links: cluster_links,
            });
        }

        let membership = clusters
            .iter()
            .enumerate()
            .flat_map(|(c, cluster)| cluster.members.iter().map(move |id| (id.clone(), c)))
            .collect();
        let states = docs
            .iter()
            .zip(states)
            .map(|(d, s)| (d.id.clone(), s))
            .collect();

        tracing::info!(
            "Resolved {} documents into {} clusters ({} ambiguous)",
            docs.len(),
            clusters.len(),
            report.len()
        );

        Resolution {
            clusters,
            states,
            membership,
            report,
        }
    }

    /// `members` is already in revision order
    fn pick_canonical(&self, members: &[usize], docs: &[Document]) -> usize {
        let last = members[members.len() - 1];
        match self.config.canonical {
            CanonicalPolicy::Latest => last,
            CanonicalPolicy::PreferPublished => members
                .iter()
                .rev()
                .copied()
                .find(|&i| docs[i].status == Status::Published)
                .unwrap_or(last),
        }
    }
}

/// Undated documents first, then by date, then drafts before published,
/// then by source path
fn revision_order(doc: &Document) -> (Option<chrono::NaiveDate>, Status, &str) {
    (doc.date, doc.status, doc.source.as_str())
}

/// Published members with different dates cannot be ordered safely
fn check_dates(members: &[usize], docs: &[Document]) -> Option<DocumentError> {
    let published: Vec<&Document> = members
        .iter()
        .map(|&i| &docs[i])
        .filter(|d| d.status == Status::Published)
        .collect();
    let dates: BTreeSet<_> = published.iter().filter_map(|d| d.date).collect();

    if dates.len() > 1 {
        let dates: Vec<String> = dates.iter().map(|d| d.to_string()).collect();
        Some(DocumentError::ambiguous(
            published.iter().map(|d| d.id.clone()).collect(),
            format!(
                "published revisions of one article have conflicting dates ({})",
                dates.join(", ")
            ),
        ))
    } else {
        None
    }
}

/// Union-find over document positions
struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, i: usize) -> usize {
        let mut root = i;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut node = i;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::content::loader::ContentUnit;
    use crate::content::FrontMatter;
    use crate::error::IssueKind;
    use std::path::PathBuf;

    const FIXTURE: &str = "Problem X shows up whenever a test needs a fully built system under test.\n\n\
        The naive solution constructs every dependency inline in each test method, \
        which repeats the same ten lines in every test of the class.\n\n\
        A setup method moves the construction into one place but hides it from the reader, \
        and every test now shares state it never asked for.\n\n\
        A factory method keeps construction explicit and lets each test state only what matters.\n";

    const DDD: &str = "A list of domain driven design resources collected during the year: \
        books, conference talks, sample applications and blog series, \
        each with a short note on why it is worth reading.\n";

    fn unit(source: &str, front_matter: &str, body: &str) -> ContentUnit {
        let content = format!("---\n{}---\n{}", front_matter, body);
        let (front_matter, body) = FrontMatter::parse(&content).unwrap();
        ContentUnit {
            source: source.to_string(),
            full_source: PathBuf::from(source),
            front_matter,
            body: body.to_string(),
        }
    }

    fn corpus(units: Vec<ContentUnit>) -> Corpus {
        let corpus = Corpus::from_units(units, &SiteConfig::default());
        assert!(corpus.report().is_empty(), "{:?}", corpus.report());
        corpus
    }

    fn resolve(corpus: &Corpus) -> Resolution {
        Resolver::new(&ResolverConfig::default()).resolve(corpus)
    }

    #[test]
    fn test_single_document_is_its_own_canonical() {
        let corpus = corpus(vec![unit("post.md", "title: P\ndate: 2016-12-27\n", DDD)]);

        let first = resolve(&corpus);
        let second = resolve(&corpus);
        for resolution in [&first, &second] {
            assert_eq!(resolution.clusters().len(), 1);
            assert_eq!(resolution.canonical_ids().collect::<Vec<_>>(), vec!["post"]);
            assert_eq!(resolution.history()["post"], Vec::<String>::new());
            assert_eq!(resolution.state("post"), Some(ResolutionState::Canonical));
            assert_eq!(resolution.revision_of("post"), None);
        }
    }

    #[test]
    fn test_published_revision_supersedes_draft() {
        let revised = FIXTURE.replace(
            "which repeats the same ten lines",
            "which copies the same block of construction code",
        );
        let corpus = corpus(vec![
            unit("_drafts/fixture.md", "", FIXTURE),
            unit(
                "_posts/fixture.md",
                "title: Test Fixture\ndate: 2016-08-01\n",
                &revised,
            ),
        ]);

        let resolution = resolve(&corpus);
        assert_eq!(resolution.clusters().len(), 1);

        let cluster = &resolution.clusters()[0];
        assert_eq!(cluster.members, vec!["drafts/fixture", "posts/fixture"]);
        assert_eq!(cluster.canonical.as_deref(), Some("posts/fixture"));
        assert_eq!(cluster.links.len(), 1);

        assert_eq!(
            resolution.state("drafts/fixture"),
            Some(ResolutionState::Historical)
        );
        assert_eq!(resolution.revision_of("drafts/fixture"), Some("posts/fixture"));
        assert_eq!(resolution.history()["posts/fixture"], vec!["drafts/fixture"]);
        assert!(resolution.report().is_empty());
    }

    #[test]
    fn test_conflicting_published_dates_are_ambiguous() {
        let corpus = corpus(vec![
            unit("a.md", "title: A\ndate: 2016-08-01\n", FIXTURE),
            unit("b.md", "title: B\ndate: 2016-09-01\n", FIXTURE),
            unit("c.md", "title: C\ndate: 2016-12-27\n", DDD),
        ]);

        let resolution = resolve(&corpus);
        assert_eq!(resolution.clusters().len(), 2);
        assert!(resolution.clusters()[0].ambiguous);
        assert_eq!(resolution.clusters()[0].canonical, None);

        // The unrelated cluster still resolves
        assert_eq!(resolution.canonical_ids().collect::<Vec<_>>(), vec!["c"]);
        assert!(!resolution.history().contains_key("a"));
        assert!(!resolution.history().contains_key("b"));
        assert_eq!(resolution.state("a"), Some(ResolutionState::Clustered));
        assert_eq!(resolution.revision_of("a"), None);

        assert_eq!(resolution.report().count(IssueKind::AmbiguousRevision), 1);
        match &resolution.report().errors()[0] {
            DocumentError::AmbiguousRevision { members, message } => {
                assert_eq!(members, &vec!["a".to_string(), "b".to_string()]);
                assert!(message.contains("2016-08-01, 2016-09-01"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_same_date_published_revisions_order_by_path() {
        let corpus = corpus(vec![
            unit("b.md", "title: B\ndate: 2016-08-01\n", FIXTURE),
            unit("a.md", "title: A\ndate: 2016-08-01\n", FIXTURE),
        ]);
        let resolution = resolve(&corpus);
        assert_eq!(resolution.clusters()[0].members, vec!["a", "b"]);
        assert_eq!(resolution.canonical_ids().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn test_revision_chain_orders_drafts_by_date() {
        let corpus = corpus(vec![
            unit("_drafts/v1.md", "", FIXTURE),
            unit("_drafts/v2.md", "date: 2016-07-15\n", FIXTURE),
            unit("_posts/final.md", "title: F\ndate: 2016-08-01\n", FIXTURE),
        ]);
        let resolution = resolve(&corpus);

        let cluster = &resolution.clusters()[0];
        assert_eq!(cluster.members, vec!["drafts/v1", "drafts/v2", "posts/final"]);
        assert_eq!(
            resolution.history()["posts/final"],
            vec!["drafts/v1", "drafts/v2"]
        );
    }

    #[test]
    fn test_prefer_published_policy() {
        let corpus = corpus(vec![
            unit("_posts/post.md", "title: P\ndate: 2016-08-01\n", FIXTURE),
            unit("_drafts/rewrite.md", "date: 2017-01-10\n", FIXTURE),
        ]);

        let latest = resolve(&corpus);
        assert_eq!(
            latest.canonical_ids().collect::<Vec<_>>(),
            vec!["drafts/rewrite"]
        );

        let config = ResolverConfig {
            canonical: CanonicalPolicy::PreferPublished,
            ..Default::default()
        };
        let preferred = Resolver::new(&config).resolve(&corpus);
        assert_eq!(
            preferred.canonical_ids().collect::<Vec<_>>(),
            vec!["posts/post"]
        );
        assert_eq!(preferred.history()["posts/post"], vec!["drafts/rewrite"]);
    }

    #[test]
    fn test_explicit_revision_link_joins_divergent_bodies() {
        let corpus = corpus(vec![
            unit("_drafts/outline.md", "revision_of: posts/ddd\n", "Just an outline."),
            unit("_posts/ddd.md", "title: DDD\ndate: 2016-12-27\n", DDD),
        ]);

        let resolution = resolve(&corpus);
        assert_eq!(resolution.clusters().len(), 1);
        assert_eq!(resolution.revision_of("drafts/outline"), Some("posts/ddd"));
        assert_eq!(resolution.clusters()[0].links[0].similarity, None);

        let config = ResolverConfig {
            follow_revision_links: false,
            ..Default::default()
        };
        let unlinked = Resolver::new(&config).resolve(&corpus);
        assert_eq!(unlinked.clusters().len(), 2);
    }

    #[test]
    fn test_growing_revisions_form_one_cluster() {
        let middle = format!("{}\nOne more closing paragraph about fixtures.\n", FIXTURE);
        let config = ResolverConfig {
            metric: crate::config::SimilarityMetric::Jaccard,
            threshold: 0.8,
            ..Default::default()
        };
        let corpus = corpus(vec![
            unit("_drafts/a.md", "", FIXTURE),
            unit("_drafts/b.md", "", &middle),
            unit("_drafts/c.md", "", &format!("{}\nAnd a final remark.\n", middle)),
        ]);
        let resolution = Resolver::new(&config).resolve(&corpus);
        assert_eq!(resolution.clusters().len(), 1);
        assert_eq!(resolution.clusters()[0].members.len(), 3);
    }

    #[test]
    fn test_shared_quote_does_not_join_unrelated_posts() {
        let quote = "Make the implicit explicit and the explicit obvious.\n";
        let corpus = corpus(vec![
            unit(
                "_posts/a.md",
                "title: A\ndate: 2016-08-01\n",
                &format!("{FIXTURE}\n{quote}"),
            ),
            unit(
                "_posts/b.md",
                "title: B\ndate: 2016-12-27\n",
                &format!("{DDD}\n{quote}"),
            ),
            unit("_drafts/q.md", "", quote),
        ]);

        let resolution = resolve(&corpus);
        assert_eq!(resolution.clusters().len(), 3);
        assert!(resolution.clusters().iter().all(Cluster::is_singleton));
        assert!(resolution.report().is_empty());
        let mut canonical: Vec<&str> = resolution.canonical_ids().collect();
        canonical.sort();
        assert_eq!(canonical, vec!["drafts/q", "posts/a", "posts/b"]);

        // Without the size guard the excerpt is fully contained in both posts
        let config = ResolverConfig {
            min_size_ratio: 0.0,
            ..Default::default()
        };
        let unguarded = Resolver::new(&config).resolve(&corpus);
        assert_eq!(unguarded.clusters().len(), 1);
        assert!(unguarded.clusters()[0].ambiguous);
    }

    #[test]
    fn test_empty_bodies_never_cluster() {
        let corpus = corpus(vec![
            unit("_drafts/a.md", "", ""),
            unit("_drafts/b.md", "", ""),
        ]);
        let resolution = resolve(&corpus);
        assert_eq!(resolution.clusters().len(), 2);
        assert!(resolution.clusters().iter().all(Cluster::is_singleton));
    }

    #[test]
    fn test_disjoint_set() {
        let mut sets = DisjointSet::new(5);
        sets.union(0, 1);
        sets.union(3, 4);
        sets.union(1, 4);
        assert_eq!(sets.find(0), sets.find(3));
        assert_ne!(sets.find(0), sets.find(2));
    }
}
