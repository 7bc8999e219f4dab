//! Shingle fingerprints, body similarity and candidate pair generation

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::{Hash, Hasher};

use crate::config::{ResolverConfig, SimilarityMetric};
use crate::content::markdown;

/// Set of hashed word shingles of a document body
#[derive(Debug, Clone, Default)]
pub struct Fingerprint {
    shingles: HashSet<u64>,
}

impl Fingerprint {
    /// Fingerprint a Markdown body using shingles of `size` consecutive words.
    ///
    /// Bodies shorter than one shingle hash to a single shingle of all their
    /// words, so short documents can still match exactly.
    pub fn of(body: &str, size: usize) -> Self {
        let blocks = markdown::text_blocks(body);
        let words: Vec<&str> = blocks.iter().flat_map(|b| b.split(' ')).collect();

        let size = size.max(1);
        let shingles = if words.is_empty() {
            HashSet::new()
        } else if words.len() < size {
            std::iter::once(hash_words(&words)).collect()
        } else {
            words.windows(size).map(hash_words).collect()
        };

        Self { shingles }
    }

    pub fn len(&self) -> usize {
        self.shingles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shingles.is_empty()
    }

    /// Similarity in [0, 1]; an empty fingerprint matches nothing
    pub fn similarity(&self, other: &Fingerprint, metric: SimilarityMetric) -> f64 {
        if self.is_empty() || other.is_empty() {
            return 0.0;
        }

        let (small, large) = if self.len() <= other.len() {
            (&self.shingles, &other.shingles)
        } else {
            (&other.shingles, &self.shingles)
        };
        let shared = small.iter().filter(|h| large.contains(h)).count() as f64;

        match metric {
            SimilarityMetric::Containment => shared / small.len() as f64,
            SimilarityMetric::Jaccard => shared / ((small.len() + large.len()) as f64 - shared),
        }
    }

    /// Size of the smaller fingerprint over the larger one, 0 when either is empty
    pub fn size_ratio(&self, other: &Fingerprint) -> f64 {
        let (a, b) = (self.len(), other.len());
        if a == 0 || b == 0 {
            return 0.0;
        }
        a.min(b) as f64 / a.max(b) as f64
    }

    /// Content-defined sample of shingles used as candidate keys
    pub fn sample(&self, rate: u64) -> impl Iterator<Item = u64> + '_ {
        let rate = rate.max(1);
        self.shingles.iter().copied().filter(move |h| h % rate == 0)
    }
}

fn hash_words(words: &[&str]) -> u64 {
    let mut hasher = DefaultHasher::new();
    words.hash(&mut hasher);
    hasher.finish()
}

/// Pairs `(i, j)`, `i < j`, worth a full comparison.
///
/// Small corpora compare every pair. Larger ones only compare documents
/// sharing a sampled shingle; documents with no sampled shingle are
/// compared against everything.
pub fn candidate_pairs(fingerprints: &[Fingerprint], config: &ResolverConfig) -> Vec<(usize, usize)> {
    let n = fingerprints.len();
    if n <= config.exhaustive_limit {
        return (0..n)
            .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
            .collect();
    }

    let mut postings: HashMap<u64, Vec<usize>> = HashMap::new();
    let mut unsampled = Vec::new();

    for (i, fp) in fingerprints.iter().enumerate() {
        let mut sampled = false;
        for key in fp.sample(config.sample_rate) {
            postings.entry(key).or_default().push(i);
            sampled = true;
        }
        if !sampled && !fp.is_empty() {
            unsampled.push(i);
        }
    }

    let mut pairs = BTreeSet::new();
    for docs in postings.values() {
        for (k, &i) in docs.iter().enumerate() {
            for &j in &docs[k + 1..] {
                pairs.insert((i.min(j), i.max(j)));
            }
        }
    }
    for &i in &unsampled {
        for j in (0..n).filter(|&j| j != i && !fingerprints[j].is_empty()) {
            pairs.insert((i.min(j), i.max(j)));
        }
    }

    tracing::debug!(
        "{} candidate pairs among {} documents ({} unsampled)",
        pairs.len(),
        n,
        unsampled.len()
    );

    pairs.into_iter().collect()
}
