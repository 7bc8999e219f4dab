//! Validate the corpus without writing anything

use anyhow::Result;

use crate::error::{Issue, IssueKind};
use crate::Site;

/// Load and resolve the corpus, print every recorded issue and return them
pub fn run(site: &Site) -> Result<Vec<Issue>> {
    let (corpus, resolution) = site.resolve()?;

    let mut issues = corpus.report().issues();
    issues.extend(resolution.report().issues());

    println!(
        "{} documents, {} clusters, {} canonical",
        corpus.len(),
        resolution.clusters().len(),
        resolution.canonical_ids().count()
    );

    if issues.is_empty() {
        println!("No issues found.");
        return Ok(issues);
    }

    for kind in [
        IssueKind::Io,
        IssueKind::Parse,
        IssueKind::Validation,
        IssueKind::AmbiguousRevision,
    ] {
        let of_kind: Vec<&Issue> = issues.iter().filter(|i| i.kind == kind).collect();
        if of_kind.is_empty() {
            continue;
        }
        println!("{} ({}):", label(kind), of_kind.len());
        for issue in of_kind {
            println!("  {}: {}", issue.source, issue.message);
        }
    }

    Ok(issues)
}

fn label(kind: IssueKind) -> &'static str {
    match kind {
        IssueKind::Io => "Unreadable files",
        IssueKind::Parse => "Parse errors",
        IssueKind::Validation => "Validation errors",
        IssueKind::AmbiguousRevision => "Ambiguous revisions",
    }
}
