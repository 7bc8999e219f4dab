//! List site content

use anyhow::Result;
use std::collections::HashMap;

use crate::content::{Document, Status};
use crate::Site;

/// List site content by type
pub fn run(site: &Site, content_type: &str) -> Result<()> {
    let (corpus, resolution) = site.resolve()?;

    match content_type {
        "post" | "posts" | "draft" | "drafts" => {
            let status = if content_type.starts_with("post") {
                Status::Published
            } else {
                Status::Draft
            };
            let docs: Vec<&Document> = corpus
                .documents()
                .iter()
                .filter(|d| d.status == status)
                .collect();
            println!("{} ({}):", heading(status), docs.len());
            for doc in docs {
                let date = doc
                    .date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "----------".to_string());
                let state = resolution
                    .state(&doc.id)
                    .map(|s| s.to_string())
                    .unwrap_or_default();
                println!(
                    "  {} - {} [{}] ({})",
                    date,
                    doc.display_title(),
                    doc.source,
                    state
                );
            }
        }
        "cluster" | "clusters" => {
            let clusters: Vec<_> = resolution
                .clusters()
                .iter()
                .filter(|c| !c.is_singleton() || c.ambiguous)
                .collect();
            println!("Clusters ({}):", clusters.len());
            for cluster in clusters {
                match &cluster.canonical {
                    Some(canonical) => println!("  {}", canonical),
                    None => println!("  (ambiguous)"),
                }
                for member in &cluster.members {
                    if Some(member) != cluster.canonical.as_ref() {
                        println!("    <- {}", member);
                    }
                }
            }
        }
        "tag" | "tags" => {
            let tags = count(resolution.canonical_documents(&corpus), |d| &d.tags);
            println!("Tags ({}):", tags.len());
            for (tag, n) in tags {
                println!("  {} ({})", tag, n);
            }
        }
        "category" | "categories" => {
            let categories = count(resolution.canonical_documents(&corpus), |d| &d.categories);
            println!("Categories ({}):", categories.len());
            for (cat, n) in categories {
                println!("  {} ({})", cat, n);
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: post, draft, cluster, tag, category",
                content_type
            );
        }
    }

    Ok(())
}

fn heading(status: Status) -> &'static str {
    match status {
        Status::Published => "Posts",
        Status::Draft => "Drafts",
    }
}

/// Count labels across documents, most used first
fn count<'d, I, F>(docs: Vec<&'d Document>, labels: F) -> Vec<(String, usize)>
where
    F: Fn(&'d Document) -> I,
    I: IntoIterator<Item = &'d String>,
{
    let mut counts: HashMap<String, usize> = HashMap::new();
    for doc in docs {
        for label in labels(doc) {
            *counts.entry(label.clone()).or_insert(0) += 1;
        }
    }
    let mut counts: Vec<_> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}
