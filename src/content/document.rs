//! Document model and the builder that derives it from a content unit

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use super::frontmatter::parse_date;
use super::loader::ContentUnit;
use super::FrontMatter;
use crate::config::SiteConfig;
use crate::error::DocumentError;

lazy_static! {
    /// `2016-08-01-some-title` style file stems
    static ref DATED_STEM: Regex = Regex::new(r"^(\d{4}-\d{2}-\d{2})-.+$").unwrap();
}

/// Publication status. Drafts order before published documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Draft,
    Published,
}

impl Status {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "published" | "publish" => Some(Self::Published),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A post or draft, as loaded. Never mutated after the corpus is built.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    /// Stable identifier derived from the source path
    pub id: String,

    pub status: Status,

    pub title: Option<String>,

    /// Calendar date; always set on published documents
    pub date: Option<NaiveDate>,

    pub categories: BTreeSet<String>,

    pub tags: BTreeSet<String>,

    pub summary: Option<String>,

    pub layout: Option<String>,

    /// Raw Markdown body, front matter removed
    pub body: String,

    /// Id of the document this one revises
    pub revision_of: Option<String>,

    /// All front-matter keys as read, in file order
    pub front_matter: FrontMatter,

    /// Source file path relative to the content root
    pub source: String,

    /// Full source file path
    #[serde(skip)]
    pub full_source: PathBuf,
}

impl Document {
    /// Build a document from a loaded content unit.
    ///
    /// Missing `status` is inferred from location: anything under the
    /// drafts collection is a draft, everything else is published.
    pub fn from_unit(unit: &ContentUnit, config: &SiteConfig) -> Result<Self, DocumentError> {
        let fm = &unit.front_matter;

        let status = match fm.status() {
            Some(raw) => Status::parse(&raw).ok_or_else(|| {
                DocumentError::validation(
                    &unit.source,
                    format!("unknown status {:?} (expected draft or published)", raw),
                )
            })?,
            None => match fm.published() {
                Some(true) => Status::Published,
                Some(false) => Status::Draft,
                None if in_collection(&unit.source, &config.drafts_dir) => Status::Draft,
                None => Status::Published,
            },
        };

        let date = match fm.date() {
            Some(raw) => Some(parse_date(&raw).ok_or_else(|| {
                DocumentError::validation(&unit.source, format!("invalid date {:?}", raw))
            })?),
            None => date_from_filename(&unit.source),
        };

        let title = fm.title();

        if status == Status::Published {
            if title.is_none() {
                return Err(DocumentError::validation(
                    &unit.source,
                    "published document has no title",
                ));
            }
            if date.is_none() {
                return Err(DocumentError::validation(
                    &unit.source,
                    "published document has no date",
                ));
            }
        }

        let id = derive_id(&unit.source, fm.slug().as_deref());
        if id.is_empty() {
            return Err(DocumentError::validation(
                &unit.source,
                "cannot derive an id from the source path",
            ));
        }

        Ok(Self {
            id,
            status,
            title,
            date,
            categories: fm.categories().into_iter().collect(),
            tags: fm.tags().into_iter().collect(),
            summary: fm.summary(),
            layout: fm.layout(),
            body: unit.body.clone(),
            revision_of: fm.revision_of(),
            front_matter: fm.clone(),
            source: unit.source.clone(),
            full_source: unit.full_source.clone(),
        })
    }

    pub fn is_draft(&self) -> bool {
        self.status == Status::Draft
    }

    /// Title, or the id when the document has none
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }
}

/// Whether a relative source path sits under the given top-level collection
fn in_collection(source: &str, collection: &str) -> bool {
    let collection = collection.trim_matches('/');
    !collection.is_empty() && source.split('/').next() == Some(collection)
}

/// Derive an id from a relative source path: extension dropped, each
/// component slugified, leading underscores of collection names removed.
/// A `slug` override replaces the last component.
pub fn derive_id(source: &str, slug_override: Option<&str>) -> String {
    let mut components: Vec<&str> = source.split('/').filter(|c| !c.is_empty()).collect();
    let stem = components
        .pop()
        .map(|file| file.rsplit_once('.').map_or(file, |(stem, _)| stem))
        .unwrap_or("");
    let last = slug_override.unwrap_or(stem);

    components
        .into_iter()
        .map(|c| slug::slugify(c.trim_start_matches('_')))
        .chain(std::iter::once(slug::slugify(last)))
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Date encoded in a `YYYY-MM-DD-title.md` file name
fn date_from_filename(source: &str) -> Option<NaiveDate> {
    let file = source.rsplit('/').next()?;
    let caps = DATED_STEM.captures(file)?;
    NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(source: &str, content: &str) -> ContentUnit {
        let (front_matter, body) = FrontMatter::parse(content).unwrap();
        ContentUnit {
            source: source.to_string(),
            full_source: PathBuf::from("/site/source").join(source),
            front_matter,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_derive_id() {
        assert_eq!(derive_id("draft.md", None), "draft");
        assert_eq!(derive_id("_drafts/My Post.md", None), "drafts/my-post");
        assert_eq!(
            derive_id("_posts/2016-08-01-test-fixture.md", None),
            "posts/2016-08-01-test-fixture"
        );
        assert_eq!(
            derive_id("_posts/whatever.markdown", Some("Test Fixture")),
            "posts/test-fixture"
        );
        assert_eq!(derive_id("notes/README", None), "notes/readme");
    }

    #[test]
    fn test_published_document() {
        let doc = Document::from_unit(
            &unit(
                "_posts/fixture.md",
                "---\nlayout: post\ntitle: Test Fixture\ndate: 2016-08-01\ncategories: [testing]\ntags: [csharp, tdd, csharp]\n---\nBody\n",
            ),
            &SiteConfig::default(),
        )
        .unwrap();

        assert_eq!(doc.id, "posts/fixture");
        assert_eq!(doc.status, Status::Published);
        assert_eq!(doc.title.as_deref(), Some("Test Fixture"));
        assert_eq!(doc.date, NaiveDate::from_ymd_opt(2016, 8, 1));
        assert_eq!(doc.layout.as_deref(), Some("post"));
        assert_eq!(doc.tags.len(), 2);
        assert!(doc.categories.contains("testing"));
        assert_eq!(doc.body, "Body\n");
    }

    #[test]
    fn test_status_inferred_from_drafts_collection() {
        let config = SiteConfig::default();

        let draft = Document::from_unit(&unit("_drafts/idea.md", "Just a body"), &config).unwrap();
        assert_eq!(draft.status, Status::Draft);
        assert!(draft.title.is_none());
        assert!(draft.date.is_none());

        let explicit = Document::from_unit(
            &unit("notes/idea.md", "---\nstatus: Draft\n---\nBody"),
            &config,
        )
        .unwrap();
        assert_eq!(explicit.status, Status::Draft);

        let unpublished = Document::from_unit(
            &unit("_posts/idea.md", "---\ntitle: X\npublished: false\n---\nBody"),
            &config,
        )
        .unwrap();
        assert_eq!(unpublished.status, Status::Draft);
    }

    #[test]
    fn test_published_without_title_or_date_is_rejected() {
        let config = SiteConfig::default();

        let err = Document::from_unit(&unit("post.md", "---\ndate: 2016-08-01\n---\n"), &config)
            .unwrap_err();
        assert_eq!(
            err,
            DocumentError::validation("post.md", "published document has no title")
        );

        let err = Document::from_unit(&unit("post.md", "---\ntitle: '  '\n---\n"), &config)
            .unwrap_err();
        assert!(matches!(err, DocumentError::Validation { .. }));

        let err = Document::from_unit(&unit("post.md", "---\ntitle: T\n---\n"), &config)
            .unwrap_err();
        assert_eq!(
            err,
            DocumentError::validation("post.md", "published document has no date")
        );
    }

    #[test]
    fn test_invalid_date_and_status_are_rejected() {
        let config = SiteConfig::default();

        let err = Document::from_unit(
            &unit("_drafts/a.md", "---\ndate: someday\n---\n"),
            &config,
        )
        .unwrap_err();
        assert!(err.to_string().contains("invalid date"));

        let err = Document::from_unit(&unit("a.md", "---\nstatus: archived\n---\n"), &config)
            .unwrap_err();
        assert!(err.to_string().contains("unknown status"));
    }

    #[test]
    fn test_date_from_filename() {
        let doc = Document::from_unit(
            &unit("_posts/2016-12-27-ddd-resources.md", "---\ntitle: DDD\n---\n"),
            &SiteConfig::default(),
        )
        .unwrap();
        assert_eq!(doc.date, NaiveDate::from_ymd_opt(2016, 12, 27));
    }

    #[test]
    fn test_status_ordering() {
        assert!(Status::Draft < Status::Published);
        assert_eq!(Status::parse("PUBLISHED"), Some(Status::Published));
        assert_eq!(Status::Draft.to_string(), "draft");
    }
}
