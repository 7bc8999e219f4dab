//! Content module - loading, front matter and the document model

mod corpus;
mod document;
mod frontmatter;
pub mod loader;
pub mod markdown;

pub use corpus::Corpus;
pub use document::{derive_id, Document, Status};
pub use frontmatter::{parse_date, FrontMatter, FrontMatterError};
