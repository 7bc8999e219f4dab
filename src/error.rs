//! Per-document and per-cluster errors, and the report that collects them

use serde::Serialize;
use thiserror::Error;

/// Errors attached to a single document or a single cluster.
///
/// None of these abort a run: they are recorded in a [`Report`] and the
/// offending document (or cluster) is left out of the resolved corpus.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("Parse error in {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Validation error in {path}: {message}")]
    Validation { path: String, message: String },

    #[error("Ambiguous revision between {}: {}", .members.join(", "), .message)]
    AmbiguousRevision {
        members: Vec<String>,
        message: String,
    },

    #[error("IO error reading {path}: {message}")]
    Io { path: String, message: String },
}

impl DocumentError {
    pub fn parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn validation(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn ambiguous(members: Vec<String>, message: impl Into<String>) -> Self {
        Self::AmbiguousRevision {
            members,
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<String>, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Short machine-readable name of the error kind
    pub fn kind(&self) -> IssueKind {
        match self {
            Self::Parse { .. } => IssueKind::Parse,
            Self::Validation { .. } => IssueKind::Validation,
            Self::AmbiguousRevision { .. } => IssueKind::AmbiguousRevision,
            Self::Io { .. } => IssueKind::Io,
        }
    }

    /// Source path (or cluster member list) the error refers to
    pub fn subject(&self) -> String {
        match self {
            Self::Parse { path, .. } | Self::Validation { path, .. } | Self::Io { path, .. } => {
                path.clone()
            }
            Self::AmbiguousRevision { members, .. } => members.join(", "),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Parse { message, .. }
            | Self::Validation { message, .. }
            | Self::AmbiguousRevision { message, .. }
            | Self::Io { message, .. } => message,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    Parse,
    Validation,
    AmbiguousRevision,
    Io,
}

/// A recorded issue, in the shape written to the export
#[derive(Debug, Clone, Serialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub source: String,
    pub message: String,
}

impl From<&DocumentError> for Issue {
    fn from(err: &DocumentError) -> Self {
        Self {
            kind: err.kind(),
            source: err.subject(),
            message: err.message().to_string(),
        }
    }
}

/// Collected non-fatal errors of a load or resolve pass
#[derive(Debug, Clone, Default)]
pub struct Report {
    errors: Vec<DocumentError>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error and log it
    pub fn record(&mut self, err: DocumentError) {
        tracing::warn!("{}", err);
        self.errors.push(err);
    }

    pub fn extend(&mut self, other: Report) {
        self.errors.extend(other.errors);
    }

    pub fn errors(&self) -> &[DocumentError] {
        &self.errors
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Count errors of one kind
    pub fn count(&self, kind: IssueKind) -> usize {
        self.errors.iter().filter(|e| e.kind() == kind).count()
    }

    pub fn issues(&self) -> Vec<Issue> {
        self.errors.iter().map(Issue::from).collect()
    }
}
