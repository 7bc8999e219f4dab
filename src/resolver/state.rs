//! Per-document resolution state

use serde::Serialize;
use std::fmt;

/// Where a document is in resolution. States only move forward:
/// `Unresolved -> Clustered -> Ordered -> Canonical | Historical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionState {
    Unresolved,
    Clustered,
    Ordered,
    Canonical,
    Historical,
}

impl ResolutionState {
    pub fn can_advance_to(self, next: ResolutionState) -> bool {
        use ResolutionState::*;
        matches!(
            (self, next),
            (Unresolved, Clustered)
                | (Clustered, Ordered)
                | (Ordered, Canonical)
                | (Ordered, Historical)
        )
    }

    /// Move to the next state
    pub(crate) fn advance(&mut self, next: ResolutionState) {
        debug_assert!(
            self.can_advance_to(next),
            "invalid transition {:?} -> {:?}",
            self,
            next
        );
        *self = next;
    }
}

impl fmt::Display for ResolutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unresolved => "unresolved",
            Self::Clustered => "clustered",
            Self::Ordered => "ordered",
            Self::Canonical => "canonical",
            Self::Historical => "historical",
        };
        f.write_str(name)
    }
}
