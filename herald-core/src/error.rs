//! Error types for herald-core.

use thiserror::Error;

use crate::proposal::{ProposalId, ProposalStatus};

/// Errors from parsing document and section keys.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// The text is not one of the known document keys.
    #[error("unknown document key '{0}'; expected home, news, images, users, proposals or subsidiary.<id>")]
    UnknownDocument(String),

    /// A subsidiary id that is empty or contains characters outside `[a-z0-9_-]`.
    #[error("invalid subsidiary id '{0}'; use lowercase letters, digits, '-' or '_'")]
    InvalidSubsidiaryId(String),

    /// A section key without a `<document>.<section>` separator.
    #[error("malformed section key '{0}'; expected <document>.<section>")]
    MalformedSectionKey(String),

    /// The section name is not part of the document's schema.
    #[error("document '{document}' has no section '{section}'")]
    UnknownSection { document: String, section: String },
}

/// A decision was attempted on a proposal that already left `pending`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("proposal {id} is already {status}; only pending proposals can be decided")]
pub struct TransitionError {
    pub id: ProposalId,
    pub status: ProposalStatus,
}
