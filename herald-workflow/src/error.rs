//! Error types for herald-workflow.

use thiserror::Error;

use herald_core::{Action, DocumentKey, ProposalId, SectionKey, TransitionError};
use herald_store::StoreError;

/// All errors that can arise from workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The permission gate refused the caller. Nothing was written.
    #[error("'{username}' is not permitted to {action:?} on '{target}'")]
    PermissionDenied {
        username: String,
        action: Action,
        target: DocumentKey,
    },

    /// The proposal already reached a terminal status. Nothing was written.
    #[error(transparent)]
    InvalidStateTransition(#[from] TransitionError),

    #[error("proposal {0} not found")]
    ProposalNotFound(ProposalId),

    #[error("no account named '{0}'")]
    UnknownUser(String),

    /// The candidate does not satisfy the section schema, even after default
    /// backfill.
    #[error("candidate for '{section}' does not match its schema: {source}")]
    InvalidCandidate {
        section: SectionKey,
        #[source]
        source: serde_json::Error,
    },

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
