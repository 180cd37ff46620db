//! Herald core library: content model, defaults, permission gate, proposals
//! and the propagation contract.
//!
//! Public API surface:
//! - [`types`]: document/section keys and [`ContentDocument`]
//! - [`sections`]: per-section schemas and their hardcoded defaults
//! - [`merge`]: shallow section merge and field-level diff
//! - [`identity`] / [`permission`]: roles, scopes and the gate
//! - [`proposal`]: change proposals and the proposal ledger
//! - [`broadcast`]: the [`Broadcast`] contract and the same-context transport

pub mod broadcast;
pub mod error;
pub mod identity;
pub mod merge;
pub mod permission;
pub mod proposal;
pub mod sections;
pub mod types;

pub use broadcast::{
    Broadcast, BroadcastError, ContentChanged, ContextId, Listener, ListenerSet, LocalBroadcast,
    SubscriptionId,
};
pub use error::{KeyError, TransitionError};
pub use identity::{Identity, Role, Scope};
pub use merge::{diff_section, merge_section};
pub use permission::{has_permission, Action};
pub use proposal::{
    ChangeProposal, Decision, FieldChange, ProposalContent, ProposalId, ProposalLedger,
    ProposalStatus,
};
pub use sections::{default_document, known_subsidiaries, schema_for, SectionKind};
pub use types::{ContentDocument, DocumentKey, SectionKey, SubsidiaryId};
