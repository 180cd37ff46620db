//! Persistence of the proposal ledger under the `proposals` store key.
//!
//! Pending and decided proposals are written together as one entry. [`read`]
//! never touches the store. [`load`] is for callers that already passed the
//! permission gate and are about to write: a ledger that cannot be decoded is
//! quarantined there (the audit trail is kept on disk next to the store) and
//! replaced by an empty one.

use herald_core::{ContentDocument, DocumentKey, ProposalLedger};
use herald_store::{FileStore, StoreError};

/// Load the ledger, treating a missing entry as empty.
pub fn load(store: &FileStore) -> Result<ProposalLedger, StoreError> {
    match store.read_as::<ProposalLedger>(&DocumentKey::Proposals) {
        Ok(ledger) => Ok(ledger),
        Err(StoreError::NotFound { .. }) => Ok(ProposalLedger::default()),
        Err(StoreError::Decode { source, .. }) => {
            tracing::warn!("proposal ledger undecodable ({source}); starting a fresh ledger");
            store.quarantine(&DocumentKey::Proposals)?;
            Ok(ProposalLedger::default())
        }
        Err(err) => Err(err),
    }
}

/// Read the ledger without side effects. Missing or undecodable reads as
/// empty; the stored bytes are left where they are.
pub fn read(store: &FileStore) -> Result<ProposalLedger, StoreError> {
    match store.read_as::<ProposalLedger>(&DocumentKey::Proposals) {
        Ok(ledger) => Ok(ledger),
        Err(StoreError::NotFound { .. }) => Ok(ProposalLedger::default()),
        Err(StoreError::Decode { source, .. }) => {
            tracing::debug!("proposal ledger undecodable ({source}); reading as empty");
            Ok(ProposalLedger::default())
        }
        Err(err) => Err(err),
    }
}

pub fn save(store: &FileStore, ledger: &ProposalLedger) -> Result<(), StoreError> {
    store.write(&DocumentKey::Proposals, ledger)
}

/// The ledger in the shape carried by propagation signals.
pub fn as_document(ledger: &ProposalLedger) -> ContentDocument {
    match serde_json::to_value(ledger) {
        Ok(serde_json::Value::Object(map)) => ContentDocument::from(map),
        _ => ContentDocument::new(),
    }
}
