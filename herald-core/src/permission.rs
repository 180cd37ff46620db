//! The permission gate.
//!
//! [`has_permission`] is pure: it looks only at the caller's identity, the
//! requested action and the target document. Callers evaluate it before any
//! proposal is created, any decision is applied or any write is attempted.

use crate::identity::{Identity, Scope};
use crate::types::DocumentKey;

/// What the caller wants to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Submit a change proposal.
    Propose,
    /// Approve or reject a pending proposal.
    Decide,
    /// Write a document directly, bypassing approval.
    Publish,
    /// Administer user accounts.
    ManageUsers,
}

impl Action {
    fn is_content(self) -> bool {
        matches!(self, Action::Propose | Action::Decide | Action::Publish)
    }
}

/// Whether `identity` may perform `action` on `document`.
pub fn has_permission(identity: &Identity, action: Action, document: &DocumentKey) -> bool {
    identity
        .role
        .scopes()
        .iter()
        .any(|scope| scope_allows(*scope, identity, action, document))
}

fn scope_allows(scope: Scope, identity: &Identity, action: Action, document: &DocumentKey) -> bool {
    let target_ok = match action {
        Action::ManageUsers => *document == DocumentKey::Users,
        _ => document.is_content(),
    };
    if !target_ok {
        return false;
    }
    match scope {
        Scope::All => true,
        Scope::Content => action.is_content(),
        Scope::Subsidiary => {
            action.is_content()
                && matches!(
                    (document.subsidiary(), identity.department.as_ref()),
                    (Some(target), Some(department)) if target == department
                )
        }
        Scope::Users => action == Action::ManageUsers,
    }
}
