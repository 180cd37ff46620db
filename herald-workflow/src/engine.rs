//! The approval state machine.
//!
//! ```text
//! pending ──approve──▶ approved   (candidate becomes canonical)
//!    │
//!    └────reject────▶ rejected   (canonical document untouched)
//! ```
//!
//! Both terminal states are final. Every operation checks the permission gate
//! before it touches the ledger or the content store.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use herald_core::{
    diff_section, has_permission, merge_section, Action, ChangeProposal, ContentDocument,
    Decision, DocumentKey, Identity, ProposalContent, ProposalId, ProposalStatus, SectionKey,
    TransitionError,
};
use herald_store::ContentRepository;

use crate::error::WorkflowError;
use crate::ledger;

/// Approval workflow bound to one context's content repository.
#[derive(Debug, Clone)]
pub struct ApprovalWorkflow {
    repo: Arc<ContentRepository>,
}

impl ApprovalWorkflow {
    pub fn new(repo: Arc<ContentRepository>) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &Arc<ContentRepository> {
        &self.repo
    }

    /// Submit `candidate` as the new value of `section`.
    ///
    /// The proposal records only the top-level fields that differ from the
    /// current canonical section.
    pub fn propose(
        &self,
        author: &Identity,
        section: &SectionKey,
        candidate: Value,
        title: Option<String>,
    ) -> Result<ChangeProposal, WorkflowError> {
        authorize(author, Action::Propose, section.document())?;
        let candidate = prepare_candidate(section, &candidate)?;

        let current = self.repo.reload(section.document())?;
        let canonical = current.section(section.section()).cloned().unwrap_or(Value::Null);
        let changes = diff_section(section.section(), &canonical, &candidate);

        let store = self.repo.store();
        let mut book = ledger::load(store)?;
        let now = Utc::now();
        let proposal = ChangeProposal {
            id: book.next_id(now),
            title: title.unwrap_or_else(|| format!("update {section}")),
            author: author.username.clone(),
            section: section.clone(),
            status: ProposalStatus::Pending,
            created_at: now,
            approved_by: None,
            approved_at: None,
            comment: None,
            changes,
            content: ProposalContent {
                kind: section.section().to_string(),
                data: candidate,
            },
        };
        book.pending.push(proposal.clone());
        ledger::save(store, &book)?;
        self.repo.announce(&DocumentKey::Proposals, &ledger::as_document(&book));

        tracing::info!(
            "proposal {} for {section} by {} ({} field(s) changed)",
            proposal.id,
            proposal.author,
            proposal.changes.len()
        );
        Ok(proposal)
    }

    /// Approve or reject a pending proposal.
    ///
    /// Fails with [`WorkflowError::InvalidStateTransition`] if the proposal
    /// was already decided; nothing is written in that case.
    ///
    /// The terminal status is persisted before an approved candidate is
    /// applied. If applying fails, the ledger is restored and the proposal
    /// stays pending.
    pub fn decide(
        &self,
        id: ProposalId,
        decision: Decision,
        approver: &Identity,
        comment: Option<String>,
    ) -> Result<ChangeProposal, WorkflowError> {
        let store = self.repo.store();
        let mut book = ledger::read(store)?;
        let proposal = book
            .get(id)
            .cloned()
            .ok_or(WorkflowError::ProposalNotFound(id))?;

        authorize(approver, Action::Decide, proposal.section.document())?;
        if !proposal.is_pending() {
            return Err(TransitionError {
                id,
                status: proposal.status,
            }
            .into());
        }

        let before = book.clone();
        let decided = match book.decide(id, decision, &approver.username, comment, Utc::now()) {
            Some(Ok(decided)) => decided.clone(),
            Some(Err(err)) => return Err(err.into()),
            None => return Err(WorkflowError::ProposalNotFound(id)),
        };
        ledger::save(store, &book)?;

        if decision == Decision::Approve {
            if let Err(err) = self
                .repo
                .replace_section(&proposal.section, proposal.content.data.clone())
            {
                if let Err(restore) = ledger::save(store, &before) {
                    tracing::error!(
                        "proposal {id} recorded as approved but not applied; restoring the ledger failed: {restore}"
                    );
                }
                return Err(err.into());
            }
        }
        self.repo.announce(&DocumentKey::Proposals, &ledger::as_document(&book));

        tracing::info!("proposal {id} {} by {}", decided.status, approver.username);
        Ok(decided)
    }

    /// Write `candidate` as the canonical value of `section` immediately,
    /// without a proposal.
    pub fn publish(
        &self,
        identity: &Identity,
        section: &SectionKey,
        candidate: Value,
    ) -> Result<ContentDocument, WorkflowError> {
        authorize(identity, Action::Publish, section.document())?;
        let candidate = prepare_candidate(section, &candidate)?;
        let doc = self.repo.replace_section(section, candidate)?;
        tracing::info!("{section} published directly by {}", identity.username);
        Ok(doc)
    }

    pub fn get(&self, id: ProposalId) -> Result<ChangeProposal, WorkflowError> {
        ledger::read(self.repo.store())?
            .get(id)
            .cloned()
            .ok_or(WorkflowError::ProposalNotFound(id))
    }

    pub fn pending(&self) -> Result<Vec<ChangeProposal>, WorkflowError> {
        Ok(ledger::read(self.repo.store())?.pending)
    }

    pub fn decided(&self) -> Result<Vec<ChangeProposal>, WorkflowError> {
        Ok(ledger::read(self.repo.store())?.decided)
    }
}

fn authorize(identity: &Identity, action: Action, target: &DocumentKey) -> Result<(), WorkflowError> {
    if has_permission(identity, action, target) {
        return Ok(());
    }
    tracing::warn!("{} denied {action:?} on {target}", identity.username);
    Err(WorkflowError::PermissionDenied {
        username: identity.username.clone(),
        action,
        target: target.clone(),
    })
}

/// Backfill `candidate` from the section default and check it against the
/// section schema.
fn prepare_candidate(section: &SectionKey, candidate: &Value) -> Result<Value, WorkflowError> {
    let kind = section.kind();
    let merged = merge_section(&kind.default_value(section.document()), candidate);
    kind.check(&merged)
        .map_err(|source| WorkflowError::InvalidCandidate {
            section: section.clone(),
            source,
        })?;
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use herald_core::{LocalBroadcast, Role};
    use herald_store::FileStore;
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    fn workflow(home: &TempDir) -> ApprovalWorkflow {
        let repo = ContentRepository::new(FileStore::at(home.path()), Arc::new(LocalBroadcast::new()));
        ApprovalWorkflow::new(Arc::new(repo))
    }

    #[test]
    fn candidate_is_backfilled_from_defaults() {
        let section: SectionKey = "home.hero".parse().unwrap();
        let prepared = prepare_candidate(&section, &json!({ "title": "B" })).unwrap();
        assert_eq!(prepared["title"], "B");
        assert!(prepared["subtitle"].is_string());
    }

    #[test]
    fn candidate_with_wrong_types_is_rejected() {
        let section: SectionKey = "home.stats".parse().unwrap();
        let err = prepare_candidate(&section, &json!({ "employees": "many" })).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidCandidate { .. }));
    }

    #[test]
    fn unknown_proposal_is_not_found() {
        let home = TempDir::new().expect("home");
        let admin = Identity::new("admin", Role::SuperAdmin);
        let err = workflow(&home)
            .decide(ProposalId(42), Decision::Approve, &admin, None)
            .unwrap_err();
        assert!(matches!(err, WorkflowError::ProposalNotFound(ProposalId(42))));
    }

    #[test]
    fn default_title_names_the_section() {
        let home = TempDir::new().expect("home");
        let editor = Identity::new("editor", Role::ContentManager);
        let section: SectionKey = "home.group".parse().unwrap();
        let proposal = workflow(&home)
            .propose(&editor, &section, json!({ "title": "X" }), None)
            .unwrap();
        assert_eq!(proposal.title, "update home.group");
    }
}
