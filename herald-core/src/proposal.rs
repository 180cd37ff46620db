//! Change proposals and the persisted proposal ledger.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TransitionError;
use crate::types::SectionKey;

/// Numeric proposal identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProposalId(pub u64);

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle state. `Approved` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProposalStatus::Pending => write!(f, "pending"),
            ProposalStatus::Approved => write!(f, "approved"),
            ProposalStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// Outcome chosen by an approver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn status(self) -> ProposalStatus {
        match self {
            Decision::Approve => ProposalStatus::Approved,
            Decision::Reject => ProposalStatus::Rejected,
        }
    }
}

/// One changed field: the canonical value and the proposed one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub old: Value,
    pub new: Value,
}

/// The candidate carried by a proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalContent {
    /// Section name inside the target document.
    #[serde(rename = "type")]
    pub kind: String,
    /// Full candidate section value.
    pub data: Value,
}

/// A candidate section change awaiting (or past) a decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeProposal {
    pub id: ProposalId,
    pub title: String,
    pub author: String,
    pub section: SectionKey,
    pub status: ProposalStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub changes: BTreeMap<String, FieldChange>,
    pub content: ProposalContent,
}

impl ChangeProposal {
    pub fn is_pending(&self) -> bool {
        self.status == ProposalStatus::Pending
    }

    /// Move a pending proposal to its terminal status and stamp the audit
    /// fields. Terminal proposals are left untouched.
    pub fn decide(
        &mut self,
        decision: Decision,
        approver: &str,
        comment: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        if !self.is_pending() {
            return Err(TransitionError {
                id: self.id,
                status: self.status,
            });
        }
        self.status = decision.status();
        self.approved_by = Some(approver.to_string());
        self.approved_at = Some(at);
        self.comment = comment;
        Ok(())
    }
}

/// The whole proposal collection, persisted as a single store entry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProposalLedger {
    #[serde(default)]
    pub pending: Vec<ChangeProposal>,
    #[serde(default)]
    pub decided: Vec<ChangeProposal>,
}

impl ProposalLedger {
    /// Next unique id: the current time in milliseconds, bumped past every id
    /// already in the ledger.
    pub fn next_id(&self, now: DateTime<Utc>) -> ProposalId {
        let clock = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        let highest = self.iter().map(|p| p.id.0).max().map_or(0, |id| id.saturating_add(1));
        ProposalId(clock.max(highest))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChangeProposal> {
        self.pending.iter().chain(self.decided.iter())
    }

    pub fn get(&self, id: ProposalId) -> Option<&ChangeProposal> {
        self.iter().find(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.pending.len() + self.decided.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decide a pending proposal and move it to the decided partition.
    ///
    /// Returns the decided proposal, or `None` if `id` is unknown.
    pub fn decide(
        &mut self,
        id: ProposalId,
        decision: Decision,
        approver: &str,
        comment: Option<String>,
        at: DateTime<Utc>,
    ) -> Option<Result<&ChangeProposal, TransitionError>> {
        if let Some(decided) = self.decided.iter().find(|p| p.id == id) {
            return Some(Err(TransitionError {
                id,
                status: decided.status,
            }));
        }
        let index = self.pending.iter().position(|p| p.id == id)?;
        let mut proposal = self.pending.remove(index);
        if let Err(err) = proposal.decide(decision, approver, comment, at) {
            self.pending.insert(index, proposal);
            return Some(Err(err));
        }
        self.decided.push(proposal);
        self.decided.last().map(Ok)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn proposal(id: u64) -> ChangeProposal {
        ChangeProposal {
            id: ProposalId(id),
            title: "hero copy".into(),
            author: "editor".into(),
            section: "home.hero".parse().unwrap(),
            status: ProposalStatus::Pending,
            created_at: Utc::now(),
            approved_by: None,
            approved_at: None,
            comment: None,
            changes: BTreeMap::new(),
            content: ProposalContent {
                kind: "hero".into(),
                data: json!({}),
            },
        }
    }

    #[test]
    fn next_id_is_monotonic_past_existing_ids() {
        let now = Utc.timestamp_millis_opt(1_000).unwrap();
        let mut ledger = ProposalLedger::default();
        assert_eq!(ledger.next_id(now), ProposalId(1_000));
        ledger.pending.push(proposal(5_000));
        assert_eq!(ledger.next_id(now), ProposalId(5_001));
    }

    #[test]
    fn next_id_saturates_at_the_largest_id() {
        let mut ledger = ProposalLedger::default();
        ledger.pending.push(proposal(u64::MAX));
        assert_eq!(ledger.next_id(Utc::now()), ProposalId(u64::MAX));
    }

    #[test]
    fn decide_moves_to_decided_and_stamps() {
        let mut ledger = ProposalLedger::default();
        ledger.pending.push(proposal(1));
        let at = Utc::now();
        let decided = ledger
            .decide(ProposalId(1), Decision::Reject, "boss", Some("no".into()), at)
            .expect("known")
            .expect("pending");
        assert_eq!(decided.status, ProposalStatus::Rejected);
        assert_eq!(decided.approved_by.as_deref(), Some("boss"));
        assert_eq!(decided.approved_at, Some(at));
        assert!(ledger.pending.is_empty());
        assert_eq!(ledger.decided.len(), 1);
    }

    #[test]
    fn second_decision_is_refused() {
        let mut ledger = ProposalLedger::default();
        ledger.pending.push(proposal(1));
        let now = Utc::now();
        assert!(matches!(
            ledger.decide(ProposalId(1), Decision::Approve, "a", None, now),
            Some(Ok(_))
        ));
        let err = ledger
            .decide(ProposalId(1), Decision::Reject, "b", None, now)
            .expect("known")
            .unwrap_err();
        assert_eq!(err.status, ProposalStatus::Approved);
        assert_eq!(ledger.decided[0].approved_by.as_deref(), Some("a"));
    }

    #[test]
    fn unknown_id_is_none() {
        let mut ledger = ProposalLedger::default();
        assert!(ledger
            .decide(ProposalId(9), Decision::Approve, "a", None, Utc::now())
            .is_none());
    }

    #[test]
    fn wire_shape_uses_camel_case_and_type() {
        let value = serde_json::to_value(proposal(7)).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["section"], "home.hero");
        assert_eq!(value["status"], "pending");
        assert_eq!(value["content"]["type"], "hero");
        assert!(value.get("createdAt").is_some());
        assert!(value.get("approvedBy").is_none());
    }
}
