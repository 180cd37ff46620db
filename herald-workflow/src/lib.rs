//! # herald-workflow
//!
//! Approval workflow over content changes.
//!
//! Editors [`propose`](ApprovalWorkflow::propose) a candidate section; an
//! approver [`decide`](ApprovalWorkflow::decide)s it exactly once. Approved
//! candidates become canonical through the content repository, which writes
//! the store and announces the change. Every proposal stays in the ledger as
//! an audit record.
//!
//! [`UserDirectory`] resolves usernames to the identities the permission
//! gate checks.

pub mod engine;
pub mod error;
pub mod ledger;
pub mod render;
pub mod users;

pub use engine::ApprovalWorkflow;
pub use error::WorkflowError;
pub use render::render_changes;
pub use users::UserDirectory;
