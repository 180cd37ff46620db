pub mod check;
pub mod decide;
pub mod edit;
pub mod proposals;
pub mod show;
pub mod users;
pub mod watch;

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use colored::{ColoredString, Colorize};
use serde_json::Value;

use herald_bus::ContentBus;
use herald_core::{ContextId, Identity, ProposalStatus};
use herald_store::{paths, ContentRepository, FileStore};
use herald_workflow::{ApprovalWorkflow, UserDirectory};

/// One CLI invocation's execution context.
///
/// Announces its writes to running `herald watch` processes but does not
/// listen itself, so no async runtime is needed.
pub struct Session {
    pub repo: Arc<ContentRepository>,
}

impl Session {
    pub fn open() -> Result<Self> {
        let home = paths::home_dir()?;
        let bus = ContentBus::publisher(&home, ContextId::random());
        let repo = ContentRepository::new(FileStore::at(&home), Arc::new(bus));
        Ok(Self {
            repo: Arc::new(repo),
        })
    }

    pub fn workflow(&self) -> ApprovalWorkflow {
        ApprovalWorkflow::new(self.repo.clone())
    }

    pub fn users(&self) -> UserDirectory {
        UserDirectory::new(self.repo.clone())
    }

    /// Resolve `--as <username>` against the account directory.
    pub fn identity(&self, username: &str) -> Result<Identity> {
        self.users()
            .resolve(username)
            .with_context(|| format!("cannot act as '{username}'; see `herald users list`"))
    }
}

/// Read a JSON candidate from `path`, or from stdin when `path` is `-`.
pub fn read_json(path: &Path) -> Result<Value> {
    let text = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read candidate from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?
    };
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

pub fn status_label(status: ProposalStatus) -> ColoredString {
    let text = status.to_string();
    match status {
        ProposalStatus::Pending => text.yellow(),
        ProposalStatus::Approved => text.green(),
        ProposalStatus::Rejected => text.red(),
    }
}
