//! `herald approve <id>` / `herald reject <id>`

use anyhow::{Context, Result};
use clap::Args;

use herald_core::{Decision, ProposalId};

use super::{status_label, Session};

#[derive(Args, Debug)]
pub struct DecideArgs {
    /// Proposal id, as printed by `herald proposals list`.
    pub id: u64,

    /// Account making the decision.
    #[arg(long = "as", value_name = "USERNAME")]
    pub actor: String,

    /// Note stored with the decision.
    #[arg(long, short = 'c')]
    pub comment: Option<String>,
}

impl DecideArgs {
    pub fn run(self, decision: Decision) -> Result<()> {
        let session = Session::open()?;
        let identity = session.identity(&self.actor)?;
        let id = ProposalId(self.id);

        let proposal = session
            .workflow()
            .decide(id, decision, &identity, self.comment)
            .with_context(|| format!("failed to decide proposal {id}"))?;
        println!(
            "✓ Proposal {} {} ('{}')",
            proposal.id,
            status_label(proposal.status),
            proposal.section
        );
        Ok(())
    }
}
