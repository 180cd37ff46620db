//! `herald proposals list` and `herald proposals show <id>`

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use tabled::{settings::Style, Table, Tabled};

use herald_core::{ChangeProposal, ProposalId};
use herald_workflow::render_changes;

use super::{status_label, Session};

#[derive(Subcommand, Debug)]
pub enum ProposalsCommand {
    /// List pending proposals (or every proposal with --all).
    List(ListArgs),

    /// Show one proposal with a diff of its changes.
    Show {
        /// Proposal id.
        id: u64,
    },
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Include approved and rejected proposals.
    #[arg(long)]
    pub all: bool,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct ProposalRow {
    #[tabled(rename = "id")]
    id: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "section")]
    section: String,
    #[tabled(rename = "title")]
    title: String,
    #[tabled(rename = "author")]
    author: String,
    #[tabled(rename = "created")]
    created: String,
}

pub fn run(cmd: ProposalsCommand) -> Result<()> {
    match cmd {
        ProposalsCommand::List(args) => list(args),
        ProposalsCommand::Show { id } => show(ProposalId(id)),
    }
}

fn list(args: ListArgs) -> Result<()> {
    let session = Session::open()?;
    let workflow = session.workflow();
    let mut proposals = workflow.pending().context("failed to read proposals")?;
    if args.all {
        proposals.extend(workflow.decided().context("failed to read proposals")?);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&proposals)?);
        return Ok(());
    }
    if proposals.is_empty() {
        println!("No proposals.");
        return Ok(());
    }

    let rows: Vec<ProposalRow> = proposals.iter().map(row).collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    Ok(())
}

fn show(id: ProposalId) -> Result<()> {
    let session = Session::open()?;
    let proposal = session
        .workflow()
        .get(id)
        .with_context(|| format!("failed to load proposal {id}"))?;

    println!("proposal {}  {}", proposal.id, status_label(proposal.status));
    println!("title:    {}", proposal.title);
    println!("section:  {}", proposal.section);
    println!("author:   {}", proposal.author);
    println!("created:  {}", proposal.created_at.to_rfc3339());
    if let (Some(by), Some(at)) = (&proposal.approved_by, &proposal.approved_at) {
        println!("decided:  {} by {by}", at.to_rfc3339());
    }
    if let Some(comment) = &proposal.comment {
        println!("comment:  {comment}");
    }
    println!();

    let diff = render_changes(&proposal);
    if diff.is_empty() {
        println!("(no field changes)");
    } else {
        print!("{diff}");
    }
    Ok(())
}

fn row(p: &ChangeProposal) -> ProposalRow {
    ProposalRow {
        id: p.id.to_string(),
        status: status_label(p.status).to_string(),
        section: p.section.to_string(),
        title: p.title.clone(),
        author: p.author.clone(),
        created: p.created_at.format("%Y-%m-%d %H:%M").to_string(),
    }
}
