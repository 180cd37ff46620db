//! `herald publish` and `herald propose`: change one section.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use herald_core::SectionKey;
use herald_workflow::render_changes;

use super::{read_json, Session};

/// Arguments for `herald publish`.
#[derive(Args, Debug)]
pub struct PublishArgs {
    /// Section to write, e.g. "home.hero" or "subsidiary.tech.contact".
    pub section: SectionKey,

    /// JSON file holding the new section value ("-" for stdin). Fields left
    /// out are filled from the section default.
    #[arg(long, short = 'f')]
    pub file: PathBuf,

    /// Account performing the write.
    #[arg(long = "as", value_name = "USERNAME")]
    pub actor: String,
}

impl PublishArgs {
    pub fn run(self) -> Result<()> {
        let session = Session::open()?;
        let identity = session.identity(&self.actor)?;
        let candidate = read_json(&self.file)?;

        session
            .workflow()
            .publish(&identity, &self.section, candidate)
            .with_context(|| format!("failed to publish '{}'", self.section))?;
        println!("✓ Published '{}'", self.section);
        Ok(())
    }
}

/// Arguments for `herald propose`.
#[derive(Args, Debug)]
pub struct ProposeArgs {
    /// Section to change, e.g. "home.hero".
    pub section: SectionKey,

    /// JSON file holding the candidate section value ("-" for stdin).
    #[arg(long, short = 'f')]
    pub file: PathBuf,

    /// Account submitting the proposal.
    #[arg(long = "as", value_name = "USERNAME")]
    pub actor: String,

    /// Short description shown to approvers.
    #[arg(long, short = 't')]
    pub title: Option<String>,
}

impl ProposeArgs {
    pub fn run(self) -> Result<()> {
        let session = Session::open()?;
        let identity = session.identity(&self.actor)?;
        let candidate = read_json(&self.file)?;

        let proposal = session
            .workflow()
            .propose(&identity, &self.section, candidate, self.title)
            .with_context(|| format!("failed to propose a change to '{}'", self.section))?;

        println!(
            "✓ Proposal {} submitted for '{}' ({} field(s) changed)",
            proposal.id.to_string().bold(),
            proposal.section,
            proposal.changes.len()
        );
        let diff = render_changes(&proposal);
        if !diff.is_empty() {
            print!("{diff}");
        }
        Ok(())
    }
}
