//! `herald check`: run the integrity validator over stored documents.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use herald_core::{known_subsidiaries, DocumentKey};
use herald_store::{DefaultReason, RepairOutcome, RepairReport};

use super::Session;

/// Arguments for `herald check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Documents to check. Defaults to every content document and `users`.
    pub documents: Vec<DocumentKey>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct CheckTableRow {
    #[tabled(rename = "document")]
    document: String,
    #[tabled(rename = "outcome")]
    outcome: String,
    #[tabled(rename = "detail")]
    detail: String,
}

impl CheckArgs {
    pub fn run(self) -> Result<()> {
        let session = Session::open()?;
        let keys = if self.documents.is_empty() {
            default_keys(&session)?
        } else {
            self.documents
        };

        let mut reports = Vec::with_capacity(keys.len());
        for key in &keys {
            let (_, report) = session
                .repo
                .check(key)
                .with_context(|| format!("failed to check '{key}'"))?;
            reports.push(report);
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&reports)?);
            return Ok(());
        }
        print_table(&reports);
        Ok(())
    }
}

/// Fixed content documents, `users`, the known subsidiaries and any other
/// subsidiary already in the store.
fn default_keys(session: &Session) -> Result<Vec<DocumentKey>> {
    let mut keys: BTreeSet<DocumentKey> = DocumentKey::fixed()
        .iter()
        .filter(|key| **key != DocumentKey::Proposals)
        .cloned()
        .collect();
    keys.extend(known_subsidiaries().into_iter().map(DocumentKey::Subsidiary));
    let stored = session
        .repo
        .store()
        .keys()
        .context("failed to list stored documents")?;
    keys.extend(stored.into_iter().filter(|key| key.subsidiary().is_some()));
    Ok(keys.into_iter().collect())
}

fn print_table(reports: &[RepairReport]) {
    let rows: Vec<CheckTableRow> = reports
        .iter()
        .map(|report| CheckTableRow {
            document: report.key.to_string(),
            outcome: outcome_label(&report.outcome),
            detail: outcome_detail(report),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    let healed = reports.iter().filter(|r| !r.outcome.is_clean()).count();
    if healed == 0 {
        println!("{}", "✓ all documents clean".green());
    } else {
        println!("{}", format!("⚠ {healed} document(s) repaired and saved").yellow());
    }
}

fn outcome_label(outcome: &RepairOutcome) -> String {
    match outcome {
        RepairOutcome::Clean => outcome.label().green().to_string(),
        RepairOutcome::Repaired { .. } => outcome.label().yellow().to_string(),
        RepairOutcome::Defaulted { .. } => outcome.label().red().to_string(),
    }
}

fn outcome_detail(report: &RepairReport) -> String {
    let mut detail = match &report.outcome {
        RepairOutcome::Clean => String::new(),
        RepairOutcome::Repaired { sections } => format!("sections: {}", sections.join(", ")),
        RepairOutcome::Defaulted { cause } => match cause {
            DefaultReason::Missing => "not stored yet".to_string(),
            DefaultReason::Undecodable(err) => format!("undecodable: {err}"),
            DefaultReason::NotAnObject => "not an object".to_string(),
        },
    };
    if let Some(path) = &report.quarantined {
        detail.push_str(&format!(" (kept at {})", path.display()));
    }
    detail
}
