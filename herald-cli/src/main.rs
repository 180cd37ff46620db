//! Herald: content publishing and approval CLI.
//!
//! # Usage
//!
//! ```text
//! herald show <document> [--section <name>]
//! herald check [<document>...] [--json]
//! herald publish <section-key> --file <json> --as <username>
//! herald propose <section-key> --file <json> --as <username> [--title <t>]
//! herald proposals list [--all] [--json]
//! herald proposals show <id>
//! herald approve <id> --as <username> [--comment <c>]
//! herald reject <id> --as <username> [--comment <c>]
//! herald users list
//! herald users add <username> --role <role> [--department <id>] [--name <n>] --as <username>
//! herald watch [<document>...]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    check::CheckArgs,
    decide::DecideArgs,
    edit::{ProposeArgs, PublishArgs},
    proposals::ProposalsCommand,
    show::ShowArgs,
    users::UsersCommand,
    watch::WatchArgs,
};
use herald_core::Decision;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "herald",
    version,
    about = "Publish group site content through review and approval",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the canonical document (or one section) as JSON.
    Show(ShowArgs),

    /// Validate stored documents, repairing and persisting what is broken.
    Check(CheckArgs),

    /// Write a section immediately, without a proposal.
    Publish(PublishArgs),

    /// Submit a section change for approval.
    Propose(ProposeArgs),

    /// Inspect change proposals.
    Proposals {
        #[command(subcommand)]
        command: ProposalsCommand,
    },

    /// Approve a pending proposal and make it canonical.
    Approve(DecideArgs),

    /// Reject a pending proposal.
    Reject(DecideArgs),

    /// Manage administrator accounts.
    Users {
        #[command(subcommand)]
        command: UsersCommand,
    },

    /// Follow changes made by other herald processes until interrupted.
    Watch(WatchArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = match cli.command {
        Commands::Watch(_) => "info",
        _ => "warn",
    };
    herald_bus::init_tracing(default_level);

    match cli.command {
        Commands::Show(args) => args.run(),
        Commands::Check(args) => args.run(),
        Commands::Publish(args) => args.run(),
        Commands::Propose(args) => args.run(),
        Commands::Proposals { command } => commands::proposals::run(command),
        Commands::Approve(args) => args.run(Decision::Approve),
        Commands::Reject(args) => args.run(Decision::Reject),
        Commands::Users { command } => commands::users::run(command),
        Commands::Watch(args) => args.run(),
    }
}
