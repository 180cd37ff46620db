//! `herald users list` and `herald users add <username>`

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use tabled::{settings::Style, Table, Tabled};

use herald_core::sections::UserAccount;
use herald_core::{Role, SubsidiaryId};

use super::Session;

#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    /// List administrator accounts.
    List,

    /// Add an account, or update the account with the same username.
    Add(AddArgs),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Login name of the account.
    pub username: String,

    /// super_admin | content_manager | subsidiary_admin | user_manager | viewer
    #[arg(long, short = 'r')]
    pub role: Role,

    /// Subsidiary the account administers (subsidiary_admin only).
    #[arg(long, short = 'd')]
    pub department: Option<SubsidiaryId>,

    /// Display name. Defaults to the username.
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Account performing the change.
    #[arg(long = "as", value_name = "USERNAME")]
    pub actor: String,
}

#[derive(Tabled)]
struct AccountRow {
    #[tabled(rename = "username")]
    username: String,
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "role")]
    role: String,
    #[tabled(rename = "department")]
    department: String,
}

pub fn run(cmd: UsersCommand) -> Result<()> {
    match cmd {
        UsersCommand::List => list(),
        UsersCommand::Add(args) => add(args),
    }
}

fn list() -> Result<()> {
    let session = Session::open()?;
    let accounts = session
        .users()
        .accounts()
        .context("failed to read accounts")?;

    let rows: Vec<AccountRow> = accounts
        .into_iter()
        .map(|a| AccountRow {
            username: a.username,
            name: a.display_name,
            role: a.role.to_string(),
            department: a.department.map(|d| d.to_string()).unwrap_or_default(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    Ok(())
}

fn add(args: AddArgs) -> Result<()> {
    if args.role == Role::SubsidiaryAdmin && args.department.is_none() {
        anyhow::bail!("subsidiary_admin accounts need --department <id>");
    }

    let session = Session::open()?;
    let actor = session.identity(&args.actor)?;
    let account = UserAccount {
        display_name: args.name.unwrap_or_else(|| args.username.clone()),
        username: args.username,
        role: args.role,
        department: args.department,
    };
    let username = account.username.clone();

    let replaced = session
        .users()
        .upsert(&actor, account)
        .with_context(|| format!("failed to save account '{username}'"))?;
    if replaced {
        println!("✓ Updated account '{username}'");
    } else {
        println!("✓ Added account '{username}'");
    }
    Ok(())
}
