//! `herald watch`: follow changes published by other herald processes.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Args;
use colored::Colorize;

use herald_bus::{ContentBus, ContentView};
use herald_core::{known_subsidiaries, ContentChanged, ContextId, DocumentKey};
use herald_store::{paths, ContentRepository, FileStore};

/// Arguments for `herald watch`.
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Documents to follow. Defaults to every fixed document and the known
    /// subsidiaries.
    pub documents: Vec<DocumentKey>,
}

impl WatchArgs {
    pub fn run(self) -> Result<()> {
        let home = paths::home_dir()?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("failed to start the async runtime")?;
        runtime.block_on(self.watch(home))
    }

    async fn watch(self, home: PathBuf) -> Result<()> {
        let bus = ContentBus::spawn(&home, ContextId::random())
            .context("failed to start the signal watcher")?;
        let context = bus.context();
        let repo = Arc::new(ContentRepository::new(FileStore::at(&home), Arc::new(bus)));

        let keys = if self.documents.is_empty() {
            default_keys()
        } else {
            self.documents
        };

        let mut view = ContentView::new(repo).on_change(print_change);
        view.activate(&keys)
            .context("failed to read current content")?;
        tracing::info!(context = %context, documents = keys.len(), "watching for content changes");

        tokio::signal::ctrl_c()
            .await
            .context("ctrl-c handler failed")?;
        view.deactivate();
        tracing::info!("received ctrl-c, stopped watching");
        Ok(())
    }
}

fn default_keys() -> Vec<DocumentKey> {
    DocumentKey::fixed()
        .iter()
        .cloned()
        .chain(known_subsidiaries().into_iter().map(DocumentKey::Subsidiary))
        .collect()
}

fn print_change(change: &ContentChanged) {
    println!(
        "{} {} updated ({} section(s))",
        Local::now().format("%H:%M:%S").to_string().dimmed(),
        change.key.to_string().bold(),
        change.document.len()
    );
}
