//! `herald show <document>`: print canonical content.

use anyhow::{Context, Result};
use clap::Args;

use herald_core::{DocumentKey, SectionKey};

use super::Session;

/// Arguments for `herald show`.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Document key: home, news, images, users, proposals or subsidiary.<id>.
    pub document: DocumentKey,

    /// Print only this section (e.g. "hero").
    #[arg(long, short = 's')]
    pub section: Option<String>,
}

impl ShowArgs {
    pub fn run(self) -> Result<()> {
        let session = Session::open()?;
        let doc = session
            .repo
            .load(&self.document)
            .with_context(|| format!("failed to load '{}'", self.document))?;

        let value = match &self.section {
            Some(name) => {
                let key = SectionKey::new(self.document.clone(), name)?;
                doc.section(key.section())
                    .cloned()
                    .with_context(|| format!("'{key}' is not present"))?
            }
            None => doc.into_value(),
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        Ok(())
    }
}
