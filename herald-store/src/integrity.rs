//! Integrity validator and self-healing repair.
//!
//! Guarantees a usable document even from an empty or corrupt store.
//!
//! Per section of the document schema:
//! 1. missing → the section default;
//! 2. present → [`merge_section`] over the default, then the schema check;
//! 3. schema check fails → the section default.
//!
//! A payload that is missing, not valid JSON, or not a JSON object is replaced
//! by the full default document. Sections the schema does not know are kept
//! as they are.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;

use herald_core::{default_document, merge_section, schema_for, ContentDocument, DocumentKey};

use crate::error::StoreError;
use crate::store::FileStore;

/// Why a whole document was replaced by its default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "kebab-case")]
pub enum DefaultReason {
    Missing,
    Undecodable(String),
    NotAnObject,
}

/// What the validator had to do to a stored document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum RepairOutcome {
    /// Stored document already satisfied every section schema.
    Clean,
    /// Some sections were backfilled or replaced by their defaults.
    Repaired { sections: Vec<String> },
    /// Nothing usable was stored; the default document was substituted.
    #[serde(rename = "unrecoverable-defaulted")]
    Defaulted { cause: DefaultReason },
}

impl RepairOutcome {
    pub fn is_clean(&self) -> bool {
        matches!(self, RepairOutcome::Clean)
    }

    pub fn label(&self) -> &'static str {
        match self {
            RepairOutcome::Clean => "clean",
            RepairOutcome::Repaired { .. } => "repaired",
            RepairOutcome::Defaulted { .. } => "unrecoverable-defaulted",
        }
    }
}

impl fmt::Display for RepairOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Diagnostic record of one load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    pub key: DocumentKey,
    #[serde(flatten)]
    pub outcome: RepairOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quarantined: Option<PathBuf>,
}

/// Repair a decoded payload against the schema of `key`. Pure.
pub fn repair_value(key: &DocumentKey, stored: &Value) -> (ContentDocument, RepairOutcome) {
    let Value::Object(stored) = stored else {
        return (
            default_document(key),
            RepairOutcome::Defaulted {
                cause: DefaultReason::NotAnObject,
            },
        );
    };

    let mut doc = ContentDocument::from(stored.clone());
    let mut repaired = Vec::new();
    for kind in schema_for(key) {
        let default = kind.default_value(key);
        let value = match stored.get(kind.name()) {
            None => default,
            Some(partial) => {
                let merged = merge_section(&default, partial);
                if kind.check(&merged).is_ok() {
                    merged
                } else {
                    default
                }
            }
        };
        if stored.get(kind.name()) != Some(&value) {
            repaired.push(kind.name().to_string());
        }
        doc.set_section(kind.name(), value);
    }

    let outcome = if repaired.is_empty() {
        RepairOutcome::Clean
    } else {
        RepairOutcome::Repaired { sections: repaired }
    };
    (doc, outcome)
}

/// Bring a document about to be written into schema shape.
pub fn normalize(key: &DocumentKey, document: &ContentDocument) -> ContentDocument {
    repair_value(key, &Value::Object(document.as_map().clone())).0
}

/// Read `key`, repair it, and write the repaired document back when anything
/// had to change.
///
/// Decode failures never escape: they are reported in the [`RepairReport`]
/// and the undecodable payload is quarantined. Only I/O failures are errors.
pub fn load_and_repair(
    store: &FileStore,
    key: &DocumentKey,
) -> Result<(ContentDocument, RepairReport), StoreError> {
    let mut quarantined = None;
    let (doc, outcome) = match store.read(key) {
        Ok(value) => repair_value(key, &value),
        Err(StoreError::NotFound { .. }) => (
            default_document(key),
            RepairOutcome::Defaulted {
                cause: DefaultReason::Missing,
            },
        ),
        Err(StoreError::Decode { source, .. }) => {
            quarantined = store.quarantine(key)?;
            (
                default_document(key),
                RepairOutcome::Defaulted {
                    cause: DefaultReason::Undecodable(source.to_string()),
                },
            )
        }
        Err(err) => return Err(err),
    };

    match &outcome {
        RepairOutcome::Clean => {}
        RepairOutcome::Defaulted {
            cause: DefaultReason::Missing,
        } => {
            tracing::info!("'{key}' not stored yet; persisting defaults");
            store.write(key, &doc)?;
        }
        other => {
            tracing::warn!("'{key}' {other}; writing repaired document back");
            store.write(key, &doc)?;
        }
    }

    Ok((
        doc,
        RepairReport {
            key: key.clone(),
            outcome,
            quarantined,
        },
    ))
}
