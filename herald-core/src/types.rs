//! Keys and the content document container.
//!
//! A [`DocumentKey`] names one independently stored entry of the content
//! store; a [`SectionKey`] names one section inside such a document
//! (`home.hero`, `subsidiary.construction.contact`). Both serialize as their
//! dotted text form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::KeyError;
use crate::sections::{section_kind, SectionKind};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Slug identifying one group company (`construction`, `logistics`, …).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubsidiaryId(String);

impl SubsidiaryId {
    /// Validate and wrap a subsidiary slug.
    pub fn new(id: impl Into<String>) -> Result<Self, KeyError> {
        let id = id.into();
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
        if valid {
            Ok(Self(id))
        } else {
            Err(KeyError::InvalidSubsidiaryId(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubsidiaryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SubsidiaryId {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for SubsidiaryId {
    type Error = KeyError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<SubsidiaryId> for String {
    fn from(id: SubsidiaryId) -> Self {
        id.0
    }
}

// ---------------------------------------------------------------------------
// DocumentKey
// ---------------------------------------------------------------------------

/// One entry of the durable content store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DocumentKey {
    Home,
    News,
    Images,
    Users,
    Proposals,
    Subsidiary(SubsidiaryId),
}

impl DocumentKey {
    /// Whether the document holds site content (as opposed to users or the
    /// proposal ledger).
    pub fn is_content(&self) -> bool {
        matches!(
            self,
            DocumentKey::Home | DocumentKey::News | DocumentKey::Images | DocumentKey::Subsidiary(_)
        )
    }

    /// The department bound to a subsidiary document, if any.
    pub fn subsidiary(&self) -> Option<&SubsidiaryId> {
        match self {
            DocumentKey::Subsidiary(id) => Some(id),
            _ => None,
        }
    }

    /// Every fixed (non-parameterised) document key.
    pub fn fixed() -> &'static [DocumentKey] {
        &[
            DocumentKey::Home,
            DocumentKey::News,
            DocumentKey::Images,
            DocumentKey::Users,
            DocumentKey::Proposals,
        ]
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKey::Home => write!(f, "home"),
            DocumentKey::News => write!(f, "news"),
            DocumentKey::Images => write!(f, "images"),
            DocumentKey::Users => write!(f, "users"),
            DocumentKey::Proposals => write!(f, "proposals"),
            DocumentKey::Subsidiary(id) => write!(f, "subsidiary.{id}"),
        }
    }
}

impl FromStr for DocumentKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "home" => Ok(DocumentKey::Home),
            "news" => Ok(DocumentKey::News),
            "images" => Ok(DocumentKey::Images),
            "users" => Ok(DocumentKey::Users),
            "proposals" => Ok(DocumentKey::Proposals),
            other => match other.strip_prefix("subsidiary.") {
                Some(id) => Ok(DocumentKey::Subsidiary(SubsidiaryId::new(id)?)),
                None => Err(KeyError::UnknownDocument(other.to_string())),
            },
        }
    }
}

impl TryFrom<String> for DocumentKey {
    type Error = KeyError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<DocumentKey> for String {
    fn from(key: DocumentKey) -> Self {
        key.to_string()
    }
}

// ---------------------------------------------------------------------------
// SectionKey
// ---------------------------------------------------------------------------

/// A schema-known section inside a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SectionKey {
    document: DocumentKey,
    kind: SectionKind,
}

impl SectionKey {
    /// Build a section key, rejecting sections the document schema does not
    /// define.
    pub fn new(document: DocumentKey, section: &str) -> Result<Self, KeyError> {
        let kind = section_kind(&document, section).ok_or_else(|| KeyError::UnknownSection {
            document: document.to_string(),
            section: section.to_string(),
        })?;
        Ok(Self { document, kind })
    }

    pub fn document(&self) -> &DocumentKey {
        &self.document
    }

    pub fn kind(&self) -> SectionKind {
        self.kind
    }

    pub fn section(&self) -> &'static str {
        self.kind.name()
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.document, self.kind.name())
    }
}

impl FromStr for SectionKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (document, section) = s
            .rsplit_once('.')
            .ok_or_else(|| KeyError::MalformedSectionKey(s.to_string()))?;
        SectionKey::new(document.parse()?, section)
    }
}

impl TryFrom<String> for SectionKey {
    type Error = KeyError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<SectionKey> for String {
    fn from(key: SectionKey) -> Self {
        key.to_string()
    }
}

// ---------------------------------------------------------------------------
// ContentDocument
// ---------------------------------------------------------------------------

/// Section name → section value for one stored document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentDocument(Map<String, Value>);

impl ContentDocument {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn section(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Replace one section wholesale, returning the previous value.
    pub fn set_section(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(name.into(), value)
    }

    pub fn sections(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for ContentDocument {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_key_text_form_roundtrips() {
        for text in ["home", "news", "images", "users", "proposals", "subsidiary.tech"] {
            let key: DocumentKey = text.parse().expect("parse");
            assert_eq!(key.to_string(), text);
        }
    }

    #[test]
    fn unknown_document_key_rejected() {
        let err = "dashboard".parse::<DocumentKey>().unwrap_err();
        assert_eq!(err, KeyError::UnknownDocument("dashboard".into()));
    }

    #[test]
    fn subsidiary_id_rejects_uppercase_and_empty() {
        assert!(SubsidiaryId::new("Tech").is_err());
        assert!(SubsidiaryId::new("").is_err());
        assert!("subsidiary.".parse::<DocumentKey>().is_err());
        assert!(SubsidiaryId::new("e-mobility_2").is_ok());
    }

    #[test]
    fn section_key_splits_on_last_dot() {
        let key: SectionKey = "subsidiary.construction.contact".parse().expect("parse");
        assert_eq!(
            key.document(),
            &DocumentKey::Subsidiary(SubsidiaryId::new("construction").unwrap())
        );
        assert_eq!(key.section(), "contact");
        assert_eq!(key.to_string(), "subsidiary.construction.contact");
    }

    #[test]
    fn section_key_requires_known_section() {
        let err = "home.footer".parse::<SectionKey>().unwrap_err();
        assert!(matches!(err, KeyError::UnknownSection { .. }));
        let err = "home".parse::<SectionKey>().unwrap_err();
        assert!(matches!(err, KeyError::MalformedSectionKey(_)));
    }

    #[test]
    fn keys_serialize_as_strings() {
        let key: SectionKey = "home.hero".parse().unwrap();
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"home.hero\"");
        let back: DocumentKey = serde_json::from_str("\"subsidiary.logistics\"").unwrap();
        assert_eq!(back.to_string(), "subsidiary.logistics");
    }

    #[test]
    fn only_content_documents_are_content() {
        assert!(DocumentKey::Home.is_content());
        assert!(!DocumentKey::Users.is_content());
        assert!(!DocumentKey::Proposals.is_content());
    }
}
