//! Authored catalog format.
//!
//! A catalog is the list of fragments content writers publish together. Its
//! order is meaningful: fragments are stamped with increasing creation times
//! in catalog order, so the first active fragment becomes the entry point.

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use diana_core::model::{Choice, ChoiceId, ClueId, Fragment, FragmentId, FragmentKind};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors raised while reading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    /// The YAML document is malformed.
    #[error("invalid YAML catalog: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The JSON document is malformed.
    #[error("invalid JSON catalog: {0}")]
    Json(#[from] serde_json::Error),

    /// The file extension is neither YAML nor JSON.
    #[error("unsupported catalog format: {0}")]
    UnsupportedFormat(String),
}

/// A published set of fragments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Catalog {
    /// Fragments in creation order.
    pub fragments: Vec<FragmentEntry>,
}

/// One fragment as authored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FragmentEntry {
    pub id: FragmentId,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub kind: FragmentKind,
    #[serde(default)]
    pub required_clues: Vec<ClueId>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub choices: Vec<ChoiceEntry>,
}

/// One choice as authored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChoiceEntry {
    pub id: ChoiceId,
    pub text: String,
    #[serde(default)]
    pub reward: i64,
    #[serde(default)]
    pub next: Option<FragmentId>,
    #[serde(default)]
    pub unlocks: Vec<ClueId>,
}

fn default_active() -> bool {
    true
}

impl Catalog {
    /// Parses a YAML catalog.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Yaml` if the document does not match the format.
    pub fn from_yaml_str(source: &str) -> Result<Self, CatalogError> {
        Ok(serde_yaml::from_str(source)?)
    }

    /// Parses a JSON catalog.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Json` if the document does not match the format.
    pub fn from_json_str(source: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Reads a catalog file, choosing the parser from the extension
    /// (`.yaml`, `.yml` or `.json`).
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Io` if the file cannot be read,
    /// `CatalogError::UnsupportedFormat` for other extensions, or a parse
    /// error.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("yaml" | "yml") => Self::from_yaml_str(&std::fs::read_to_string(path)?),
            Some("json") => Self::from_json_str(&std::fs::read_to_string(path)?),
            _ => Err(CatalogError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Hex-encoded SHA-256 of the catalog's canonical JSON form. Two catalogs
    /// with the same content have the same fingerprint regardless of the
    /// source format or whitespace.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Json` if serialization fails.
    pub fn fingerprint(&self) -> Result<String, CatalogError> {
        let canonical = serde_json::to_vec(self)?;
        Ok(hex::encode(Sha256::digest(&canonical)))
    }

    /// Converts the catalog into fragments, stamping creation times one
    /// millisecond apart starting at `base`.
    #[must_use]
    pub fn to_fragments(&self, base: DateTime<Utc>) -> Vec<Fragment> {
        self.fragments
            .iter()
            .zip(0_i64..)
            .map(|(entry, offset)| entry.to_fragment(base + Duration::milliseconds(offset)))
            .collect()
    }
}

impl FragmentEntry {
    fn to_fragment(&self, created_at: DateTime<Utc>) -> Fragment {
        Fragment {
            id: self.id.clone(),
            title: self.title.clone(),
            content: self.content.clone(),
            kind: self.kind,
            choices: self.choices.iter().map(ChoiceEntry::to_choice).collect(),
            required_clues: self.required_clues.clone(),
            is_active: self.active,
            created_at,
        }
    }
}

impl ChoiceEntry {
    fn to_choice(&self) -> Choice {
        Choice {
            id: self.id.clone(),
            text: self.text.clone(),
            reward: self.reward,
            next_fragment_id: self.next.clone(),
            unlocks: self.unlocks.clone(),
        }
    }
}
