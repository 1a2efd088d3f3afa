//! Framework and entry documents.
//!
//! Documents use the camelCase wire field names. JSON is chosen by a `.json` extension and
//! YAML otherwise; YAML parsing also accepts JSON text.

use std::path::PathBuf;

use deep_types::{Entry, Framework};
use deep_util::DocumentFormat;
use serde::{Deserialize, de::DeserializeOwned};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("document contains no entries")]
    NoEntries,
}

/// Parses a document of type `T` in `format`.
pub fn parse_document<T: DeserializeOwned>(text: &str, format: DocumentFormat) -> Result<T, LoadError> {
    match format {
        DocumentFormat::Json => Ok(serde_json::from_str(text)?),
        DocumentFormat::Yaml => Ok(serde_yaml::from_str(text)?),
    }
}

pub fn parse_framework(text: &str, format: DocumentFormat) -> Result<Framework, LoadError> {
    parse_document(text, format)
}

/// Parses either a single entry or an `entries:` list.
pub fn parse_entries(text: &str, format: DocumentFormat) -> Result<Vec<Entry>, LoadError> {
    #[derive(Deserialize)]
    struct EntriesDocument {
        entries: Vec<Entry>,
    }

    let entries = match parse_document::<EntriesDocument>(text, format) {
        Ok(document) => document.entries,
        Err(_) => vec![parse_document::<Entry>(text, format)?],
    };
    if entries.is_empty() {
        return Err(LoadError::NoEntries);
    }
    Ok(entries)
}
