//! # DEEP Engine
//!
//! Rule-bearing core of the DEEP tagging surface: which widgets an entry shows, how their
//! values are decoded for input controls, which renderer draws them, and how edits propagate
//! back into the entry's form value.
//!
//! ## Usage
//!
//! ```rust
//! use deep_engine::{EntryForm, RenderMode, load_entries_file, load_framework_file};
//!
//! let temp_dir = tempfile::tempdir()?;
//! let framework_path = temp_dir.path().join("framework.yaml");
//! std::fs::write(&framework_path, r#"
//! title: Sample
//! secondaryTagging:
//!   - clientId: notes
//!     widgetId: TEXT
//!     title: Notes
//! "#)?;
//! let entry_path = temp_dir.path().join("entry.json");
//! std::fs::write(&entry_path, r#"{ "clientId": "e1", "attributes": [] }"#)?;
//!
//! let framework = load_framework_file(&framework_path)?;
//! let entries = load_entries_file(&entry_path)?;
//! let form = EntryForm::new(&framework, &entries[0]);
//! for section in form.render(RenderMode::Edit) {
//!     println!("{}: {} widgets", section.title, section.attributes.len());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - **`descriptor`**: static registry of widget kinds
//! - **`codec`**: wire value <-> typed input value
//! - **`conditional`**: visibility rules and authoring-time validation
//! - **`render`**: renderer dispatch, props and textual rendering
//! - **`form`**: key-scoped value/error propagation
//! - **`planner`**: cascading visibility for a whole framework
//! - **`entry_form`**: one entry being tagged

use std::{fs, path::Path};

use anyhow::{Context, Result};
use deep_types::{Entry, Framework};
use deep_util::document_format;

pub mod codec;
pub mod conditional;
pub mod descriptor;
pub mod entry_form;
pub mod form;
pub mod loader;
pub mod planner;
pub mod render;

pub use codec::{AttributeEdit, decode_value, encode_value, from_input_value, to_input_value};
pub use conditional::{ConditionEvaluator, ConditionalIssue, WidgetLookup, is_visible, validate_framework};
pub use descriptor::{ValueKind, WidgetDescriptor, describe};
pub use entry_form::{EntryForm, RenderedSection, SECONDARY_TAGGING_ID, validate_attribute};
pub use form::{FormObject, ObjectScope, SetValue, set_object_value};
pub use loader::LoadError;
pub use planner::{VisibilityPlan, hidden_widget_ids, prune_hidden_attributes, visible_widgets};
pub use render::{
    AttributeRenderer, RenderMode, RenderProps, RenderedAttribute, RendererKind, RendererResolution, render_attribute, resolve_renderer,
};

/// Loads a framework document, YAML unless the extension is `.json`.
///
/// # Errors
///
/// Fails when the file cannot be read or does not describe a framework.
pub fn load_framework_file(file_path: impl AsRef<Path>) -> Result<Framework> {
    let file_path = file_path.as_ref();
    let text = read_document(file_path)?;
    loader::parse_framework(&text, document_format(file_path))
        .with_context(|| format!("Failed to parse framework file: {}", file_path.display()))
}

/// Loads one entry, or every entry of an `entries:` document.
pub fn load_entries_file(file_path: impl AsRef<Path>) -> Result<Vec<Entry>> {
    let file_path = file_path.as_ref();
    let text = read_document(file_path)?;
    loader::parse_entries(&text, document_format(file_path)).with_context(|| format!("Failed to parse entry file: {}", file_path.display()))
}

/// Loads an entry file and returns its first entry.
pub fn load_entry_file(file_path: impl AsRef<Path>) -> Result<Entry> {
    let entries = load_entries_file(file_path)?;
    Ok(entries.into_iter().next().ok_or(LoadError::NoEntries)?)
}

fn read_document(file_path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(file_path).map_err(|source| LoadError::Read {
        path: file_path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_yaml_and_json_documents() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let yaml_path = temp_dir.path().join("framework.yml");
        fs::write(&yaml_path, "title: YAML\nsecondaryTagging:\n  - { clientId: w1, widgetId: TEXT }\n").expect("write yaml");
        let json_path = temp_dir.path().join("framework.json");
        fs::write(&json_path, r#"{ "title": "JSON", "primaryTagging": [] }"#).expect("write json");

        assert_eq!(load_framework_file(&yaml_path).expect("yaml").widgets().count(), 1);
        assert_eq!(load_framework_file(&json_path).expect("json").title, "JSON");
    }

    #[test]
    fn missing_file_reports_the_path() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let missing = temp_dir.path().join("missing.yaml");
        let error = load_framework_file(&missing).expect_err("missing file");
        assert!(format!("{error:#}").contains("missing.yaml"));
    }

    #[test]
    fn load_entry_file_returns_the_first_entry() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("entries.yaml");
        fs::write(&path, "entries:\n  - clientId: first\n  - clientId: second\n").expect("write entries");
        assert_eq!(load_entry_file(&path).expect("entry").client_id, "first");
    }
}
