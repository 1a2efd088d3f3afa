//! Analytical frameworks and the entries tagged against them.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    attribute::{Attribute, AttributeMap},
    widget::Widget,
};

/// A tagging framework: primary sections plus a flat list of secondary widgets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Framework {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub primary_tagging: Vec<Section>,
    #[serde(default)]
    pub secondary_tagging: Vec<Widget>,
}

impl Framework {
    /// Every widget in authoring order: sections first, then secondary tagging.
    pub fn widgets(&self) -> impl Iterator<Item = &Widget> {
        self.primary_tagging
            .iter()
            .flat_map(|section| section.widgets.iter())
            .chain(self.secondary_tagging.iter())
    }

    /// Widgets keyed by client id. A duplicated id keeps its first occurrence.
    pub fn widget_index(&self) -> IndexMap<&str, &Widget> {
        let mut index = IndexMap::new();
        for widget in self.widgets() {
            index.entry(widget.client_id.as_str()).or_insert(widget);
        }
        index
    }

    pub fn find_widget(&self, client_id: &str) -> Option<&Widget> {
        self.widgets().find(|widget| widget.client_id == client_id)
    }
}

/// A titled group of widgets in the primary tagging canvas.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub client_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub widgets: Vec<Widget>,
}

/// One tagged excerpt with its attribute set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub client_id: String,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

impl Entry {
    /// Attributes keyed by widget client id. Later duplicates replace earlier ones.
    pub fn attributes_by_widget(&self) -> AttributeMap {
        self.attributes
            .iter()
            .map(|attribute| (attribute.widget.clone(), attribute.clone()))
            .collect()
    }
}
