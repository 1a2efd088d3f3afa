//! Widget configuration shared by the framework editor, the tagging surface, and the CLI.
//!
//! Widgets arrive from the API already parsed. Their `properties` payload is type-specific,
//! so it is kept as raw JSON and read through typed accessors that report malformed
//! configuration instead of failing the whole framework.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value as JsonValue;

use crate::conditional::Conditional;

/// Closed set of widget kinds understood by the engine.
///
/// Tags outside the set deserialize as [`WidgetKind::Unsupported`] carrying the raw tag, so
/// one unknown widget never prevents a framework from loading.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WidgetKind {
    Text,
    Number,
    Date,
    DateRange,
    Time,
    TimeRange,
    Scale,
    SingleSelect,
    MultiSelect,
    GeoLocation,
    Organigram,
    Matrix1d,
    Matrix2d,
    /// Any tag the engine does not know how to render or evaluate.
    Unsupported(String),
}

impl WidgetKind {
    /// Every supported kind, in catalogue order.
    pub const SUPPORTED: [WidgetKind; 13] = [
        WidgetKind::Text,
        WidgetKind::Number,
        WidgetKind::Date,
        WidgetKind::DateRange,
        WidgetKind::Time,
        WidgetKind::TimeRange,
        WidgetKind::Scale,
        WidgetKind::SingleSelect,
        WidgetKind::MultiSelect,
        WidgetKind::GeoLocation,
        WidgetKind::Organigram,
        WidgetKind::Matrix1d,
        WidgetKind::Matrix2d,
    ];

    /// Parses a wire tag. Accepts both the API tags (`SELECT`, `GEO`) and the long
    /// spellings (`SINGLE_SELECT`, `GEO_LOCATION`).
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_uppercase().as_str() {
            "TEXT" => Self::Text,
            "NUMBER" => Self::Number,
            "DATE" => Self::Date,
            "DATE_RANGE" => Self::DateRange,
            "TIME" => Self::Time,
            "TIME_RANGE" => Self::TimeRange,
            "SCALE" => Self::Scale,
            "SELECT" | "SINGLE_SELECT" => Self::SingleSelect,
            "MULTISELECT" | "MULTI_SELECT" => Self::MultiSelect,
            "GEO" | "GEO_LOCATION" => Self::GeoLocation,
            "ORGANIGRAM" => Self::Organigram,
            "MATRIX1D" => Self::Matrix1d,
            "MATRIX2D" => Self::Matrix2d,
            _ => Self::Unsupported(tag.to_string()),
        }
    }

    /// Canonical wire tag.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "TEXT",
            Self::Number => "NUMBER",
            Self::Date => "DATE",
            Self::DateRange => "DATE_RANGE",
            Self::Time => "TIME",
            Self::TimeRange => "TIME_RANGE",
            Self::Scale => "SCALE",
            Self::SingleSelect => "SELECT",
            Self::MultiSelect => "MULTISELECT",
            Self::GeoLocation => "GEO",
            Self::Organigram => "ORGANIGRAM",
            Self::Matrix1d => "MATRIX1D",
            Self::Matrix2d => "MATRIX2D",
            Self::Unsupported(tag) => tag.as_str(),
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported(_))
    }

    /// Range kinds expose a start/end swap affordance.
    pub fn is_range(&self) -> bool {
        matches!(self, Self::DateRange | Self::TimeRange)
    }
}

impl From<String> for WidgetKind {
    fn from(tag: String) -> Self {
        Self::from_tag(&tag)
    }
}

impl From<WidgetKind> for String {
    fn from(kind: WidgetKind) -> Self {
        kind.as_str().to_string()
    }
}

impl FromStr for WidgetKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_tag(s))
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Layout hint for the section canvas.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WidgetWidth {
    #[default]
    Full,
    Half,
}

/// One taggable field of an analytical framework.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Widget {
    /// Stable local identifier, unique within a framework.
    pub client_id: String,
    /// Server identifier, absent until the framework is saved.
    #[serde(default)]
    pub id: Option<String>,
    /// Widget kind tag.
    #[serde(rename = "widgetId", alias = "widgetType", alias = "type")]
    pub kind: WidgetKind,
    #[serde(default)]
    pub title: String,
    /// Render order among siblings. Presentation only.
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub width: WidgetWidth,
    /// When true an entry cannot be saved without a value for this widget.
    #[serde(default)]
    pub required: bool,
    /// Type-specific configuration (options, bounds, default value).
    #[serde(default)]
    pub properties: Option<JsonValue>,
    /// Optional rule set gating visibility.
    #[serde(default)]
    pub conditional: Option<Conditional>,
}

impl Widget {
    /// Creates a widget with no properties and no conditional.
    pub fn new(client_id: impl Into<String>, kind: WidgetKind) -> Self {
        Self {
            client_id: client_id.into(),
            id: None,
            kind,
            title: String::new(),
            order: 0,
            width: WidgetWidth::Full,
            required: false,
            properties: None,
            conditional: None,
        }
    }

    /// Deserializes `properties` into a typed view.
    ///
    /// Returns `Ok(None)` when the widget has no properties.
    pub fn typed_properties<T: DeserializeOwned>(&self) -> Result<Option<T>, serde_json::Error> {
        match &self.properties {
            None | Some(JsonValue::Null) => Ok(None),
            Some(properties) => T::deserialize(properties).map(Some),
        }
    }

    /// Raw `properties.defaultValue`, when present.
    pub fn default_value_json(&self) -> Option<&JsonValue> {
        self.properties
            .as_ref()
            .and_then(|properties| properties.get("defaultValue"))
            .filter(|value| !value.is_null())
    }

    /// True when the widget carries at least one condition.
    pub fn has_conditions(&self) -> bool {
        self.conditional.as_ref().is_some_and(|conditional| !conditional.conditions.is_empty())
    }
}

/// Option entity used by select, scale, and matrix properties.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KeyLabel {
    #[serde(alias = "clientId")]
    pub key: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub tooltip: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// Properties of SELECT, MULTISELECT and SCALE widgets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct OptionProperties {
    #[serde(default)]
    pub options: Vec<KeyLabel>,
    #[serde(default)]
    pub default_value: Option<JsonValue>,
}

impl OptionProperties {
    pub fn option(&self, key: &str) -> Option<&KeyLabel> {
        self.options.iter().find(|option| option.key == key)
    }

    /// Rank of an option: its `order`, then its position in the list for absent or tied orders.
    pub fn ordinal(&self, key: &str) -> Option<(i32, usize)> {
        self.options
            .iter()
            .position(|option| option.key == key)
            .map(|index| (self.options[index].order, index))
    }
}

/// Properties of NUMBER widgets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct NumberProperties {
    #[serde(default)]
    pub min_value: Option<f64>,
    #[serde(default)]
    pub max_value: Option<f64>,
    #[serde(default)]
    pub default_value: Option<JsonValue>,
}

/// A node of an organigram tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrganigramNode {
    #[serde(alias = "clientId")]
    pub key: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub children: Vec<OrganigramNode>,
}

impl OrganigramNode {
    /// Finds the node with `key` in this subtree.
    pub fn find(&self, key: &str) -> Option<&OrganigramNode> {
        if self.key == key {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(key))
    }

    /// Keys of every strict descendant, depth first.
    pub fn descendant_keys(&self) -> Vec<&str> {
        let mut keys = Vec::new();
        let mut stack: Vec<&OrganigramNode> = self.children.iter().rev().collect();
        while let Some(node) = stack.pop() {
            keys.push(node.key.as_str());
            stack.extend(node.children.iter().rev());
        }
        keys
    }

    /// Path of labels from this node down to `key`, inclusive.
    pub fn label_path(&self, key: &str) -> Option<Vec<&str>> {
        if self.key == key {
            return Some(vec![self.label.as_str()]);
        }
        for child in &self.children {
            if let Some(mut path) = child.label_path(key) {
                path.insert(0, self.label.as_str());
                return Some(path);
            }
        }
        None
    }
}

/// Properties of ORGANIGRAM widgets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct OrganigramProperties {
    #[serde(default)]
    pub options: Option<OrganigramNode>,
    #[serde(default)]
    pub default_value: Option<JsonValue>,
}

/// A MATRIX1D row and its cells.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Matrix1dRow {
    #[serde(alias = "clientId")]
    pub key: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub cells: Vec<KeyLabel>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Matrix1dProperties {
    #[serde(default)]
    pub rows: Vec<Matrix1dRow>,
}

/// A MATRIX2D row and its sub-rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Matrix2dRow {
    #[serde(alias = "clientId")]
    pub key: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub sub_rows: Vec<KeyLabel>,
}

/// A MATRIX2D column and its sub-columns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Matrix2dColumn {
    #[serde(alias = "clientId")]
    pub key: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub sub_columns: Vec<KeyLabel>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Matrix2dProperties {
    #[serde(default)]
    pub rows: Vec<Matrix2dRow>,
    #[serde(default)]
    pub columns: Vec<Matrix2dColumn>,
}
