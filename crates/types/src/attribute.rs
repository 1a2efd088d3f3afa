//! Captured entry values.
//!
//! [`Attribute`] is the wire shape (`{clientId, widget, widgetType, data: {value}}`) and
//! [`WidgetValue`] is the typed value handed to input renderers.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value as JsonValue};

use crate::widget::WidgetKind;

/// Attributes of one entry keyed by the client id of the widget they belong to.
pub type AttributeMap = IndexMap<String, Attribute>;

/// One entry's captured value for one widget.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    /// Identifier unique within the entry.
    pub client_id: String,
    /// Client id of the widget this attribute belongs to.
    pub widget: String,
    pub widget_type: WidgetKind,
    /// Absent until the user provides a value.
    #[serde(default)]
    pub data: Option<AttributeData>,
}

impl Attribute {
    /// Creates an empty attribute for a widget.
    pub fn empty(client_id: impl Into<String>, widget: impl Into<String>, widget_type: WidgetKind) -> Self {
        Self {
            client_id: client_id.into(),
            widget: widget.into(),
            widget_type,
            data: None,
        }
    }

    /// Raw wire value, ignoring explicit nulls.
    pub fn value(&self) -> Option<&JsonValue> {
        self.data.as_ref().map(|data| &data.value).filter(|value| !value.is_null())
    }
}

/// Payload wrapper around the wire value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttributeData {
    pub value: JsonValue,
}

/// `{startDate, endDate}` pair of ISO dates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeValue {
    pub start_date: String,
    pub end_date: String,
}

impl DateRangeValue {
    /// Returns the range with start and end exchanged.
    pub fn swapped(&self) -> Self {
        Self {
            start_date: self.end_date.clone(),
            end_date: self.start_date.clone(),
        }
    }
}

/// `{startTime, endTime}` pair of wall-clock times.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimeRangeValue {
    pub start_time: String,
    pub end_time: String,
}

impl TimeRangeValue {
    /// Returns the range with start and end exchanged.
    pub fn swapped(&self) -> Self {
        Self {
            start_time: self.end_time.clone(),
            end_time: self.start_time.clone(),
        }
    }
}

/// `{row: {cell: selected}}`.
pub type Matrix1dValue = BTreeMap<String, BTreeMap<String, bool>>;

/// `{row: {subRow: {column: [subColumn]}}}`. A present column key marks the cell selected,
/// even with no sub-columns.
pub type Matrix2dValue = BTreeMap<String, BTreeMap<String, BTreeMap<String, Vec<String>>>>;

/// Typed value used by input renderers, one variant per widget kind.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetValue {
    Text(String),
    /// Kept as a JSON number so encoding reproduces the wire representation exactly.
    Number(Number),
    Date(String),
    Time(String),
    DateRange(DateRangeValue),
    TimeRange(TimeRangeValue),
    SingleSelect(String),
    MultiSelect(Vec<String>),
    Scale(String),
    Organigram(Vec<String>),
    GeoLocation(Vec<String>),
    Matrix1d(Matrix1dValue),
    Matrix2d(Matrix2dValue),
}

impl WidgetValue {
    /// Widget kind this value belongs to.
    pub fn kind(&self) -> WidgetKind {
        match self {
            Self::Text(_) => WidgetKind::Text,
            Self::Number(_) => WidgetKind::Number,
            Self::Date(_) => WidgetKind::Date,
            Self::Time(_) => WidgetKind::Time,
            Self::DateRange(_) => WidgetKind::DateRange,
            Self::TimeRange(_) => WidgetKind::TimeRange,
            Self::SingleSelect(_) => WidgetKind::SingleSelect,
            Self::MultiSelect(_) => WidgetKind::MultiSelect,
            Self::Scale(_) => WidgetKind::Scale,
            Self::Organigram(_) => WidgetKind::Organigram,
            Self::GeoLocation(_) => WidgetKind::GeoLocation,
            Self::Matrix1d(_) => WidgetKind::Matrix1d,
            Self::Matrix2d(_) => WidgetKind::Matrix2d,
        }
    }

    /// True when the value carries nothing a user selected or typed.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) | Self::Date(text) | Self::Time(text) | Self::SingleSelect(text) | Self::Scale(text) => {
                text.trim().is_empty()
            }
            Self::Number(_) => false,
            Self::DateRange(range) => range.start_date.is_empty() && range.end_date.is_empty(),
            Self::TimeRange(range) => range.start_time.is_empty() && range.end_time.is_empty(),
            Self::MultiSelect(keys) | Self::Organigram(keys) | Self::GeoLocation(keys) => keys.is_empty(),
            Self::Matrix1d(rows) => rows.values().all(|cells| cells.values().all(|selected| !selected)),
            Self::Matrix2d(rows) => rows.values().flat_map(|sub_rows| sub_rows.values()).all(|columns| columns.is_empty()),
        }
    }

    /// Selected option keys for select-like values; empty for everything else.
    pub fn selected_keys(&self) -> Vec<&str> {
        match self {
            Self::SingleSelect(key) | Self::Scale(key) => vec![key.as_str()],
            Self::MultiSelect(keys) | Self::Organigram(keys) | Self::GeoLocation(keys) => keys.iter().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }
}
