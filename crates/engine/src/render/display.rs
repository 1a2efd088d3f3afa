//! Textual rendering of attributes, with option keys resolved to labels.

use deep_types::{
    Attribute, FormError, Matrix1dProperties, Matrix2dProperties, OptionProperties, OrganigramProperties, Widget, WidgetValue,
};
use deep_util::{format_date_display, format_time_display};
use serde::Serialize;

use super::{AttributeRenderer, RenderMode, RendererKind};

/// One rendered widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedAttribute {
    pub widget: String,
    pub title: String,
    pub renderer: RendererKind,
    /// Human readable value; `None` when the attribute is unset.
    pub display: Option<String>,
    pub interactive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Renders one widget's attribute in `mode`.
///
/// Unsupported widgets render a placeholder instead of their value.
pub fn render_attribute(widget: &Widget, attribute: Option<&Attribute>, error: Option<&FormError>, mode: RenderMode) -> RenderedAttribute {
    let renderer = AttributeRenderer::new(widget, attribute, mode);
    let resolution = renderer.resolution();

    let display = if resolution.renderer == RendererKind::Unsupported {
        let tag = attribute.map_or(&widget.kind, |attribute| &attribute.widget_type);
        Some(format!("unsupported widget type '{tag}'"))
    } else {
        renderer.value().map(|value| display_value(widget, &value))
    };

    RenderedAttribute {
        widget: widget.client_id.clone(),
        title: widget.title.clone(),
        renderer: resolution.renderer,
        display,
        interactive: renderer.is_interactive(false),
        error: error.map(error_text),
    }
}

/// Formats a value for display, resolving option, node and matrix keys to labels.
///
/// Keys the widget configuration does not know are shown as-is.
pub fn display_value(widget: &Widget, value: &WidgetValue) -> String {
    match value {
        WidgetValue::Text(text) => text.clone(),
        WidgetValue::Number(number) => number.to_string(),
        WidgetValue::Date(date) => format_date_display(date),
        WidgetValue::Time(time) => format_time_display(time),
        WidgetValue::DateRange(range) => format!("{} - {}", format_date_display(&range.start_date), format_date_display(&range.end_date)),
        WidgetValue::TimeRange(range) => format!("{} - {}", format_time_display(&range.start_time), format_time_display(&range.end_time)),
        WidgetValue::SingleSelect(key) | WidgetValue::Scale(key) => option_label(widget, key),
        WidgetValue::MultiSelect(keys) => keys.iter().map(|key| option_label(widget, key)).collect::<Vec<_>>().join(", "),
        WidgetValue::GeoLocation(ids) => ids.join(", "),
        WidgetValue::Organigram(keys) => {
            let root = widget
                .typed_properties::<OrganigramProperties>()
                .ok()
                .flatten()
                .and_then(|properties| properties.options);
            keys.iter()
                .map(|key| {
                    root.as_ref()
                        .and_then(|root| root.label_path(key))
                        .map_or_else(|| key.clone(), |path| path.join(" / "))
                })
                .collect::<Vec<_>>()
                .join(", ")
        }
        WidgetValue::Matrix1d(rows) => {
            let properties = widget.typed_properties::<Matrix1dProperties>().ok().flatten().unwrap_or_default();
            rows.iter()
                .flat_map(|(row_key, cells)| {
                    let row = properties.rows.iter().find(|row| &row.key == row_key);
                    cells.iter().filter(|(_, selected)| **selected).map(move |(cell_key, _)| {
                        let row_label = row.map_or(row_key.as_str(), |row| row.label.as_str());
                        let cell_label = row
                            .and_then(|row| row.cells.iter().find(|cell| &cell.key == cell_key))
                            .map_or(cell_key.as_str(), |cell| cell.label.as_str());
                        format!("{row_label}: {cell_label}")
                    })
                })
                .collect::<Vec<_>>()
                .join("; ")
        }
        WidgetValue::Matrix2d(rows) => {
            let properties = widget.typed_properties::<Matrix2dProperties>().ok().flatten().unwrap_or_default();
            let mut parts = Vec::new();
            for (row_key, sub_rows) in rows {
                let row = properties.rows.iter().find(|row| &row.key == row_key);
                let row_label = row.map_or(row_key.as_str(), |row| row.label.as_str());
                for (sub_row_key, columns) in sub_rows {
                    let sub_row_label = row
                        .and_then(|row| row.sub_rows.iter().find(|sub_row| &sub_row.key == sub_row_key))
                        .map_or(sub_row_key.as_str(), |sub_row| sub_row.label.as_str());
                    for (column_key, sub_columns) in columns {
                        let column = properties.columns.iter().find(|column| &column.key == column_key);
                        let column_label = column.map_or(column_key.as_str(), |column| column.label.as_str());
                        let sub_column_labels: Vec<&str> = sub_columns
                            .iter()
                            .map(|sub_column_key| {
                                column
                                    .and_then(|column| column.sub_columns.iter().find(|sub_column| &sub_column.key == sub_column_key))
                                    .map_or(sub_column_key.as_str(), |sub_column| sub_column.label.as_str())
                            })
                            .collect();
                        if sub_column_labels.is_empty() {
                            parts.push(format!("{row_label} / {sub_row_label}: {column_label}"));
                        } else {
                            parts.push(format!("{row_label} / {sub_row_label}: {column_label} ({})", sub_column_labels.join(", ")));
                        }
                    }
                }
            }
            parts.join("; ")
        }
    }
}

fn option_label(widget: &Widget, key: &str) -> String {
    widget
        .typed_properties::<OptionProperties>()
        .ok()
        .flatten()
        .and_then(|properties| properties.option(key).map(|option| option.label.clone()))
        .unwrap_or_else(|| key.to_string())
}

fn error_text(error: &FormError) -> String {
    match error.own_message() {
        Some(message) => message.to_string(),
        None => format!("{} invalid field(s)", error.count()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deep_types::{AttributeData, WidgetKind};
    use serde_json::json;

    fn attribute(widget: &Widget, value: serde_json::Value) -> Attribute {
        let mut attribute = Attribute::empty(format!("attr-{}", widget.client_id), widget.client_id.clone(), widget.kind.clone());
        attribute.data = Some(AttributeData { value });
        attribute
    }

    #[test]
    fn select_values_display_option_labels() {
        let mut widget = Widget::new("sector", WidgetKind::MultiSelect);
        widget.title = "Sector".to_string();
        widget.properties = Some(json!({ "options": [{ "key": "health", "label": "Health" }, { "key": "wash", "label": "WASH" }] }));
        let value = attribute(&widget, json!(["wash", "unknown"]));

        let rendered = render_attribute(&widget, Some(&value), None, RenderMode::ReadOnly);
        assert_eq!(rendered.renderer, RendererKind::MultiSelectOutput);
        assert_eq!(rendered.display.as_deref(), Some("WASH, unknown"));
        assert!(!rendered.interactive);
    }

    #[test]
    fn organigram_values_display_label_paths() {
        let mut widget = Widget::new("org", WidgetKind::Organigram);
        widget.properties = Some(json!({
            "options": { "key": "root", "label": "All", "children": [{ "key": "a", "label": "Agencies" }] }
        }));
        let value = attribute(&widget, json!(["a"]));
        let rendered = render_attribute(&widget, Some(&value), None, RenderMode::Edit);
        assert_eq!(rendered.display.as_deref(), Some("All / Agencies"));
        assert!(rendered.interactive);
    }

    #[test]
    fn matrix1d_values_display_row_and_cell_labels() {
        let mut widget = Widget::new("m1", WidgetKind::Matrix1d);
        widget.properties = Some(json!({
            "rows": [{ "key": "r1", "label": "Context", "cells": [{ "key": "c1", "label": "Politics" }] }]
        }));
        let value = attribute(&widget, json!({ "r1": { "c1": true, "c2": false } }));
        let rendered = render_attribute(&widget, Some(&value), None, RenderMode::Compact);
        assert_eq!(rendered.renderer, RendererKind::CompactMatrix1d);
        assert_eq!(rendered.display.as_deref(), Some("Context: Politics"));
    }

    #[test]
    fn unsupported_widgets_render_a_placeholder() {
        let widget = Widget::new("x", WidgetKind::Unsupported("EXCERPT".to_string()));
        let rendered = render_attribute(&widget, None, Some(&FormError::message("required")), RenderMode::Edit);
        assert_eq!(rendered.renderer, RendererKind::Unsupported);
        assert_eq!(rendered.display.as_deref(), Some("unsupported widget type 'EXCERPT'"));
        assert_eq!(rendered.error.as_deref(), Some("required"));
    }

    #[test]
    fn unset_attributes_have_no_display() {
        let widget = Widget::new("d1", WidgetKind::DateRange);
        let rendered = render_attribute(&widget, None, None, RenderMode::ReadOnly);
        assert_eq!(rendered.display, None);

        let value = attribute(&widget, json!({ "startDate": "2021-01-05", "endDate": "2021-02-10" }));
        let rendered = render_attribute(&widget, Some(&value), None, RenderMode::ReadOnly);
        assert_eq!(rendered.display.as_deref(), Some("05/01/2021 - 10/02/2021"));
    }
}
