//! Conversion between wire attribute values and typed input values.
//!
//! Decoding is total: a payload whose shape does not match the widget kind is reported with
//! `tracing::warn!` and treated as "no value". Encoding never fails.

use std::collections::BTreeMap;

use deep_types::{Attribute, AttributeData, DateRangeValue, Matrix1dValue, Matrix2dValue, TimeRangeValue, WidgetKind, WidgetValue};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value as JsonValue};
use tracing::warn;

/// Reads the typed input value for a widget from an attribute payload.
///
/// Absent data, an explicit `null` and shape mismatches all yield `None`.
pub fn to_input_value(kind: &WidgetKind, data: Option<&AttributeData>) -> Option<WidgetValue> {
    let value = data.map(|data| &data.value).filter(|value| !value.is_null())?;
    decode_value(kind, value)
}

/// Wraps a typed input value back into an attribute payload. `None` means "delete the data".
pub fn from_input_value(value: Option<WidgetValue>) -> Option<AttributeData> {
    value.map(|value| AttributeData {
        value: encode_value(&value),
    })
}

/// Decodes a raw wire value for `kind`.
pub fn decode_value(kind: &WidgetKind, value: &JsonValue) -> Option<WidgetValue> {
    let decoded = match kind {
        WidgetKind::Text => value.as_str().map(|text| WidgetValue::Text(text.to_string())),
        WidgetKind::Number => match value {
            JsonValue::Number(number) => Some(WidgetValue::Number(number.clone())),
            _ => None,
        },
        WidgetKind::Date => value.as_str().map(|text| WidgetValue::Date(text.to_string())),
        WidgetKind::Time => value.as_str().map(|text| WidgetValue::Time(text.to_string())),
        WidgetKind::DateRange => deserialize::<DateRangeValue>(value).map(WidgetValue::DateRange),
        WidgetKind::TimeRange => deserialize::<TimeRangeValue>(value).map(WidgetValue::TimeRange),
        WidgetKind::SingleSelect => value.as_str().map(|key| WidgetValue::SingleSelect(key.to_string())),
        WidgetKind::Scale => value.as_str().map(|key| WidgetValue::Scale(key.to_string())),
        WidgetKind::MultiSelect => deserialize::<Vec<String>>(value).map(WidgetValue::MultiSelect),
        WidgetKind::Organigram => deserialize::<Vec<String>>(value).map(WidgetValue::Organigram),
        WidgetKind::GeoLocation => deserialize::<Vec<String>>(value).map(WidgetValue::GeoLocation),
        WidgetKind::Matrix1d => decode_matrix1d(value).map(WidgetValue::Matrix1d),
        WidgetKind::Matrix2d => decode_matrix2d(value).map(WidgetValue::Matrix2d),
        WidgetKind::Unsupported(_) => return None,
    };

    if decoded.is_none() {
        warn!(widget_kind = %kind, value = %value, "attribute value does not match widget kind");
    }
    decoded
}

/// Encodes a typed input value in its wire shape.
pub fn encode_value(value: &WidgetValue) -> JsonValue {
    match value {
        WidgetValue::Text(text)
        | WidgetValue::Date(text)
        | WidgetValue::Time(text)
        | WidgetValue::SingleSelect(text)
        | WidgetValue::Scale(text) => JsonValue::String(text.clone()),
        WidgetValue::Number(number) => JsonValue::Number(number.clone()),
        WidgetValue::DateRange(range) => {
            let mut object = Map::new();
            object.insert("startDate".into(), JsonValue::String(range.start_date.clone()));
            object.insert("endDate".into(), JsonValue::String(range.end_date.clone()));
            JsonValue::Object(object)
        }
        WidgetValue::TimeRange(range) => {
            let mut object = Map::new();
            object.insert("startTime".into(), JsonValue::String(range.start_time.clone()));
            object.insert("endTime".into(), JsonValue::String(range.end_time.clone()));
            JsonValue::Object(object)
        }
        WidgetValue::MultiSelect(keys) | WidgetValue::Organigram(keys) | WidgetValue::GeoLocation(keys) => {
            JsonValue::Array(keys.iter().cloned().map(JsonValue::String).collect())
        }
        WidgetValue::Matrix1d(rows) => JsonValue::Object(
            rows.iter()
                .map(|(row, cells)| {
                    let cells = cells.iter().map(|(cell, selected)| (cell.clone(), JsonValue::Bool(*selected))).collect();
                    (row.clone(), JsonValue::Object(cells))
                })
                .collect(),
        ),
        WidgetValue::Matrix2d(rows) => JsonValue::Object(
            rows.iter()
                .map(|(row, sub_rows)| {
                    let sub_rows = sub_rows
                        .iter()
                        .map(|(sub_row, columns)| {
                            let columns = columns
                                .iter()
                                .map(|(column, sub_columns)| {
                                    let sub_columns = sub_columns.iter().cloned().map(JsonValue::String).collect();
                                    (column.clone(), JsonValue::Array(sub_columns))
                                })
                                .collect();
                            (sub_row.clone(), JsonValue::Object(columns))
                        })
                        .collect();
                    (row.clone(), JsonValue::Object(sub_rows))
                })
                .collect(),
        ),
    }
}

/// Applies a component's output to an attribute.
pub trait AttributeEdit {
    /// `Some` replaces the attribute's data; `None` deletes it.
    fn apply(&mut self, value: Option<WidgetValue>);
}

impl AttributeEdit for Attribute {
    fn apply(&mut self, value: Option<WidgetValue>) {
        if let Some(value) = &value
            && value.kind() != self.widget_type
        {
            warn!(
                attribute = %self.client_id,
                expected = %self.widget_type,
                actual = %value.kind(),
                "input value kind differs from attribute widget type"
            );
        }
        self.data = from_input_value(value);
    }
}

fn deserialize<T: DeserializeOwned>(value: &JsonValue) -> Option<T> {
    T::deserialize(value).ok()
}

// Null rows and cells are treated as unset.
fn decode_matrix1d(value: &JsonValue) -> Option<Matrix1dValue> {
    let raw: BTreeMap<String, Option<BTreeMap<String, Option<bool>>>> = deserialize(value)?;
    Some(
        raw.into_iter()
            .filter_map(|(row, cells)| {
                let cells: BTreeMap<String, bool> = cells?.into_iter().filter_map(|(cell, selected)| Some((cell, selected?))).collect();
                Some((row, cells))
            })
            .collect(),
    )
}

fn decode_matrix2d(value: &JsonValue) -> Option<Matrix2dValue> {
    type RawColumns = BTreeMap<String, Option<Vec<String>>>;
    let raw: BTreeMap<String, Option<BTreeMap<String, Option<RawColumns>>>> = deserialize(value)?;
    Some(
        raw.into_iter()
            .filter_map(|(row, sub_rows)| {
                let sub_rows = sub_rows?
                    .into_iter()
                    .filter_map(|(sub_row, columns)| {
                        let columns = columns?
                            .into_iter()
                            .filter_map(|(column, sub_columns)| Some((column, sub_columns?)))
                            .collect();
                        Some((sub_row, columns))
                    })
                    .collect();
                Some((row, sub_rows))
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(value: JsonValue) -> AttributeData {
        AttributeData { value }
    }

    #[test]
    fn round_trips_every_supported_kind() {
        let samples = [
            (WidgetKind::Text, json!("hello")),
            (WidgetKind::Number, json!(12.5)),
            (WidgetKind::Number, json!(7)),
            (WidgetKind::Date, json!("2021-03-04")),
            (WidgetKind::Time, json!("10:15")),
            (WidgetKind::DateRange, json!({ "startDate": "2021-01-01", "endDate": "2021-02-01" })),
            (WidgetKind::TimeRange, json!({ "startTime": "08:00", "endTime": "17:30" })),
            (WidgetKind::SingleSelect, json!("health")),
            (WidgetKind::MultiSelect, json!(["health", "wash"])),
            (WidgetKind::Scale, json!("high")),
            (WidgetKind::Organigram, json!(["root", "child"])),
            (WidgetKind::GeoLocation, json!(["12", "13"])),
            (WidgetKind::Matrix1d, json!({ "r1": { "c1": true, "c2": false } })),
            (WidgetKind::Matrix2d, json!({ "r1": { "sr1": { "col1": ["sc1"], "col2": [] } } })),
        ];

        for (kind, value) in samples {
            let original = data(value);
            let typed = to_input_value(&kind, Some(&original));
            assert!(typed.is_some(), "{kind} should decode");
            assert_eq!(from_input_value(typed), Some(original), "{kind} should round trip");
        }
    }

    #[test]
    fn absent_values_stay_absent() {
        for kind in WidgetKind::SUPPORTED.iter() {
            assert_eq!(to_input_value(kind, None), None);
            assert_eq!(to_input_value(kind, Some(&data(JsonValue::Null))), None);
        }
        assert_eq!(from_input_value(None), None);
    }

    #[test]
    fn shape_mismatch_decodes_to_none() {
        assert_eq!(to_input_value(&WidgetKind::MultiSelect, Some(&data(json!("health")))), None);
        assert_eq!(to_input_value(&WidgetKind::Number, Some(&data(json!("12")))), None);
        assert_eq!(to_input_value(&WidgetKind::DateRange, Some(&data(json!({ "start": "x" })))), None);
        assert_eq!(to_input_value(&WidgetKind::Unsupported("X".into()), Some(&data(json!("x")))), None);
    }

    #[test]
    fn swapping_range_twice_restores_the_value() {
        let original = data(json!({ "startTime": "08:00", "endTime": "17:30" }));
        let Some(WidgetValue::TimeRange(range)) = to_input_value(&WidgetKind::TimeRange, Some(&original)) else {
            panic!("expected a time range");
        };
        let swapped = range.swapped();
        assert_eq!(swapped.start_time, "17:30");
        assert_eq!(from_input_value(Some(WidgetValue::TimeRange(swapped.swapped()))), Some(original));
    }

    #[test]
    fn matrix_nulls_are_skipped() {
        let value = to_input_value(&WidgetKind::Matrix1d, Some(&data(json!({ "r1": { "c1": true, "c2": null }, "r2": null }))));
        let Some(WidgetValue::Matrix1d(rows)) = value else {
            panic!("expected a matrix1d value");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(rows["r1"].len(), 1);
    }

    #[test]
    fn apply_sets_and_deletes_data() {
        let mut attribute = Attribute::empty("a1", "w1", WidgetKind::Text);
        attribute.apply(Some(WidgetValue::Text("note".into())));
        assert_eq!(attribute.value(), Some(&json!("note")));

        attribute.apply(None);
        assert!(attribute.data.is_none());
    }
}
