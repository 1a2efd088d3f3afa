//! Per-operator predicates.
//!
//! Every predicate is total: a missing parent value, a payload of the wrong shape or a parent
//! widget without the configuration an operator needs all evaluate to `false`.

use std::{cmp::Ordering, collections::HashSet};

use chrono::{NaiveDate, NaiveTime};
use deep_types::{
    Condition, ConditionOperator as Op, OperatorModifier, OptionProperties, OrganigramNode, OrganigramProperties, Widget, WidgetValue,
};
use deep_util::{parse_attribute_date, parse_attribute_time};
use serde_json::Value as JsonValue;
use tracing::debug;

pub(crate) fn evaluate(operator: Op, condition: &Condition, parent_value: Option<&WidgetValue>, parent_widget: Option<&Widget>) -> bool {
    if operator == Op::Empty {
        return parent_value.is_none_or(WidgetValue::is_empty);
    }
    let Some(parent_value) = parent_value else {
        return false;
    };
    let payload = condition.value.as_ref();

    match operator {
        Op::Empty => false,
        Op::NumberGreaterThan => compare_number(parent_value, payload, Ordering::is_gt),
        Op::NumberLessThan => compare_number(parent_value, payload, Ordering::is_lt),
        Op::NumberEqualTo => compare_number(parent_value, payload, Ordering::is_eq),
        Op::TextStartsWith => match_text(parent_value, payload, |text, needle| text.starts_with(needle)),
        Op::TextEndsWith => match_text(parent_value, payload, |text, needle| text.ends_with(needle)),
        Op::TextContains => match_text(parent_value, payload, |text, needle| text.contains(needle)),
        Op::DateAfter => compare_point(parent_value, payload, date_of, parse_attribute_date, Ordering::is_gt),
        Op::DateBefore => compare_point(parent_value, payload, date_of, parse_attribute_date, Ordering::is_lt),
        Op::DateEqualTo => compare_point(parent_value, payload, date_of, parse_attribute_date, Ordering::is_eq),
        Op::TimeAfter => compare_point(parent_value, payload, time_of, parse_attribute_time, Ordering::is_gt),
        Op::TimeBefore => compare_point(parent_value, payload, time_of, parse_attribute_time, Ordering::is_lt),
        Op::TimeEqualTo => compare_point(parent_value, payload, time_of, parse_attribute_time, Ordering::is_eq),
        Op::DateRangeAfter | Op::DateRangeBefore | Op::DateRangeIncludes => {
            let (Some(payload), WidgetValue::DateRange(range)) = (payload_str(payload), parent_value) else {
                return false;
            };
            compare_range(
                operator,
                parse_attribute_date(&range.start_date),
                parse_attribute_date(&range.end_date),
                parse_attribute_date(payload),
            )
        }
        Op::TimeRangeAfter | Op::TimeRangeBefore | Op::TimeRangeIncludes => {
            let (Some(payload), WidgetValue::TimeRange(range)) = (payload_str(payload), parent_value) else {
                return false;
            };
            compare_range(
                operator,
                parse_attribute_time(&range.start_time),
                parse_attribute_time(&range.end_time),
                parse_attribute_time(payload),
            )
        }
        Op::SingleSelectionSelected => match parent_value {
            WidgetValue::SingleSelect(key) => key_set(payload).is_some_and(|expected| expected.contains(&key.as_str())),
            _ => false,
        },
        Op::ScaleSelected => match parent_value {
            WidgetValue::Scale(key) => key_set(payload).is_some_and(|expected| expected.contains(&key.as_str())),
            _ => false,
        },
        Op::ScaleMoreThan => compare_scale(parent_value, payload, parent_widget, Ordering::is_gt),
        Op::ScaleLessThan => compare_scale(parent_value, payload, parent_widget, Ordering::is_lt),
        Op::MultiSelectionSelected => match parent_value {
            WidgetValue::MultiSelect(keys) => match_selection(condition, payload, keys.iter().map(String::as_str).collect()),
            _ => false,
        },
        Op::OrganigramSelected => match parent_value {
            WidgetValue::Organigram(keys) => match_selection(condition, payload, keys.iter().map(String::as_str).collect()),
            _ => false,
        },
        Op::OrganigramDescendentSelected => organigram_descendent_selected(condition, parent_value, payload, parent_widget),
        Op::Matrix1dRowsSelected => match parent_value {
            WidgetValue::Matrix1d(rows) => {
                let selected = rows
                    .iter()
                    .filter(|(_, cells)| cells.values().any(|selected| *selected))
                    .map(|(row, _)| row.as_str())
                    .collect();
                match_selection(condition, payload, selected)
            }
            _ => false,
        },
        Op::Matrix1dCellsSelected => match parent_value {
            WidgetValue::Matrix1d(rows) => {
                let selected = rows
                    .values()
                    .flat_map(|cells| cells.iter())
                    .filter(|(_, selected)| **selected)
                    .map(|(cell, _)| cell.as_str())
                    .collect();
                match_selection(condition, payload, selected)
            }
            _ => false,
        },
        Op::Matrix2dRowsSelected => match parent_value {
            WidgetValue::Matrix2d(rows) => {
                let selected = rows
                    .iter()
                    .filter(|(_, sub_rows)| sub_rows.values().any(|columns| !columns.is_empty()))
                    .map(|(row, _)| row.as_str())
                    .collect();
                match_selection(condition, payload, selected)
            }
            _ => false,
        },
        Op::Matrix2dSubRowsSelected => match parent_value {
            WidgetValue::Matrix2d(rows) => {
                let selected = rows
                    .values()
                    .flat_map(|sub_rows| sub_rows.iter())
                    .filter(|(_, columns)| !columns.is_empty())
                    .map(|(sub_row, _)| sub_row.as_str())
                    .collect();
                match_selection(condition, payload, selected)
            }
            _ => false,
        },
        Op::Matrix2dColumnsSelected => match parent_value {
            WidgetValue::Matrix2d(rows) => {
                let selected = rows
                    .values()
                    .flat_map(|sub_rows| sub_rows.values())
                    .flat_map(|columns| columns.keys())
                    .map(String::as_str)
                    .collect();
                match_selection(condition, payload, selected)
            }
            _ => false,
        },
        Op::Matrix2dSubColumnsSelected => match parent_value {
            WidgetValue::Matrix2d(rows) => {
                let selected = rows
                    .values()
                    .flat_map(|sub_rows| sub_rows.values())
                    .flat_map(|columns| columns.values())
                    .flatten()
                    .map(String::as_str)
                    .collect();
                match_selection(condition, payload, selected)
            }
            _ => false,
        },
    }
}

/// Reads a key-set payload: an array of strings. Anything else is malformed.
pub(crate) fn key_set(payload: Option<&JsonValue>) -> Option<Vec<&str>> {
    payload?.as_array()?.iter().map(JsonValue::as_str).collect()
}

fn payload_str(payload: Option<&JsonValue>) -> Option<&str> {
    payload?.as_str()
}

/// `ANY` (default): at least one expected key is selected. `ALL`: every expected key is.
///
/// An empty expected set never matches.
fn match_selection(condition: &Condition, payload: Option<&JsonValue>, selected: HashSet<&str>) -> bool {
    let Some(modifier) = modifier_of(condition) else {
        return false;
    };
    let Some(expected) = key_set(payload) else {
        debug!(condition = %condition.key, "condition payload is not a list of keys");
        return false;
    };
    set_matches(modifier, &expected, |key| selected.contains(key))
}

/// `ANY` needs a selected key among `expected`; `ALL` needs `expected` to be a subset of the
/// selection, which an empty set always is.
fn set_matches(modifier: OperatorModifier, expected: &[&str], is_selected: impl Fn(&str) -> bool) -> bool {
    match modifier {
        OperatorModifier::Any => expected.iter().any(|key| is_selected(key)),
        OperatorModifier::All => expected.iter().all(|key| is_selected(key)),
    }
}

fn modifier_of(condition: &Condition) -> Option<OperatorModifier> {
    match condition.modifier() {
        Ok(modifier) => Some(modifier),
        Err(error) => {
            debug!(condition = %condition.key, %error, "treating condition as not satisfied");
            None
        }
    }
}

fn compare_number(parent_value: &WidgetValue, payload: Option<&JsonValue>, accept: fn(Ordering) -> bool) -> bool {
    let (WidgetValue::Number(number), Some(threshold)) = (parent_value, payload.and_then(JsonValue::as_f64)) else {
        return false;
    };
    number
        .as_f64()
        .and_then(|number| number.partial_cmp(&threshold))
        .is_some_and(accept)
}

fn match_text(parent_value: &WidgetValue, payload: Option<&JsonValue>, matches: fn(&str, &str) -> bool) -> bool {
    let (WidgetValue::Text(text), Some(needle)) = (parent_value, payload_str(payload)) else {
        return false;
    };
    matches(&text.to_lowercase(), &needle.to_lowercase())
}

fn date_of(value: &WidgetValue) -> Option<NaiveDate> {
    match value {
        WidgetValue::Date(text) => parse_attribute_date(text),
        _ => None,
    }
}

fn time_of(value: &WidgetValue) -> Option<NaiveTime> {
    match value {
        WidgetValue::Time(text) => parse_attribute_time(text),
        _ => None,
    }
}

fn compare_point<T: Ord>(
    parent_value: &WidgetValue,
    payload: Option<&JsonValue>,
    read: fn(&WidgetValue) -> Option<T>,
    parse: fn(&str) -> Option<T>,
    accept: fn(Ordering) -> bool,
) -> bool {
    let (Some(current), Some(reference)) = (read(parent_value), payload_str(payload).and_then(parse)) else {
        return false;
    };
    accept(current.cmp(&reference))
}

fn compare_range<T: Ord>(operator: Op, start: Option<T>, end: Option<T>, reference: Option<T>) -> bool {
    let Some(reference) = reference else {
        return false;
    };
    match operator {
        Op::DateRangeAfter | Op::TimeRangeAfter => start.is_some_and(|start| start > reference),
        Op::DateRangeBefore | Op::TimeRangeBefore => end.is_some_and(|end| end < reference),
        Op::DateRangeIncludes | Op::TimeRangeIncludes => match (start, end) {
            (Some(start), Some(end)) => start <= reference && reference <= end,
            _ => false,
        },
        _ => false,
    }
}

/// Compares the `order` of the selected scale option with the option named by the payload.
fn compare_scale(parent_value: &WidgetValue, payload: Option<&JsonValue>, parent_widget: Option<&Widget>, accept: fn(Ordering) -> bool) -> bool {
    let (WidgetValue::Scale(selected), Some(reference)) = (parent_value, payload_str(payload)) else {
        return false;
    };
    let Some(properties) = parent_widget.and_then(option_properties) else {
        return false;
    };
    match (properties.ordinal(selected), properties.ordinal(reference)) {
        (Some(selected), Some(reference)) => accept(selected.cmp(&reference)),
        _ => false,
    }
}

fn organigram_descendent_selected(
    condition: &Condition,
    parent_value: &WidgetValue,
    payload: Option<&JsonValue>,
    parent_widget: Option<&Widget>,
) -> bool {
    let WidgetValue::Organigram(selected) = parent_value else {
        return false;
    };
    let Some(modifier) = modifier_of(condition) else {
        return false;
    };
    let Some(expected) = key_set(payload) else {
        return false;
    };
    let Some(root) = parent_widget.and_then(organigram_root) else {
        return false;
    };

    let selected: HashSet<&str> = selected.iter().map(String::as_str).collect();
    set_matches(modifier, &expected, |key| {
        root.find(key)
            .is_some_and(|node| node.descendant_keys().into_iter().any(|descendant| selected.contains(descendant)))
    })
}

fn option_properties(widget: &Widget) -> Option<OptionProperties> {
    match widget.typed_properties::<OptionProperties>() {
        Ok(properties) => properties,
        Err(error) => {
            debug!(widget = %widget.client_id, %error, "malformed option properties");
            None
        }
    }
}

fn organigram_root(widget: &Widget) -> Option<OrganigramNode> {
    match widget.typed_properties::<OrganigramProperties>() {
        Ok(properties) => properties.and_then(|properties| properties.options),
        Err(error) => {
            debug!(widget = %widget.client_id, %error, "malformed organigram properties");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deep_types::{DateRangeValue, Matrix1dValue, Matrix2dValue, TimeRangeValue, WidgetKind};
    use serde_json::{Number, json};
    use std::collections::BTreeMap;

    fn condition(operator: &str, value: JsonValue) -> Condition {
        Condition::new("c1", operator, Some(value))
    }

    fn with_modifier(operator: &str, modifier: &str, value: JsonValue) -> Condition {
        let mut condition = condition(operator, value);
        condition.operator_modifier = Some(modifier.to_string());
        condition
    }

    fn check(condition: &Condition, value: Option<&WidgetValue>, widget: Option<&Widget>) -> bool {
        let operator = Op::parse(&condition.operator).expect("known operator");
        evaluate(operator, condition, value, widget)
    }

    fn scale_widget() -> Widget {
        let mut widget = Widget::new("scale", WidgetKind::Scale);
        widget.properties = Some(json!({
            "options": [
                { "key": "low", "label": "Low", "order": 1 },
                { "key": "medium", "label": "Medium", "order": 2 },
                { "key": "high", "label": "High", "order": 3 }
            ]
        }));
        widget
    }

    fn organigram_widget() -> Widget {
        let mut widget = Widget::new("org", WidgetKind::Organigram);
        widget.properties = Some(json!({
            "options": {
                "key": "root",
                "label": "All",
                "children": [
                    { "key": "a", "label": "A", "children": [{ "key": "a1", "label": "A1" }] },
                    { "key": "b", "label": "B", "children": [{ "key": "b1", "label": "B1" }] }
                ]
            }
        }));
        widget
    }

    #[test]
    fn missing_parent_value_only_satisfies_empty() {
        assert!(check(&condition("empty", JsonValue::Null), None, None));
        assert!(check(&condition("empty", JsonValue::Null), Some(&WidgetValue::MultiSelect(Vec::new())), None));
        assert!(!check(&condition("empty", JsonValue::Null), Some(&WidgetValue::Text("x".into())), None));

        for (operator, value) in [
            ("single-selection-selected", json!(["a"])),
            ("multi-selection-selected", json!(["a"])),
            ("number-greater-than", json!(1)),
            ("text-contains", json!("a")),
            ("date-after", json!("2020-01-01")),
            ("matrix1d-rows-selected", json!(["r1"])),
        ] {
            assert!(!check(&condition(operator, value), None, None), "{operator} should be false without a value");
        }
    }

    #[test]
    fn multi_selection_any_and_all() {
        let value = WidgetValue::MultiSelect(vec!["a".into(), "b".into()]);
        assert!(check(&condition("multi-selection-selected", json!(["b", "z"])), Some(&value), None));
        assert!(!check(&with_modifier("multi-selection-selected", "ALL", json!(["b", "z"])), Some(&value), None));
        assert!(check(&with_modifier("multi-selection-selected", "every", json!(["a", "b"])), Some(&value), None));
        assert!(!check(&with_modifier("multi-selection-selected", "most", json!(["a"])), Some(&value), None));
    }

    #[test]
    fn empty_key_sets_match_only_under_all() {
        let value = WidgetValue::MultiSelect(vec!["a".into(), "b".into()]);
        assert!(!check(&condition("multi-selection-selected", json!([])), Some(&value), None));
        assert!(!check(&with_modifier("multi-selection-selected", "ANY", json!([])), Some(&value), None));
        assert!(check(&with_modifier("multi-selection-selected", "ALL", json!([])), Some(&value), None));
        // Still needs a parent value.
        assert!(!check(&with_modifier("multi-selection-selected", "ALL", json!([])), None, None));
    }

    #[test]
    fn malformed_payloads_are_false() {
        let value = WidgetValue::SingleSelect("a".into());
        assert!(!check(&condition("single-selection-selected", json!("a")), Some(&value), None));
        assert!(!check(&condition("single-selection-selected", json!([1, 2])), Some(&value), None));
        assert!(!check(&condition("number-equal-to", json!("3")), Some(&WidgetValue::Number(Number::from(3))), None));
    }

    #[test]
    fn scale_comparisons_fall_back_to_list_position() {
        let mut widget = Widget::new("scale", WidgetKind::Scale);
        widget.properties = Some(json!({
            "options": [{ "key": "low", "label": "Low" }, { "key": "medium", "label": "Medium" }, { "key": "high", "label": "High" }]
        }));
        let medium = WidgetValue::Scale("medium".into());
        assert!(check(&condition("scale-more-than", json!("low")), Some(&medium), Some(&widget)));
        assert!(check(&condition("scale-less-than", json!("high")), Some(&medium), Some(&widget)));
        assert!(!check(&condition("scale-more-than", json!("medium")), Some(&medium), Some(&widget)));
    }

    #[test]
    fn scale_comparisons_use_option_order() {
        let widget = scale_widget();
        let medium = WidgetValue::Scale("medium".into());
        assert!(check(&condition("scale-more-than", json!("low")), Some(&medium), Some(&widget)));
        assert!(!check(&condition("scale-more-than", json!("medium")), Some(&medium), Some(&widget)));
        assert!(check(&condition("scale-less-than", json!("high")), Some(&medium), Some(&widget)));
        assert!(!check(&condition("scale-less-than", json!("missing")), Some(&medium), Some(&widget)));
        assert!(!check(&condition("scale-more-than", json!("low")), Some(&medium), None));
        assert!(check(&condition("scale-selected", json!(["medium", "high"])), Some(&medium), None));
    }

    #[test]
    fn organigram_descendants_exclude_the_listed_node() {
        let widget = organigram_widget();
        let selected_child = WidgetValue::Organigram(vec!["a1".into()]);
        let selected_node = WidgetValue::Organigram(vec!["a".into()]);

        assert!(check(&condition("organigram-descendent-selected", json!(["a"])), Some(&selected_child), Some(&widget)));
        assert!(!check(&condition("organigram-descendent-selected", json!(["a"])), Some(&selected_node), Some(&widget)));
        assert!(check(&condition("organigram-descendent-selected", json!(["root"])), Some(&selected_node), Some(&widget)));
        assert!(
            !check(&with_modifier("organigram-descendent-selected", "ALL", json!(["a", "b"])), Some(&selected_child), Some(&widget))
        );
        assert!(!check(&condition("organigram-descendent-selected", json!(["a"])), Some(&selected_child), None));
    }

    #[test]
    fn organigram_selected_matches_the_node_itself() {
        let value = WidgetValue::Organigram(vec!["a".into(), "b1".into()]);
        assert!(check(&condition("organigram-selected", json!(["a"])), Some(&value), None));
        assert!(check(&with_modifier("organigram-selected", "ALL", json!(["a", "b1"])), Some(&value), None));
        assert!(!check(&condition("organigram-selected", json!(["a1"])), Some(&value), None));
    }

    #[test]
    fn number_and_text_comparisons() {
        let number = WidgetValue::Number(Number::from(5));
        assert!(check(&condition("number-greater-than", json!(4.5)), Some(&number), None));
        assert!(check(&condition("number-less-than", json!(6)), Some(&number), None));
        assert!(check(&condition("number-equal-to", json!(5.0)), Some(&number), None));

        let text = WidgetValue::Text("Flood response".into());
        assert!(check(&condition("text-starts-with", json!("flood")), Some(&text), None));
        assert!(check(&condition("text-ends-with", json!("Response")), Some(&text), None));
        assert!(!check(&condition("text-contains", json!("drought")), Some(&text), None));
    }

    #[test]
    fn date_and_time_comparisons() {
        let date = WidgetValue::Date("2021-06-15".into());
        assert!(check(&condition("date-after", json!("2021-06-01")), Some(&date), None));
        assert!(check(&condition("date-equal-to", json!("2021/06/15")), Some(&date), None));
        assert!(!check(&condition("date-before", json!("not a date")), Some(&date), None));

        let time = WidgetValue::Time("09:30".into());
        assert!(check(&condition("time-before", json!("10:00")), Some(&time), None));
        assert!(check(&condition("time-equal-to", json!("09:30:00")), Some(&time), None));
    }

    #[test]
    fn range_comparisons() {
        let dates = WidgetValue::DateRange(DateRangeValue {
            start_date: "2021-01-10".into(),
            end_date: "2021-01-20".into(),
        });
        assert!(check(&condition("date-range-after", json!("2021-01-01")), Some(&dates), None));
        assert!(check(&condition("date-range-before", json!("2021-02-01")), Some(&dates), None));
        assert!(check(&condition("date-range-includes", json!("2021-01-20")), Some(&dates), None));
        assert!(!check(&condition("date-range-includes", json!("2021-01-21")), Some(&dates), None));

        let times = WidgetValue::TimeRange(TimeRangeValue {
            start_time: "08:00".into(),
            end_time: "12:00".into(),
        });
        assert!(check(&condition("time-range-includes", json!("08:00")), Some(&times), None));
        assert!(!check(&condition("time-range-after", json!("09:00")), Some(&times), None));
    }

    #[test]
    fn matrix_levels_are_collected_before_matching() {
        let mut cells = BTreeMap::new();
        cells.insert("c1".to_string(), true);
        cells.insert("c2".to_string(), false);
        let mut matrix1d = Matrix1dValue::new();
        matrix1d.insert("r1".to_string(), cells);
        let matrix1d = WidgetValue::Matrix1d(matrix1d);

        assert!(check(&condition("matrix1d-rows-selected", json!(["r1"])), Some(&matrix1d), None));
        assert!(check(&condition("matrix1d-cells-selected", json!(["c1"])), Some(&matrix1d), None));
        assert!(!check(&condition("matrix1d-cells-selected", json!(["c2"])), Some(&matrix1d), None));

        let mut columns = BTreeMap::new();
        columns.insert("col1".to_string(), vec!["sc1".to_string()]);
        columns.insert("col2".to_string(), Vec::new());
        let mut sub_rows = BTreeMap::new();
        sub_rows.insert("sr1".to_string(), columns);
        let mut matrix2d = Matrix2dValue::new();
        matrix2d.insert("r1".to_string(), sub_rows);
        let matrix2d = WidgetValue::Matrix2d(matrix2d);

        assert!(check(&condition("matrix2d-rows-selected", json!(["r1"])), Some(&matrix2d), None));
        assert!(check(&condition("matrix2d-sub-rows-selected", json!(["sr1"])), Some(&matrix2d), None));
        assert!(check(&with_modifier("matrix2d-columns-selected", "ALL", json!(["col1", "col2"])), Some(&matrix2d), None));
        assert!(check(&condition("matrix2d-sub-columns-selected", json!(["sc1"])), Some(&matrix2d), None));
        assert!(!check(&condition("matrix2d-sub-columns-selected", json!(["sc2"])), Some(&matrix2d), None));
    }
}
