//! Authoring-time checks for framework conditionals.
//!
//! The tagging path never fails on bad configuration; it evaluates defensively and hides the
//! widget. This module is where the same problems are surfaced to framework authors instead.

use std::collections::{HashMap, HashSet};

use deep_types::{
    Condition, ConditionOperator, Conditional, Framework, OperatorPayload, OptionProperties, OrganigramProperties, Widget, WidgetKind,
};
use deep_util::{parse_attribute_date, parse_attribute_time};
use indexmap::IndexMap;
use thiserror::Error;

use super::operators::key_set;
use crate::descriptor::describe;

/// A problem found in a framework's conditional configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionalIssue {
    #[error("widget id '{client_id}' is used by more than one widget")]
    DuplicateWidget { client_id: String },

    #[error("widget '{widget}' condition '{condition}' references missing parent widget '{parent}'")]
    MissingParent { widget: String, condition: String, parent: String },

    #[error("widget '{widget}' condition '{condition}' references the widget itself")]
    SelfReference { widget: String, condition: String },

    #[error("widget '{widget}' condition '{condition}' uses unknown operator '{operator}'")]
    UnknownOperator { widget: String, condition: String, operator: String },

    #[error("widget '{widget}' condition '{condition}': operator '{operator}' is not available for {parent_kind} widgets")]
    UnsupportedOperator {
        widget: String,
        condition: String,
        operator: String,
        parent_kind: String,
    },

    #[error("widget '{widget}' has more than one condition with key '{key}'")]
    DuplicateConditionKey { widget: String, key: String },

    #[error("widget '{widget}' condition '{condition}': operator '{operator}' expects {expected}")]
    MalformedPayload {
        widget: String,
        condition: String,
        operator: String,
        expected: &'static str,
    },

    #[error("widget '{widget}' condition '{condition}' has malformed {field} {value}")]
    MalformedField {
        widget: String,
        condition: String,
        field: &'static str,
        value: String,
    },

    #[error("widget '{widget}' condition '{condition}' has invalid operator modifier '{modifier}'; expected ALL or ANY")]
    InvalidModifier { widget: String, condition: String, modifier: String },

    #[error("widget '{widget}' condition '{condition}' refers to '{key}', which is not an option of the parent widget")]
    UnknownOptionKey { widget: String, condition: String, key: String },

    #[error("conditional dependency cycle: {}", path.join(" -> "))]
    DependencyCycle { path: Vec<String> },
}

/// Validates every conditional in `framework`.
///
/// Issues are returned in a stable order: duplicate widget ids first, then per-widget issues in
/// authoring order, then dependency cycles. An empty list means the configuration is clean.
pub fn validate_framework(framework: &Framework) -> Vec<ConditionalIssue> {
    let mut issues = Vec::new();

    let mut seen = HashSet::new();
    for widget in framework.widgets() {
        if !seen.insert(widget.client_id.as_str()) {
            issues.push(ConditionalIssue::DuplicateWidget {
                client_id: widget.client_id.clone(),
            });
        }
    }

    let index = framework.widget_index();
    for widget in framework.widgets() {
        if let Some(conditional) = &widget.conditional {
            validate_conditional(widget, conditional, &index, &mut issues);
        }
    }

    issues.extend(find_cycles(&index).into_iter().map(|path| ConditionalIssue::DependencyCycle { path }));
    issues
}

fn validate_conditional(widget: &Widget, conditional: &Conditional, index: &IndexMap<&str, &Widget>, issues: &mut Vec<ConditionalIssue>) {
    let mut keys = HashSet::new();
    for condition in &conditional.conditions {
        if !keys.insert(condition.key.as_str()) {
            issues.push(ConditionalIssue::DuplicateConditionKey {
                widget: widget.client_id.clone(),
                key: condition.key.clone(),
            });
        }
        validate_condition(widget, conditional, condition, index, issues);
    }
}

fn validate_condition(
    widget: &Widget,
    conditional: &Conditional,
    condition: &Condition,
    index: &IndexMap<&str, &Widget>,
    issues: &mut Vec<ConditionalIssue>,
) {
    let widget_id = || widget.client_id.clone();
    let condition_key = || condition.key.clone();

    let parent_id = conditional.parent_of(condition);
    if parent_id == widget.client_id {
        issues.push(ConditionalIssue::SelfReference {
            widget: widget_id(),
            condition: condition_key(),
        });
    }
    let parent = index.get(parent_id).copied();
    if parent.is_none() {
        issues.push(ConditionalIssue::MissingParent {
            widget: widget_id(),
            condition: condition_key(),
            parent: parent_id.to_string(),
        });
    }

    for (field, value) in condition.malformed_fields() {
        issues.push(ConditionalIssue::MalformedField {
            widget: widget_id(),
            condition: condition_key(),
            field,
            value: value.to_string(),
        });
    }

    let Some(operator) = ConditionOperator::parse(&condition.operator) else {
        issues.push(ConditionalIssue::UnknownOperator {
            widget: widget_id(),
            condition: condition_key(),
            operator: condition.operator.clone(),
        });
        return;
    };

    if let Some(parent) = parent
        && !describe(&parent.kind).supports(operator)
    {
        issues.push(ConditionalIssue::UnsupportedOperator {
            widget: widget_id(),
            condition: condition_key(),
            operator: condition.operator.clone(),
            parent_kind: parent.kind.to_string(),
        });
    }

    if let Some(modifier) = &condition.operator_modifier
        && condition.modifier().is_err()
    {
        issues.push(ConditionalIssue::InvalidModifier {
            widget: widget_id(),
            condition: condition_key(),
            modifier: modifier.clone(),
        });
    }

    if let Some(expected) = payload_problem(operator, condition) {
        issues.push(ConditionalIssue::MalformedPayload {
            widget: widget_id(),
            condition: condition_key(),
            operator: condition.operator.clone(),
            expected,
        });
        return;
    }

    if let Some(parent) = parent {
        for key in unknown_option_keys(operator, condition, parent) {
            issues.push(ConditionalIssue::UnknownOptionKey {
                widget: widget_id(),
                condition: condition_key(),
                key,
            });
        }
    }
}

/// Describes the expected payload when the condition's value has the wrong shape.
fn payload_problem(operator: ConditionOperator, condition: &Condition) -> Option<&'static str> {
    let value = condition.value.as_ref();
    match operator.payload() {
        OperatorPayload::None => None,
        OperatorPayload::Number => value.and_then(|value| value.as_f64()).is_none().then_some("a number"),
        OperatorPayload::Key => value.and_then(|value| value.as_str()).is_none().then_some("an option key"),
        OperatorPayload::KeySet => key_set(value).is_none().then_some("a list of keys"),
        OperatorPayload::Text => {
            let text = value.and_then(|value| value.as_str());
            match operator {
                ConditionOperator::DateAfter
                | ConditionOperator::DateBefore
                | ConditionOperator::DateEqualTo
                | ConditionOperator::DateRangeAfter
                | ConditionOperator::DateRangeBefore
                | ConditionOperator::DateRangeIncludes => {
                    text.and_then(parse_attribute_date).is_none().then_some("a date (YYYY-MM-DD)")
                }
                ConditionOperator::TimeAfter
                | ConditionOperator::TimeBefore
                | ConditionOperator::TimeEqualTo
                | ConditionOperator::TimeRangeAfter
                | ConditionOperator::TimeRangeBefore
                | ConditionOperator::TimeRangeIncludes => text.and_then(parse_attribute_time).is_none().then_some("a time (HH:MM)"),
                _ => text.is_none().then_some("a string"),
            }
        }
    }
}

/// Payload keys that do not name an option of the parent widget.
fn unknown_option_keys(operator: ConditionOperator, condition: &Condition, parent: &Widget) -> Vec<String> {
    let referenced: Vec<&str> = match operator.payload() {
        OperatorPayload::Key => condition.value.as_ref().and_then(|value| value.as_str()).into_iter().collect(),
        OperatorPayload::KeySet => key_set(condition.value.as_ref()).unwrap_or_default(),
        _ => return Vec::new(),
    };

    let known: HashSet<String> = match parent.kind {
        WidgetKind::SingleSelect | WidgetKind::MultiSelect | WidgetKind::Scale => match parent.typed_properties::<OptionProperties>() {
            Ok(Some(properties)) => properties.options.into_iter().map(|option| option.key).collect(),
            _ => return Vec::new(),
        },
        WidgetKind::Organigram => match parent.typed_properties::<OrganigramProperties>() {
            Ok(Some(OrganigramProperties { options: Some(root), .. })) => {
                let mut keys: HashSet<String> = root.descendant_keys().into_iter().map(str::to_string).collect();
                keys.insert(root.key.clone());
                keys
            }
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    referenced
        .into_iter()
        .filter(|key| !known.contains(*key))
        .map(str::to_string)
        .collect()
}

/// Finds cycles in the widget -> parent dependency graph.
///
/// Each cycle is reported once, as the path from its first widget in authoring order back to
/// that widget.
fn find_cycles(index: &IndexMap<&str, &Widget>) -> Vec<Vec<String>> {
    let edges: HashMap<&str, Vec<&str>> = index
        .iter()
        .map(|(client_id, widget)| {
            let mut parents: Vec<&str> = widget
                .conditional
                .iter()
                .flat_map(|conditional| conditional.conditions.iter().map(|condition| conditional.parent_of(condition)))
                .filter(|parent| index.contains_key(parent))
                .collect();
            parents.dedup();
            (*client_id, parents)
        })
        .collect();

    let mut state: HashMap<&str, VisitState> = HashMap::new();
    let mut reported: HashSet<Vec<&str>> = HashSet::new();
    let mut cycles = Vec::new();
    let mut stack = Vec::new();

    for client_id in index.keys() {
        visit(client_id, &edges, &mut state, &mut stack, &mut reported, &mut cycles);
    }
    cycles
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum VisitState {
    InProgress,
    Done,
}

fn visit<'graph>(
    node: &'graph str,
    edges: &HashMap<&'graph str, Vec<&'graph str>>,
    state: &mut HashMap<&'graph str, VisitState>,
    stack: &mut Vec<&'graph str>,
    reported: &mut HashSet<Vec<&'graph str>>,
    cycles: &mut Vec<Vec<String>>,
) {
    match state.get(node) {
        Some(VisitState::Done) => return,
        Some(VisitState::InProgress) => {
            if let Some(start) = stack.iter().position(|entry| *entry == node) {
                let members = &stack[start..];
                let mut key = members.to_vec();
                key.sort_unstable();
                if reported.insert(key) {
                    let mut path: Vec<String> = members.iter().map(|member| member.to_string()).collect();
                    path.push(node.to_string());
                    cycles.push(path);
                }
            }
            return;
        }
        None => {}
    }

    state.insert(node, VisitState::InProgress);
    stack.push(node);
    if let Some(parents) = edges.get(node) {
        for parent in parents {
            visit(parent, edges, state, stack, reported, cycles);
        }
    }
    stack.pop();
    state.insert(node, VisitState::Done);
}
