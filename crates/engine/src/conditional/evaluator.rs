//! Visibility evaluation for conditional widgets.
//!
//! A widget with no conditions is always visible. Otherwise its conditions are sorted by
//! `order`, each one is evaluated against the current value of its parent widget, inverted
//! when requested, and the results are folded left with each condition's conjunction. The
//! first condition seeds the fold, so its conjunction is never consulted.

use std::collections::HashSet;

use deep_types::{AttributeMap, Condition, ConditionOperator, Conditional, Framework, Widget, WidgetValue};
use indexmap::IndexMap;
use tracing::debug;

use super::operators;
use crate::codec;

/// Read-only lookup of widget configuration by client id.
pub trait WidgetLookup {
    fn lookup_widget(&self, client_id: &str) -> Option<&Widget>;
}

impl WidgetLookup for Framework {
    fn lookup_widget(&self, client_id: &str) -> Option<&Widget> {
        self.find_widget(client_id)
    }
}

impl WidgetLookup for [Widget] {
    fn lookup_widget(&self, client_id: &str) -> Option<&Widget> {
        self.iter().find(|widget| widget.client_id == client_id)
    }
}

impl WidgetLookup for Vec<Widget> {
    fn lookup_widget(&self, client_id: &str) -> Option<&Widget> {
        self.as_slice().lookup_widget(client_id)
    }
}

impl<'widget> WidgetLookup for IndexMap<&'widget str, &'widget Widget> {
    fn lookup_widget(&self, client_id: &str) -> Option<&Widget> {
        self.get(client_id).copied()
    }
}

/// Evaluates widget conditionals against one entry's attributes.
///
/// The evaluator only borrows its inputs, so it is cheap to build per render pass and can be
/// shared across threads whenever the lookup is `Sync`.
pub struct ConditionEvaluator<'context, L: WidgetLookup + ?Sized> {
    widgets: &'context L,
    attributes: &'context AttributeMap,
    hidden: Option<&'context HashSet<String>>,
}

impl<'context, L: WidgetLookup + ?Sized> ConditionEvaluator<'context, L> {
    pub fn new(widgets: &'context L, attributes: &'context AttributeMap) -> Self {
        Self {
            widgets,
            attributes,
            hidden: None,
        }
    }

    /// Treats the listed widgets as unset, as if their attributes did not exist.
    ///
    /// Used by the visibility planner so a hidden widget cannot keep its dependents visible.
    pub fn with_hidden(mut self, hidden: &'context HashSet<String>) -> Self {
        self.hidden = Some(hidden);
        self
    }

    /// Returns whether `widget` should be shown.
    ///
    /// # Behavior
    /// - No conditional, or an empty condition list, means visible.
    /// - Conditions are stably sorted by `order` before folding.
    /// - `invert` is applied to each condition before it is combined.
    /// - Unknown operators, malformed payloads and missing parent values make the individual
    ///   condition false; they never abort evaluation.
    /// - A condition whose `order`, `invert` or `conjunctionOperator` did not parse sorts last
    ///   and sets the running result to false.
    pub fn is_visible(&self, widget: &Widget) -> bool {
        let Some(conditional) = widget.conditional.as_ref() else {
            return true;
        };
        if conditional.conditions.is_empty() {
            return true;
        }

        let mut ordered: Vec<&Condition> = conditional.conditions.iter().collect();
        ordered.sort_by_key(|condition| condition.order.valid().copied().unwrap_or(i32::MAX));

        let mut accumulator: Option<bool> = None;
        for condition in ordered {
            let step = match (condition.order.valid(), condition.invert.valid(), condition.conjunction_operator.valid()) {
                (Some(_), Some(&invert), Some(&conjunction)) => Some((invert, conjunction)),
                _ => None,
            };
            accumulator = Some(match (accumulator, step) {
                (_, None) => {
                    debug!(condition = %condition.key, "malformed condition; folding to false");
                    false
                }
                (None, Some((invert, _))) => self.evaluate_condition(conditional, condition) != invert,
                (Some(previous), Some((invert, conjunction))) => {
                    conjunction.combine(previous, self.evaluate_condition(conditional, condition) != invert)
                }
            });
        }

        let visible = accumulator.unwrap_or(true);
        debug!(widget = %widget.client_id, visible, "evaluated widget conditional");
        visible
    }

    /// Evaluates a single condition, before inversion.
    pub fn evaluate_condition(&self, conditional: &Conditional, condition: &Condition) -> bool {
        let Some(operator) = ConditionOperator::parse(&condition.operator) else {
            debug!(condition = %condition.key, operator = %condition.operator, "unknown condition operator; treating as not satisfied");
            return false;
        };

        let parent_id = conditional.parent_of(condition);
        let parent_widget = self.widgets.lookup_widget(parent_id);
        let parent_value = self.parent_value(parent_id, parent_widget);

        operators::evaluate(operator, condition, parent_value.as_ref(), parent_widget)
    }

    /// Current typed value of a parent widget, `None` when unset, hidden or malformed.
    fn parent_value(&self, parent_id: &str, parent_widget: Option<&Widget>) -> Option<WidgetValue> {
        if self.hidden.is_some_and(|hidden| hidden.contains(parent_id)) {
            return None;
        }
        let attribute = self.attributes.get(parent_id)?;
        let kind = parent_widget.map_or(&attribute.widget_type, |widget| &widget.kind);
        codec::to_input_value(kind, attribute.data.as_ref())
    }
}

/// Returns whether `widget` is visible given the framework's widgets and an entry's
/// attributes keyed by widget client id.
pub fn is_visible<L: WidgetLookup + ?Sized>(widget: &Widget, widgets: &L, attributes: &AttributeMap) -> bool {
    ConditionEvaluator::new(widgets, attributes).is_visible(widget)
}

#[cfg(test)]
mod tests {
    use super::*;
    use deep_types::{Attribute, AttributeData, Conjunction, Lenient, WidgetKind};
    use serde_json::{Value as JsonValue, json};

    fn select_widget(client_id: &str) -> Widget {
        let mut widget = Widget::new(client_id, WidgetKind::SingleSelect);
        widget.properties = Some(json!({
            "options": [{ "key": "a", "label": "A", "order": 1 }, { "key": "b", "label": "B", "order": 2 }]
        }));
        widget
    }

    fn attributes(values: &[(&str, WidgetKind, JsonValue)]) -> AttributeMap {
        values
            .iter()
            .map(|(widget, kind, value)| {
                let mut attribute = Attribute::empty(format!("attr-{widget}"), *widget, kind.clone());
                attribute.data = Some(AttributeData { value: value.clone() });
                (widget.to_string(), attribute)
            })
            .collect()
    }

    fn condition(key: &str, order: i32, operator: &str, value: JsonValue, conjunction: Conjunction, invert: bool) -> Condition {
        let mut condition = Condition::new(key, operator, Some(value));
        condition.order = order.into();
        condition.conjunction_operator = conjunction.into();
        condition.invert = invert.into();
        condition
    }

    fn child(conditions: Vec<Condition>) -> Widget {
        let mut widget = Widget::new("child", WidgetKind::Text);
        widget.conditional = Some(Conditional {
            parent_widget: "parent".to_string(),
            parent_widget_type: Some(WidgetKind::SingleSelect),
            conditions,
        });
        widget
    }

    #[test]
    fn widgets_without_conditions_are_visible() {
        let widgets = vec![select_widget("parent")];
        let attributes = AttributeMap::new();
        assert!(is_visible(&Widget::new("plain", WidgetKind::Text), &widgets, &attributes));
        assert!(is_visible(&child(Vec::new()), &widgets, &attributes));
    }

    #[test]
    fn single_condition_follows_the_selection() {
        let widgets = vec![select_widget("parent")];
        let target = child(vec![condition("c1", 0, "single-selection-selected", json!(["a"]), Conjunction::And, false)]);

        let selected_a = attributes(&[("parent", WidgetKind::SingleSelect, json!("a"))]);
        let selected_b = attributes(&[("parent", WidgetKind::SingleSelect, json!("b"))]);
        assert!(is_visible(&target, &widgets, &selected_a));
        assert!(!is_visible(&target, &widgets, &selected_b));
    }

    #[test]
    fn invert_negates_a_single_condition() {
        let widgets = vec![select_widget("parent")];
        let values = attributes(&[("parent", WidgetKind::SingleSelect, json!("a"))]);

        let plain = child(vec![condition("c1", 0, "single-selection-selected", json!(["a"]), Conjunction::And, false)]);
        let inverted = child(vec![condition("c1", 0, "single-selection-selected", json!(["a"]), Conjunction::And, true)]);
        assert_ne!(is_visible(&plain, &widgets, &values), is_visible(&inverted, &widgets, &values));
    }

    #[test]
    fn or_fold_is_true_when_any_condition_holds() {
        let widgets = vec![select_widget("parent")];
        let values = attributes(&[("parent", WidgetKind::SingleSelect, json!("b"))]);
        let target = child(vec![
            condition("c1", 0, "single-selection-selected", json!(["a"]), Conjunction::Or, false),
            condition("c2", 1, "single-selection-selected", json!(["b"]), Conjunction::Or, false),
        ]);
        assert!(is_visible(&target, &widgets, &values));
    }

    #[test]
    fn order_decides_the_fold_not_the_list_position() {
        let widgets = vec![select_widget("parent")];
        let values = attributes(&[("parent", WidgetKind::SingleSelect, json!("a"))]);

        // Sorted: (a AND b) OR a == true. In list order: (a AND a) AND b == false.
        let target = child(vec![
            condition("c3", 3, "single-selection-selected", json!(["a"]), Conjunction::Or, false),
            condition("c1", 1, "single-selection-selected", json!(["a"]), Conjunction::And, false),
            condition("c2", 2, "single-selection-selected", json!(["b"]), Conjunction::And, false),
        ]);
        assert!(is_visible(&target, &widgets, &values));
    }

    #[test]
    fn xor_requires_exactly_one_side() {
        let widgets = vec![select_widget("parent")];
        let values = attributes(&[("parent", WidgetKind::SingleSelect, json!("a"))]);
        let both = child(vec![
            condition("c1", 0, "single-selection-selected", json!(["a"]), Conjunction::And, false),
            condition("c2", 1, "single-selection-selected", json!(["a", "b"]), Conjunction::Xor, false),
        ]);
        assert!(!is_visible(&both, &widgets, &values));
    }

    #[test]
    fn unknown_operator_fails_closed_before_inversion() {
        let widgets = vec![select_widget("parent")];
        let values = attributes(&[("parent", WidgetKind::SingleSelect, json!("a"))]);

        let unknown = child(vec![condition("c1", 0, "colour-is-blue", json!(["a"]), Conjunction::And, false)]);
        assert!(!is_visible(&unknown, &widgets, &values));

        let inverted = child(vec![condition("c1", 0, "colour-is-blue", json!(["a"]), Conjunction::And, true)]);
        assert!(is_visible(&inverted, &widgets, &values));
    }

    #[test]
    fn malformed_conjunction_folds_to_false() {
        let widgets = vec![select_widget("parent")];
        let values = attributes(&[("parent", WidgetKind::SingleSelect, json!("a"))]);

        let mut broken = condition("c2", 1, "single-selection-selected", json!(["a"]), Conjunction::Or, false);
        broken.conjunction_operator = Lenient::Malformed(json!("NAND"));
        let target = child(vec![condition("c1", 0, "single-selection-selected", json!(["a"]), Conjunction::And, false), broken.clone()]);
        assert!(!is_visible(&target, &widgets, &values));

        // A later OR can still recover the result.
        let recovered = child(vec![
            condition("c1", 0, "single-selection-selected", json!(["a"]), Conjunction::And, false),
            broken,
            condition("c3", 2, "single-selection-selected", json!(["a"]), Conjunction::Or, false),
        ]);
        assert!(is_visible(&recovered, &widgets, &values));
    }

    #[test]
    fn malformed_order_sorts_last_and_fails_closed() {
        let widgets = vec![select_widget("parent")];
        let values = attributes(&[("parent", WidgetKind::SingleSelect, json!("a"))]);

        let mut broken = condition("c1", 0, "single-selection-selected", json!(["a"]), Conjunction::Or, false);
        broken.order = Lenient::Malformed(json!("first"));
        let target = child(vec![broken, condition("c2", 5, "single-selection-selected", json!(["a"]), Conjunction::And, false)]);
        assert!(!is_visible(&target, &widgets, &values));

        let mut inverted = condition("c1", 0, "single-selection-selected", json!(["a"]), Conjunction::And, false);
        inverted.invert = Lenient::Malformed(json!("yes"));
        assert!(!is_visible(&child(vec![inverted]), &widgets, &values));
    }

    #[test]
    fn hidden_parents_are_treated_as_unset() {
        let widgets = vec![select_widget("parent")];
        let values = attributes(&[("parent", WidgetKind::SingleSelect, json!("a"))]);
        let target = child(vec![condition("c1", 0, "single-selection-selected", json!(["a"]), Conjunction::And, false)]);

        let hidden: HashSet<String> = ["parent".to_string()].into_iter().collect();
        let evaluator = ConditionEvaluator::new(widgets.as_slice(), &values).with_hidden(&hidden);
        assert!(!evaluator.is_visible(&target));
    }

    #[test]
    fn per_condition_parent_override_is_honoured() {
        let widgets = vec![select_widget("parent"), select_widget("other")];
        let values = attributes(&[
            ("parent", WidgetKind::SingleSelect, json!("b")),
            ("other", WidgetKind::SingleSelect, json!("a")),
        ]);
        let mut override_condition = condition("c1", 0, "single-selection-selected", json!(["a"]), Conjunction::And, false);
        override_condition.parent_widget = Some("other".to_string());
        assert!(is_visible(&child(vec![override_condition]), &widgets, &values));
    }
}
