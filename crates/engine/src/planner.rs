//! Visibility planning for a whole framework.
//!
//! Hiding cascades: a hidden widget contributes no value, so widgets conditioned on it are
//! evaluated as if it were unset. The plan re-evaluates until the hidden set stops changing.

use std::collections::HashSet;

use deep_types::{AttributeMap, Framework, Widget};
use tracing::{debug, warn};

use crate::conditional::ConditionEvaluator;

/// Hidden widgets of a framework for one entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VisibilityPlan {
    hidden: HashSet<String>,
}

impl VisibilityPlan {
    pub fn compute(framework: &Framework, attributes: &AttributeMap) -> Self {
        let widget_count = framework.widgets().count();
        let mut hidden: HashSet<String> = HashSet::new();

        // Inverted conditions on hidden parents can flip back and forth, so the loop is bounded.
        for pass in 0..=widget_count {
            let evaluator = ConditionEvaluator::new(framework, attributes).with_hidden(&hidden);
            let next: HashSet<String> = framework
                .widgets()
                .filter(|widget| !evaluator.is_visible(widget))
                .map(|widget| widget.client_id.clone())
                .collect();
            if next == hidden {
                debug!(passes = pass + 1, hidden = hidden.len(), "visibility plan settled");
                return Self { hidden };
            }
            hidden = next;
        }

        warn!(hidden = hidden.len(), "visibility plan did not settle; using the last pass");
        Self { hidden }
    }

    pub fn is_hidden(&self, client_id: &str) -> bool {
        self.hidden.contains(client_id)
    }

    pub fn hidden(&self) -> &HashSet<String> {
        &self.hidden
    }

    /// Visible widgets of `widgets`, stably sorted by `order`.
    pub fn visible<'w>(&self, widgets: &'w [Widget]) -> Vec<&'w Widget> {
        let mut visible: Vec<&Widget> = widgets.iter().filter(|widget| !self.is_hidden(&widget.client_id)).collect();
        visible.sort_by_key(|widget| widget.order);
        visible
    }

    /// Drops attributes belonging to hidden widgets.
    pub fn prune(&self, attributes: AttributeMap) -> AttributeMap {
        attributes.into_iter().filter(|(widget, _)| !self.is_hidden(widget)).collect()
    }
}

/// Widgets of `widgets` to render for the entry, in display order.
///
/// Hidden widgets are omitted, not flagged.
pub fn visible_widgets<'w>(framework: &Framework, widgets: &'w [Widget], attributes: &AttributeMap) -> Vec<&'w Widget> {
    VisibilityPlan::compute(framework, attributes).visible(widgets)
}

/// Client ids of every hidden widget in the framework.
pub fn hidden_widget_ids(framework: &Framework, attributes: &AttributeMap) -> HashSet<String> {
    VisibilityPlan::compute(framework, attributes).hidden
}

/// Removes attributes of hidden widgets before submission.
pub fn prune_hidden_attributes(framework: &Framework, attributes: AttributeMap) -> AttributeMap {
    VisibilityPlan::compute(framework, &attributes).prune(attributes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use deep_types::{Attribute, AttributeData, Condition, Conditional, Section, WidgetKind};
    use serde_json::json;

    fn conditioned(client_id: &str, parent: &str, operator: &str, value: serde_json::Value) -> Widget {
        let mut widget = Widget::new(client_id, WidgetKind::Text);
        widget.conditional = Some(Conditional {
            parent_widget: parent.to_string(),
            parent_widget_type: None,
            conditions: vec![Condition::new("c1", operator, Some(value))],
        });
        widget
    }

    fn framework(widgets: Vec<Widget>) -> Framework {
        Framework {
            primary_tagging: vec![Section {
                client_id: "s1".to_string(),
                widgets,
                ..Section::default()
            }],
            ..Framework::default()
        }
    }

    fn text_attribute(widget: &str, value: &str) -> (String, Attribute) {
        let mut attribute = Attribute::empty(format!("attr-{widget}"), widget, WidgetKind::Text);
        attribute.data = Some(AttributeData { value: json!(value) });
        (widget.to_string(), attribute)
    }

    #[test]
    fn hidden_widgets_are_excluded_from_the_render_list() {
        let mut w1 = Widget::new("w1", WidgetKind::SingleSelect);
        w1.order = 1;
        let mut w2 = Widget::new("w2", WidgetKind::Text);
        w2.order = 2;
        w2.conditional = Some(Conditional {
            parent_widget: "w1".to_string(),
            parent_widget_type: Some(WidgetKind::SingleSelect),
            conditions: vec![Condition::new("c1", "single-selection-selected", Some(json!(["a"])))],
        });
        let framework = framework(vec![w2, w1]);
        let widgets = &framework.primary_tagging[0].widgets;

        let visible = visible_widgets(&framework, widgets, &AttributeMap::new());
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].client_id, "w1");
    }

    #[test]
    fn hiding_cascades_through_dependents() {
        // w2 shows when w1 has text; w3 shows when w2 has text. w2 is hidden, so w3 must be too
        // even though w2 still carries a stale value.
        let framework = framework(vec![
            Widget::new("w1", WidgetKind::Text),
            conditioned("w2", "w1", "text-contains", json!("yes")),
            conditioned("w3", "w2", "text-contains", json!("go")),
        ]);
        let attributes: AttributeMap = [text_attribute("w1", "no"), text_attribute("w2", "go")].into_iter().collect();

        let plan = VisibilityPlan::compute(&framework, &attributes);
        assert!(plan.is_hidden("w2"));
        assert!(plan.is_hidden("w3"));
        assert!(!plan.is_hidden("w1"));
    }

    #[test]
    fn pruning_drops_hidden_attributes_only() {
        let framework = framework(vec![Widget::new("w1", WidgetKind::Text), conditioned("w2", "w1", "text-contains", json!("yes"))]);
        let attributes: AttributeMap = [text_attribute("w1", "no"), text_attribute("w2", "stale")].into_iter().collect();

        let pruned = prune_hidden_attributes(&framework, attributes);
        assert_eq!(pruned.keys().collect::<Vec<_>>(), vec!["w1"]);
    }

    #[test]
    fn visible_widgets_keep_authoring_order_for_equal_orders() {
        let framework = framework(vec![Widget::new("b", WidgetKind::Text), Widget::new("a", WidgetKind::Text)]);
        let widgets = &framework.primary_tagging[0].widgets;
        let ids: Vec<_> = visible_widgets(&framework, widgets, &AttributeMap::new())
            .into_iter()
            .map(|widget| widget.client_id.as_str())
            .collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn oscillating_plans_terminate() {
        // w1 and w2 depend on each other through an inverted condition; the hidden set cycles.
        let w1 = conditioned("w1", "w2", "empty", json!(null));
        let mut w2 = conditioned("w2", "w1", "empty", json!(null));
        if let Some(conditional) = w2.conditional.as_mut() {
            conditional.conditions[0].invert = true.into();
        }
        let framework = framework(vec![w1, w2]);
        let attributes: AttributeMap = [text_attribute("w1", "x"), text_attribute("w2", "y")].into_iter().collect();

        // Passes: {w1}, {w1, w2}, {w2}; the bound stops at the third.
        let plan = VisibilityPlan::compute(&framework, &attributes);
        let expected: HashSet<String> = ["w2".to_string()].into_iter().collect();
        assert_eq!(plan.hidden(), &expected);
    }
}
