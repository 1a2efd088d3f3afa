//! One entry being tagged against a framework.
//!
//! [`EntryForm`] owns the entry's attributes as a form object keyed by widget client id,
//! routes renderer callbacks through [`ObjectScope`], validates what is visible and produces
//! the pruned submission.

use deep_types::{
    Attribute, AttributeConstraints, AttributeMap, Entry, FormError, Framework, ObjectError, Section, Widget, WidgetValue,
    validate_candidate_value,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    codec::{self, AttributeEdit},
    descriptor::describe,
    form::{ObjectScope, SetValue},
    planner::VisibilityPlan,
    render::{RenderMode, RenderedAttribute, render_attribute},
};

/// Pseudo-section id used for the secondary tagging widgets.
pub const SECONDARY_TAGGING_ID: &str = "secondary-tagging";

/// Rendered widgets of one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedSection {
    pub client_id: String,
    pub title: String,
    pub attributes: Vec<RenderedAttribute>,
}

/// Validates one attribute against its widget's constraints.
///
/// Returns `None` when the value is acceptable or the widget kind is unsupported.
pub fn validate_attribute(widget: &Widget, attribute: Option<&Attribute>) -> Option<FormError> {
    if !describe(&widget.kind).is_supported() {
        return None;
    }
    let value = attribute.and_then(|attribute| codec::to_input_value(&widget.kind, attribute.data.as_ref()));
    validate_candidate_value(value.as_ref(), &AttributeConstraints::for_widget(widget))
        .err()
        .map(FormError::Message)
}

pub struct EntryForm<'f> {
    framework: &'f Framework,
    entry_client_id: String,
    attributes: AttributeMap,
    error: Option<FormError>,
}

impl<'f> EntryForm<'f> {
    pub fn new(framework: &'f Framework, entry: &Entry) -> Self {
        Self {
            framework,
            entry_client_id: entry.client_id.clone(),
            attributes: entry.attributes_by_widget(),
            error: None,
        }
    }

    pub fn framework(&self) -> &'f Framework {
        self.framework
    }

    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    pub fn error(&self) -> Option<&FormError> {
        self.error.as_ref()
    }

    pub fn plan(&self) -> VisibilityPlan {
        VisibilityPlan::compute(self.framework, &self.attributes)
    }

    /// Typed value currently held for a widget.
    pub fn value_of(&self, widget_id: &str) -> Option<WidgetValue> {
        let widget = self.framework.find_widget(widget_id)?;
        let attribute = self.attributes.get(widget_id)?;
        codec::to_input_value(&widget.kind, attribute.data.as_ref())
    }

    /// Visible widgets per section, sections in display order. Secondary tagging comes last
    /// under [`SECONDARY_TAGGING_ID`].
    pub fn visible_sections(&self) -> Vec<(&'f str, &'f str, Vec<&'f Widget>)> {
        let plan = self.plan();
        let mut sections: Vec<&'f Section> = self.framework.primary_tagging.iter().collect();
        sections.sort_by_key(|section| section.order);

        let mut visible: Vec<(&'f str, &'f str, Vec<&'f Widget>)> = sections
            .into_iter()
            .map(|section| (section.client_id.as_str(), section.title.as_str(), plan.visible(&section.widgets)))
            .collect();
        if !self.framework.secondary_tagging.is_empty() {
            visible.push((SECONDARY_TAGGING_ID, "Secondary tagging", plan.visible(&self.framework.secondary_tagging)));
        }
        visible
    }

    /// Renderer callback: applies `value` to the attribute of widget `name`.
    ///
    /// The attribute is created on first edit. Returns `false` when `name` is not a widget of
    /// the framework.
    pub fn handle_change(&mut self, value: Option<WidgetValue>, name: &str) -> bool {
        let Some(widget) = self.framework.find_widget(name) else {
            warn!(widget = name, "change for unknown widget ignored");
            return false;
        };

        let widget_id = widget.client_id.clone();
        let kind = widget.kind.clone();
        let mut next = None;
        {
            let mut on_change = |attributes: AttributeMap| next = Some(attributes);
            let mut scope = ObjectScope::new(name, &self.attributes, &mut on_change);
            scope.set(SetValue::update(move |previous: Option<&Attribute>| {
                let mut attribute = previous
                    .cloned()
                    .unwrap_or_else(|| Attribute::empty(format!("attr-{widget_id}"), widget_id.clone(), kind));
                attribute.apply(value);
                Some(attribute)
            }));
        }
        if let Some(next) = next {
            self.attributes = next;
        }

        if let Some(FormError::Object(object)) = self.error.as_mut() {
            object.fields.shift_remove(name);
        }
        debug!(entry = %self.entry_client_id, widget = name, "attribute updated");
        true
    }

    /// Validates visible widgets only; hidden widgets never block submission.
    pub fn validate(&mut self) -> Result<(), FormError> {
        let plan = self.plan();
        let mut object = ObjectError::default();
        for widget in self.framework.widgets() {
            if plan.is_hidden(&widget.client_id) {
                continue;
            }
            if let Some(error) = validate_attribute(widget, self.attributes.get(&widget.client_id)) {
                object.insert(widget.client_id.clone(), error);
            }
        }

        if object.is_empty() {
            self.error = None;
            return Ok(());
        }
        let error = FormError::Object(object);
        self.error = Some(error.clone());
        Err(error)
    }

    /// Renders every visible widget in `mode`, with errors scoped per widget.
    pub fn render(&self, mode: RenderMode) -> Vec<RenderedSection> {
        self.visible_sections()
            .into_iter()
            .map(|(client_id, title, widgets)| RenderedSection {
                client_id: client_id.to_string(),
                title: title.to_string(),
                attributes: widgets
                    .into_iter()
                    .map(|widget| {
                        let error = self.error.as_ref().and_then(|error| error.field(&widget.client_id));
                        render_attribute(widget, self.attributes.get(&widget.client_id), error, mode)
                    })
                    .collect(),
            })
            .collect()
    }

    /// Builds the entry to submit: attributes of hidden widgets and attributes without data
    /// are dropped.
    pub fn into_submission(self) -> Entry {
        let plan = self.plan();
        let attributes = plan
            .prune(self.attributes)
            .into_values()
            .filter(|attribute| attribute.data.is_some())
            .collect();
        Entry {
            client_id: self.entry_client_id,
            attributes,
        }
    }
}
