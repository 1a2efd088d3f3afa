//! Author-defined constraints on attribute values.
//!
//! Widgets can be marked required and NUMBER widgets can declare bounds. The checks return a
//! message instead of an error type because the result is threaded into the form error tree,
//! not propagated.

use crate::{
    attribute::WidgetValue,
    widget::{NumberProperties, Widget, WidgetKind},
};

/// Constraints derived from a widget's configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttributeConstraints {
    pub required: bool,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
}

impl AttributeConstraints {
    /// Reads constraints from a widget. Malformed NUMBER properties contribute no bounds.
    pub fn for_widget(widget: &Widget) -> Self {
        let mut constraints = Self {
            required: widget.required,
            ..Self::default()
        };
        if widget.kind == WidgetKind::Number
            && let Ok(Some(properties)) = widget.typed_properties::<NumberProperties>()
        {
            constraints.min_value = properties.min_value;
            constraints.max_value = properties.max_value;
        }
        constraints
    }
}

/// Validate a candidate value against the widget's constraints.
///
/// - Required widgets reject absent and empty values.
/// - Bounds apply to numbers only and are inclusive.
/// - Everything else passes.
pub fn validate_candidate_value(candidate: Option<&WidgetValue>, constraints: &AttributeConstraints) -> Result<(), String> {
    let candidate = candidate.filter(|value| !value.is_empty());
    let Some(candidate) = candidate else {
        if constraints.required {
            return Err("value is required".to_string());
        }
        return Ok(());
    };

    if let WidgetValue::Number(number) = candidate {
        let Some(number) = number.as_f64() else {
            return Err("value must be a finite number".to_string());
        };
        if let Some(min_value) = constraints.min_value
            && number < min_value
        {
            return Err(format!("value must be at least {}", min_value));
        }
        if let Some(max_value) = constraints.max_value
            && number > max_value
        {
            return Err(format!("value must be at most {}", max_value));
        }
    }

    Ok(())
}
