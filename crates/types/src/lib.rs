//! Strongly typed analytical framework definitions shared across the engine and the CLI.
//!
//! The wire format is the camelCase JSON produced by the DEEP API; YAML fixtures use the
//! same field names.

pub mod attribute;
pub mod conditional;
pub mod form_error;
pub mod framework;
pub mod validation;
pub mod widget;

pub use attribute::{Attribute, AttributeData, AttributeMap, DateRangeValue, Matrix1dValue, Matrix2dValue, TimeRangeValue, WidgetValue};
pub use conditional::{Condition, ConditionOperator, Conditional, Conjunction, Lenient, OperatorModifier, OperatorPayload, ParseOperatorModifierError};
pub use form_error::{FormError, ObjectError, error_object};
pub use framework::{Entry, Framework, Section};
pub use validation::{AttributeConstraints, validate_candidate_value};
pub use widget::{
    KeyLabel, Matrix1dProperties, Matrix1dRow, Matrix2dColumn, Matrix2dProperties, Matrix2dRow, NumberProperties, OptionProperties,
    OrganigramNode, OrganigramProperties, Widget, WidgetKind, WidgetWidth,
};
