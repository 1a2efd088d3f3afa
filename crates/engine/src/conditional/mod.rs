pub mod evaluator;
mod operators;
pub mod validation;

pub use evaluator::{ConditionEvaluator, WidgetLookup, is_visible};
pub use validation::{ConditionalIssue, validate_framework};
