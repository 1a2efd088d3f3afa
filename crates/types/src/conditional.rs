//! Conditional visibility rules attached to widgets.
//!
//! A widget's [`Conditional`] names a default parent widget and an ordered list of
//! [`Condition`]s. Operators are stored as raw tags so an operator this build does not know
//! still deserializes; [`ConditionOperator::parse`] is the single place tags are interpreted.
//! The other scalar fields are [`Lenient`], so one badly authored condition never stops the
//! framework from loading.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::widget::WidgetKind;

/// Rule set gating a widget's visibility.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Conditional {
    /// Client id of the widget the conditions refer to unless a condition overrides it.
    #[serde(alias = "parentClientId")]
    pub parent_widget: String,
    /// Kind of the parent widget as recorded by the editor. Advisory.
    #[serde(default)]
    pub parent_widget_type: Option<WidgetKind>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl Conditional {
    /// Parent widget client id used by `condition`.
    pub fn parent_of<'a>(&'a self, condition: &'a Condition) -> &'a str {
        condition.parent_widget.as_deref().unwrap_or(self.parent_widget.as_str())
    }
}

/// One rule referencing a parent widget's current value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Identifier unique within the owning conditional.
    pub key: String,
    /// Evaluation order.
    #[serde(default)]
    pub order: Lenient<i32>,
    /// Overrides [`Conditional::parent_widget`] for this condition only.
    #[serde(default)]
    pub parent_widget: Option<String>,
    /// Operator tag, for example `single-selection-selected`.
    pub operator: String,
    /// `ALL` / `ANY` (or `every` / `some`) for set operators.
    #[serde(default)]
    pub operator_modifier: Option<String>,
    /// Operator-specific comparison payload.
    #[serde(default)]
    pub value: Option<JsonValue>,
    /// How this condition folds into the running result.
    #[serde(default)]
    pub conjunction_operator: Lenient<Conjunction>,
    /// Negates this condition before folding.
    #[serde(default)]
    pub invert: Lenient<bool>,
}

impl Condition {
    /// Builds an `AND`-joined, non-inverted condition.
    pub fn new(key: impl Into<String>, operator: impl Into<String>, value: Option<JsonValue>) -> Self {
        Self {
            key: key.into(),
            order: Lenient::Valid(0),
            parent_widget: None,
            operator: operator.into(),
            operator_modifier: None,
            value,
            conjunction_operator: Lenient::Valid(Conjunction::And),
            invert: Lenient::Valid(false),
        }
    }

    /// Wire names and raw values of the fields that did not parse.
    pub fn malformed_fields(&self) -> Vec<(&'static str, &JsonValue)> {
        [
            ("order", self.order.malformed()),
            ("conjunctionOperator", self.conjunction_operator.malformed()),
            ("invert", self.invert.malformed()),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|value| (field, value)))
        .collect()
    }

    /// Interprets the modifier. Absent means [`OperatorModifier::Any`]; an unknown tag is
    /// returned as an error so evaluation can fail closed.
    pub fn modifier(&self) -> Result<OperatorModifier, ParseOperatorModifierError> {
        match self.operator_modifier.as_deref() {
            None => Ok(OperatorModifier::Any),
            Some(tag) => tag.parse(),
        }
    }
}

/// A wire field that either parsed as `T` or is kept verbatim for reporting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Lenient<T> {
    Valid(T),
    Malformed(JsonValue),
}

impl<T> Lenient<T> {
    pub fn valid(&self) -> Option<&T> {
        match self {
            Self::Valid(value) => Some(value),
            Self::Malformed(_) => None,
        }
    }

    pub fn malformed(&self) -> Option<&JsonValue> {
        match self {
            Self::Valid(_) => None,
            Self::Malformed(raw) => Some(raw),
        }
    }
}

impl<T: Default> Default for Lenient<T> {
    fn default() -> Self {
        Self::Valid(T::default())
    }
}

impl<T> From<T> for Lenient<T> {
    fn from(value: T) -> Self {
        Self::Valid(value)
    }
}

/// Folding rule between a condition and the accumulated result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Conjunction {
    #[default]
    And,
    Or,
    Xor,
}

impl Conjunction {
    pub fn combine(self, accumulator: bool, result: bool) -> bool {
        match self {
            Self::And => accumulator && result,
            Self::Or => accumulator || result,
            Self::Xor => accumulator != result,
        }
    }
}

/// Set comparison mode for multi-valued operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorModifier {
    /// Every configured key must be selected.
    All,
    /// At least one configured key must be selected.
    Any,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOperatorModifierError(pub String);

impl fmt::Display for ParseOperatorModifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid operator modifier '{}'; expected ALL or ANY", self.0)
    }
}

impl std::error::Error for ParseOperatorModifierError {}

impl FromStr for OperatorModifier {
    type Err = ParseOperatorModifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "every" => Ok(Self::All),
            "any" | "some" => Ok(Self::Any),
            _ => Err(ParseOperatorModifierError(s.to_string())),
        }
    }
}

/// Every operator the evaluator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionOperator {
    Empty,
    NumberGreaterThan,
    NumberLessThan,
    NumberEqualTo,
    TextStartsWith,
    TextEndsWith,
    TextContains,
    DateAfter,
    DateBefore,
    DateEqualTo,
    TimeAfter,
    TimeBefore,
    TimeEqualTo,
    DateRangeAfter,
    DateRangeBefore,
    DateRangeIncludes,
    TimeRangeAfter,
    TimeRangeBefore,
    TimeRangeIncludes,
    SingleSelectionSelected,
    MultiSelectionSelected,
    ScaleSelected,
    ScaleMoreThan,
    ScaleLessThan,
    OrganigramSelected,
    OrganigramDescendentSelected,
    Matrix1dRowsSelected,
    Matrix1dCellsSelected,
    Matrix2dRowsSelected,
    Matrix2dSubRowsSelected,
    Matrix2dColumnsSelected,
    Matrix2dSubColumnsSelected,
}

impl ConditionOperator {
    /// Interprets a wire tag; `None` for tags this build does not know.
    pub fn parse(tag: &str) -> Option<Self> {
        let operator = match tag {
            "empty" => Self::Empty,
            "number-greater-than" => Self::NumberGreaterThan,
            "number-less-than" => Self::NumberLessThan,
            "number-equal-to" => Self::NumberEqualTo,
            "text-starts-with" => Self::TextStartsWith,
            "text-ends-with" => Self::TextEndsWith,
            "text-contains" => Self::TextContains,
            "date-after" => Self::DateAfter,
            "date-before" => Self::DateBefore,
            "date-equal-to" => Self::DateEqualTo,
            "time-after" => Self::TimeAfter,
            "time-before" => Self::TimeBefore,
            "time-equal-to" => Self::TimeEqualTo,
            "date-range-after" => Self::DateRangeAfter,
            "date-range-before" => Self::DateRangeBefore,
            "date-range-includes" => Self::DateRangeIncludes,
            "time-range-after" => Self::TimeRangeAfter,
            "time-range-before" => Self::TimeRangeBefore,
            "time-range-includes" => Self::TimeRangeIncludes,
            "single-selection-selected" => Self::SingleSelectionSelected,
            "multi-selection-selected" => Self::MultiSelectionSelected,
            "scale-selected" => Self::ScaleSelected,
            "scale-more-than" => Self::ScaleMoreThan,
            "scale-less-than" => Self::ScaleLessThan,
            "organigram-selected" => Self::OrganigramSelected,
            "organigram-descendent-selected" => Self::OrganigramDescendentSelected,
            "matrix1d-rows-selected" => Self::Matrix1dRowsSelected,
            "matrix1d-cells-selected" => Self::Matrix1dCellsSelected,
            "matrix2d-rows-selected" => Self::Matrix2dRowsSelected,
            "matrix2d-sub-rows-selected" => Self::Matrix2dSubRowsSelected,
            "matrix2d-columns-selected" => Self::Matrix2dColumnsSelected,
            "matrix2d-sub-columns-selected" => Self::Matrix2dSubColumnsSelected,
            _ => return None,
        };
        Some(operator)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::NumberGreaterThan => "number-greater-than",
            Self::NumberLessThan => "number-less-than",
            Self::NumberEqualTo => "number-equal-to",
            Self::TextStartsWith => "text-starts-with",
            Self::TextEndsWith => "text-ends-with",
            Self::TextContains => "text-contains",
            Self::DateAfter => "date-after",
            Self::DateBefore => "date-before",
            Self::DateEqualTo => "date-equal-to",
            Self::TimeAfter => "time-after",
            Self::TimeBefore => "time-before",
            Self::TimeEqualTo => "time-equal-to",
            Self::DateRangeAfter => "date-range-after",
            Self::DateRangeBefore => "date-range-before",
            Self::DateRangeIncludes => "date-range-includes",
            Self::TimeRangeAfter => "time-range-after",
            Self::TimeRangeBefore => "time-range-before",
            Self::TimeRangeIncludes => "time-range-includes",
            Self::SingleSelectionSelected => "single-selection-selected",
            Self::MultiSelectionSelected => "multi-selection-selected",
            Self::ScaleSelected => "scale-selected",
            Self::ScaleMoreThan => "scale-more-than",
            Self::ScaleLessThan => "scale-less-than",
            Self::OrganigramSelected => "organigram-selected",
            Self::OrganigramDescendentSelected => "organigram-descendent-selected",
            Self::Matrix1dRowsSelected => "matrix1d-rows-selected",
            Self::Matrix1dCellsSelected => "matrix1d-cells-selected",
            Self::Matrix2dRowsSelected => "matrix2d-rows-selected",
            Self::Matrix2dSubRowsSelected => "matrix2d-sub-rows-selected",
            Self::Matrix2dColumnsSelected => "matrix2d-columns-selected",
            Self::Matrix2dSubColumnsSelected => "matrix2d-sub-columns-selected",
        }
    }

    /// Shape of the `value` payload this operator expects.
    pub fn payload(self) -> OperatorPayload {
        match self {
            Self::Empty => OperatorPayload::None,
            Self::NumberGreaterThan | Self::NumberLessThan | Self::NumberEqualTo => OperatorPayload::Number,
            Self::TextStartsWith
            | Self::TextEndsWith
            | Self::TextContains
            | Self::DateAfter
            | Self::DateBefore
            | Self::DateEqualTo
            | Self::TimeAfter
            | Self::TimeBefore
            | Self::TimeEqualTo
            | Self::DateRangeAfter
            | Self::DateRangeBefore
            | Self::DateRangeIncludes
            | Self::TimeRangeAfter
            | Self::TimeRangeBefore
            | Self::TimeRangeIncludes => OperatorPayload::Text,
            Self::ScaleMoreThan | Self::ScaleLessThan => OperatorPayload::Key,
            Self::SingleSelectionSelected
            | Self::MultiSelectionSelected
            | Self::ScaleSelected
            | Self::OrganigramSelected
            | Self::OrganigramDescendentSelected
            | Self::Matrix1dRowsSelected
            | Self::Matrix1dCellsSelected
            | Self::Matrix2dRowsSelected
            | Self::Matrix2dSubRowsSelected
            | Self::Matrix2dColumnsSelected
            | Self::Matrix2dSubColumnsSelected => OperatorPayload::KeySet,
        }
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload shapes accepted by condition operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorPayload {
    None,
    Number,
    Text,
    /// A single option key.
    Key,
    /// An array of option keys.
    KeySet,
}
