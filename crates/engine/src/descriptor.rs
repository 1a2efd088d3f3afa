//! Static widget type registry.
//!
//! [`describe`] answers three questions about a widget kind: what value shape it produces,
//! which condition operators may reference it, and what its default value is. Unknown kinds
//! resolve to [`UNSUPPORTED`] so callers always get a descriptor back.

use deep_types::{ConditionOperator as Op, Widget, WidgetKind, WidgetValue};

use crate::codec;

/// Shape of the value a widget kind produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Number,
    Date,
    Time,
    DateRange,
    TimeRange,
    /// A single option key.
    OptionKey,
    /// A list of option keys.
    OptionKeys,
    /// Selected organigram node keys.
    NodeKeys,
    /// Selected geo area ids.
    GeoAreaIds,
    Matrix1dCells,
    Matrix2dCells,
    Unsupported,
}

/// Static description of a widget kind.
#[derive(Debug, PartialEq, Eq)]
pub struct WidgetDescriptor {
    pub value_kind: ValueKind,
    pub supported_operators: &'static [Op],
}

impl WidgetDescriptor {
    pub fn is_supported(&self) -> bool {
        self.value_kind != ValueKind::Unsupported
    }

    pub fn supports(&self, operator: Op) -> bool {
        self.supported_operators.contains(&operator)
    }

    /// Default value configured on the widget, decoded for its kind.
    ///
    /// Unsupported kinds and malformed defaults yield `None`.
    pub fn default_value_for(&self, widget: &Widget) -> Option<WidgetValue> {
        if !self.is_supported() {
            return None;
        }
        let default_value = widget.default_value_json()?;
        codec::decode_value(&widget.kind, default_value)
    }
}

pub const TEXT: WidgetDescriptor = WidgetDescriptor {
    value_kind: ValueKind::Text,
    supported_operators: &[Op::Empty, Op::TextStartsWith, Op::TextEndsWith, Op::TextContains],
};

pub const NUMBER: WidgetDescriptor = WidgetDescriptor {
    value_kind: ValueKind::Number,
    supported_operators: &[Op::Empty, Op::NumberGreaterThan, Op::NumberLessThan, Op::NumberEqualTo],
};

pub const DATE: WidgetDescriptor = WidgetDescriptor {
    value_kind: ValueKind::Date,
    supported_operators: &[Op::Empty, Op::DateAfter, Op::DateBefore, Op::DateEqualTo],
};

pub const TIME: WidgetDescriptor = WidgetDescriptor {
    value_kind: ValueKind::Time,
    supported_operators: &[Op::Empty, Op::TimeAfter, Op::TimeBefore, Op::TimeEqualTo],
};

pub const DATE_RANGE: WidgetDescriptor = WidgetDescriptor {
    value_kind: ValueKind::DateRange,
    supported_operators: &[Op::Empty, Op::DateRangeAfter, Op::DateRangeBefore, Op::DateRangeIncludes],
};

pub const TIME_RANGE: WidgetDescriptor = WidgetDescriptor {
    value_kind: ValueKind::TimeRange,
    supported_operators: &[Op::Empty, Op::TimeRangeAfter, Op::TimeRangeBefore, Op::TimeRangeIncludes],
};

pub const SCALE: WidgetDescriptor = WidgetDescriptor {
    value_kind: ValueKind::OptionKey,
    supported_operators: &[Op::Empty, Op::ScaleSelected, Op::ScaleMoreThan, Op::ScaleLessThan],
};

pub const SINGLE_SELECT: WidgetDescriptor = WidgetDescriptor {
    value_kind: ValueKind::OptionKey,
    supported_operators: &[Op::Empty, Op::SingleSelectionSelected],
};

pub const MULTI_SELECT: WidgetDescriptor = WidgetDescriptor {
    value_kind: ValueKind::OptionKeys,
    supported_operators: &[Op::Empty, Op::MultiSelectionSelected],
};

pub const GEO_LOCATION: WidgetDescriptor = WidgetDescriptor {
    value_kind: ValueKind::GeoAreaIds,
    supported_operators: &[Op::Empty],
};

pub const ORGANIGRAM: WidgetDescriptor = WidgetDescriptor {
    value_kind: ValueKind::NodeKeys,
    supported_operators: &[Op::Empty, Op::OrganigramSelected, Op::OrganigramDescendentSelected],
};

pub const MATRIX1D: WidgetDescriptor = WidgetDescriptor {
    value_kind: ValueKind::Matrix1dCells,
    supported_operators: &[Op::Empty, Op::Matrix1dRowsSelected, Op::Matrix1dCellsSelected],
};

pub const MATRIX2D: WidgetDescriptor = WidgetDescriptor {
    value_kind: ValueKind::Matrix2dCells,
    supported_operators: &[
        Op::Empty,
        Op::Matrix2dRowsSelected,
        Op::Matrix2dSubRowsSelected,
        Op::Matrix2dColumnsSelected,
        Op::Matrix2dSubColumnsSelected,
    ],
};

pub const UNSUPPORTED: WidgetDescriptor = WidgetDescriptor {
    value_kind: ValueKind::Unsupported,
    supported_operators: &[],
};

/// Looks up the descriptor for a widget kind.
pub fn describe(kind: &WidgetKind) -> &'static WidgetDescriptor {
    match kind {
        WidgetKind::Text => &TEXT,
        WidgetKind::Number => &NUMBER,
        WidgetKind::Date => &DATE,
        WidgetKind::Time => &TIME,
        WidgetKind::DateRange => &DATE_RANGE,
        WidgetKind::TimeRange => &TIME_RANGE,
        WidgetKind::Scale => &SCALE,
        WidgetKind::SingleSelect => &SINGLE_SELECT,
        WidgetKind::MultiSelect => &MULTI_SELECT,
        WidgetKind::GeoLocation => &GEO_LOCATION,
        WidgetKind::Organigram => &ORGANIGRAM,
        WidgetKind::Matrix1d => &MATRIX1D,
        WidgetKind::Matrix2d => &MATRIX2D,
        WidgetKind::Unsupported(_) => &UNSUPPORTED,
    }
}
