//! Renderer dispatch.
//!
//! A static table maps `(widget kind, mode)` to a concrete renderer. Modes without a dedicated
//! renderer for a kind fall back to the edit renderer with interaction disabled, and unknown
//! kinds map to [`RendererKind::Unsupported`], so every widget renders as something.

mod display;
mod props;

use std::{fmt, str::FromStr};

use deep_types::WidgetKind;
use serde::{Deserialize, Serialize};

pub use display::{RenderedAttribute, display_value, render_attribute};
pub use props::{AttributeRenderer, RenderProps};

/// Where an attribute is being drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderMode {
    /// Full tagging form.
    #[default]
    Edit,
    /// Dense grid used by the entry list.
    Compact,
    /// Output-only view, e.g. entry review.
    ReadOnly,
}

impl RenderMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::Compact => "compact",
            Self::ReadOnly => "read-only",
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRenderModeError(pub String);

impl fmt::Display for ParseRenderModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown render mode '{}'; expected edit, compact or read-only", self.0)
    }
}

impl std::error::Error for ParseRenderModeError {}

impl FromStr for RenderMode {
    type Err = ParseRenderModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "edit" => Ok(Self::Edit),
            "compact" => Ok(Self::Compact),
            "read-only" | "readonly" | "read_only" => Ok(Self::ReadOnly),
            _ => Err(ParseRenderModeError(s.to_string())),
        }
    }
}

/// Concrete renderer components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RendererKind {
    TextInput,
    NumberInput,
    DateInput,
    TimeInput,
    DateRangeInput,
    TimeRangeInput,
    ScaleInput,
    SingleSelectInput,
    MultiSelectInput,
    GeoLocationInput,
    OrganigramInput,
    Matrix1dInput,
    Matrix2dInput,
    CompactMatrix1d,
    CompactMatrix2d,
    CompactGeoLocation,
    TextOutput,
    NumberOutput,
    DateOutput,
    TimeOutput,
    DateRangeOutput,
    TimeRangeOutput,
    ScaleOutput,
    SingleSelectOutput,
    MultiSelectOutput,
    /// Placeholder for kinds the engine cannot draw.
    Unsupported,
}

impl RendererKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TextInput => "text-input",
            Self::NumberInput => "number-input",
            Self::DateInput => "date-input",
            Self::TimeInput => "time-input",
            Self::DateRangeInput => "date-range-input",
            Self::TimeRangeInput => "time-range-input",
            Self::ScaleInput => "scale-input",
            Self::SingleSelectInput => "single-select-input",
            Self::MultiSelectInput => "multi-select-input",
            Self::GeoLocationInput => "geo-location-input",
            Self::OrganigramInput => "organigram-input",
            Self::Matrix1dInput => "matrix1d-input",
            Self::Matrix2dInput => "matrix2d-input",
            Self::CompactMatrix1d => "compact-matrix1d",
            Self::CompactMatrix2d => "compact-matrix2d",
            Self::CompactGeoLocation => "compact-geo-location",
            Self::TextOutput => "text-output",
            Self::NumberOutput => "number-output",
            Self::DateOutput => "date-output",
            Self::TimeOutput => "time-output",
            Self::DateRangeOutput => "date-range-output",
            Self::TimeRangeOutput => "time-range-output",
            Self::ScaleOutput => "scale-output",
            Self::SingleSelectOutput => "single-select-output",
            Self::MultiSelectOutput => "multi-select-output",
            Self::Unsupported => "unsupported",
        }
    }

    /// Output renderers never accept edits.
    pub fn is_output(self) -> bool {
        matches!(
            self,
            Self::TextOutput
                | Self::NumberOutput
                | Self::DateOutput
                | Self::TimeOutput
                | Self::DateRangeOutput
                | Self::TimeRangeOutput
                | Self::ScaleOutput
                | Self::SingleSelectOutput
                | Self::MultiSelectOutput
        )
    }
}

impl fmt::Display for RendererKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of renderer dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RendererResolution {
    pub renderer: RendererKind,
    /// True when the mode had no dedicated renderer and the edit renderer is used read-only.
    pub disabled_fallback: bool,
}

/// Picks the renderer for a widget kind in a mode.
pub fn resolve_renderer(kind: &WidgetKind, mode: RenderMode) -> RendererResolution {
    if let Some(renderer) = table_entry(kind, mode) {
        return RendererResolution {
            renderer,
            disabled_fallback: false,
        };
    }
    match table_entry(kind, RenderMode::Edit) {
        Some(renderer) => RendererResolution {
            renderer,
            disabled_fallback: true,
        },
        None => RendererResolution {
            renderer: RendererKind::Unsupported,
            disabled_fallback: false,
        },
    }
}

fn table_entry(kind: &WidgetKind, mode: RenderMode) -> Option<RendererKind> {
    use RendererKind as R;

    let renderer = match (mode, kind) {
        (RenderMode::Edit | RenderMode::Compact, WidgetKind::Text) => R::TextInput,
        (RenderMode::Edit | RenderMode::Compact, WidgetKind::Number) => R::NumberInput,
        (RenderMode::Edit | RenderMode::Compact, WidgetKind::Date) => R::DateInput,
        (RenderMode::Edit | RenderMode::Compact, WidgetKind::Time) => R::TimeInput,
        (RenderMode::Edit | RenderMode::Compact, WidgetKind::DateRange) => R::DateRangeInput,
        (RenderMode::Edit | RenderMode::Compact, WidgetKind::TimeRange) => R::TimeRangeInput,
        (RenderMode::Edit | RenderMode::Compact, WidgetKind::Scale) => R::ScaleInput,
        (RenderMode::Edit | RenderMode::Compact, WidgetKind::SingleSelect) => R::SingleSelectInput,
        (RenderMode::Edit | RenderMode::Compact, WidgetKind::MultiSelect) => R::MultiSelectInput,
        (RenderMode::Edit | RenderMode::Compact, WidgetKind::Organigram) => R::OrganigramInput,
        (RenderMode::Edit, WidgetKind::GeoLocation) => R::GeoLocationInput,
        (RenderMode::Edit, WidgetKind::Matrix1d) => R::Matrix1dInput,
        (RenderMode::Edit, WidgetKind::Matrix2d) => R::Matrix2dInput,
        (RenderMode::Compact, WidgetKind::GeoLocation) => R::CompactGeoLocation,
        (RenderMode::Compact, WidgetKind::Matrix1d) => R::CompactMatrix1d,
        (RenderMode::Compact, WidgetKind::Matrix2d) => R::CompactMatrix2d,
        (RenderMode::ReadOnly, WidgetKind::Text) => R::TextOutput,
        (RenderMode::ReadOnly, WidgetKind::Number) => R::NumberOutput,
        (RenderMode::ReadOnly, WidgetKind::Date) => R::DateOutput,
        (RenderMode::ReadOnly, WidgetKind::Time) => R::TimeOutput,
        (RenderMode::ReadOnly, WidgetKind::DateRange) => R::DateRangeOutput,
        (RenderMode::ReadOnly, WidgetKind::TimeRange) => R::TimeRangeOutput,
        (RenderMode::ReadOnly, WidgetKind::Scale) => R::ScaleOutput,
        (RenderMode::ReadOnly, WidgetKind::SingleSelect) => R::SingleSelectOutput,
        (RenderMode::ReadOnly, WidgetKind::MultiSelect) => R::MultiSelectOutput,
        _ => return None,
    };
    Some(renderer)
}
