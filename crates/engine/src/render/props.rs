use deep_types::{Attribute, FormError, Widget, WidgetValue};
use tracing::warn;

use super::{RenderMode, RendererKind, RendererResolution, resolve_renderer};
use crate::codec;

/// Props handed to a concrete renderer.
///
/// `name` is always the widget's client id. Renderers report edits through [`RenderProps::change`],
/// which forwards that name unchanged no matter how deeply the control is nested.
pub struct RenderProps<'a> {
    pub name: &'a str,
    pub value: Option<WidgetValue>,
    /// Error scoped to this widget's subtree.
    pub error: Option<&'a FormError>,
    pub disabled: bool,
    pub read_only: bool,
    pub widget: &'a Widget,
    on_change: &'a mut dyn FnMut(Option<WidgetValue>, &str),
}

impl RenderProps<'_> {
    /// Reports a new value. `None` clears the attribute.
    pub fn change(&mut self, value: Option<WidgetValue>) {
        (self.on_change)(value, self.name);
    }

    /// Reports the current range with start and end exchanged.
    ///
    /// Returns `false` without calling back when the value is not a range.
    pub fn swap_range(&mut self) -> bool {
        let swapped = match &self.value {
            Some(WidgetValue::DateRange(range)) => WidgetValue::DateRange(range.swapped()),
            Some(WidgetValue::TimeRange(range)) => WidgetValue::TimeRange(range.swapped()),
            _ => return false,
        };
        self.change(Some(swapped));
        true
    }
}

/// Dispatches one widget to its renderer and assembles props for it.
pub struct AttributeRenderer<'a> {
    widget: &'a Widget,
    attribute: Option<&'a Attribute>,
    mode: RenderMode,
    resolution: RendererResolution,
}

impl<'a> AttributeRenderer<'a> {
    /// An attribute recorded under a different kind than the widget renders as unsupported.
    pub fn new(widget: &'a Widget, attribute: Option<&'a Attribute>, mode: RenderMode) -> Self {
        let resolution = match attribute {
            Some(attribute) if attribute.widget_type != widget.kind => {
                warn!(
                    widget = %widget.client_id,
                    widget_kind = %widget.kind,
                    attribute_kind = %attribute.widget_type,
                    "attribute kind does not match widget kind"
                );
                RendererResolution {
                    renderer: RendererKind::Unsupported,
                    disabled_fallback: false,
                }
            }
            _ => resolve_renderer(&widget.kind, mode),
        };
        Self {
            widget,
            attribute,
            mode,
            resolution,
        }
    }

    pub fn resolution(&self) -> RendererResolution {
        self.resolution
    }

    pub fn widget(&self) -> &'a Widget {
        self.widget
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Decoded value of the attribute, `None` when unset or unrenderable.
    pub fn value(&self) -> Option<WidgetValue> {
        if self.resolution.renderer == RendererKind::Unsupported {
            return None;
        }
        let attribute = self.attribute?;
        codec::to_input_value(&self.widget.kind, attribute.data.as_ref())
    }

    /// Whether the renderer accepts edits once `disabled` is applied.
    pub fn is_interactive(&self, disabled: bool) -> bool {
        !disabled
            && !self.resolution.disabled_fallback
            && self.mode != RenderMode::ReadOnly
            && self.resolution.renderer != RendererKind::Unsupported
            && !self.resolution.renderer.is_output()
    }

    pub fn props<'p>(
        &'p self,
        error: Option<&'p FormError>,
        disabled: bool,
        on_change: &'p mut dyn FnMut(Option<WidgetValue>, &str),
    ) -> RenderProps<'p> {
        RenderProps {
            name: self.widget.client_id.as_str(),
            value: self.value(),
            error,
            disabled: disabled || self.resolution.disabled_fallback || self.resolution.renderer == RendererKind::Unsupported,
            read_only: self.mode == RenderMode::ReadOnly,
            widget: self.widget,
            on_change,
        }
    }
}
