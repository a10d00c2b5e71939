use foundation::math::GeoPoint;

use crate::outline::LineSegmentBuffer;

/// One resolved selection and its renderable outline.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub name: String,
    pub point: GeoPoint,
    pub buffers: Vec<LineSegmentBuffer>,
}

/// The current selection, owned by the orchestrating layer.
///
/// A later click replaces the whole value; `replace` and `clear` hand the
/// retired buffers back so the host can dispose their GPU resources before
/// attaching the new ones. Nothing accumulates across repeated clicks.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    current: Option<Selection>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Selection> {
        self.current.as_ref()
    }

    /// Swaps in a new selection; returns the previous selection's buffers
    /// for disposal.
    pub fn replace(&mut self, selection: Selection) -> Vec<LineSegmentBuffer> {
        let retired = self.current.take().map(|s| s.buffers).unwrap_or_default();
        self.current = Some(selection);
        retired
    }

    /// Drops the selection (e.g. an ocean click); returns the retired
    /// buffers for disposal.
    pub fn clear(&mut self) -> Vec<LineSegmentBuffer> {
        self.current.take().map(|s| s.buffers).unwrap_or_default()
    }
}
