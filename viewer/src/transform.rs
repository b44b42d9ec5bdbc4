//! Zoom and pan transform of a single page.

use serde::Serialize;

use crate::geometry::{Offset, Size};

pub const MIN_ZOOM: f32 = 1.0;
pub const MAX_ZOOM: f32 = 5.0;
pub const DOUBLE_TAP_ZOOM: f32 = 2.0;

/// Largest translation per axis that keeps content edges inside the viewport.
pub fn max_offset(scale: f32, viewport: Size) -> Offset {
    Offset::new(
        ((viewport.width * scale - viewport.width) / 2.0).max(0.0),
        ((viewport.height * scale - viewport.height) / 2.0).max(0.0),
    )
}

pub fn clamp_offset(raw: Offset, scale: f32, viewport: Size) -> Offset {
    let max = max_offset(scale, viewport);
    Offset::new(raw.x.clamp(-max.x, max.x), raw.y.clamp(-max.y, max.y))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageTransform {
    pub scale: f32,
    pub translation: Offset,
}

impl Default for PageTransform {
    fn default() -> Self {
        PageTransform::IDENTITY
    }
}

impl PageTransform {
    pub const IDENTITY: PageTransform = PageTransform {
        scale: MIN_ZOOM,
        translation: Offset::ZERO,
    };

    pub fn is_zoomed(&self) -> bool {
        self.scale > MIN_ZOOM
    }

    /// Pinch/pan update. Returns false when the input was rejected.
    ///
    /// The existing translation is scaled with the zoom so the focus stays put,
    /// then the pan is added and the result clamped. Back at 1x the
    /// translation snaps to zero.
    pub fn apply_pinch(&mut self, zoom_delta: f32, pan_delta: Offset, viewport: Size) -> bool {
        if !zoom_delta.is_finite() || !pan_delta.is_finite() {
            return false;
        }
        let old = self.scale;
        let new = (old * zoom_delta).clamp(MIN_ZOOM, MAX_ZOOM);
        self.translation = if new > MIN_ZOOM {
            clamp_offset(self.translation * (new / old) + pan_delta, new, viewport)
        } else {
            Offset::ZERO
        };
        self.scale = new;
        true
    }

    /// Double tap toggles between 1x and [`DOUBLE_TAP_ZOOM`] around `point`.
    pub fn toggle_double_tap(&mut self, point: Offset, viewport: Size) -> bool {
        if !point.is_finite() {
            return false;
        }
        if self.is_zoomed() {
            *self = PageTransform::IDENTITY;
        } else {
            let raw = (viewport.center() - point) * (DOUBLE_TAP_ZOOM - 1.0);
            self.scale = DOUBLE_TAP_ZOOM;
            self.translation = clamp_offset(raw, DOUBLE_TAP_ZOOM, viewport);
        }
        true
    }

    /// Re-clamp after the viewport changed size.
    pub fn fit_to(&mut self, viewport: Size) {
        self.translation = clamp_offset(self.translation, self.scale, viewport);
    }
}
