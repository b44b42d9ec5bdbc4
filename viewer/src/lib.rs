//! Full-screen paged viewer for the photos app.
//!
//! Pure gesture and transform state. Rendering reads a [`ViewerFrame`]
//! after each input and never writes back.

mod controller;
mod dismiss;
mod geometry;
mod gesture;
mod overlay;
mod transform;

pub use controller::{ViewerController, ViewerEvent, ViewerFrame, ViewerSession, ViewerState};
pub use dismiss::{DismissDrag, ReleaseOutcome, DISMISS_THRESHOLD_DP, MIN_DISMISS_SCALE};
pub use geometry::{Offset, Size};
pub use gesture::{GestureEvent, GestureHandler};
pub use overlay::MetadataOverlay;
pub use transform::{clamp_offset, max_offset, PageTransform, DOUBLE_TAP_ZOOM, MAX_ZOOM, MIN_ZOOM};

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ViewerError {
    #[error("Cannot open the viewer without pages")]
    NoPages,
    #[error("Invalid viewport: {0}")]
    InvalidViewport(String),
}
