//! Full-screen paged viewer state machine.

use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::dismiss::{DismissDrag, ReleaseOutcome};
use crate::geometry::{Offset, Size};
use crate::gesture::GestureHandler;
use crate::transform::{PageTransform, MIN_ZOOM};
use crate::ViewerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ViewerEvent {
    PageChanged { index: usize },
    OverlayToggled { visible: bool },
    Dismissed { index: usize },
    Closed { index: usize },
}

/// Everything the renderer needs to draw one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewerFrame {
    pub page_index: usize,
    pub scale: f32,
    pub translation_x: f32,
    pub translation_y: f32,
    pub pager_scale: f32,
    pub pager_offset_y: f32,
    pub background_opacity: f32,
    pub overlay_visible: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerSession {
    page_count: usize,
    active_index: usize,
    transform: PageTransform,
    dismiss: DismissDrag,
    overlay_visible: bool,
    viewport: Size,
}

impl ViewerSession {
    fn new(initial_index: usize, page_count: usize, viewport: Size, density: f32) -> Self {
        ViewerSession {
            page_count,
            active_index: initial_index.min(page_count - 1),
            transform: PageTransform::IDENTITY,
            dismiss: DismissDrag::new(density),
            overlay_visible: true,
            viewport,
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn transform(&self) -> PageTransform {
        self.transform
    }

    pub fn dismiss(&self) -> &DismissDrag {
        &self.dismiss
    }

    pub fn overlay_visible(&self) -> bool {
        self.overlay_visible
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Dismiss drags only start from an unzoomed page.
    fn dismiss_enabled(&self) -> bool {
        self.transform.scale == MIN_ZOOM
    }

    /// A zoom that interrupts a dismiss drag sends the pager back to rest.
    fn snap_back_if_zoomed(&mut self) {
        if self.transform.is_zoomed() && !self.dismiss.is_animating() {
            self.dismiss.cancel();
        }
    }

    fn frame(&self) -> ViewerFrame {
        ViewerFrame {
            page_index: self.active_index,
            scale: self.transform.scale,
            translation_x: self.transform.translation.x,
            translation_y: self.transform.translation.y,
            pager_scale: self.dismiss.visual_scale(),
            pager_offset_y: self.dismiss.offset(),
            background_opacity: self.dismiss.background_opacity(),
            overlay_visible: self.overlay_visible,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ViewerState {
    #[default]
    Hidden,
    Viewing(ViewerSession),
}

/// Drives a [`ViewerSession`] from gesture input.
///
/// Owned by the UI loop. Every gesture received while hidden is ignored.
pub struct ViewerController {
    state: ViewerState,
    density: f32,
    subscribers: Vec<mpsc::UnboundedSender<ViewerEvent>>,
}

impl ViewerController {
    pub fn new(density: f32) -> Self {
        ViewerController {
            state: ViewerState::Hidden,
            density,
            subscribers: Vec::new(),
        }
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn session(&self) -> Option<&ViewerSession> {
        match &self.state {
            ViewerState::Viewing(session) => Some(session),
            ViewerState::Hidden => None,
        }
    }

    pub fn is_viewing(&self) -> bool {
        self.session().is_some()
    }

    /// Receive every event emitted after this call.
    pub fn events(&mut self) -> mpsc::UnboundedReceiver<ViewerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    fn emit(&mut self, event: ViewerEvent) {
        tracing::debug!(?event, "Viewer event");
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }

    fn session_mut(&mut self) -> Option<&mut ViewerSession> {
        match &mut self.state {
            ViewerState::Viewing(session) => Some(session),
            ViewerState::Hidden => None,
        }
    }

    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    pub fn open(
        &mut self,
        initial_index: usize,
        page_count: usize,
        viewport: Size,
    ) -> Result<(), ViewerError> {
        if page_count == 0 {
            return Err(ViewerError::NoPages);
        }
        if !viewport.is_valid() {
            return Err(ViewerError::InvalidViewport(format!(
                "{}x{}",
                viewport.width, viewport.height
            )));
        }
        if initial_index >= page_count {
            tracing::debug!(initial_index, page_count, "Clamping initial page index");
        }
        let session = ViewerSession::new(initial_index, page_count, viewport, self.density);
        tracing::info!(index = session.active_index, page_count, "Viewer opened");
        self.state = ViewerState::Viewing(session);
        Ok(())
    }

    /// Hide immediately and drop the session.
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    pub fn close(&mut self) {
        if let ViewerState::Viewing(session) = std::mem::take(&mut self.state) {
            tracing::info!(index = session.active_index, "Viewer closed");
            self.emit(ViewerEvent::Closed {
                index: session.active_index,
            });
        }
    }

    /// Pager swipes are disabled while the page is zoomed in.
    pub fn paging_enabled(&self) -> bool {
        self.session()
            .map(|s| !s.transform.is_zoomed())
            .unwrap_or(false)
    }

    pub fn frame(&self) -> Option<ViewerFrame> {
        self.session().map(ViewerSession::frame)
    }

    pub fn tick(&mut self, dt: Duration) {
        if let Some(session) = self.session_mut() {
            session.dismiss.tick(dt);
        }
    }
}

impl GestureHandler for ViewerController {
    fn on_tap(&mut self) {
        let Some(session) = self.session_mut() else {
            return;
        };
        session.overlay_visible = !session.overlay_visible;
        let visible = session.overlay_visible;
        self.emit(ViewerEvent::OverlayToggled { visible });
    }

    fn on_double_tap(&mut self, point: Offset) {
        let Some(session) = self.session_mut() else {
            return;
        };
        let viewport = session.viewport;
        if !session.transform.toggle_double_tap(point, viewport) {
            tracing::warn!(?point, "Ignoring non-finite double tap");
            return;
        }
        session.snap_back_if_zoomed();
    }

    fn on_transform(&mut self, zoom: f32, pan: Offset) {
        let Some(session) = self.session_mut() else {
            return;
        };
        let viewport = session.viewport;
        if !session.transform.apply_pinch(zoom, pan, viewport) {
            tracing::warn!(zoom, ?pan, "Ignoring non-finite transform");
            return;
        }
        session.snap_back_if_zoomed();
    }

    fn on_vertical_drag(&mut self, dy: f32) {
        let Some(session) = self.session_mut() else {
            return;
        };
        if !dy.is_finite() {
            tracing::warn!(dy, "Ignoring non-finite drag");
            return;
        }
        if session.dismiss_enabled() {
            session.dismiss.drag_by(dy);
        } else {
            let viewport = session.viewport;
            session
                .transform
                .apply_pinch(1.0, Offset::new(0.0, dy), viewport);
        }
    }

    fn on_drag_end(&mut self) {
        let Some(session) = self.session_mut() else {
            return;
        };
        if !session.dismiss_enabled() {
            session.snap_back_if_zoomed();
            return;
        }
        let index = session.active_index;
        if session.dismiss.release() == ReleaseOutcome::Dismiss {
            tracing::info!(index, "Viewer dismissed by drag");
            self.state = ViewerState::Hidden;
            self.emit(ViewerEvent::Dismissed { index });
        }
    }

    fn on_drag_cancel(&mut self) {
        if let Some(session) = self.session_mut() {
            session.dismiss.cancel();
        }
    }

    fn on_page_changed(&mut self, index: usize) {
        let Some(session) = self.session_mut() else {
            return;
        };
        let clamped = index.min(session.page_count - 1);
        if clamped != index {
            tracing::debug!(index, clamped, "Clamping page index");
        }
        if clamped == session.active_index {
            return;
        }
        session.active_index = clamped;
        session.transform = PageTransform::IDENTITY;
        session.dismiss.reset();
        self.emit(ViewerEvent::PageChanged { index: clamped });
    }

    fn on_viewport_changed(&mut self, viewport: Size) {
        if !viewport.is_valid() {
            tracing::warn!(?viewport, "Ignoring invalid viewport");
            return;
        }
        if let Some(session) = self.session_mut() {
            session.viewport = viewport;
            session.transform.fit_to(viewport);
        }
    }

    fn on_close(&mut self) {
        self.close();
    }

    fn on_frame(&mut self, dt: Duration) {
        self.tick(dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Size = Size {
        width: 1080.0,
        height: 1920.0,
    };

    fn viewing(index: usize, count: usize) -> ViewerController {
        let mut controller = ViewerController::new(1.0);
        controller.open(index, count, VIEWPORT).unwrap();
        controller
    }

    #[test]
    fn test_open_with_no_pages_stays_hidden() {
        let mut controller = ViewerController::new(1.0);
        assert_eq!(controller.open(0, 0, VIEWPORT), Err(ViewerError::NoPages));
        assert_eq!(controller.state(), &ViewerState::Hidden);
        assert!(controller.frame().is_none());
    }

    #[test]
    fn test_open_clamps_initial_index() {
        let controller = viewing(9, 3);
        assert_eq!(controller.session().unwrap().active_index(), 2);
    }

    #[test]
    fn test_open_rejects_bad_viewport() {
        let mut controller = ViewerController::new(1.0);
        let err = controller
            .open(0, 1, Size::new(f32::NAN, 10.0))
            .unwrap_err();
        assert!(matches!(err, ViewerError::InvalidViewport(_)));
        assert!(!controller.is_viewing());
    }

    #[test]
    fn test_gestures_ignored_while_hidden() {
        let mut controller = ViewerController::new(1.0);
        controller.on_tap();
        controller.on_transform(3.0, Offset::ZERO);
        controller.on_vertical_drag(500.0);
        controller.on_drag_end();
        controller.on_page_changed(4);
        assert_eq!(controller.state(), &ViewerState::Hidden);
    }

    #[test]
    fn test_same_page_keeps_zoom() {
        let mut controller = viewing(1, 3);
        controller.on_transform(2.0, Offset::ZERO);
        controller.on_page_changed(1);
        assert_eq!(controller.frame().unwrap().scale, 2.0);
    }

    #[test]
    fn test_page_change_clamps_out_of_range() {
        let mut controller = viewing(0, 3);
        controller.on_page_changed(42);
        assert_eq!(controller.frame().unwrap().page_index, 2);
    }

    #[test]
    fn test_paging_disabled_while_zoomed() {
        let mut controller = viewing(0, 2);
        assert!(controller.paging_enabled());
        controller.on_double_tap(VIEWPORT.center());
        assert!(!controller.paging_enabled());
        controller.on_double_tap(VIEWPORT.center());
        assert!(controller.paging_enabled());
    }

    #[test]
    fn test_viewport_change_reclamps_translation() {
        let mut controller = viewing(0, 1);
        controller.on_transform(2.0, Offset::new(540.0, 0.0));
        controller.on_viewport_changed(Size::new(500.0, 1920.0));
        assert_eq!(controller.frame().unwrap().translation_x, 250.0);
    }
}
