//! Gesture input for the viewer.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::geometry::{Offset, Size};

/// Receiver of recognized viewer gestures.
pub trait GestureHandler {
    fn on_tap(&mut self);
    fn on_double_tap(&mut self, point: Offset);
    /// Pinch or pan. `zoom` is multiplicative, `pan` is in pixels.
    fn on_transform(&mut self, zoom: f32, pan: Offset);
    fn on_vertical_drag(&mut self, dy: f32);
    fn on_drag_end(&mut self);
    fn on_drag_cancel(&mut self);
    fn on_page_changed(&mut self, index: usize);
    fn on_viewport_changed(&mut self, viewport: Size);
    fn on_close(&mut self);
    fn on_frame(&mut self, dt: Duration);
}

/// A gesture as it arrives over a line-oriented channel, e.g. one JSON object per line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GestureEvent {
    Tap,
    DoubleTap {
        x: f32,
        y: f32,
    },
    Transform {
        zoom: f32,
        #[serde(default)]
        pan_x: f32,
        #[serde(default)]
        pan_y: f32,
    },
    VerticalDrag {
        dy: f32,
    },
    DragEnd,
    DragCancel,
    PageChanged {
        index: usize,
    },
    Resize {
        width: f32,
        height: f32,
    },
    Close,
    Tick {
        dt_ms: u64,
    },
}

impl GestureEvent {
    pub fn dispatch<H: GestureHandler + ?Sized>(self, handler: &mut H) {
        match self {
            GestureEvent::Tap => handler.on_tap(),
            GestureEvent::DoubleTap { x, y } => handler.on_double_tap(Offset::new(x, y)),
            GestureEvent::Transform { zoom, pan_x, pan_y } => {
                handler.on_transform(zoom, Offset::new(pan_x, pan_y))
            }
            GestureEvent::VerticalDrag { dy } => handler.on_vertical_drag(dy),
            GestureEvent::DragEnd => handler.on_drag_end(),
            GestureEvent::DragCancel => handler.on_drag_cancel(),
            GestureEvent::PageChanged { index } => handler.on_page_changed(index),
            GestureEvent::Resize { width, height } => {
                handler.on_viewport_changed(Size::new(width, height))
            }
            GestureEvent::Close => handler.on_close(),
            GestureEvent::Tick { dt_ms } => handler.on_frame(Duration::from_millis(dt_ms)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Vec<String>);

    impl GestureHandler for Recorder {
        fn on_tap(&mut self) {
            self.0.push("tap".into());
        }
        fn on_double_tap(&mut self, point: Offset) {
            self.0.push(format!("double_tap {} {}", point.x, point.y));
        }
        fn on_transform(&mut self, zoom: f32, pan: Offset) {
            self.0.push(format!("transform {} {} {}", zoom, pan.x, pan.y));
        }
        fn on_vertical_drag(&mut self, dy: f32) {
            self.0.push(format!("drag {}", dy));
        }
        fn on_drag_end(&mut self) {
            self.0.push("drag_end".into());
        }
        fn on_drag_cancel(&mut self) {
            self.0.push("drag_cancel".into());
        }
        fn on_page_changed(&mut self, index: usize) {
            self.0.push(format!("page {}", index));
        }
        fn on_viewport_changed(&mut self, viewport: Size) {
            self.0.push(format!("resize {}x{}", viewport.width, viewport.height));
        }
        fn on_close(&mut self) {
            self.0.push("close".into());
        }
        fn on_frame(&mut self, dt: Duration) {
            self.0.push(format!("frame {}", dt.as_millis()));
        }
    }

    #[test]
    fn test_parse_and_dispatch_lines() {
        let lines = [
            r#"{"type":"tap"}"#,
            r#"{"type":"double_tap","x":10,"y":20}"#,
            r#"{"type":"transform","zoom":1.5}"#,
            r#"{"type":"vertical_drag","dy":-30}"#,
            r#"{"type":"page_changed","index":3}"#,
            r#"{"type":"tick","dt_ms":16}"#,
            r#"{"type":"resize","width":720,"height":1280}"#,
            r#"{"type":"close"}"#,
        ];
        let mut recorder = Recorder::default();
        for line in lines {
            let event: GestureEvent = serde_json::from_str(line).unwrap();
            event.dispatch(&mut recorder);
        }
        assert_eq!(
            recorder.0,
            vec![
                "tap",
                "double_tap 10 20",
                "transform 1.5 0 0",
                "drag -30",
                "page 3",
                "frame 16",
                "resize 720x1280",
                "close",
            ]
        );
    }

    #[test]
    fn test_unknown_gesture_rejected() {
        assert!(serde_json::from_str::<GestureEvent>(r#"{"type":"rotate"}"#).is_err());
    }
}
