//! Swipe-to-dismiss drag and its snap-back animation.

use std::time::Duration;

/// Drag distance in density-independent pixels past which a release dismisses.
pub const DISMISS_THRESHOLD_DP: f32 = 100.0;
/// Pager scale reached at full dismiss progress.
pub const MIN_DISMISS_SCALE: f32 = 0.8;

const SPRING_DAMPING_RATIO: f32 = 0.5;
const SPRING_STIFFNESS: f32 = 1500.0;
const SPRING_POSITION_THRESHOLD: f32 = 0.01;
const SPRING_VELOCITY_THRESHOLD: f32 = 0.5;
const MAX_STEP_SECS: f32 = 1.0 / 240.0;

/// Damped spring pulling a value toward zero.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Spring {
    velocity: f32,
}

impl Spring {
    fn step(&mut self, value: f32, dt: f32) -> f32 {
        let omega = SPRING_STIFFNESS.sqrt();
        let accel = -SPRING_STIFFNESS * value - 2.0 * SPRING_DAMPING_RATIO * omega * self.velocity;
        self.velocity += accel * dt;
        value + self.velocity * dt
    }

    fn is_settled(&self, value: f32) -> bool {
        value.abs() < SPRING_POSITION_THRESHOLD && self.velocity.abs() < SPRING_VELOCITY_THRESHOLD
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Dismiss,
    SnapBack,
}

/// Vertical dismiss offset of the pager.
#[derive(Debug, Clone, PartialEq)]
pub struct DismissDrag {
    offset: f32,
    threshold_px: f32,
    snap_back: Option<Spring>,
}

impl DismissDrag {
    /// `density` converts [`DISMISS_THRESHOLD_DP`] into physical pixels.
    pub fn new(density: f32) -> Self {
        let density = if density.is_finite() && density > 0.0 { density } else { 1.0 };
        DismissDrag {
            offset: 0.0,
            threshold_px: DISMISS_THRESHOLD_DP * density,
            snap_back: None,
        }
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn threshold_px(&self) -> f32 {
        self.threshold_px
    }

    pub fn is_animating(&self) -> bool {
        self.snap_back.is_some()
    }

    /// Add a drag delta. Interrupts a running snap-back.
    pub fn drag_by(&mut self, dy: f32) -> bool {
        if !dy.is_finite() {
            return false;
        }
        self.snap_back = None;
        self.offset += dy;
        true
    }

    pub fn release(&mut self) -> ReleaseOutcome {
        if self.offset.abs() > self.threshold_px {
            ReleaseOutcome::Dismiss
        } else {
            self.cancel();
            ReleaseOutcome::SnapBack
        }
    }

    /// Start animating back to rest.
    pub fn cancel(&mut self) {
        if self.offset != 0.0 {
            self.snap_back = Some(Spring { velocity: 0.0 });
        }
    }

    /// Jump to rest without animating.
    pub fn reset(&mut self) {
        self.offset = 0.0;
        self.snap_back = None;
    }

    /// Advance the snap-back animation by `dt`.
    pub fn tick(&mut self, dt: Duration) {
        let Some(mut spring) = self.snap_back else {
            return;
        };
        let mut remaining = dt.as_secs_f32();
        while remaining > 0.0 {
            let step = remaining.min(MAX_STEP_SECS);
            self.offset = spring.step(self.offset, step);
            remaining -= step;
            if spring.is_settled(self.offset) {
                self.reset();
                return;
            }
        }
        self.snap_back = Some(spring);
    }

    /// 0 at rest, 1 at or beyond the threshold.
    pub fn progress(&self) -> f32 {
        (self.offset.abs() / self.threshold_px).min(1.0)
    }

    pub fn visual_scale(&self) -> f32 {
        1.0 - self.progress() * (1.0 - MIN_DISMISS_SCALE)
    }

    pub fn background_opacity(&self) -> f32 {
        1.0 - self.progress()
    }
}
