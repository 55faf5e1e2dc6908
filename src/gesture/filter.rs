use super::{
    config::DetectorConfig,
    types::{RejectReason, Vec3},
};

/// Exponential low-pass estimate of the gravity component.
///
/// Starts at zero, so the first few samples read as roughly 1 g of linear motion;
/// that stays well under any sane shake threshold.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GravityFilter {
    estimate: Vec3,
}

impl GravityFilter {
    pub const fn new() -> Self {
        Self {
            estimate: Vec3::ZERO,
        }
    }

    pub fn gravity(&self) -> Vec3 {
        self.estimate
    }

    /// Returns the linear acceleration of `raw` and folds `raw` into the estimate.
    ///
    /// The linear part is taken against the estimate as it stood before this sample,
    /// so a single jolt does not partially cancel itself.
    pub fn update(&mut self, raw: Vec3, alpha: f32) -> Vec3 {
        let linear = raw - self.estimate;
        let keep = alpha;
        let take = 1.0 - alpha;
        self.estimate = Vec3::new(
            keep * self.estimate.x + take * raw.x,
            keep * self.estimate.y + take * raw.y,
            keep * self.estimate.z + take * raw.z,
        );
        linear
    }
}

pub fn total_accel_g(linear: Vec3, gravity_earth: f32) -> f32 {
    linear.magnitude() / gravity_earth
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PulseAssessment {
    pub total_accel_g: f32,
    pub candidate: bool,
    pub reason: RejectReason,
}

pub fn assess_magnitude(total_accel_g: f32, cfg: &DetectorConfig) -> PulseAssessment {
    let candidate = total_accel_g > cfg.shake_threshold_g;
    PulseAssessment {
        total_accel_g,
        candidate,
        reason: if candidate {
            RejectReason::None
        } else {
            RejectReason::BelowThreshold
        },
    }
}

pub fn is_debounced(last_accepted_at_ms: Option<u64>, now_ms: u64, min_interval_ms: u64) -> bool {
    last_accepted_at_ms.is_some_and(|last| now_ms.saturating_sub(last) < min_interval_ms)
}
