use super::types::{DetectorStateId, RejectReason};

/// Per-sample snapshot of what the detector saw and decided.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DetectorTrace {
    pub now_ms: u64,
    pub state_id: DetectorStateId,
    pub reject_reason: RejectReason,
    pub total_accel_g: f32,
    pub candidate: u8,
    pub running_events: u16,
    pub running_frequency_hz: f32,
    pub running_cv: f32,
    pub window_ms: u16,
}
