use core::cmp::min;

use super::*;
use crate::gesture::{
    filter::{assess_magnitude, is_debounced, total_accel_g},
    running::RunningAssessment,
};

/// Axis readings beyond this many g are clamped before filtering.
const MAX_ABS_AXIS_G: f32 = 64.0;

#[derive(Clone, Copy, Debug, Default)]
pub(super) struct CandidateAssessment {
    pub(super) accepted: bool,
    pub(super) reason: RejectReason,
    pub(super) total_accel_g: f32,
    pub(super) running: RunningAssessment,
}

#[derive(Clone, Copy, Debug)]
pub(super) struct PulseState {
    pub(super) first_pulse_ms: u64,
    pub(super) last_pulse_ms: u64,
    pub(super) peak_g: f32,
}

impl DetectorHsm {
    pub(super) fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            gravity: GravityFilter::new(),
            running: RunningWindow::new(),
            last_sample_ms: None,
            last_accepted_at_ms: None,
            pulse: None,
            last_trace: DetectorTrace {
                state_id: DetectorStateId::Idle,
                ..DetectorTrace::default()
            },
        }
    }

    pub(super) fn window_ms(&self, now_ms: u64) -> u16 {
        let dt = self
            .pulse
            .map_or(0, |pulse| now_ms.saturating_sub(pulse.first_pulse_ms));
        min(dt, u16::MAX as u64) as u16
    }

    pub(super) fn window_expired(&self, now_ms: u64) -> bool {
        self.pulse.is_some_and(|pulse| {
            now_ms.saturating_sub(pulse.first_pulse_ms) > self.config.timing.time_window_ms
        })
    }

    pub(super) fn clear_pulse(&mut self) {
        self.pulse = None;
    }

    pub(super) fn start_pulse(&mut self, now_ms: u64, total_accel_g: f32) {
        self.pulse = Some(PulseState {
            first_pulse_ms: now_ms,
            last_pulse_ms: now_ms,
            peak_g: total_accel_g,
        });
    }

    pub(super) fn settle(&mut self, state_id: DetectorStateId) {
        self.last_trace.state_id = state_id;
    }

    pub(super) fn reject_with_reason(&mut self, reason: RejectReason) {
        self.last_trace.reject_reason = reason;
    }

    pub(super) fn push_reset(context: &mut DispatchContext, reason: RejectReason) {
        context.reset = Some(reason);
    }

    pub(super) fn clamp_axis(&self, value: f32) -> f32 {
        let limit = MAX_ABS_AXIS_G * self.config.gravity_earth;
        value.clamp(-limit, limit)
    }

    pub(super) fn update_control_trace(
        &mut self,
        state_id: DetectorStateId,
        now_ms: u64,
        reason: RejectReason,
    ) {
        self.last_trace = DetectorTrace {
            now_ms,
            state_id,
            reject_reason: reason,
            window_ms: self.window_ms(now_ms),
            ..DetectorTrace::default()
        };
    }

    pub(super) fn update_sample_trace(
        &mut self,
        state_id: DetectorStateId,
        now_ms: u64,
        candidate: bool,
        assessment: CandidateAssessment,
    ) {
        self.last_trace = DetectorTrace {
            now_ms,
            state_id,
            reject_reason: assessment.reason,
            total_accel_g: assessment.total_accel_g,
            candidate: if candidate { 1 } else { 0 },
            running_events: assessment.running.events,
            running_frequency_hz: assessment.running.frequency_hz,
            running_cv: assessment.running.cv,
            window_ms: self.window_ms(now_ms),
        };
    }

    /// Runs the filter and classifies the sample. Returns `None` for samples that are
    /// dropped without touching any state.
    pub(super) fn evaluate_sample(
        &mut self,
        state_id: DetectorStateId,
        sample: Sample,
    ) -> Option<CandidateAssessment> {
        let now_ms = sample.now_ms;
        let regressed = self.last_sample_ms.is_some_and(|last| now_ms < last);
        if regressed || !sample.accel.is_finite() {
            log::trace!(
                "gesture: dropped sample t={} regressed={} accel={:?}",
                now_ms,
                regressed,
                sample.accel
            );
            self.update_control_trace(state_id, now_ms, RejectReason::InvalidSample);
            return None;
        }
        self.last_sample_ms = Some(now_ms);

        let raw = Vec3::new(
            self.clamp_axis(sample.accel.x),
            self.clamp_axis(sample.accel.y),
            self.clamp_axis(sample.accel.z),
        );
        let linear = self.gravity.update(raw, self.config.gravity_filter_alpha);
        let magnitude = assess_magnitude(
            total_accel_g(linear, self.config.gravity_earth),
            &self.config,
        );

        self.running.trim(now_ms, self.config.running.window_ms);

        let mut assessment = CandidateAssessment {
            accepted: false,
            reason: magnitude.reason,
            total_accel_g: magnitude.total_accel_g,
            running: RunningAssessment::default(),
        };

        if magnitude.candidate {
            let _ = self.running.record(now_ms, &self.config.timing);
            assessment.running = self.running.assess(&self.config.running);

            if assessment.running.is_running() {
                assessment.reason = RejectReason::RunningMotion;
            } else if is_debounced(
                self.last_accepted_at_ms,
                now_ms,
                self.config.timing.min_interval_ms,
            ) {
                assessment.reason = RejectReason::Debounced;
            } else {
                assessment.accepted = true;
                self.last_accepted_at_ms = Some(now_ms);
            }
        } else {
            assessment.running = self.running.assess(&self.config.running);
        }

        if !assessment.accepted {
            log::trace!(
                "gesture: t={} g={:.2} rejected={}",
                now_ms,
                assessment.total_accel_g,
                assessment.reason.label()
            );
        }

        self.update_sample_trace(state_id, now_ms, magnitude.candidate, assessment);
        Some(assessment)
    }
}
