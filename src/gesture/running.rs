use heapless::Deque;

use super::config::{PulseTimingConfig, RunningSuppressionConfig};

pub const RUNNING_WINDOW_CAPACITY: usize = 64;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RunningAssessment {
    pub events: u16,
    pub frequency_hz: f32,
    pub cv: f32,
    pub gait_frequency: bool,
    pub regular: bool,
}

impl RunningAssessment {
    pub fn is_running(&self) -> bool {
        self.gait_frequency && self.regular
    }
}

/// Trailing history of candidate-pulse timestamps used to spot gait-like cadence.
///
/// Candidates closer than the debounce interval to the newest entry belong to the same
/// physical jolt and are not recorded twice. When full, the oldest entry is dropped.
#[derive(Clone, Debug, Default)]
pub struct RunningWindow {
    pulses: Deque<u64, RUNNING_WINDOW_CAPACITY>,
}

impl RunningWindow {
    pub const fn new() -> Self {
        Self {
            pulses: Deque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.pulses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pulses.is_empty()
    }

    pub fn clear(&mut self) {
        self.pulses.clear();
    }

    pub fn trim(&mut self, now_ms: u64, window_ms: u64) {
        while let Some(&oldest) = self.pulses.front() {
            if now_ms.saturating_sub(oldest) <= window_ms {
                break;
            }
            let _ = self.pulses.pop_front();
        }
    }

    /// Returns `true` when `now_ms` was stored as a new pulse.
    pub fn record(&mut self, now_ms: u64, timing: &PulseTimingConfig) -> bool {
        if self
            .pulses
            .back()
            .is_some_and(|&last| now_ms.saturating_sub(last) < timing.min_interval_ms)
        {
            return false;
        }
        if self.pulses.is_full() {
            let _ = self.pulses.pop_front();
        }
        // Capacity was just ensured above.
        let _ = self.pulses.push_back(now_ms);
        true
    }

    pub fn assess(&self, cfg: &RunningSuppressionConfig) -> RunningAssessment {
        let count = self.pulses.len();
        let mut assessment = RunningAssessment {
            events: count.min(u16::MAX as usize) as u16,
            ..RunningAssessment::default()
        };

        let (Some(&first), Some(&last)) = (self.pulses.front(), self.pulses.back()) else {
            return assessment;
        };
        let span_ms = last.saturating_sub(first);
        if count < 2 || span_ms == 0 {
            return assessment;
        }

        let intervals = (count - 1) as f32;
        assessment.frequency_hz = intervals / (span_ms as f32 / 1_000.0);

        let mean_ms = span_ms as f32 / intervals;
        let mut prev = first;
        let mut sum_sq = 0.0f32;
        for &at in self.pulses.iter().skip(1) {
            let delta = at.saturating_sub(prev) as f32 - mean_ms;
            sum_sq += delta * delta;
            prev = at;
        }
        assessment.cv = (sum_sq / intervals).sqrt() / mean_ms;

        if count < usize::from(cfg.min_events) {
            return assessment;
        }

        assessment.gait_frequency =
            (cfg.freq_min_hz..=cfg.freq_max_hz).contains(&assessment.frequency_hz);
        assessment.regular = assessment.cv < cfg.regularity_cv;
        assessment
    }
}
