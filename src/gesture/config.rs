#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PulseTimingConfig {
    pub min_interval_ms: u64,
    pub max_interval_ms: u64,
    pub time_window_ms: u64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunningSuppressionConfig {
    pub window_ms: u64,
    pub min_events: u16,
    pub freq_min_hz: f32,
    pub freq_max_hz: f32,
    pub regularity_cv: f32,
}

/// Tunables for [`GestureDetector`](super::GestureDetector).
///
/// Defaults come from `config/detector.toml`, compiled in by `build.rs`. The running
/// thresholds are empirical starting points, not correctness requirements.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectorConfig {
    pub gravity_earth: f32,
    pub gravity_filter_alpha: f32,
    pub shake_threshold_g: f32,
    pub timing: PulseTimingConfig,
    pub running: RunningSuppressionConfig,
}

include!(concat!(env!("OUT_DIR"), "/detector_config.rs"));

pub fn active_config() -> &'static DetectorConfig {
    &DETECTOR_CONFIG
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DETECTOR_CONFIG
    }
}

impl DetectorConfig {
    pub const SENSITIVITY_NEUTRAL_PERCENT: u8 = 50;

    /// Scales the shake threshold from a 0..=100 sensitivity slider.
    ///
    /// 50 keeps the configured threshold, 100 halves it, 0 raises it by half.
    pub fn with_sensitivity(mut self, percent: u8) -> Self {
        let percent = percent.min(100) as f32;
        self.shake_threshold_g *= 1.5 - percent / 100.0;
        self
    }

    pub fn with_shake_threshold_g(mut self, threshold_g: f32) -> Self {
        self.shake_threshold_g = threshold_g;
        self
    }

    pub fn with_timing(mut self, timing: PulseTimingConfig) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_running(mut self, running: RunningSuppressionConfig) -> Self {
        self.running = running;
        self
    }
}
