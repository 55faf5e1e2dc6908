// @generated by detector_config_compiler from config/detector.toml. Do not edit.
pub const DETECTOR_CONFIG: DetectorConfig = DetectorConfig {
    gravity_earth: 9.80665,
    gravity_filter_alpha: 0.8,
    shake_threshold_g: 2.5,
    timing: PulseTimingConfig {
        min_interval_ms: 150,
        max_interval_ms: 600,
        time_window_ms: 1000,
    },
    running: RunningSuppressionConfig {
        window_ms: 3000,
        min_events: 6,
        freq_min_hz: 1.5,
        freq_max_hz: 4.0,
        regularity_cv: 0.3,
    },
};
