//! Compiles `config/detector.toml` into a Rust constant for the gesture detector.
//!
//! The same parse + validate path is used at build time (from `build.rs`) and by host
//! tools that accept override files at runtime.

use std::{fmt, fs, path::Path};

use serde::Deserialize;

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DetectorFile {
    pub detector: DetectorSection,
    pub timing: TimingSection,
    pub running: RunningSection,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DetectorSection {
    pub gravity_earth: f64,
    pub gravity_filter_alpha: f64,
    pub shake_threshold_g: f64,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TimingSection {
    pub min_interval_ms: u64,
    pub max_interval_ms: u64,
    pub time_window_ms: u64,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RunningSection {
    pub window_ms: u64,
    pub min_events: u16,
    pub freq_min_hz: f64,
    pub freq_max_hz: f64,
    pub regularity_cv: f64,
}

#[derive(Debug)]
pub enum ConfigCompilerError {
    Io(String),
    Parse(String),
    Validation(String),
}

impl fmt::Display for ConfigCompilerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "io error: {msg}"),
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
            Self::Validation(msg) => write!(f, "validation error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigCompilerError {}

pub fn parse_detector_file(path: &Path) -> Result<DetectorFile, ConfigCompilerError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| ConfigCompilerError::Io(format!("{}: {e}", path.display())))?;
    parse_detector_str(&raw)
}

pub fn parse_detector_str(raw: &str) -> Result<DetectorFile, ConfigCompilerError> {
    toml::from_str(raw).map_err(|e| ConfigCompilerError::Parse(e.to_string()))
}

pub fn validate_config(config: &DetectorFile) -> Result<(), ConfigCompilerError> {
    let mut problems: Vec<&'static str> = Vec::new();

    let detector = &config.detector;
    let timing = &config.timing;
    let running = &config.running;

    let floats = [
        detector.gravity_earth,
        detector.gravity_filter_alpha,
        detector.shake_threshold_g,
        running.freq_min_hz,
        running.freq_max_hz,
        running.regularity_cv,
    ];
    if floats.iter().any(|v| !v.is_finite()) {
        problems.push("all floating-point fields must be finite");
    }

    if detector.shake_threshold_g <= 0.0 {
        problems.push("detector.shake_threshold_g must be > 0");
    }
    if detector.gravity_earth <= 0.0 {
        problems.push("detector.gravity_earth must be > 0");
    }
    if !(0.0..1.0).contains(&detector.gravity_filter_alpha) {
        problems.push("detector.gravity_filter_alpha must be in [0, 1)");
    }

    if timing.min_interval_ms == 0 {
        problems.push("timing.min_interval_ms must be > 0");
    }
    if timing.max_interval_ms < timing.min_interval_ms {
        problems.push("timing.max_interval_ms must be >= timing.min_interval_ms");
    }
    if timing.time_window_ms < timing.max_interval_ms {
        problems.push("timing.time_window_ms must be >= timing.max_interval_ms");
    }

    if running.window_ms == 0 {
        problems.push("running.window_ms must be > 0");
    }
    if running.min_events < 3 {
        problems.push("running.min_events must be >= 3");
    }
    if running.freq_min_hz <= 0.0 || running.freq_min_hz > running.freq_max_hz {
        problems.push("running.freq_min_hz must be > 0 and <= running.freq_max_hz");
    }
    if running.regularity_cv <= 0.0 {
        problems.push("running.regularity_cv must be > 0");
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(ConfigCompilerError::Validation(problems.join("; ")))
    }
}

fn render_float(value: f64) -> String {
    // Debug keeps a decimal point or exponent, so the literal stays a float.
    format!("{value:?}")
}

pub fn render_generated_config(config: &DetectorFile) -> String {
    let detector = &config.detector;
    let timing = &config.timing;
    let running = &config.running;

    let mut out = String::new();
    out.push_str("// @generated by detector_config_compiler from config/detector.toml. Do not edit.\n");
    out.push_str("pub const DETECTOR_CONFIG: DetectorConfig = DetectorConfig {\n");
    out.push_str(&format!(
        "    gravity_earth: {},\n",
        render_float(detector.gravity_earth)
    ));
    out.push_str(&format!(
        "    gravity_filter_alpha: {},\n",
        render_float(detector.gravity_filter_alpha)
    ));
    out.push_str(&format!(
        "    shake_threshold_g: {},\n",
        render_float(detector.shake_threshold_g)
    ));
    out.push_str("    timing: PulseTimingConfig {\n");
    out.push_str(&format!(
        "        min_interval_ms: {},\n",
        timing.min_interval_ms
    ));
    out.push_str(&format!(
        "        max_interval_ms: {},\n",
        timing.max_interval_ms
    ));
    out.push_str(&format!(
        "        time_window_ms: {},\n",
        timing.time_window_ms
    ));
    out.push_str("    },\n");
    out.push_str("    running: RunningSuppressionConfig {\n");
    out.push_str(&format!("        window_ms: {},\n", running.window_ms));
    out.push_str(&format!("        min_events: {},\n", running.min_events));
    out.push_str(&format!(
        "        freq_min_hz: {},\n",
        render_float(running.freq_min_hz)
    ));
    out.push_str(&format!(
        "        freq_max_hz: {},\n",
        render_float(running.freq_max_hz)
    ));
    out.push_str(&format!(
        "        regularity_cv: {},\n",
        render_float(running.regularity_cv)
    ));
    out.push_str("    },\n");
    out.push_str("};\n");
    out
}

pub fn generate_from_path(path: &Path) -> Result<String, ConfigCompilerError> {
    let config = parse_detector_file(path)?;
    validate_config(&config)?;
    Ok(render_generated_config(&config))
}
