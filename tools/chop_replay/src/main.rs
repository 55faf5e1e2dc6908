mod logging;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use chopflash::gesture::{
    DetectorConfig, DetectorTrace, GestureDetector, PulseTimingConfig, RunningSuppressionConfig,
    Sample, TriggerEvent,
};
use clap::Parser;
use detector_config_compiler::{parse_detector_file, validate_config, DetectorFile};
use logging::JsonLog;
use serde_json::json;

const TRACE_HEADER: &str = "accel,ms,x,y,z";
const TRIGGER_HEADER: &str = "trigger,ms,first_pulse_ms,interval_ms,peak_g";
const TRACE_ROW_HEADER: &str =
    "trace,ms,state,reason,total_g,candidate,running_events,running_hz,running_cv,window_ms";

#[derive(Debug, Parser)]
#[command(name = "chop_replay")]
#[command(about = "Replay an accelerometer trace through the chop detector")]
struct Cli {
    /// CSV trace with `accel,ms,x,y,z` rows.
    trace: PathBuf,
    /// File of expected trigger timestamps, one per line.
    #[arg(long)]
    expect: Option<PathBuf>,
    /// Detector TOML overriding the compiled-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    sensitivity: Option<u8>,
    /// Print one trace row per sample.
    #[arg(long = "trace")]
    dump_trace: bool,
    #[arg(long = "json-log")]
    json_log: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => DetectorConfig::default(),
    };
    if let Some(percent) = cli.sensitivity {
        config = config.with_sensitivity(percent);
    }

    let raw = fs::read_to_string(&cli.trace)
        .with_context(|| format!("failed to read {}", cli.trace.display()))?;
    let samples =
        parse_trace(&raw).with_context(|| format!("invalid trace {}", cli.trace.display()))?;

    let mut json_log = JsonLog::new(cli.json_log.clone())?;
    json_log.record(
        "replay_start",
        json!({
            "trace": cli.trace.display().to_string(),
            "samples": samples.len(),
            "shake_threshold_g": config.shake_threshold_g,
        }),
    );
    log::info!(
        "replaying {} samples, threshold {:.2} g",
        samples.len(),
        config.shake_threshold_g
    );

    let mut detector = GestureDetector::new(config);
    let mut triggers: Vec<TriggerEvent> = Vec::new();

    if cli.dump_trace {
        println!("{TRACE_ROW_HEADER}");
    }
    for sample in samples {
        let output = detector.tick(sample);
        if cli.dump_trace {
            println!("{}", format_trace_row(&output.trace));
        }
        if let Some(reason) = output.reset {
            json_log.record(
                "reset",
                json!({ "ms": sample.now_ms, "reason": reason.label() }),
            );
        }
        if let Some(event) = output.trigger {
            json_log.record(
                "trigger",
                json!({
                    "ms": event.at_ms,
                    "first_pulse_ms": event.first_pulse_ms,
                    "interval_ms": event.interval_ms,
                    "peak_g": event.peak_g,
                }),
            );
            triggers.push(event);
        }
    }

    println!("{TRIGGER_HEADER}");
    for event in &triggers {
        println!("{}", format_trigger(event));
    }
    json_log.record("replay_done", json!({ "triggers": triggers.len() }));

    if let Some(expect_path) = cli.expect {
        let raw = fs::read_to_string(&expect_path)
            .with_context(|| format!("failed to read {}", expect_path.display()))?;
        let expected = parse_expected(&raw)
            .with_context(|| format!("invalid expectations {}", expect_path.display()))?;
        let actual: Vec<u64> = triggers.iter().map(|event| event.at_ms).collect();
        if actual != expected {
            eprintln!("expected triggers: {}", join_ms(&expected));
            eprintln!("actual triggers:   {}", join_ms(&actual));
            bail!("trigger sequence mismatch");
        }
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<DetectorConfig> {
    let file = parse_detector_file(path)
        .with_context(|| format!("failed to load config {}", path.display()))?;
    validate_config(&file).with_context(|| format!("rejected config {}", path.display()))?;
    Ok(runtime_config(&file))
}

fn runtime_config(file: &DetectorFile) -> DetectorConfig {
    DetectorConfig {
        gravity_earth: file.detector.gravity_earth as f32,
        gravity_filter_alpha: file.detector.gravity_filter_alpha as f32,
        shake_threshold_g: file.detector.shake_threshold_g as f32,
        timing: PulseTimingConfig {
            min_interval_ms: file.timing.min_interval_ms,
            max_interval_ms: file.timing.max_interval_ms,
            time_window_ms: file.timing.time_window_ms,
        },
        running: RunningSuppressionConfig {
            window_ms: file.running.window_ms,
            min_events: file.running.min_events,
            freq_min_hz: file.running.freq_min_hz as f32,
            freq_max_hz: file.running.freq_max_hz as f32,
            regularity_cv: file.running.regularity_cv as f32,
        },
    }
}

fn parse_trace(raw: &str) -> Result<Vec<Sample>> {
    let mut out = Vec::new();
    for (line_no, line) in raw.lines().enumerate() {
        let line_no = line_no + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed == TRACE_HEADER {
            continue;
        }

        let parts: Vec<&str> = trimmed.split(',').map(str::trim).collect();
        if parts[0] != "accel" {
            continue;
        }
        if parts.len() != 5 {
            bail!("line {line_no}: expected 5 columns, got {}", parts.len());
        }

        let now_ms: u64 = parts[1]
            .parse()
            .with_context(|| format!("line {line_no}: invalid ms '{}'", parts[1]))?;
        let mut axes = [0.0f32; 3];
        for (slot, (name, text)) in axes.iter_mut().zip(["x", "y", "z"].iter().zip(&parts[2..])) {
            *slot = text
                .parse()
                .with_context(|| format!("line {line_no}: invalid {name} '{text}'"))?;
        }
        out.push(Sample::new(now_ms, axes[0], axes[1], axes[2]));
    }
    Ok(out)
}

fn parse_expected(raw: &str) -> Result<Vec<u64>> {
    raw.lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(line_no, line)| {
            line.parse()
                .with_context(|| format!("line {line_no}: invalid trigger ms '{line}'"))
        })
        .collect()
}

fn format_trigger(event: &TriggerEvent) -> String {
    format!(
        "trigger,{},{},{},{:.3}",
        event.at_ms, event.first_pulse_ms, event.interval_ms, event.peak_g
    )
}

fn format_trace_row(trace: &DetectorTrace) -> String {
    format!(
        "trace,{},{},{},{:.3},{},{},{:.2},{:.3},{}",
        trace.now_ms,
        trace.state_id.label(),
        trace.reject_reason.label(),
        trace.total_accel_g,
        trace.candidate,
        trace.running_events,
        trace.running_frequency_hz,
        trace.running_cv,
        trace.window_ms
    )
}

fn join_ms(values: &[u64]) -> String {
    values
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
