//! Host-side glue between the gesture detector and a flashlight.
//!
//! The torch, the persisted "enabled" flag and user feedback are host collaborators, so they
//! are reached only through the traits below. Their failures are reported to the caller and
//! never touch detector state.

use core::fmt;

use crate::gesture::{DetectorConfig, GestureDetector, Sample, TriggerEvent};

pub const TRIGGER_VIBRATION_MS: u32 = 100;
pub const DEFAULT_MIN_SAMPLE_INTERVAL_MS: u64 = 100;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TorchStatus {
    #[default]
    Off,
    On,
}

impl TorchStatus {
    pub const fn is_on(self) -> bool {
        matches!(self, Self::On)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::On => "ON",
        }
    }

    const fn from_on(on: bool) -> Self {
        if on {
            Self::On
        } else {
            Self::Off
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ServiceError {
    TorchUnavailable,
    Torch(String),
    Store(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TorchUnavailable => write!(f, "device has no usable torch"),
            Self::Torch(msg) => write!(f, "torch error: {msg}"),
            Self::Store(msg) => write!(f, "store error: {msg}"),
        }
    }
}

impl std::error::Error for ServiceError {}

pub trait TorchActuator {
    fn is_available(&self) -> bool;

    /// Drives the torch to an absolute state. Repeating the current state is a no-op.
    fn set_torch(&mut self, on: bool) -> Result<(), ServiceError>;
}

pub trait EnabledStore {
    fn load_enabled(&self) -> bool;
    fn save_enabled(&mut self, enabled: bool) -> Result<(), ServiceError>;
}

pub trait FeedbackSink {
    fn vibrate(&mut self, duration_ms: u32);
    fn notify(&mut self, status: TorchStatus);
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ServiceConfig {
    pub detector: DetectorConfig,
    /// Samples closer than this to the last fed one are skipped. Zero feeds everything.
    pub min_sample_interval_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            detector: DetectorConfig::default(),
            min_sample_interval_ms: DEFAULT_MIN_SAMPLE_INTERVAL_MS,
        }
    }
}

pub struct FlashlightService<T, S, F> {
    config: ServiceConfig,
    detector: GestureDetector,
    torch: T,
    store: S,
    feedback: F,
    torch_status: TorchStatus,
    running: bool,
    last_fed_ms: Option<u64>,
}

impl<T, S, F> FlashlightService<T, S, F>
where
    T: TorchActuator,
    S: EnabledStore,
    F: FeedbackSink,
{
    /// Builds a stopped service. Nothing reaches the detector until [`Self::start`].
    pub fn new(config: ServiceConfig, torch: T, store: S, feedback: F) -> Self {
        let mut detector = GestureDetector::new(config.detector);
        let _ = detector.pause(0);
        Self {
            config,
            detector,
            torch,
            store,
            feedback,
            torch_status: TorchStatus::Off,
            running: false,
            last_fed_ms: None,
        }
    }

    pub fn start(&mut self, now_ms: u64) -> Result<(), ServiceError> {
        if !self.torch.is_available() {
            log::warn!("service: start refused, no torch available");
            return Err(ServiceError::TorchUnavailable);
        }

        self.store.save_enabled(true).inspect_err(|err| {
            log::warn!("service: failed to persist enabled flag: {err}");
        })?;

        if !self.running {
            let _ = self.detector.resume(now_ms);
            self.running = true;
            self.last_fed_ms = None;
            log::info!("service: detection started t={now_ms}");
        }
        self.feedback.notify(self.torch_status);
        Ok(())
    }

    /// Pauses detection and turns the torch off. Both steps run even if persisting fails;
    /// the first error is returned.
    pub fn stop(&mut self, now_ms: u64) -> Result<(), ServiceError> {
        let saved = self.store.save_enabled(false).inspect_err(|err| {
            log::warn!("service: failed to persist disabled flag: {err}");
        });
        self.halt(now_ms);
        let torch = self.torch_off();
        saved.and(torch)
    }

    /// Starts only when the persisted flag says the service was left enabled.
    pub fn restore_on_boot(&mut self, now_ms: u64) -> Result<bool, ServiceError> {
        if !self.store.load_enabled() {
            log::debug!("service: left disabled, not restoring");
            return Ok(false);
        }
        self.start(now_ms)?;
        Ok(true)
    }

    pub fn on_sample(&mut self, sample: Sample) -> Result<Option<TriggerEvent>, ServiceError> {
        if !self.running || self.throttled(sample.now_ms) {
            return Ok(None);
        }
        self.last_fed_ms = Some(sample.now_ms);

        let Some(event) = self.detector.tick(sample).trigger else {
            return Ok(None);
        };

        self.feedback.vibrate(TRIGGER_VIBRATION_MS);
        let target = !self.torch_status.is_on();
        let toggled = self.set_torch(target);
        self.feedback.notify(self.torch_status);
        toggled.map(|()| Some(event))
    }

    /// Stops detection and turns the torch off without touching the persisted flag.
    pub fn shutdown(&mut self, now_ms: u64) -> Result<(), ServiceError> {
        self.halt(now_ms);
        self.torch_off()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn torch_status(&self) -> TorchStatus {
        self.torch_status
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn detector(&self) -> &GestureDetector {
        &self.detector
    }

    pub fn torch(&self) -> &T {
        &self.torch
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn feedback(&self) -> &F {
        &self.feedback
    }

    fn throttled(&self, now_ms: u64) -> bool {
        let interval = self.config.min_sample_interval_ms;
        interval > 0
            && self
                .last_fed_ms
                .is_some_and(|last| now_ms.saturating_sub(last) < interval)
    }

    fn halt(&mut self, now_ms: u64) {
        if self.running {
            let _ = self.detector.pause(now_ms);
            self.running = false;
            log::info!("service: detection stopped t={now_ms}");
        }
    }

    fn torch_off(&mut self) -> Result<(), ServiceError> {
        if !self.torch_status.is_on() {
            return Ok(());
        }
        self.set_torch(false)
    }

    fn set_torch(&mut self, on: bool) -> Result<(), ServiceError> {
        match self.torch.set_torch(on) {
            Ok(()) => {
                self.torch_status = TorchStatus::from_on(on);
                log::debug!("service: torch {}", self.torch_status.label());
                Ok(())
            }
            Err(err) => {
                log::warn!("service: torch command failed: {err}");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests;
