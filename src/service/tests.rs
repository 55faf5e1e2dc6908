use super::*;

const G: f32 = 9.80665;

#[derive(Default)]
struct FakeTorch {
    unavailable: bool,
    fail: bool,
    on: bool,
    commands: Vec<bool>,
}

impl TorchActuator for FakeTorch {
    fn is_available(&self) -> bool {
        !self.unavailable
    }

    fn set_torch(&mut self, on: bool) -> Result<(), ServiceError> {
        self.commands.push(on);
        if self.fail {
            return Err(ServiceError::Torch("camera in use".into()));
        }
        self.on = on;
        Ok(())
    }
}

#[derive(Default)]
struct FakeStore {
    enabled: bool,
    fail: bool,
}

impl EnabledStore for FakeStore {
    fn load_enabled(&self) -> bool {
        self.enabled
    }

    fn save_enabled(&mut self, enabled: bool) -> Result<(), ServiceError> {
        if self.fail {
            return Err(ServiceError::Store("read-only".into()));
        }
        self.enabled = enabled;
        Ok(())
    }
}

#[derive(Default)]
struct FakeFeedback {
    vibrations: Vec<u32>,
    notifications: Vec<TorchStatus>,
}

impl FeedbackSink for FakeFeedback {
    fn vibrate(&mut self, duration_ms: u32) {
        self.vibrations.push(duration_ms);
    }

    fn notify(&mut self, status: TorchStatus) {
        self.notifications.push(status);
    }
}

type TestService = FlashlightService<FakeTorch, FakeStore, FakeFeedback>;

fn unthrottled() -> ServiceConfig {
    ServiceConfig {
        min_sample_interval_ms: 0,
        ..ServiceConfig::default()
    }
}

fn service_with(torch: FakeTorch, store: FakeStore) -> TestService {
    FlashlightService::new(unthrottled(), torch, store, FakeFeedback::default())
}

/// Feeds 10 ms samples from `from_ms` to `to_ms` inclusive, spiking at each pulse.
fn feed(service: &mut TestService, from_ms: u64, to_ms: u64, pulses: &[u64]) -> Vec<TriggerEvent> {
    let mut events = Vec::new();
    for at in (from_ms..=to_ms).step_by(10) {
        let x = if pulses.contains(&at) { 4.0 * G } else { 0.0 };
        if let Ok(Some(event)) = service.on_sample(Sample::new(at, x, 0.0, G)) {
            events.push(event);
        }
    }
    events
}

#[test]
fn start_requires_a_torch() {
    let torch = FakeTorch {
        unavailable: true,
        ..FakeTorch::default()
    };
    let mut service = service_with(torch, FakeStore::default());

    assert_eq!(service.start(0), Err(ServiceError::TorchUnavailable));
    assert!(!service.is_running());
    assert!(!service.store().enabled);
}

#[test]
fn stopped_service_ignores_gestures() {
    let mut service = service_with(FakeTorch::default(), FakeStore::default());
    let events = feed(&mut service, 0, 1_500, &[500, 800]);
    assert!(events.is_empty());
    assert!(service.torch().commands.is_empty());
}

#[test]
fn double_chop_toggles_torch_with_feedback() {
    let mut service = service_with(FakeTorch::default(), FakeStore::default());
    service.start(0).expect("start");
    assert!(service.store().enabled);

    let events = feed(&mut service, 0, 1_500, &[500, 800]);
    assert_eq!(events.len(), 1);
    assert_eq!(service.torch_status(), TorchStatus::On);
    assert_eq!(service.torch().commands, vec![true]);
    assert_eq!(service.feedback().vibrations, vec![TRIGGER_VIBRATION_MS]);
    assert_eq!(
        service.feedback().notifications.last(),
        Some(&TorchStatus::On)
    );

    let events = feed(&mut service, 1_510, 3_000, &[2_000, 2_300]);
    assert_eq!(events.len(), 1);
    assert_eq!(service.torch_status(), TorchStatus::Off);
    assert_eq!(service.torch().commands, vec![true, false]);
}

#[test]
fn torch_failure_is_reported_and_detection_continues() {
    let torch = FakeTorch {
        fail: true,
        ..FakeTorch::default()
    };
    let mut service = service_with(torch, FakeStore::default());
    service.start(0).expect("start");

    let mut failures = 0;
    for at in (0..=1_500).step_by(10) {
        let x = if at == 500 || at == 800 { 4.0 * G } else { 0.0 };
        if let Err(err) = service.on_sample(Sample::new(at, x, 0.0, G)) {
            assert_eq!(err, ServiceError::Torch("camera in use".into()));
            failures += 1;
        }
    }
    assert_eq!(failures, 1);
    assert_eq!(service.torch_status(), TorchStatus::Off);
    assert!(service.is_running());
    assert_eq!(
        service.feedback().notifications.last(),
        Some(&TorchStatus::Off)
    );
}

#[test]
fn stop_persists_flag_and_turns_torch_off() {
    let mut service = service_with(FakeTorch::default(), FakeStore::default());
    service.start(0).expect("start");
    let _ = feed(&mut service, 0, 1_000, &[500, 800]);
    assert!(service.torch().on);

    service.stop(1_100).expect("stop");
    assert!(!service.is_running());
    assert!(!service.store().enabled);
    assert!(!service.torch().on);
    assert_eq!(service.torch_status(), TorchStatus::Off);

    let events = feed(&mut service, 1_110, 2_500, &[1_500, 1_800]);
    assert!(events.is_empty());
}

#[test]
fn stop_still_halts_when_store_fails() {
    let mut service = service_with(FakeTorch::default(), FakeStore::default());
    service.start(0).expect("start");
    let _ = feed(&mut service, 0, 1_000, &[500, 800]);
    assert!(service.torch().on);

    service.store.fail = true;
    let result = service.stop(1_100);
    assert!(matches!(result, Err(ServiceError::Store(_))));
    assert!(!service.is_running());
    assert!(!service.torch().on);
}

#[test]
fn start_reports_store_failure() {
    let store = FakeStore {
        fail: true,
        ..FakeStore::default()
    };
    let mut service = service_with(FakeTorch::default(), store);
    assert!(matches!(service.start(0), Err(ServiceError::Store(_))));
    assert!(!service.is_running());
}

#[test]
fn restore_on_boot_follows_persisted_flag() {
    let mut disabled = service_with(FakeTorch::default(), FakeStore::default());
    assert_eq!(disabled.restore_on_boot(0), Ok(false));
    assert!(!disabled.is_running());

    let store = FakeStore {
        enabled: true,
        ..FakeStore::default()
    };
    let mut enabled = service_with(FakeTorch::default(), store);
    assert_eq!(enabled.restore_on_boot(0), Ok(true));
    assert!(enabled.is_running());
}

#[test]
fn shutdown_turns_torch_off_and_keeps_flag() {
    let mut service = service_with(FakeTorch::default(), FakeStore::default());
    service.start(0).expect("start");
    let _ = feed(&mut service, 0, 1_000, &[500, 800]);

    service.shutdown(1_100).expect("shutdown");
    assert!(!service.torch().on);
    assert!(!service.is_running());
    assert!(service.store().enabled);

    // Already off: nothing more is sent.
    let sent = service.torch().commands.len();
    service.shutdown(1_200).expect("shutdown");
    assert_eq!(service.torch().commands.len(), sent);
}

#[test]
fn throttle_skips_samples_closer_than_interval() {
    let config = ServiceConfig {
        min_sample_interval_ms: 100,
        ..ServiceConfig::default()
    };
    let mut service = FlashlightService::new(
        config,
        FakeTorch::default(),
        FakeStore::default(),
        FakeFeedback::default(),
    );
    service.start(0).expect("start");

    for at in (0..=440).step_by(10) {
        let _ = service.on_sample(Sample::new(at, 0.0, 0.0, G));
    }
    // Lands between fed samples, so the spike is never seen.
    let _ = service.on_sample(Sample::new(450, 4.0 * G, 0.0, G));
    assert_eq!(service.detector().last_trace().now_ms, 400);

    let _ = service.on_sample(Sample::new(500, 0.0, 0.0, G));
    assert_eq!(service.detector().last_trace().now_ms, 500);
}

#[test]
fn service_error_messages() {
    assert_eq!(
        ServiceError::TorchUnavailable.to_string(),
        "device has no usable torch"
    );
    assert_eq!(
        ServiceError::Torch("busy".into()).to_string(),
        "torch error: busy"
    );
    assert_eq!(
        ServiceError::Store("full".into()).to_string(),
        "store error: full"
    );
}
