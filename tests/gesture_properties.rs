use chopflash::gesture::{
    filter::GravityFilter, DetectorConfig, DetectorStateId, GestureDetector, RejectReason, Sample,
    TriggerEvent, Vec3,
};

const G: f32 = 9.80665;
const STEP_MS: u64 = 10;

fn stream(pulses: &[u64], until_ms: u64) -> impl Iterator<Item = Sample> + '_ {
    (0..=until_ms / STEP_MS).map(move |idx| {
        let at = idx * STEP_MS;
        let x = if pulses.contains(&at) { 4.0 * G } else { 0.0 };
        Sample::new(at, x, 0.0, G)
    })
}

fn triggers_for(pulses: &[u64], until_ms: u64) -> Vec<TriggerEvent> {
    let mut detector = GestureDetector::default();
    detector.triggers(stream(pulses, until_ms)).collect()
}

#[test]
fn any_pair_between_debounce_and_max_interval_triggers_once() {
    let cfg = DetectorConfig::default();
    let first = 1_000;
    let mut gap = cfg.timing.min_interval_ms;
    while gap <= cfg.timing.max_interval_ms {
        let events = triggers_for(&[first, first + gap], first + gap + 1_500);
        assert_eq!(events.len(), 1, "gap {gap} ms");
        assert_eq!(events[0].at_ms, first + gap);
        assert_eq!(events[0].first_pulse_ms, first);
        assert_eq!(events[0].interval_ms, gap);
        gap += 50;
    }
}

#[test]
fn pairs_wider_than_time_window_never_trigger() {
    for gap in [1_100, 1_200, 2_500] {
        let second = 1_000 + gap;
        let mut detector = GestureDetector::default();
        for sample in stream(&[1_000, second], second + 1_000) {
            if sample.now_ms == second {
                assert_eq!(
                    detector.state_id(),
                    DetectorStateId::Idle,
                    "gap {gap} ms: still armed when the second pulse arrived"
                );
            }
            assert_eq!(detector.tick(sample).trigger, None, "gap {gap} ms");
        }
    }
}

#[test]
fn slow_pairs_reset_and_let_a_third_pulse_start_over() {
    for gap in [650, 800, 1_000] {
        let second = 1_000 + gap;
        let third = second + 200;
        let fourth = third + 300;
        let events = triggers_for(&[1_000, second, third, fourth], fourth + 1_000);
        assert_eq!(events.len(), 1, "gap {gap} ms");
        assert_eq!(events[0].first_pulse_ms, third);
        assert_eq!(events[0].at_ms, fourth);
    }
}

#[test]
fn steady_running_cadence_is_suppressed() {
    let cfg = DetectorConfig::default();
    // 2 Hz, perfectly regular.
    let pulses: Vec<u64> = (0..12).map(|idx| 1_000 + idx * 500).collect();
    let last = *pulses.last().unwrap_or(&0);

    let mut detector = GestureDetector::default();
    let mut suppressed = 0;
    let mut triggers = Vec::new();
    for sample in stream(&pulses, last + 1_000) {
        let out = detector.tick(sample);
        if out.trace.reject_reason == RejectReason::RunningMotion {
            suppressed += 1;
        }
        if let Some(event) = out.trigger {
            triggers.push(event.at_ms);
        }
    }

    let evidence_at = pulses[usize::from(cfg.running.min_events) - 1];
    assert!(
        triggers.iter().all(|&at| at < evidence_at),
        "triggers after running was established: {triggers:?}"
    );
    assert_eq!(suppressed, pulses.len() - usize::from(cfg.running.min_events) + 1);
}

#[test]
fn qualifying_pair_inside_running_stream_is_suppressed() {
    // A 2 Hz stride with an extra chop 300 ms after one footfall.
    let mut pulses: Vec<u64> = (0..10).map(|idx| 1_000 + idx * 500).collect();
    pulses.push(4_300);
    pulses.sort_unstable();

    let events = triggers_for(&pulses, 7_000);
    assert!(events.iter().all(|event| event.at_ms < 3_500), "{events:?}");
}

#[test]
fn debounced_candidates_collapse_into_one_pulse() {
    let mut detector = GestureDetector::default();
    let mut reasons = Vec::new();
    // One jolt spanning three samples, then a real second chop.
    for sample in stream(&[1_000, 1_010, 1_020, 1_400], 2_000) {
        let out = detector.tick(sample);
        if out.trace.candidate == 1 {
            reasons.push(out.trace.reject_reason);
        }
        if let Some(event) = out.trigger {
            assert_eq!(event.first_pulse_ms, 1_000);
            assert_eq!(event.at_ms, 1_400);
        }
    }
    assert_eq!(reasons.first(), Some(&RejectReason::None));
    assert!(reasons[1..reasons.len() - 1]
        .iter()
        .all(|reason| *reason == RejectReason::Debounced));
}

#[test]
fn gravity_filter_converges_with_ratio_alpha() {
    let alpha = DetectorConfig::default().gravity_filter_alpha;
    let target = Vec3::new(1.0, -2.0, G);
    let mut filter = GravityFilter::new();

    let mut previous_error = target.magnitude();
    for _ in 0..40 {
        let _ = filter.update(target, alpha);
        let error = (filter.gravity() - target).magnitude();
        assert!((error - previous_error * alpha).abs() < 1e-3);
        previous_error = error;
    }
}

#[test]
fn end_to_end_reference_sequence() {
    let mut detector = GestureDetector::default();
    assert_eq!(detector.process_sample(0, 0.0, 0.0, 9.8), None);
    assert_eq!(detector.process_sample(50, 0.0, 0.0, 9.8), None);
    assert_eq!(detector.process_sample(200, 30.0, 0.0, 9.8), None);
    assert_eq!(detector.state_id(), DetectorStateId::Armed);

    let event = detector.process_sample(500, 30.0, 0.0, 9.8);
    assert!(event.is_some());
    assert_eq!(detector.state_id(), DetectorStateId::Idle);
}
