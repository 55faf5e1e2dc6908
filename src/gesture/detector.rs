use statig::{blocking::IntoStateMachineExt as _, prelude::*};

use super::{
    config::{active_config, DetectorConfig},
    filter::GravityFilter,
    running::RunningWindow,
    trace::DetectorTrace,
    types::{DetectorStateId, RejectReason, Sample, TriggerEvent, Vec3},
};

mod helpers;

use helpers::PulseState;

#[derive(Clone, Copy, Debug)]
enum DetectorHsmEvent {
    Sample(Sample),
    Pause { now_ms: u64 },
    Resume { now_ms: u64 },
}

#[derive(Default)]
struct DispatchContext {
    trigger: Option<TriggerEvent>,
    reset: Option<RejectReason>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DetectorOutput {
    pub trigger: Option<TriggerEvent>,
    /// Set when an armed pulse was discarded while handling this input.
    pub reset: Option<RejectReason>,
    pub trace: DetectorTrace,
}

struct DetectorHsm {
    config: DetectorConfig,
    gravity: GravityFilter,
    running: RunningWindow,
    last_sample_ms: Option<u64>,
    // Debounce reference; survives pulse resets so a trigger's tail cannot re-arm.
    last_accepted_at_ms: Option<u64>,
    pulse: Option<PulseState>,
    last_trace: DetectorTrace,
}

#[state_machine(initial = "State::idle()")]
impl DetectorHsm {
    #[state(superstate = "listening")]
    fn idle(&mut self, context: &mut DispatchContext, event: &DetectorHsmEvent) -> Outcome<State> {
        let _ = context;
        match event {
            DetectorHsmEvent::Sample(sample) => {
                let Some(assessment) = self.evaluate_sample(DetectorStateId::Idle, *sample) else {
                    return Handled;
                };
                if !assessment.accepted {
                    return Handled;
                }

                self.start_pulse(sample.now_ms, assessment.total_accel_g);
                self.settle(DetectorStateId::Armed);
                log::debug!(
                    "gesture: armed t={} g={:.2}",
                    sample.now_ms,
                    assessment.total_accel_g
                );
                Transition(State::armed())
            }
            DetectorHsmEvent::Resume { now_ms } => {
                self.update_control_trace(DetectorStateId::Idle, *now_ms, RejectReason::None);
                Handled
            }
            DetectorHsmEvent::Pause { .. } => Super,
        }
    }

    #[state(superstate = "listening")]
    fn armed(
        &mut self,
        context: &mut DispatchContext,
        event: &DetectorHsmEvent,
    ) -> Outcome<State> {
        match event {
            DetectorHsmEvent::Sample(sample) => {
                let now_ms = sample.now_ms;
                let Some(pulse) = self.pulse else {
                    self.settle(DetectorStateId::Idle);
                    return Transition(State::idle());
                };

                // Checked before the sample can touch the pulse state.
                let expired = self.window_expired(now_ms);

                let Some(assessment) = self.evaluate_sample(DetectorStateId::Armed, *sample)
                else {
                    return Handled;
                };

                if expired {
                    self.clear_pulse();
                    Self::push_reset(context, RejectReason::WindowExpired);
                    log::debug!(
                        "gesture: window expired t={} first={}",
                        now_ms,
                        pulse.first_pulse_ms
                    );
                }

                if assessment.reason == RejectReason::RunningMotion {
                    if !expired {
                        self.clear_pulse();
                        Self::push_reset(context, RejectReason::RunningMotion);
                    }
                    log::debug!(
                        "gesture: running cadence {:.2} Hz cv={:.2}; pulse discarded",
                        assessment.running.frequency_hz,
                        assessment.running.cv
                    );
                    self.settle(DetectorStateId::Idle);
                    return Transition(State::idle());
                }

                if !assessment.accepted {
                    if expired {
                        self.reject_with_reason(RejectReason::WindowExpired);
                        self.settle(DetectorStateId::Idle);
                        return Transition(State::idle());
                    }
                    return Handled;
                }

                if expired {
                    self.start_pulse(now_ms, assessment.total_accel_g);
                    self.last_trace.window_ms = 0;
                    log::debug!(
                        "gesture: re-armed t={} g={:.2}",
                        now_ms,
                        assessment.total_accel_g
                    );
                    return Handled;
                }

                let interval_ms = now_ms.saturating_sub(pulse.first_pulse_ms);
                self.pulse = Some(PulseState {
                    last_pulse_ms: now_ms,
                    peak_g: pulse.peak_g.max(assessment.total_accel_g),
                    ..pulse
                });

                if interval_ms > self.config.timing.max_interval_ms {
                    self.clear_pulse();
                    self.reject_with_reason(RejectReason::GapTooLong);
                    Self::push_reset(context, RejectReason::GapTooLong);
                    self.settle(DetectorStateId::Idle);
                    log::debug!("gesture: second pulse too slow ({interval_ms} ms)");
                    return Transition(State::idle());
                }

                let Some(pair) = self.pulse.take() else {
                    self.settle(DetectorStateId::Idle);
                    return Transition(State::idle());
                };
                let event = TriggerEvent {
                    at_ms: pair.last_pulse_ms,
                    first_pulse_ms: pair.first_pulse_ms,
                    interval_ms,
                    peak_g: pair.peak_g,
                };
                context.trigger = Some(event);
                self.settle(DetectorStateId::Idle);
                log::debug!(
                    "gesture: trigger t={} interval={} ms peak={:.2} g",
                    event.at_ms,
                    event.interval_ms,
                    event.peak_g
                );
                Transition(State::idle())
            }
            DetectorHsmEvent::Resume { now_ms } => {
                self.update_control_trace(DetectorStateId::Armed, *now_ms, RejectReason::None);
                Handled
            }
            DetectorHsmEvent::Pause { .. } => Super,
        }
    }

    #[state(superstate = "suspended")]
    fn paused(
        &mut self,
        context: &mut DispatchContext,
        event: &DetectorHsmEvent,
    ) -> Outcome<State> {
        let _ = context;
        match event {
            DetectorHsmEvent::Sample(sample) => {
                self.update_control_trace(
                    DetectorStateId::Paused,
                    sample.now_ms,
                    RejectReason::Paused,
                );
                Handled
            }
            DetectorHsmEvent::Pause { now_ms } => {
                self.update_control_trace(DetectorStateId::Paused, *now_ms, RejectReason::Paused);
                Handled
            }
            DetectorHsmEvent::Resume { .. } => Super,
        }
    }

    #[superstate]
    fn listening(
        &mut self,
        context: &mut DispatchContext,
        event: &DetectorHsmEvent,
    ) -> Outcome<State> {
        match event {
            DetectorHsmEvent::Pause { now_ms } => {
                if self.pulse.is_some() {
                    Self::push_reset(context, RejectReason::Paused);
                }
                self.clear_pulse();
                self.update_control_trace(DetectorStateId::Paused, *now_ms, RejectReason::Paused);
                log::debug!("gesture: paused t={now_ms}");
                Transition(State::paused())
            }
            _ => Super,
        }
    }

    #[superstate]
    fn suspended(
        &mut self,
        context: &mut DispatchContext,
        event: &DetectorHsmEvent,
    ) -> Outcome<State> {
        let _ = context;
        match event {
            DetectorHsmEvent::Resume { now_ms } => {
                self.update_control_trace(DetectorStateId::Idle, *now_ms, RejectReason::None);
                log::debug!("gesture: resumed t={now_ms}");
                Transition(State::idle())
            }
            _ => Handled,
        }
    }
}

/// Streaming double-chop detector.
///
/// Feed samples in non-decreasing timestamp order from a single stream. Every timeout is
/// evaluated against the next sample, so an idle stream leaves an armed pulse pending.
pub struct GestureDetector {
    config: DetectorConfig,
    machine: statig::blocking::StateMachine<DetectorHsm>,
}

impl Default for GestureDetector {
    fn default() -> Self {
        Self::new(*active_config())
    }
}

impl GestureDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            machine: DetectorHsm::new(config).state_machine(),
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn process_sample(&mut self, now_ms: u64, x: f32, y: f32, z: f32) -> Option<TriggerEvent> {
        self.tick(Sample::new(now_ms, x, y, z)).trigger
    }

    pub fn tick(&mut self, sample: Sample) -> DetectorOutput {
        self.dispatch(DetectorHsmEvent::Sample(sample))
    }

    /// Stops consuming samples and drops any armed pulse. The gravity estimate is kept.
    pub fn pause(&mut self, now_ms: u64) -> DetectorOutput {
        self.dispatch(DetectorHsmEvent::Pause { now_ms })
    }

    pub fn resume(&mut self, now_ms: u64) -> DetectorOutput {
        self.dispatch(DetectorHsmEvent::Resume { now_ms })
    }

    pub fn reset(&mut self) {
        self.machine = DetectorHsm::new(self.config).state_machine();
    }

    pub fn state_id(&self) -> DetectorStateId {
        self.machine.inner().last_trace.state_id
    }

    pub fn is_armed(&self) -> bool {
        self.state_id() == DetectorStateId::Armed
    }

    pub fn gravity_estimate(&self) -> Vec3 {
        self.machine.inner().gravity.gravity()
    }

    pub fn last_trace(&self) -> DetectorTrace {
        self.machine.inner().last_trace
    }

    /// Lazily turns a sample stream into the triggers it produces.
    pub fn triggers<'a, I>(&'a mut self, samples: I) -> impl Iterator<Item = TriggerEvent> + 'a
    where
        I: IntoIterator<Item = Sample>,
        I::IntoIter: 'a,
    {
        samples
            .into_iter()
            .filter_map(move |sample| self.tick(sample).trigger)
    }

    fn dispatch(&mut self, event: DetectorHsmEvent) -> DetectorOutput {
        let mut context = DispatchContext::default();
        self.machine.handle_with_context(&event, &mut context);
        DetectorOutput {
            trigger: context.trigger,
            reset: context.reset,
            trace: self.machine.inner().last_trace,
        }
    }
}
