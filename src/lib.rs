//! Double-chop gesture detection for a flashlight toggle.
//!
//! [`GestureDetector`] turns a stream of accelerometer samples into [`TriggerEvent`]s.
//! [`service::FlashlightService`] wires triggers to a torch through host-provided traits.

pub mod gesture;
pub mod service;

pub use gesture::{
    DetectorConfig, DetectorOutput, DetectorTrace, GestureDetector, RejectReason, Sample,
    TriggerEvent,
};
