pub mod config;
pub mod detector;
pub mod filter;
pub mod running;
pub mod trace;
pub mod types;

pub use config::{active_config, DetectorConfig, PulseTimingConfig, RunningSuppressionConfig};
pub use detector::{DetectorOutput, GestureDetector};
pub use trace::DetectorTrace;
pub use types::{DetectorStateId, RejectReason, Sample, TriggerEvent, Vec3};
