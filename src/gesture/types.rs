#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn magnitude(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl core::ops::Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// One accelerometer reading in m/s², stamped with a monotonic millisecond clock.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Sample {
    pub now_ms: u64,
    pub accel: Vec3,
}

impl Sample {
    pub const fn new(now_ms: u64, x: f32, y: f32, z: f32) -> Self {
        Self {
            now_ms,
            accel: Vec3::new(x, y, z),
        }
    }
}

/// Emitted once per qualifying pulse pair, at the second pulse.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriggerEvent {
    pub at_ms: u64,
    pub first_pulse_ms: u64,
    pub interval_ms: u64,
    pub peak_g: f32,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[repr(u8)]
pub enum RejectReason {
    #[default]
    None = 0,
    BelowThreshold = 1,
    Debounced = 2,
    RunningMotion = 3,
    GapTooLong = 4,
    WindowExpired = 5,
    InvalidSample = 6,
    Paused = 7,
}

impl RejectReason {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::BelowThreshold => "below_threshold",
            Self::Debounced => "debounced",
            Self::RunningMotion => "running_motion",
            Self::GapTooLong => "gap_too_long",
            Self::WindowExpired => "window_expired",
            Self::InvalidSample => "invalid_sample",
            Self::Paused => "paused",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[repr(u8)]
pub enum DetectorStateId {
    #[default]
    Idle = 0,
    Armed = 1,
    Paused = 2,
}

impl DetectorStateId {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Armed => "armed",
            Self::Paused => "paused",
        }
    }
}
