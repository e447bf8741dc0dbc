//! The aggregate error type returned by [`crate::Controller`] operations.

use adc_bus::BusError;
use adc_homing::HomingError;
use adc_motor::MotorError;

use crate::lookup::LookupError;

/// Failure from a [`crate::Controller`] action.
///
/// Each layer below this one (`adc-bus`, `adc-motor`, `adc-homing`) has its
/// own narrower error enum; this type aggregates them via `#[from]` and adds
/// the pre-flight validation errors that only make sense once both motors
/// are being coordinated (§7).
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    /// A motor id outside `{-1, 0, 1, 2}` (or `{1, 2}` where a dual dispatch
    /// value is not accepted) was supplied. Pre-flight; no side effects.
    #[error("invalid motor id: {0}")]
    InvalidMotorId(i32),
    /// `activate` was called with a zenith angle outside the lookup table's
    /// domain. No motion is attempted.
    #[error("zenith angle {0} is outside the lookup table domain")]
    OutOfBounds(f64),
    /// Parking or zeroing was attempted before homing completed.
    #[error("parking/zeroing attempted before homing")]
    NotHomed,
    /// `find_devices` found no bus hardware at all.
    #[error("no bus hardware available")]
    NoBusHardware,
    /// `find_devices` scanned the bus but found no devices.
    #[error("no devices found on bus")]
    NoDevices,
    /// A motor-level operation failed.
    #[error(transparent)]
    Motor(#[from] MotorError),
    /// A homing/parking/zeroing operation failed.
    #[error(transparent)]
    Homing(#[from] HomingError),
    /// A bus-level operation failed outside the motor engine (e.g. during
    /// power-on/off).
    #[error(transparent)]
    Bus(#[from] BusError),
    /// The lookup table failed to load or evaluate.
    #[error(transparent)]
    Lookup(#[from] LookupError),
    /// A spawned per-motor dispatch task panicked instead of returning.
    #[error("motor task did not complete: {0}")]
    TaskFailed(String),
}

impl ControllerError {
    /// The motor this error pertains to, if it is motor-scoped (used to
    /// populate [`crate::action::ActionError::motor_id`]).
    #[must_use]
    pub fn motor_id(&self) -> Option<i32> {
        match self {
            ControllerError::Homing(HomingError::Timeout(id)) => Some(id.raw()),
            _ => None,
        }
    }
}
