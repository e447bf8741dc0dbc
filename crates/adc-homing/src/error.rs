//! Errors produced by homing, parking, and zeroing.

use adc_bus::MotorId;
use adc_motor::MotorError;

/// Failure from a [`crate::ReferenceManager`] operation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum HomingError {
    /// Parking or zeroing was attempted before a successful homing (I3).
    #[error("parking/zeroing attempted before homing")]
    NotHomed,
    /// `find_home_position` did not see the digital input change within
    /// the 300 s budget; the motor is halted before this is returned.
    #[error("homing search timed out for {0}")]
    Timeout(MotorId),
    /// A motor-level operation failed.
    #[error(transparent)]
    Motor(#[from] MotorError),
}
