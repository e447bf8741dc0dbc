//! Errors produced by the motor control engine.

use adc_bus::BusError;

/// Failure from a [`crate::MotorEngine`] operation.
///
/// The engine aborts on the first failing OD write and propagates; it never
/// retries (policy shared with `adc-bus`, see §7).
#[derive(Debug, Clone, thiserror::Error)]
pub enum MotorError {
    /// The motor was not connected; no OD write was issued (I5).
    #[error("motor is not connected")]
    NotConnected,
    /// An OD read or write failed on the bus.
    #[error(transparent)]
    Bus(#[from] BusError),
}
