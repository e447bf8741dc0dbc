//! Identifiers shared by every layer of the control core.

use std::fmt;

/// One process-wide bus hardware instance, as enumerated by
/// [`crate::BusDriver::list_bus_hardware`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BusId(pub u32);

impl fmt::Display for BusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bus#{}", self.0)
    }
}

/// A device found by [`crate::BusDriver::scan_devices`], before it has been
/// registered with [`crate::BusDriver::add_device`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(pub u32);

/// An opaque, connectable handle to a device, returned by
/// [`crate::BusDriver::add_device`].
///
/// `Handle` values are cheap to copy and compare; the bus driver is
/// responsible for mapping them back to whatever the vendor library needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(pub u64);

/// Identifies one of the two ADC prism motors.
///
/// The public action surface (see `adc-core`) accepts raw motor numbers
/// (0, 1, 2, -1 for some operations); this type is the validated form used
/// once a request has passed pre-flight checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotorId {
    /// Motor 1 (L3 prism).
    One,
    /// Motor 2 (L4 prism).
    Two,
}

impl MotorId {
    /// Both motor identifiers, in order.
    pub const ALL: [MotorId; 2] = [MotorId::One, MotorId::Two];

    /// Converts a raw motor number (`1` or `2`) into a `MotorId`.
    ///
    /// Returns `None` for any other value, including `0` and `-1`, which are
    /// meaningful only to the dual-motor dispatch in `adc-core` and are
    /// handled there rather than by this conversion.
    #[must_use]
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            1 => Some(MotorId::One),
            2 => Some(MotorId::Two),
            _ => None,
        }
    }

    /// The raw motor number (`1` or `2`) used on the public action surface.
    #[must_use]
    pub fn raw(self) -> i32 {
        match self {
            MotorId::One => 1,
            MotorId::Two => 2,
        }
    }
}

impl fmt::Display for MotorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "motor {}", self.raw())
    }
}
