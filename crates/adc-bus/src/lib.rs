//! Bus driver facade: a uniform, testable surface over the vendor CANopen
//! bus-discovery library used by the ADC control core.
//!
//! This crate specifies only the narrow interface the rest of the core
//! needs — open a bus, scan for devices, add/connect/disconnect a device,
//! read and write numeric object-dictionary entries, close the bus — and
//! never the vendor library's own API surface, which is out of scope.
//!
//! Every operation returns a [`BusError`]; nothing here retries, and nothing
//! here panics on a transport failure. See [`sim::SimulatedBus`] for the
//! in-memory implementation every other crate in this workspace tests
//! against.

mod constants;
mod driver;
mod error;
mod ids;
mod od;

pub mod sim;

pub use constants::{COUNTS_PER_DEG, COUNTS_PER_REV, POS_MOD};
pub use driver::BusDriver;
pub use error::BusError;
pub use ids::{BusId, DeviceId, Handle, MotorId};
pub use od::{
    OdBits, OdIndex, Parity, ScanProgress, SerialOptions, OD_CONTROLWORD,
    OD_DIGITAL_INPUT_RAW, OD_MODES_OF_OPERATION, OD_POSITION_ACTUAL_VALUE,
    OD_PROFILE_VELOCITY, OD_STATUSWORD, OD_TARGET_POSITION,
};
