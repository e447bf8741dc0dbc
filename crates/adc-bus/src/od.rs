//! CANopen object-dictionary indices and serial line parameters.

/// A CANopen object-dictionary index: `(index, sub-index)`.
pub type OdIndex = (u16, u8);

/// Controlword (CiA-402 §5.3.1).
pub const OD_CONTROLWORD: OdIndex = (0x6040, 0x00);
/// Statusword (CiA-402 §5.3.2).
pub const OD_STATUSWORD: OdIndex = (0x6041, 0x00);
/// Modes of operation. Value `1` selects Profile Position.
pub const OD_MODES_OF_OPERATION: OdIndex = (0x6060, 0x00);
/// Target position, Profile Position mode.
pub const OD_TARGET_POSITION: OdIndex = (0x607A, 0x00);
/// Profile velocity, Profile Position mode.
pub const OD_PROFILE_VELOCITY: OdIndex = (0x6081, 0x00);
/// Position actual value.
pub const OD_POSITION_ACTUAL_VALUE: OdIndex = (0x6064, 0x00);
/// Raw digital input word used for homing sensor readback.
pub const OD_DIGITAL_INPUT_RAW: OdIndex = (0x3240, 0x05);

/// Bit width of an object-dictionary read or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OdBits {
    /// 8-bit value (e.g. modes-of-operation).
    Eight,
    /// 16-bit value (e.g. control/status word).
    Sixteen,
    /// 32-bit value (e.g. target position, profile velocity).
    ThirtyTwo,
}

/// Serial line parity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Parity {
    /// No parity bit.
    None,
    /// Even parity (the ADC bus default, see [`SerialOptions::default`]).
    #[default]
    Even,
    /// Odd parity.
    Odd,
}

/// Serial line parameters for [`crate::BusDriver::open_bus`].
///
/// The default is the ADC bus's fixed configuration: 115200 baud, 8 data
/// bits, even parity, 1 stop bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialOptions {
    /// Baud rate in bits per second.
    pub baud_rate: u32,
    /// Number of data bits per frame.
    pub data_bits: u8,
    /// Parity mode.
    pub parity: Parity,
    /// Number of stop bits.
    pub stop_bits: u8,
}

impl Default for SerialOptions {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            data_bits: 8,
            parity: Parity::Even,
            stop_bits: 1,
        }
    }
}

/// Progress notification emitted by [`crate::BusDriver::scan_devices`].
///
/// Purely observational: nothing in the core branches on these values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanProgress {
    /// The scan has started.
    Started,
    /// The scan is in progress; `devices_found` so far.
    InProgress {
        /// Number of devices found so far.
        devices_found: u32,
    },
    /// The scan has finished.
    Finished,
}
