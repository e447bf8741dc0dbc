//! The narrow bus driver trait itself.

use crate::error::BusError;
use crate::ids::{BusId, DeviceId, Handle};
use crate::od::{OdBits, OdIndex, ScanProgress, SerialOptions};

/// A uniform request/response surface over a CANopen-over-serial vendor bus
/// library.
///
/// Every operation is `Result<T, BusError>`; nothing here panics or leaks an
/// exception, and nothing here retries. Implementors are expected to wrap a
/// real vendor accessor (out of scope for this crate, see the crate docs);
/// [`crate::sim::SimulatedBus`] is the in-memory stand-in used throughout
/// this workspace's tests.
///
/// # Examples
///
/// ```
/// use adc_bus::{BusDriver, sim::SimulatedBus};
///
/// let bus = SimulatedBus::new();
/// let buses = bus.list_bus_hardware();
/// assert!(!buses.is_empty());
/// ```
pub trait BusDriver: Send + Sync {
    /// Enumerates bus hardware instances available to this process.
    fn list_bus_hardware(&self) -> Vec<BusId>;

    /// Opens `bus` with the given serial parameters. Exactly one bus is open
    /// at a time in this core's usage.
    fn open_bus(&self, bus: BusId, options: SerialOptions) -> Result<(), BusError>;

    /// Closes a previously opened bus. Failure here is fatal to the caller
    /// (see the error handling design in §7).
    fn close_bus(&self, bus: BusId) -> Result<(), BusError>;

    /// Scans `bus` for devices, invoking `on_progress` for observability
    /// only; the returned device list is the only thing that matters
    /// semantically.
    fn scan_devices(
        &self,
        bus: BusId,
        on_progress: &mut dyn FnMut(ScanProgress),
    ) -> Result<Vec<DeviceId>, BusError>;

    /// Registers `device` with the driver, returning a connectable handle.
    fn add_device(&self, device: DeviceId) -> Result<Handle, BusError>;

    /// Opens a connection on `handle`.
    fn connect(&self, handle: Handle) -> Result<(), BusError>;

    /// Closes a connection on `handle`.
    fn disconnect(&self, handle: Handle) -> Result<(), BusError>;

    /// Reports whether `handle` currently has an open connection.
    fn check_connection(&self, handle: Handle) -> Result<bool, BusError>;

    /// Writes `value` to `od_index` on `handle`, using `bits` as the
    /// object-dictionary entry's declared width.
    fn write_number(
        &self,
        handle: Handle,
        value: i64,
        od_index: OdIndex,
        bits: OdBits,
    ) -> Result<(), BusError>;

    /// Reads the unsigned value at `od_index` on `handle`.
    ///
    /// Values are always returned as `u32`; callers that need a signed
    /// interpretation (e.g. a relative position delta) perform the
    /// reinterpretation themselves.
    fn read_number(&self, handle: Handle, od_index: OdIndex) -> Result<u32, BusError>;
}
