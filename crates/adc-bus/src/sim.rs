//! An in-memory [`BusDriver`] used by every test in this workspace.
//!
//! The real vendor bus-discovery library is out of scope for this core (see
//! §1); `SimulatedBus` stands in for it everywhere a test
//! needs to observe OD writes, script status-word/digital-input sequences,
//! or inject a transport failure on a specific handle.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;

use crate::driver::BusDriver;
use crate::error::BusError;
use crate::ids::{BusId, DeviceId, Handle};
use crate::od::{OdBits, OdIndex, ScanProgress, SerialOptions};

#[derive(Default)]
struct State {
    bus_open: bool,
    devices: Vec<DeviceId>,
    handles: HashMap<DeviceId, Handle>,
    next_handle: u64,
    connected: HashMap<Handle, bool>,
    od: HashMap<Handle, HashMap<OdIndex, u32>>,
    /// Values popped off the front on each read before falling back to `od`.
    read_queue: HashMap<(Handle, OdIndex), VecDeque<u32>>,
    /// One-shot errors returned (and consumed) by the next matching call.
    fail_write_once: HashMap<Handle, BusError>,
    fail_read_once: HashMap<Handle, BusError>,
    /// Every write issued, in order, for assertions about ordering (§5) and
    /// about "no writes on an invalid request" (I5 / P5).
    write_log: Vec<(Handle, OdIndex, i64)>,
}

/// An in-memory stand-in for the vendor bus driver.
///
/// Construct with [`SimulatedBus::new`], then use [`SimulatedBus::add_device`]
/// (via the [`BusDriver`] trait) or the [`SimulatedBus::with_two_devices`]
/// convenience constructor to obtain handles to script.
pub struct SimulatedBus {
    state: Mutex<State>,
}

impl SimulatedBus {
    /// Creates an empty simulated bus with one bus hardware id (`BusId(0)`).
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    /// Convenience constructor: opens the bus, scans, and registers two
    /// devices, returning their handles in motor order (`handle_1, handle_2`).
    ///
    /// Mirrors the `find_devices` power-on sequence of §4.3.3.
    #[must_use]
    pub fn with_two_devices() -> (Self, Handle, Handle) {
        let bus = Self::new();
        bus.open_bus(BusId(0), SerialOptions::default())
            .expect("open_bus on a fresh SimulatedBus never fails");
        {
            let mut state = bus.state.lock();
            state.devices.push(DeviceId(0));
            state.devices.push(DeviceId(1));
        }
        let devices = bus
            .scan_devices(BusId(0), &mut |_| {})
            .expect("scan_devices on a fresh SimulatedBus never fails");
        assert_eq!(devices.len(), 2, "two devices were staged before scanning");
        let h1 = bus.add_device(DeviceId(0)).expect("add_device(0)");
        let h2 = bus.add_device(DeviceId(1)).expect("add_device(1)");
        (bus, h1, h2)
    }

    /// Directly sets the stored value for `od_index` on `handle`, as if the
    /// device reported it at power-on.
    pub fn set_od(&self, handle: Handle, od_index: OdIndex, value: u32) {
        self.state
            .lock()
            .od
            .entry(handle)
            .or_default()
            .insert(od_index, value);
    }

    /// Queues a sequence of values to return on successive reads of
    /// `od_index` on `handle`; once exhausted, reads fall back to the
    /// stored OD value (see [`SimulatedBus::set_od`]).
    pub fn queue_reads(&self, handle: Handle, od_index: OdIndex, values: impl IntoIterator<Item = u32>) {
        self.state
            .lock()
            .read_queue
            .entry((handle, od_index))
            .or_default()
            .extend(values);
    }

    /// Causes the next `write_number` on `handle` to fail with `err` instead
    /// of applying, and then behave normally again.
    pub fn fail_next_write(&self, handle: Handle, err: BusError) {
        self.state.lock().fail_write_once.insert(handle, err);
    }

    /// Causes the next `read_number` on `handle` to fail with `err` instead
    /// of returning a value, and then behave normally again.
    pub fn fail_next_read(&self, handle: Handle, err: BusError) {
        self.state.lock().fail_read_once.insert(handle, err);
    }

    /// Returns every `(od_index, value)` write issued against `handle`, in
    /// order, since the bus was created.
    #[must_use]
    pub fn writes(&self, handle: Handle) -> Vec<(OdIndex, i64)> {
        self.state
            .lock()
            .write_log
            .iter()
            .filter(|(h, _, _)| *h == handle)
            .map(|(_, idx, val)| (*idx, *val))
            .collect()
    }

    /// The total number of writes issued against any handle.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.state.lock().write_log.len()
    }
}

impl Default for SimulatedBus {
    fn default() -> Self {
        Self::new()
    }
}

impl BusDriver for SimulatedBus {
    fn list_bus_hardware(&self) -> Vec<BusId> {
        vec![BusId(0), BusId(1)]
    }

    fn open_bus(&self, _bus: BusId, _options: SerialOptions) -> Result<(), BusError> {
        self.state.lock().bus_open = true;
        Ok(())
    }

    fn close_bus(&self, _bus: BusId) -> Result<(), BusError> {
        let mut state = self.state.lock();
        if !state.bus_open {
            return Err(BusError::Handle);
        }
        state.bus_open = false;
        Ok(())
    }

    fn scan_devices(
        &self,
        _bus: BusId,
        on_progress: &mut dyn FnMut(ScanProgress),
    ) -> Result<Vec<DeviceId>, BusError> {
        on_progress(ScanProgress::Started);
        let devices = self.state.lock().devices.clone();
        on_progress(ScanProgress::InProgress {
            devices_found: devices.len() as u32,
        });
        on_progress(ScanProgress::Finished);
        Ok(devices)
    }

    fn add_device(&self, device: DeviceId) -> Result<Handle, BusError> {
        let mut state = self.state.lock();
        if let Some(existing) = state.handles.get(&device) {
            return Ok(*existing);
        }
        let handle = Handle(state.next_handle);
        state.next_handle += 1;
        state.handles.insert(device, handle);
        state.connected.insert(handle, false);
        state.od.entry(handle).or_default();
        Ok(handle)
    }

    fn connect(&self, handle: Handle) -> Result<(), BusError> {
        let mut state = self.state.lock();
        if !state.connected.contains_key(&handle) {
            return Err(BusError::Handle);
        }
        state.connected.insert(handle, true);
        Ok(())
    }

    fn disconnect(&self, handle: Handle) -> Result<(), BusError> {
        let mut state = self.state.lock();
        if !state.connected.contains_key(&handle) {
            return Err(BusError::Handle);
        }
        state.connected.insert(handle, false);
        Ok(())
    }

    fn check_connection(&self, handle: Handle) -> Result<bool, BusError> {
        self.state
            .lock()
            .connected
            .get(&handle)
            .copied()
            .ok_or(BusError::Handle)
    }

    fn write_number(
        &self,
        handle: Handle,
        value: i64,
        od_index: OdIndex,
        _bits: OdBits,
    ) -> Result<(), BusError> {
        let mut state = self.state.lock();
        if let Some(err) = state.fail_write_once.remove(&handle) {
            return Err(err);
        }
        if !state.connected.contains_key(&handle) {
            return Err(BusError::Handle);
        }
        state.write_log.push((handle, od_index, value));
        state
            .od
            .entry(handle)
            .or_default()
            .insert(od_index, value as u32);
        Ok(())
    }

    fn read_number(&self, handle: Handle, od_index: OdIndex) -> Result<u32, BusError> {
        let mut state = self.state.lock();
        if let Some(err) = state.fail_read_once.remove(&handle) {
            return Err(err);
        }
        if !state.connected.contains_key(&handle) {
            return Err(BusError::Handle);
        }
        if let Some(queue) = state.read_queue.get_mut(&(handle, od_index)) {
            if let Some(value) = queue.pop_front() {
                return Ok(value);
            }
        }
        Ok(state
            .od
            .get(&handle)
            .and_then(|m| m.get(&od_index))
            .copied()
            .unwrap_or(0))
    }
}
