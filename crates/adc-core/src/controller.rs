//! The `Controller`: one long-lived value owning bus, motor, and reference
//! state, exposing the action surface of §6.
//!
//! A single integration-layer type that owns everything below it — the bus,
//! the two motor engines, and the homing reference manager — and exposes a
//! small set of high-level operations, rather than relying on process-wide
//! singleton state.

use std::sync::Arc;

use adc_bus::{BusDriver, BusId, Handle, MotorId, SerialOptions};
use adc_homing::ReferenceManager;
use adc_motor::{MotorEngine, MotorError, PollClock};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::action::ActionResponse;
use crate::config::AdcConfig;
use crate::error::ControllerError;
use crate::lookup::{InterpolationMethod, LookupTable};
use crate::orchestrator::{self, MoveOutcome, StopOutcome};

/// Snapshot of one motor's state, as returned by `status(motor_id)`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MotorStatus {
    /// The motor this status describes (`1` or `2`).
    pub motor_id: i32,
    /// Whether the motor is currently connected (I1).
    pub connected: bool,
    /// The motor's position actual value, if it could be read.
    pub position: Option<u32>,
    /// The motor's raw CiA-402 statusword, if it could be read.
    pub status_word: Option<u32>,
    /// The recorded home count, if homing has completed.
    pub home_count: Option<u32>,
}

/// One process-wide ADC controller (§3 "Controller State").
///
/// Owns the bus driver, the per-motor engines (once [`Controller::find_devices`]
/// has run), the homing reference manager, the loaded configuration and
/// lookup table, and the poll clock used for every suspension point in this
/// workspace (§5). Every fallible action returns a [`ControllerError`];
/// pre-flight validation failures (I5) issue no OD writes.
pub struct Controller<B: BusDriver + 'static, C: PollClock + 'static> {
    bus: Arc<B>,
    clock: Arc<C>,
    config: AdcConfig,
    lookup: LookupTable,
    interpolation: InterpolationMethod,
    bus_id: Mutex<Option<BusId>>,
    motor_1: Mutex<Option<Arc<MotorEngine<B>>>>,
    motor_2: Mutex<Option<Arc<MotorEngine<B>>>>,
    reference: tokio::sync::Mutex<Option<ReferenceManager<B>>>,
}

impl<B: BusDriver + 'static, C: PollClock + 'static> Controller<B, C> {
    /// Builds a controller from an already-loaded config and lookup table.
    /// No bus has been opened and no motors are registered yet; call
    /// [`Controller::find_devices`] once before issuing any other action
    /// (§3 "Lifecycle").
    #[must_use]
    pub fn new(bus: Arc<B>, clock: Arc<C>, config: AdcConfig, lookup: LookupTable, interpolation: InterpolationMethod) -> Self {
        Self {
            bus,
            clock,
            config,
            lookup,
            interpolation,
            bus_id: Mutex::new(None),
            motor_1: Mutex::new(None),
            motor_2: Mutex::new(None),
            reference: tokio::sync::Mutex::new(None),
        }
    }

    fn motor(&self, id: MotorId) -> Option<Arc<MotorEngine<B>>> {
        let slot = match id {
            MotorId::One => &self.motor_1,
            MotorId::Two => &self.motor_2,
        };
        slot.lock().clone()
    }

    fn require_motor(&self, id: MotorId) -> Result<Arc<MotorEngine<B>>, ControllerError> {
        self.motor(id).ok_or(ControllerError::Motor(MotorError::NotConnected))
    }

    /// Power-on (§4.3.3): opens the configured bus index, scans for exactly
    /// two devices, and registers a [`MotorEngine`] for each. Connection is
    /// a separate, explicit step ([`Controller::connect`]).
    #[instrument(skip(self))]
    pub async fn find_devices(&self) -> Result<(), ControllerError> {
        let buses = self.bus.list_bus_hardware();
        if buses.is_empty() {
            return Err(ControllerError::NoBusHardware);
        }
        let bus_id = *buses
            .get(self.config.selected_bus_index as usize)
            .unwrap_or(&buses[0]);
        self.bus.open_bus(bus_id, SerialOptions::default())?;

        let mut devices_seen = 0u32;
        let devices = self.bus.scan_devices(bus_id, &mut |progress| {
            if let adc_bus::ScanProgress::InProgress { devices_found } = progress {
                devices_seen = devices_found;
            }
        })?;
        if devices.len() != 2 {
            warn!(found = devices.len(), seen_during_scan = devices_seen, "expected exactly two devices");
            return Err(ControllerError::NoDevices);
        }

        let handle_1: Handle = self.bus.add_device(devices[0])?;
        let handle_2: Handle = self.bus.add_device(devices[1])?;
        let motor_1 = Arc::new(MotorEngine::new(Arc::clone(&self.bus), MotorId::One, handle_1));
        let motor_2 = Arc::new(MotorEngine::new(Arc::clone(&self.bus), MotorId::Two, handle_2));

        *self.reference.lock().await = Some(ReferenceManager::new(Arc::clone(&motor_1), Arc::clone(&motor_2)));
        *self.motor_1.lock() = Some(motor_1);
        *self.motor_2.lock() = Some(motor_2);
        *self.bus_id.lock() = Some(bus_id);
        info!(%bus_id, "bus opened and devices registered");
        Ok(())
    }

    /// `connect` action: opens the connection on both registered motors.
    /// Both are attempted even if the first fails (motor-scoped errors
    /// don't affect the other motor, §7); the first failure encountered is
    /// returned.
    #[instrument(skip(self))]
    pub fn connect(&self) -> ActionResponse<()> {
        self.try_connect().into()
    }

    fn try_connect(&self) -> Result<(), ControllerError> {
        let motor_1 = self.require_motor(MotorId::One)?;
        let motor_2 = self.require_motor(MotorId::Two)?;
        let r1 = motor_1.connect();
        let r2 = motor_2.connect();
        r1?;
        r2?;
        Ok(())
    }

    /// `disconnect` action: closes the connection on both registered
    /// motors; both are attempted regardless of the first's outcome.
    #[instrument(skip(self))]
    pub fn disconnect(&self) -> ActionResponse<()> {
        self.try_disconnect().into()
    }

    fn try_disconnect(&self) -> Result<(), ControllerError> {
        let motor_1 = self.require_motor(MotorId::One)?;
        let motor_2 = self.require_motor(MotorId::Two)?;
        let r1 = motor_1.disconnect();
        let r2 = motor_2.disconnect();
        r1?;
        r2?;
        Ok(())
    }

    /// `power_off` action (§4.3.3): disconnects both motors (logging but
    /// still surfacing any failure) and then closes the bus. A close
    /// failure is fatal and takes priority over a disconnect failure,
    /// matching the error handling design of §7.
    #[instrument(skip(self))]
    pub async fn power_off(&self) -> ActionResponse<()> {
        self.try_power_off().await.into()
    }

    async fn try_power_off(&self) -> Result<(), ControllerError> {
        let disconnect_result = self.try_disconnect();
        if let Err(ref err) = disconnect_result {
            error!(error = %err, "disconnect failed during power-off, still closing bus");
        }
        if let Some(bus_id) = self.bus_id.lock().take() {
            self.bus.close_bus(bus_id)?;
        }
        *self.reference.lock().await = None;
        *self.motor_1.lock() = None;
        *self.motor_2.lock() = None;
        disconnect_result
    }

    /// `status(motor_id)` action: snapshots connection state, position, and
    /// statusword for one motor.
    pub async fn status(&self, motor_id: i32) -> ActionResponse<MotorStatus> {
        self.try_status(motor_id).await.into_response(|status| {
            (format!("motor {motor_id} status"), status)
        })
    }

    async fn try_status(&self, motor_id: i32) -> Result<MotorStatus, ControllerError> {
        let id = MotorId::from_raw(motor_id).ok_or(ControllerError::InvalidMotorId(motor_id))?;
        let engine = self.require_motor(id)?;
        let connected = engine.is_connected();
        let (position, status_word) = if connected {
            (engine.read_position().ok(), engine.read_status().ok())
        } else {
            (None, None)
        };
        let home_count = {
            let reference = self.reference.lock().await;
            reference.as_ref().and_then(|r| r.home_counts()).map(|(h1, h2)| match id {
                MotorId::One => h1,
                MotorId::Two => h2,
            })
        };
        Ok(MotorStatus {
            motor_id: id.raw(),
            connected,
            position,
            status_word,
            home_count,
        })
    }

    /// `move(motor_id, pos_count, vel_set)` action (§4.4.3).
    #[instrument(skip(self))]
    pub async fn move_motors(&self, motor_id: i32, pos_count: i32, vel_set: i32) -> ActionResponse<MoveOutcome> {
        let result = orchestrator::move_dispatch(
            self.motor(MotorId::One),
            self.motor(MotorId::Two),
            Arc::clone(&self.clock),
            motor_id,
            pos_count,
            vel_set,
        )
        .await;
        result.into_response(|outcome| {
            if outcome.all_ok() {
                ("move complete".to_string(), outcome)
            } else {
                let failing = outcome.failing_motor_ids();
                (format!("motor(s) {failing:?} failed"), outcome)
            }
        })
    }

    /// `stop(motor_id)` action (§4.4.4).
    #[instrument(skip(self))]
    pub async fn stop_motors(&self, motor_id: i32) -> ActionResponse<StopOutcome> {
        let result = orchestrator::stop_dispatch(self.motor(MotorId::One), self.motor(MotorId::Two), motor_id).await;
        result.into_response(|outcome| {
            if outcome.all_ok() {
                ("stop complete".to_string(), outcome)
            } else {
                ("one or more motors failed to halt".to_string(), outcome)
            }
        })
    }

    /// `activate(za, vel_set)` action (§4.4.2): counter-rotates both
    /// prisms to the interpolated angle for zenith angle `za`.
    #[instrument(skip(self))]
    pub async fn activate(&self, za: f64, vel_set: i32) -> ActionResponse<orchestrator::DualOutcome<orchestrator::MotorOutcome>> {
        let result = self.try_activate(za, vel_set).await;
        result.into_response(|outcome| {
            if outcome.motor_1.result.is_ok() && outcome.motor_2.result.is_ok() {
                ("activate complete".to_string(), outcome)
            } else {
                ("one or more motors failed during activate".to_string(), outcome)
            }
        })
    }

    async fn try_activate(
        &self,
        za: f64,
        vel_set: i32,
    ) -> Result<orchestrator::DualOutcome<orchestrator::MotorOutcome>, ControllerError> {
        let motor_1 = self.require_motor(MotorId::One)?;
        let motor_2 = self.require_motor(MotorId::Two)?;
        orchestrator::activate(
            motor_1,
            motor_2,
            Arc::clone(&self.clock),
            &self.lookup,
            self.interpolation,
            za,
            vel_set,
        )
        .await
    }

    /// `homing(vel)` action (§4.3.1).
    #[instrument(skip(self))]
    pub async fn homing(&self, vel: u32) -> ActionResponse<()> {
        self.try_homing(vel).await.into()
    }

    async fn try_homing(&self, vel: u32) -> Result<(), ControllerError> {
        let mut reference = self.reference.lock().await;
        let reference = reference.as_mut().ok_or(ControllerError::Motor(MotorError::NotConnected))?;
        reference.homing(vel, self.clock.as_ref()).await?;
        Ok(())
    }

    /// `parking(vel)` action (§4.3.2). Fails with `NotHomed` (no writes) if
    /// homing has not completed (I3).
    #[instrument(skip(self))]
    pub async fn parking(&self, vel: u32) -> ActionResponse<()> {
        self.try_parking(vel).await.into()
    }

    async fn try_parking(&self, vel: u32) -> Result<(), ControllerError> {
        let reference = self.reference.lock().await;
        let reference = reference.as_ref().ok_or(ControllerError::NotHomed)?;
        reference.parking(vel, self.clock.as_ref()).await?;
        Ok(())
    }

    /// `zeroing(vel)` action (§4.3.2). Fails with `NotHomed` (no writes) if
    /// homing has not completed (I3).
    #[instrument(skip(self))]
    pub async fn zeroing(&self, vel: u32) -> ActionResponse<()> {
        self.try_zeroing(vel).await.into()
    }

    async fn try_zeroing(&self, vel: u32) -> Result<(), ControllerError> {
        let reference = self.reference.lock().await;
        let reference = reference.as_ref().ok_or(ControllerError::NotHomed)?;
        reference.zeroing(vel, self.clock.as_ref()).await?;
        Ok(())
    }

    /// `calc_from_za(za)` action: evaluates `fn_za_adc(za)` without
    /// commanding any motion.
    pub fn calc_from_za(&self, za: f64) -> ActionResponse<f64> {
        let result = self.lookup.evaluate(za, self.interpolation).map_err(ControllerError::from);
        result.into_response(|adc_deg| (format!("za={za} -> adc={adc_deg}"), adc_deg))
    }

    /// `degree_to_count(deg)` action: pure unit conversion, never fails.
    #[must_use]
    pub fn degree_to_count(&self, deg: f64) -> i64 {
        orchestrator::degree_to_count(deg)
    }
}

impl From<Result<(), ControllerError>> for ActionResponse<()> {
    fn from(result: Result<(), ControllerError>) -> Self {
        result.into_response(|()| ("ok".to_string(), ()))
    }
}

trait IntoActionResponse<T> {
    fn into_response<F: FnOnce(T) -> (String, T)>(self, on_ok: F) -> ActionResponse<T>;
}

impl<T> IntoActionResponse<T> for Result<T, ControllerError> {
    fn into_response<F: FnOnce(T) -> (String, T)>(self, on_ok: F) -> ActionResponse<T> {
        match self {
            Ok(value) => {
                let (message, extra) = on_ok(value);
                ActionResponse::Success { message, extra }
            }
            Err(err) => err.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adc_bus::sim::SimulatedBus;
    use adc_motor::test_util::InstantClock;

    fn controller() -> (Controller<SimulatedBus, InstantClock>, adc_bus::Handle, adc_bus::Handle) {
        let (sim, h1, h2) = SimulatedBus::with_two_devices();
        let bus = Arc::new(sim);
        let clock = Arc::new(InstantClock::new());
        let config = AdcConfig::default();
        let lookup = LookupTable::from_rows(vec![(0.0, 0.0), (10.0, 20.0), (20.0, 40.0), (30.0, 60.0)]).unwrap();
        (Controller::new(bus, clock, config, lookup, InterpolationMethod::Pchip), h1, h2)
    }

    #[tokio::test]
    async fn parking_before_homing_is_rejected() {
        let (controller, _h1, _h2) = controller();
        controller.find_devices().await.unwrap();
        controller.connect();
        let response = controller.parking(1).await;
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn activate_out_of_bounds_reports_error_with_no_writes() {
        let (controller, _h1, _h2) = controller();
        controller.find_devices().await.unwrap();
        controller.connect();
        let response = controller.activate(31.0, 1).await;
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn status_on_invalid_motor_id_is_an_error() {
        let (controller, _h1, _h2) = controller();
        let response = controller.status(7).await;
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn happy_path_connect_activate_disconnect() {
        let (controller, h1, h2) = controller();
        controller.find_devices().await.unwrap();
        assert!(controller.connect().is_success());
        // Preload the statusword so the Profile Position poll inside
        // `move_motor` (§4.2.1 step 7) is satisfied on the first read.
        controller.bus.set_od(h1, adc_bus::OD_STATUSWORD, 0x1400);
        controller.bus.set_od(h2, adc_bus::OD_STATUSWORD, 0x1400);
        let response = controller.activate(15.0, 99).await;
        assert!(response.is_success(), "{response:?}");
        assert!(controller.disconnect().is_success());
    }

    #[tokio::test]
    async fn power_off_without_find_devices_surfaces_not_connected() {
        let (controller, _h1, _h2) = controller();
        let response = controller.power_off().await;
        assert!(!response.is_success());
    }
}
