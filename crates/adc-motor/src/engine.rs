//! Per-motor CiA-402 Profile Position sequencing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use adc_bus::{
    BusDriver, Handle, MotorId, OdBits, OD_CONTROLWORD, OD_POSITION_ACTUAL_VALUE,
    OD_PROFILE_VELOCITY, OD_STATUSWORD, OD_TARGET_POSITION,
};
use tracing::{debug, info, instrument};

use crate::clock::PollClock;
use crate::error::MotorError;
use crate::report::{MoveReport, StopReport, StopStatus};

/// Statusword mask for "target reached" (bit 10) combined with "set-point
/// acknowledged" (bit 12), per CiA-402.
const STATUS_TARGET_REACHED_AND_ACK: u32 = 0x1400;

/// Statusword mask for "halt acknowledged" / voltage disabled after a
/// quick-stop, per CiA-402.
const STATUS_HALT_ACK: u32 = 0x8000;

/// Profile Position mode value for `0x6060/00`.
const MODE_PROFILE_POSITION: i64 = 1;

/// Controlword values of the shutdown -> switch-on -> enable-operation
/// sequence (§4.2.1 step 5).
const CW_SHUTDOWN: i64 = 0x06;
const CW_SWITCH_ON: i64 = 0x07;
const CW_ENABLE_OPERATION: i64 = 0x0F;
/// Controlword set-point trigger: enable + new set-point + immediate change.
const CW_NEW_SETPOINT: i64 = 0x5F;
/// Controlword halt bit set, operation still enabled.
const CW_HALT: i64 = 0x1F;
/// Controlword quick-stop request.
const CW_QUICK_STOP: i64 = 0x01;

/// The velocity (vendor-scaled units) used when a caller does not specify
/// one; the orchestrator in `adc-core` clamps the velocity it actually
/// passes down (§4.4.2), so this default is mostly a documentation aid.
pub const DEFAULT_VELOCITY: u32 = 1000;

/// Drives one motor through the CiA-402 Profile Position control word
/// sequence over a [`BusDriver`].
///
/// Generic over the bus so this crate carries no vendor-specific code;
/// `B` is typically `adc_bus::sim::SimulatedBus` in tests and a real vendor
/// wrapper in production.
pub struct MotorEngine<B: BusDriver> {
    bus: Arc<B>,
    id: MotorId,
    handle: Handle,
    connected: AtomicBool,
}

impl<B: BusDriver> MotorEngine<B> {
    /// Wraps `handle` as `id`, initially disconnected.
    pub fn new(bus: Arc<B>, id: MotorId, handle: Handle) -> Self {
        Self {
            bus,
            id,
            handle,
            connected: AtomicBool::new(false),
        }
    }

    /// The motor this engine drives.
    #[must_use]
    pub fn id(&self) -> MotorId {
        self.id
    }

    /// The bus handle this engine drives.
    #[must_use]
    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// Whether the most recent `connect` succeeded without an intervening
    /// `disconnect` (invariant I1).
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Opens the connection on this motor's handle.
    #[instrument(skip(self), fields(motor = %self.id))]
    pub fn connect(&self) -> Result<(), MotorError> {
        self.bus.connect(self.handle)?;
        self.connected.store(true, Ordering::Release);
        info!("connected");
        Ok(())
    }

    /// Closes the connection on this motor's handle.
    #[instrument(skip(self), fields(motor = %self.id))]
    pub fn disconnect(&self) -> Result<(), MotorError> {
        self.bus.disconnect(self.handle)?;
        self.connected.store(false, Ordering::Release);
        info!("disconnected");
        Ok(())
    }

    /// Reads the raw CiA-402 statusword (`0x6041/00`).
    pub fn read_status(&self) -> Result<u32, MotorError> {
        Ok(self.bus.read_number(self.handle, OD_STATUSWORD)?)
    }

    /// Reads the position actual value (`0x6064/00`).
    pub fn read_position(&self) -> Result<u32, MotorError> {
        Ok(self.bus.read_number(self.handle, OD_POSITION_ACTUAL_VALUE)?)
    }

    /// Issues the CiA-402 command sequence for one Profile Position move
    /// (§4.2.1 steps 1-6) without waiting for the target-reached bit, and
    /// returns the position actual value read just before the target was
    /// written.
    ///
    /// `target_delta` is a **signed relative offset** applied from the
    /// current position (the resolved convention of the open design
    /// question in §4.2.3), written to `0x607A/00` and
    /// committed with controlword `0x5F` (new set-point, not an absolute
    /// move).
    ///
    /// This is split out of [`MotorEngine::move_motor`] so
    /// `adc-homing`'s `find_home_position` can command a move and then
    /// race it against a digital-input poll, rather than blocking on
    /// target-reached the way a plain move does.
    ///
    /// Issues zero OD writes and returns `Err(MotorError::NotConnected)` if
    /// this motor is not connected (I5 / P5).
    pub fn command_move(&self, target_delta: i32, velocity: u32) -> Result<u32, MotorError> {
        if !self.is_connected() {
            return Err(MotorError::NotConnected);
        }
        let h = self.handle;

        self.bus
            .write_number(h, MODE_PROFILE_POSITION, adc_bus::OD_MODES_OF_OPERATION, OdBits::Eight)?;
        self.bus
            .write_number(h, i64::from(velocity), OD_PROFILE_VELOCITY, OdBits::ThirtyTwo)?;

        let initial_position = self.bus.read_number(h, OD_POSITION_ACTUAL_VALUE)?;

        self.bus.write_number(
            h,
            i64::from(target_delta),
            OD_TARGET_POSITION,
            OdBits::ThirtyTwo,
        )?;

        for command in [CW_SHUTDOWN, CW_SWITCH_ON, CW_ENABLE_OPERATION] {
            self.bus
                .write_number(h, command, OD_CONTROLWORD, OdBits::Sixteen)?;
        }
        self.bus
            .write_number(h, CW_NEW_SETPOINT, OD_CONTROLWORD, OdBits::Sixteen)?;

        Ok(initial_position)
    }

    /// Polls the statusword at `clock.poll_interval()` until target-reached
    /// and set-point-acknowledged are both set (P7).
    pub async fn wait_until_target_reached<C: PollClock>(&self, clock: &C) -> Result<(), MotorError> {
        loop {
            let status = self.bus.read_number(self.handle, OD_STATUSWORD)?;
            debug!(status_word = format_args!("{status:#06x}"), "polled statusword");
            if status & STATUS_TARGET_REACHED_AND_ACK == STATUS_TARGET_REACHED_AND_ACK {
                return Ok(());
            }
            clock.sleep(clock.poll_interval()).await;
        }
    }

    /// Reads the raw digital input word (`0x3240/05`) used for homing
    /// sensor readback.
    pub fn read_digital_input_raw(&self) -> Result<u32, MotorError> {
        Ok(self
            .bus
            .read_number(self.handle, adc_bus::OD_DIGITAL_INPUT_RAW)?)
    }

    /// Drives this motor through one Profile Position move, end to end:
    /// commands the move, then does not return until the statusword
    /// reports target-reached and set-point-acknowledged (P7).
    #[instrument(skip(self, clock), fields(motor = %self.id, target_delta, velocity))]
    pub async fn move_motor<C: PollClock>(
        &self,
        target_delta: i32,
        velocity: u32,
        clock: &C,
    ) -> Result<MoveReport, MotorError> {
        let start = Instant::now();
        let initial_position = self.command_move(target_delta, velocity)?;
        self.wait_until_target_reached(clock).await?;
        let final_position = self.bus.read_number(self.handle, OD_POSITION_ACTUAL_VALUE)?;
        let report = MoveReport {
            initial_position,
            final_position,
            position_change: i64::from(final_position) - i64::from(initial_position),
            execution_time: start.elapsed(),
        };
        info!(?report, "move complete");
        Ok(report)
    }

    /// Halts this motor via the controlword (§4.2.2): sets the halt bit,
    /// then requests a quick-stop, then reads back the statusword once.
    #[instrument(skip(self), fields(motor = %self.id))]
    pub fn stop_motor(&self) -> Result<StopReport, MotorError> {
        if !self.is_connected() {
            return Err(MotorError::NotConnected);
        }
        let h = self.handle;
        self.bus
            .write_number(h, CW_HALT, OD_CONTROLWORD, OdBits::Sixteen)?;
        self.bus
            .write_number(h, CW_QUICK_STOP, OD_CONTROLWORD, OdBits::Sixteen)?;
        let status = self.bus.read_number(h, OD_STATUSWORD)?;
        let acknowledged = status & STATUS_HALT_ACK != 0;
        let report = StopReport {
            status: StopStatus { acknowledged },
            error_code: if acknowledged { None } else { Some(status) },
        };
        info!(?report, "stop complete");
        Ok(report)
    }
}
