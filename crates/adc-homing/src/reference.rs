//! Homing, parking, and zeroing (component C3).

use std::sync::Arc;

use adc_bus::{BusDriver, MotorId};
use adc_motor::{MotorEngine, PollClock};
use tracing::{info, instrument, warn};

use crate::constants::{
    BUSSTOP_SENTINEL, HOME_POLL_INTERVAL, HOME_SEARCH_TIMEOUT, PARK_OFFSET,
    SHORTEST_PATH_THRESHOLD, ZERO_OFFSET_1, ZERO_OFFSET_2,
};
use crate::error::HomingError;
use crate::ring::shortest_path_delta;

/// Recorded home-reference state for both motors, plus the two engines used
/// to drive them.
///
/// Mirrors the `home_known` / `home_count_1` / `home_count_2` fields of the
/// controller state in §3; parking and zeroing are only
/// permitted once `home_known()` is `true` (I3).
pub struct ReferenceManager<B: BusDriver> {
    motor_1: Arc<MotorEngine<B>>,
    motor_2: Arc<MotorEngine<B>>,
    home_count_1: Option<u32>,
    home_count_2: Option<u32>,
}

fn home_count(id: MotorId, value: Option<u32>) -> Result<u32, HomingError> {
    value.ok_or_else(|| {
        warn!(%id, "home count missing despite home_known");
        HomingError::NotHomed
    })
}

impl<B: BusDriver> ReferenceManager<B> {
    /// Wraps the two motor engines, with no home reference recorded yet.
    #[must_use]
    pub fn new(motor_1: Arc<MotorEngine<B>>, motor_2: Arc<MotorEngine<B>>) -> Self {
        Self {
            motor_1,
            motor_2,
            home_count_1: None,
            home_count_2: None,
        }
    }

    /// `true` iff both home counts are recorded (I2).
    #[must_use]
    pub fn home_known(&self) -> bool {
        self.home_count_1.is_some() && self.home_count_2.is_some()
    }

    /// The recorded home counts, if homing has completed.
    #[must_use]
    pub fn home_counts(&self) -> Option<(u32, u32)> {
        Some((self.home_count_1?, self.home_count_2?))
    }

    /// Clears the recorded home reference, e.g. after the bus is closed
    /// (I2: home_known requires no intervening bus close).
    pub fn forget_home(&mut self) {
        self.home_count_1 = None;
        self.home_count_2 = None;
    }

    /// Discovers (or returns to) the home reference for both motors.
    ///
    /// If no home is known yet, each motor is checked against the
    /// bus-stop sentinel (§4.3.1); a motor already at its sensor skips the
    /// search. Once both motors have settled, their position actual values
    /// are recorded as the home counts and `home_known()` becomes `true`.
    ///
    /// If a home is already known, this instead returns each motor to its
    /// recorded home count via the shortest-path delta (P2: a second
    /// `homing()` call with no intervening motion produces a zero delta).
    #[instrument(skip(self, clock), fields(velocity = vel))]
    pub async fn homing<C: PollClock>(&mut self, vel: u32, clock: &C) -> Result<(), HomingError> {
        if self.home_known() {
            info!("home already known, returning to home");
            let (home_1, home_2) = self.home_counts().expect("home_known just checked");
            for (motor, home) in [(&self.motor_1, home_1), (&self.motor_2, home_2)] {
                let current = motor.read_position()?;
                let delta = shortest_path_delta(current, home);
                if delta.abs() >= SHORTEST_PATH_THRESHOLD {
                    motor.move_motor(delta as i32, vel, clock).await?;
                }
            }
            return Ok(());
        }

        for motor in [&self.motor_1, &self.motor_2] {
            let raw = motor.read_digital_input_raw()?;
            if raw == BUSSTOP_SENTINEL {
                info!(motor = %motor.id(), "already at home sensor");
            } else {
                find_home_position(motor, vel, clock).await?;
            }
        }

        self.home_count_1 = Some(self.motor_1.read_position()?);
        self.home_count_2 = Some(self.motor_2.read_position()?);
        info!(
            home_count_1 = self.home_count_1.unwrap(),
            home_count_2 = self.home_count_2.unwrap(),
            "homing complete"
        );
        Ok(())
    }

    /// Moves each motor to its calibrated park offset from home (§4.3.2).
    ///
    /// Returns [`HomingError::NotHomed`] with no OD writes if homing has
    /// not completed (I3 / P5).
    pub async fn parking<C: PollClock>(&self, vel: u32, clock: &C) -> Result<(), HomingError> {
        if !self.home_known() {
            return Err(HomingError::NotHomed);
        }
        let home_1 = home_count(MotorId::One, self.home_count_1)?;
        let home_2 = home_count(MotorId::Two, self.home_count_2)?;
        let target_1 = offset_target(home_1, PARK_OFFSET);
        let target_2 = offset_target(home_2, PARK_OFFSET);
        move_to_target(&self.motor_1, target_1, vel, clock).await?;
        move_to_target(&self.motor_2, target_2, vel, clock).await?;
        Ok(())
    }

    /// Moves each motor to its calibrated optical-zero offset (§4.3.2).
    ///
    /// Returns [`HomingError::NotHomed`] with no OD writes if homing has
    /// not completed (I3 / P5).
    pub async fn zeroing<C: PollClock>(&self, vel: u32, clock: &C) -> Result<(), HomingError> {
        if !self.home_known() {
            return Err(HomingError::NotHomed);
        }
        let target_1 = ZERO_OFFSET_1.rem_euclid(adc_bus::POS_MOD as i64) as u32;
        let target_2 = ZERO_OFFSET_2.rem_euclid(adc_bus::POS_MOD as i64) as u32;
        move_to_target(&self.motor_1, target_1, vel, clock).await?;
        move_to_target(&self.motor_2, target_2, vel, clock).await?;
        Ok(())
    }
}

/// `(home + offset) mod POS_MOD`, as an absolute target position.
fn offset_target(home: u32, offset: i64) -> u32 {
    ((i64::from(home) + offset).rem_euclid(adc_bus::POS_MOD as i64)) as u32
}

/// Reads the current position, computes the shortest-path delta to
/// `target`, and issues the move unless it is within the "already close"
/// threshold (§4.3.2).
async fn move_to_target<B: BusDriver, C: PollClock>(
    motor: &MotorEngine<B>,
    target: u32,
    vel: u32,
    clock: &C,
) -> Result<(), HomingError> {
    let current = motor.read_position()?;
    let delta = shortest_path_delta(current, target);
    if delta.abs() >= SHORTEST_PATH_THRESHOLD {
        motor.move_motor(delta as i32, vel, clock).await?;
    } else {
        info!(motor = %motor.id(), delta, "already close, skipping move");
    }
    Ok(())
}

/// Searches for the home sensor edge on one motor (§4.3.1).
///
/// Commands a one-revolution move and polls the digital input every
/// [`HOME_POLL_INTERVAL`]; as soon as it differs from the value snapshotted
/// before the move, the motor is stopped and the search succeeds. Fails
/// with [`HomingError::Timeout`] if [`HOME_SEARCH_TIMEOUT`] elapses first,
/// halting the motor before returning.
async fn find_home_position<B: BusDriver, C: PollClock>(
    motor: &MotorEngine<B>,
    vel: u32,
    clock: &C,
) -> Result<(), HomingError> {
    let initial_raw = motor.read_digital_input_raw()?;
    motor.command_move(adc_bus::COUNTS_PER_REV as i32, vel)?;

    let max_polls = (HOME_SEARCH_TIMEOUT.as_secs_f64() / HOME_POLL_INTERVAL.as_secs_f64()).ceil() as u64;
    for _ in 0..max_polls {
        clock.sleep(HOME_POLL_INTERVAL).await;
        let raw = motor.read_digital_input_raw()?;
        if raw != initial_raw {
            motor.stop_motor()?;
            return Ok(());
        }
    }

    motor.stop_motor()?;
    Err(HomingError::Timeout(motor.id()))
}
