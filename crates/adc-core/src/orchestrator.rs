//! Dual-motor orchestration: ZA→counts conversion and parallel per-motor
//! dispatch with error isolation (component C4, §4.4).

use std::sync::Arc;

use adc_bus::{BusDriver, MotorId, COUNTS_PER_DEG};
use adc_motor::{MotorEngine, MotorError, MoveReport, PollClock, StopReport};
use serde::Serialize;
use tracing::warn;

use crate::constants::{MAX_VELOCITY, MIN_VELOCITY};
use crate::error::ControllerError;

/// `degree_to_count(deg) = round(deg * COUNTS_PER_DEG)` (§4.4.1), returned
/// as a signed count since a prism angle may be negative.
#[must_use]
pub fn degree_to_count(deg: f64) -> i64 {
    (deg * f64::from(COUNTS_PER_DEG)).round() as i64
}

/// Clamps a caller-supplied velocity into `[MIN_VELOCITY, MAX_VELOCITY]`
/// (§4.4.2): non-positive raises to the floor, anything above the ceiling
/// is clamped down with a warning (P4).
#[must_use]
pub fn sanitize_velocity(vel_set: i32) -> u32 {
    if vel_set < MIN_VELOCITY as i32 {
        MIN_VELOCITY
    } else if vel_set > MAX_VELOCITY as i32 {
        warn!(requested = vel_set, clamped = MAX_VELOCITY, "velocity clamped to ceiling");
        MAX_VELOCITY
    } else {
        vel_set as u32
    }
}

/// Converts a count (which may overflow the `i32` a CiA-402 relative
/// target position is written as) down to `i32`, saturating rather than
/// panicking; counts of this magnitude never occur on a 16_200-count ring
/// in practice, but this keeps the conversion total.
fn as_target_delta(count: i64) -> i32 {
    count.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// One motor's outcome from a dispatched move.
#[derive(Debug, Clone, Serialize)]
pub struct MotorOutcome {
    /// Which motor this outcome belongs to.
    pub motor_id: i32,
    /// `Ok` with the move report, or `Err` with the failure message.
    #[serde(flatten)]
    pub result: OutcomeResult<MoveReport>,
}

/// One motor's outcome from a dispatched stop.
#[derive(Debug, Clone, Serialize)]
pub struct StopOutcomeInner {
    /// Which motor this outcome belongs to.
    pub motor_id: i32,
    /// `Ok` with the stop report, or `Err` with the failure message.
    #[serde(flatten)]
    pub result: OutcomeResult<StopReport>,
}

/// A per-motor `Result` rendered for serialization (`thiserror` enums don't
/// implement `Serialize`, so failures are flattened to their message).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum OutcomeResult<T> {
    /// The motor-level operation completed.
    Ok {
        /// The report returned by the operation.
        report: T,
    },
    /// The motor-level operation failed; the sibling motor's task was not
    /// cancelled (§4.4.2/P6).
    Err {
        /// The failure's display message.
        error: String,
    },
}

impl<T> OutcomeResult<T> {
    fn from_result(result: Result<T, MotorError>) -> Self {
        match result {
            Ok(report) => OutcomeResult::Ok { report },
            Err(err) => OutcomeResult::Err { error: err.to_string() },
        }
    }

    /// `true` iff this outcome succeeded.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, OutcomeResult::Ok { .. })
    }
}

/// The combined outcome of a dual-motor dispatch (both `activate` and a
/// `move`/`stop` with `motor_id` 0 or -1).
#[derive(Debug, Clone, Serialize)]
pub struct DualOutcome<T> {
    /// Motor 1's outcome.
    pub motor_1: T,
    /// Motor 2's outcome.
    pub motor_2: T,
}

/// The outcome of a `move` dispatch, whose shape depends on `motor_id`
/// (§4.4.3): a single motor, or both at once.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MoveOutcome {
    /// `motor_id` was `1` or `2`.
    Single(MotorOutcome),
    /// `motor_id` was `0` or `-1`.
    Dual(DualOutcome<MotorOutcome>),
}

impl MoveOutcome {
    /// `true` iff every motor outcome present succeeded (P6: the aggregate
    /// result is `error` iff at least one motor failed).
    #[must_use]
    pub fn all_ok(&self) -> bool {
        match self {
            MoveOutcome::Single(m) => m.result.is_ok(),
            MoveOutcome::Dual(d) => d.motor_1.result.is_ok() && d.motor_2.result.is_ok(),
        }
    }

    /// The raw motor ids that failed, for building an aggregate error
    /// message (§4.4.2: "the message enumerates the failing motor(s)").
    #[must_use]
    pub fn failing_motor_ids(&self) -> Vec<i32> {
        match self {
            MoveOutcome::Single(m) if !m.result.is_ok() => vec![m.motor_id],
            MoveOutcome::Single(_) => vec![],
            MoveOutcome::Dual(d) => [&d.motor_1, &d.motor_2]
                .iter()
                .filter(|m| !m.result.is_ok())
                .map(|m| m.motor_id)
                .collect(),
        }
    }
}

/// The outcome of a `stop` dispatch; shape depends on `motor_id` (§4.4.4).
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum StopOutcome {
    /// `motor_id` was `1` or `2`.
    Single(StopOutcomeInner),
    /// `motor_id` was `0`.
    Dual(DualOutcome<StopOutcomeInner>),
}

impl StopOutcome {
    /// `true` iff every motor outcome present succeeded.
    #[must_use]
    pub fn all_ok(&self) -> bool {
        match self {
            StopOutcome::Single(m) => m.result.is_ok(),
            StopOutcome::Dual(d) => d.motor_1.result.is_ok() && d.motor_2.result.is_ok(),
        }
    }
}

async fn move_one<B: BusDriver + 'static, C: PollClock + 'static>(
    motor: Arc<MotorEngine<B>>,
    clock: Arc<C>,
    target_delta: i32,
    velocity: u32,
) -> MotorOutcome {
    let motor_id = motor.id().raw();
    let result = tokio::spawn(async move { motor.move_motor(target_delta, velocity, clock.as_ref()).await })
        .await
        .unwrap_or_else(|join_err| Err(MotorError::from(join_err_to_bus(join_err))));
    MotorOutcome {
        motor_id,
        result: OutcomeResult::from_result(result),
    }
}

/// A panicked/cancelled join is reported through the same `MotorError`
/// channel as a transport failure, since both mean "this motor's outcome
/// could not be obtained" to the caller; the aggregate error isolation
/// (P6) still applies — the sibling motor's task is unaffected.
fn join_err_to_bus(err: tokio::task::JoinError) -> adc_bus::BusError {
    adc_bus::BusError::Transport(format!("motor task did not complete: {err}"))
}

async fn stop_one<B: BusDriver + 'static>(motor: Arc<MotorEngine<B>>) -> StopOutcomeInner {
    let motor_id = motor.id().raw();
    let result = tokio::task::spawn_blocking(move || motor.stop_motor())
        .await
        .unwrap_or_else(|join_err| Err(MotorError::from(join_err_to_bus(join_err))));
    StopOutcomeInner {
        motor_id,
        result: OutcomeResult::from_result(result),
    }
}

/// Dispatches `activate(za, vel_set)` (§4.4.2): evaluates the lookup table,
/// converts to counts, and drives both motors counter-rotating
/// (`motor_1 <- -pos`, `motor_2 <- +pos`) concurrently, always collecting
/// both outcomes (never cancelling the sibling on one motor's failure).
///
/// Returns `Err` only for the pre-flight `OutOfBounds` check (§4.4.1): an
/// out-of-range `za` issues zero OD writes on either motor (P5).
pub async fn activate<B: BusDriver + 'static, C: PollClock + 'static>(
    motor_1: Arc<MotorEngine<B>>,
    motor_2: Arc<MotorEngine<B>>,
    clock: Arc<C>,
    lookup: &crate::lookup::LookupTable,
    method: crate::lookup::InterpolationMethod,
    za: f64,
    vel_set: i32,
) -> Result<DualOutcome<MotorOutcome>, ControllerError> {
    let adc_deg = lookup.evaluate(za, method)?;
    let pos = degree_to_count(adc_deg);
    let vel = sanitize_velocity(vel_set);
    let target_1 = as_target_delta(-pos);
    let target_2 = as_target_delta(pos);

    let clock_2 = Arc::clone(&clock);
    let (motor_1_outcome, motor_2_outcome) = tokio::join!(
        move_one(motor_1, clock, target_1, vel),
        move_one(motor_2, clock_2, target_2, vel),
    );
    Ok(DualOutcome {
        motor_1: motor_1_outcome,
        motor_2: motor_2_outcome,
    })
}

/// Dispatches `move(motor_id, pos_count, vel_set)` (§4.4.3).
///
/// - `motor_id = 0`: both motors move to `-pos_count` simultaneously.
/// - `motor_id = -1`: counter-rotate, motor 1 to `-pos_count`, motor 2 to
///   `+pos_count`.
/// - `motor_id ∈ {1, 2}`: only that motor moves, to `-pos_count`.
///
/// Any other `motor_id` is `Err(ControllerError::InvalidMotorId)` with no
/// side effects (pre-flight, P5).
pub async fn move_dispatch<B: BusDriver + 'static, C: PollClock + 'static>(
    motor_1: Option<Arc<MotorEngine<B>>>,
    motor_2: Option<Arc<MotorEngine<B>>>,
    clock: Arc<C>,
    motor_id: i32,
    pos_count: i32,
    vel_set: i32,
) -> Result<MoveOutcome, ControllerError> {
    let vel = sanitize_velocity(vel_set);
    match motor_id {
        0 => {
            let m1 = require_motor(motor_1)?;
            let m2 = require_motor(motor_2)?;
            let clock_2 = Arc::clone(&clock);
            let (o1, o2) = tokio::join!(
                move_one(m1, clock, as_target_delta(-i64::from(pos_count)), vel),
                move_one(m2, clock_2, as_target_delta(-i64::from(pos_count)), vel),
            );
            Ok(MoveOutcome::Dual(DualOutcome { motor_1: o1, motor_2: o2 }))
        }
        -1 => {
            let m1 = require_motor(motor_1)?;
            let m2 = require_motor(motor_2)?;
            let clock_2 = Arc::clone(&clock);
            let (o1, o2) = tokio::join!(
                move_one(m1, clock, as_target_delta(-i64::from(pos_count)), vel),
                move_one(m2, clock_2, as_target_delta(i64::from(pos_count)), vel),
            );
            Ok(MoveOutcome::Dual(DualOutcome { motor_1: o1, motor_2: o2 }))
        }
        1 => {
            let m1 = require_motor(motor_1)?;
            Ok(MoveOutcome::Single(
                move_one(m1, clock, as_target_delta(-i64::from(pos_count)), vel).await,
            ))
        }
        2 => {
            let m2 = require_motor(motor_2)?;
            Ok(MoveOutcome::Single(
                move_one(m2, clock, as_target_delta(-i64::from(pos_count)), vel).await,
            ))
        }
        other => Err(ControllerError::InvalidMotorId(other)),
    }
}

/// Dispatches `stop(motor_id)` (§4.4.4).
///
/// - `motor_id = 0`: both motors stop concurrently.
/// - `motor_id ∈ {1, 2}`: only that motor stops.
///
/// Any other `motor_id` is `Err(ControllerError::InvalidMotorId)`.
pub async fn stop_dispatch<B: BusDriver + 'static>(
    motor_1: Option<Arc<MotorEngine<B>>>,
    motor_2: Option<Arc<MotorEngine<B>>>,
    motor_id: i32,
) -> Result<StopOutcome, ControllerError> {
    match motor_id {
        0 => {
            let m1 = require_motor(motor_1)?;
            let m2 = require_motor(motor_2)?;
            let (o1, o2) = tokio::join!(stop_one(m1), stop_one(m2));
            Ok(StopOutcome::Dual(DualOutcome { motor_1: o1, motor_2: o2 }))
        }
        1 => {
            let m1 = require_motor(motor_1)?;
            Ok(StopOutcome::Single(stop_one(m1).await))
        }
        2 => {
            let m2 = require_motor(motor_2)?;
            Ok(StopOutcome::Single(stop_one(m2).await))
        }
        other => Err(ControllerError::InvalidMotorId(other)),
    }
}

fn require_motor<B: BusDriver>(motor: Option<Arc<MotorEngine<B>>>) -> Result<Arc<MotorEngine<B>>, ControllerError> {
    motor.ok_or(ControllerError::Motor(MotorError::NotConnected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use adc_bus::sim::SimulatedBus;
    use adc_bus::OD_STATUSWORD;
    use adc_motor::test_util::InstantClock;
    use crate::lookup::{InterpolationMethod, LookupTable};
    use proptest::prelude::*;

    fn engines() -> (Arc<SimulatedBus>, Arc<MotorEngine<SimulatedBus>>, Arc<MotorEngine<SimulatedBus>>) {
        let (bus, h1, h2) = SimulatedBus::with_two_devices();
        let bus = Arc::new(bus);
        let m1 = Arc::new(MotorEngine::new(Arc::clone(&bus), MotorId::One, h1));
        let m2 = Arc::new(MotorEngine::new(Arc::clone(&bus), MotorId::Two, h2));
        m1.connect().unwrap();
        m2.connect().unwrap();
        bus.set_od(h1, OD_STATUSWORD, 0x1400);
        bus.set_od(h2, OD_STATUSWORD, 0x1400);
        (bus, m1, m2)
    }

    fn table() -> LookupTable {
        LookupTable::from_rows(vec![(0.0, 0.0), (10.0, 20.0), (20.0, 40.0), (30.0, 60.0)]).unwrap()
    }

    #[test]
    fn degree_to_count_rounds() {
        assert_eq!(degree_to_count(30.0), 1_350);
        assert_eq!(degree_to_count(-30.0), -1_350);
    }

    #[test]
    fn velocity_is_clamped_both_directions() {
        assert_eq!(sanitize_velocity(-5), MIN_VELOCITY);
        assert_eq!(sanitize_velocity(0), MIN_VELOCITY);
        assert_eq!(sanitize_velocity(99), MAX_VELOCITY);
        assert_eq!(sanitize_velocity(3), 3);
    }

    proptest! {
        #[test]
        fn p4_velocity_is_always_in_range(vel_set: i32) {
            let written = sanitize_velocity(vel_set);
            prop_assert!(written >= MIN_VELOCITY);
            prop_assert!(written <= MAX_VELOCITY);
        }
    }

    #[tokio::test]
    async fn activate_counter_rotates_with_clamped_velocity() {
        let (bus, m1, m2) = engines();
        let clock = Arc::new(InstantClock::new());
        let table = table();
        let outcome = activate(m1, m2, clock, &table, InterpolationMethod::Pchip, 15.0, 99)
            .await
            .unwrap();
        assert!(outcome.motor_1.result.is_ok());
        assert!(outcome.motor_2.result.is_ok());
        assert!(bus.writes(adc_bus::Handle(0)).contains(&(adc_bus::OD_TARGET_POSITION, -1350)));
        assert!(bus.writes(adc_bus::Handle(1)).contains(&(adc_bus::OD_TARGET_POSITION, 1350)));
    }

    #[tokio::test]
    async fn activate_out_of_bounds_issues_no_writes() {
        let (bus, m1, m2) = engines();
        let clock = Arc::new(InstantClock::new());
        let table = table();
        let writes_before = bus.write_count();
        let err = activate(m1, m2, clock, &table, InterpolationMethod::Pchip, 31.0, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ControllerError::Lookup(_)));
        assert_eq!(bus.write_count(), writes_before);
    }

    #[tokio::test]
    async fn activate_isolates_a_failing_motor() {
        let (bus, m1, m2) = engines();
        bus.fail_next_write(m2.handle(), adc_bus::BusError::Transport("injected".into()));
        let clock = Arc::new(InstantClock::new());
        let table = table();
        let outcome = activate(m1, m2, clock, &table, InterpolationMethod::Pchip, 15.0, 1)
            .await
            .unwrap();
        assert!(outcome.motor_1.result.is_ok(), "motor 1 unaffected by motor 2 failure");
        assert!(!outcome.motor_2.result.is_ok());
    }

    #[tokio::test]
    async fn move_minus_one_counter_rotates() {
        let (bus, m1, m2) = engines();
        let clock = Arc::new(InstantClock::new());
        let outcome = move_dispatch(Some(m1), Some(m2), clock, -1, 50, 1).await.unwrap();
        let MoveOutcome::Dual(d) = outcome else { panic!("expected dual outcome") };
        assert!(d.motor_1.result.is_ok());
        assert!(d.motor_2.result.is_ok());
        assert!(bus.writes(adc_bus::Handle(0)).contains(&(adc_bus::OD_TARGET_POSITION, -50)));
        assert!(bus.writes(adc_bus::Handle(1)).contains(&(adc_bus::OD_TARGET_POSITION, 50)));
    }

    #[tokio::test]
    async fn move_invalid_id_is_rejected_with_no_writes() {
        let (bus, m1, m2) = engines();
        let clock = Arc::new(InstantClock::new());
        let writes_before = bus.write_count();
        let err = move_dispatch(Some(m1), Some(m2), clock, 7, 50, 1).await.unwrap_err();
        assert!(matches!(err, ControllerError::InvalidMotorId(7)));
        assert_eq!(bus.write_count(), writes_before);
    }

    #[tokio::test]
    async fn stop_zero_stops_both_concurrently() {
        let (bus, m1, m2) = engines();
        bus.set_od(m1.handle(), OD_STATUSWORD, 0x8000);
        bus.set_od(m2.handle(), OD_STATUSWORD, 0x8000);
        let outcome = stop_dispatch(Some(m1), Some(m2), 0).await.unwrap();
        assert!(outcome.all_ok());
    }
}
