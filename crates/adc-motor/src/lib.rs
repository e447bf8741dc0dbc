//! Per-motor CiA-402 Profile Position sequencing (component C2).
//!
//! [`MotorEngine`] drives one motor through the `0x6040`/`0x6041` control
//! word handshake over an [`adc_bus::BusDriver`], and halts it via
//! `stop_motor`. All OD reads/writes for a single motor are issued
//! strictly sequentially, in the exact order required by CiA-402 (§5);
//! nothing here reorders or batches writes across motors.

mod clock;
mod engine;
mod error;
mod report;

pub use clock::{test_util, PollClock, RealClock};
pub use engine::{MotorEngine, DEFAULT_VELOCITY};
pub use error::MotorError;
pub use report::{MoveReport, StopReport, StopStatus};

#[cfg(test)]
mod tests {
    use super::*;
    use adc_bus::sim::SimulatedBus;
    use adc_bus::{BusError, MotorId, OD_STATUSWORD};
    use std::sync::Arc;

    use clock::test_util::InstantClock;

    fn engine_pair() -> (Arc<SimulatedBus>, MotorEngine<SimulatedBus>, MotorEngine<SimulatedBus>) {
        let (bus, h1, h2) = SimulatedBus::with_two_devices();
        let bus = Arc::new(bus);
        let m1 = MotorEngine::new(Arc::clone(&bus), MotorId::One, h1);
        let m2 = MotorEngine::new(Arc::clone(&bus), MotorId::Two, h2);
        (bus, m1, m2)
    }

    #[tokio::test]
    async fn move_on_unconnected_motor_issues_no_writes() {
        let (bus, m1, _m2) = engine_pair();
        let clock = InstantClock::new();
        let err = m1.move_motor(100, 5, &clock).await.unwrap_err();
        assert!(matches!(err, MotorError::NotConnected));
        assert_eq!(bus.write_count(), 0);
    }

    #[tokio::test]
    async fn move_motor_waits_for_target_reached_bit() {
        let (bus, m1, _m2) = engine_pair();
        m1.connect().unwrap();
        // Two "not yet" polls before the target-reached/ack bits appear.
        bus.queue_reads(m1.handle(), OD_STATUSWORD, [0x0000, 0x0400, 0x1400]);
        let clock = InstantClock::new();
        let report = m1.move_motor(-1350, 5, &clock).await.unwrap();
        assert_eq!(clock.ticks(), 2, "should have slept between the two non-terminal polls");
        assert_eq!(report.initial_position, 0);
        // target position write committed as the signed relative delta
        let writes = bus.writes(m1.handle());
        assert!(writes.contains(&(adc_bus::OD_TARGET_POSITION, -1350)));
        assert!(writes.contains(&(adc_bus::OD_CONTROLWORD, 0x5F)));
    }

    #[tokio::test]
    async fn move_motor_reports_position_change() {
        let (bus, m1, _m2) = engine_pair();
        m1.connect().unwrap();
        bus.set_od(m1.handle(), adc_bus::OD_POSITION_ACTUAL_VALUE, 1_000);
        bus.queue_reads(m1.handle(), OD_STATUSWORD, [0x1400]);
        // After the move, position_actual_value would be updated by the
        // (simulated) drive to initial + delta.
        bus.queue_reads(
            m1.handle(),
            adc_bus::OD_POSITION_ACTUAL_VALUE,
            [1_000, 1_150],
        );
        let clock = InstantClock::new();
        let report = m1.move_motor(150, 5, &clock).await.unwrap();
        assert_eq!(report.initial_position, 1_000);
        assert_eq!(report.final_position, 1_150);
        assert_eq!(report.position_change, 150);
    }

    #[test]
    fn stop_motor_success_on_halt_ack() {
        let (bus, m1, _m2) = engine_pair();
        m1.connect().unwrap();
        bus.set_od(m1.handle(), OD_STATUSWORD, 0x8000);
        let report = m1.stop_motor().unwrap();
        assert!(report.is_success());
        assert_eq!(report.error_code, None);
        let writes = bus.writes(m1.handle());
        assert_eq!(
            writes,
            vec![
                (adc_bus::OD_CONTROLWORD, 0x1F),
                (adc_bus::OD_CONTROLWORD, 0x01),
            ]
        );
    }

    #[test]
    fn stop_motor_failure_carries_raw_status() {
        let (bus, m1, _m2) = engine_pair();
        m1.connect().unwrap();
        bus.set_od(m1.handle(), OD_STATUSWORD, 0x0040);
        let report = m1.stop_motor().unwrap();
        assert!(!report.is_success());
        assert_eq!(report.error_code, Some(0x0040));
    }

    #[tokio::test]
    async fn transport_failure_propagates_and_aborts_sequence() {
        let (bus, m1, _m2) = engine_pair();
        m1.connect().unwrap();
        bus.fail_next_write(m1.handle(), BusError::Transport("noise".into()));
        let clock = InstantClock::new();
        let err = m1.move_motor(10, 5, &clock).await.unwrap_err();
        assert!(matches!(err, MotorError::Bus(BusError::Transport(_))));
        // The failing write was the very first one (modes-of-operation);
        // nothing past it should have been issued.
        assert_eq!(bus.write_count(), 0);
    }
}
