//! Sensor-edge homing and home/park/zero reference management (component
//! C3).
//!
//! [`ReferenceManager`] discovers an absolute reference via each motor's
//! digital input, records per-motor home counts, and derives bounded
//! park/zero motions from them using the shortest-path delta on the 32-bit
//! position ring ([`ring::shortest_path_delta`]) — the policy that replaces
//! the source's buggy wrap-around heuristic (see §9).

pub mod constants;
mod error;
mod reference;
pub mod ring;

pub use error::HomingError;
pub use reference::ReferenceManager;
pub use ring::shortest_path_delta;

#[cfg(test)]
mod tests {
    use super::*;
    use adc_bus::sim::SimulatedBus;
    use adc_bus::{MotorId, OD_DIGITAL_INPUT_RAW, OD_POSITION_ACTUAL_VALUE, OD_STATUSWORD};
    use adc_motor::test_util::InstantClock;
    use adc_motor::MotorEngine;
    use std::sync::Arc;

    fn manager() -> (Arc<SimulatedBus>, ReferenceManager<SimulatedBus>, adc_bus::Handle, adc_bus::Handle) {
        let (bus, h1, h2) = SimulatedBus::with_two_devices();
        let bus = Arc::new(bus);
        let m1 = Arc::new(MotorEngine::new(Arc::clone(&bus), MotorId::One, h1));
        let m2 = Arc::new(MotorEngine::new(Arc::clone(&bus), MotorId::Two, h2));
        m1.connect().unwrap();
        m2.connect().unwrap();
        let rm = ReferenceManager::new(m1, m2);
        (bus, rm, h1, h2)
    }

    #[tokio::test]
    async fn parking_before_homing_is_rejected_with_no_writes() {
        let (bus, rm, _h1, _h2) = manager();
        let clock = InstantClock::new();
        let err = rm.parking(1, &clock).await.unwrap_err();
        assert!(matches!(err, HomingError::NotHomed));
        assert_eq!(bus.write_count(), 0);
    }

    #[tokio::test]
    async fn zeroing_before_homing_is_rejected_with_no_writes() {
        let (bus, rm, _h1, _h2) = manager();
        let clock = InstantClock::new();
        let err = rm.zeroing(1, &clock).await.unwrap_err();
        assert!(matches!(err, HomingError::NotHomed));
        assert_eq!(bus.write_count(), 0);
    }

    #[tokio::test]
    async fn homing_skips_motors_already_at_the_sensor() {
        let (bus, mut rm, h1, h2) = manager();
        bus.set_od(h1, OD_DIGITAL_INPUT_RAW, 192);
        bus.set_od(h2, OD_DIGITAL_INPUT_RAW, 192);
        bus.set_od(h1, OD_POSITION_ACTUAL_VALUE, 500);
        bus.set_od(h2, OD_POSITION_ACTUAL_VALUE, 700);
        let clock = InstantClock::new();
        rm.homing(1, &clock).await.unwrap();
        assert!(rm.home_known());
        assert_eq!(rm.home_counts(), Some((500, 700)));
        assert_eq!(bus.write_count(), 0, "no move was needed");
    }

    #[tokio::test]
    async fn homing_searches_when_not_already_at_sensor() {
        let (bus, mut rm, h1, h2) = manager();
        // Both motors start away from the sensor; the digital input flips
        // after a couple of polls once the search move is underway.
        bus.set_od(h1, OD_DIGITAL_INPUT_RAW, 0);
        bus.queue_reads(h1, OD_DIGITAL_INPUT_RAW, [0, 0, 7]);
        bus.set_od(h2, OD_DIGITAL_INPUT_RAW, 0);
        bus.queue_reads(h2, OD_DIGITAL_INPUT_RAW, [0, 7]);
        bus.set_od(h1, OD_POSITION_ACTUAL_VALUE, 300);
        bus.set_od(h2, OD_POSITION_ACTUAL_VALUE, 600);
        bus.set_od(h1, OD_STATUSWORD, 0x8000);
        bus.set_od(h2, OD_STATUSWORD, 0x8000);
        let clock = InstantClock::new();
        rm.homing(1, &clock).await.unwrap();
        assert!(rm.home_known());
        assert_eq!(rm.home_counts(), Some((300, 600)));
        // Each found-home search ends with a stop_motor halt sequence.
        assert!(bus.writes(h1).contains(&(adc_bus::OD_CONTROLWORD, 0x1F)));
        assert!(bus.writes(h2).contains(&(adc_bus::OD_CONTROLWORD, 0x1F)));
    }

    #[tokio::test]
    async fn homing_times_out_when_sensor_never_changes() {
        let (bus, mut rm, h1, h2) = manager();
        bus.set_od(h1, OD_DIGITAL_INPUT_RAW, 0);
        bus.set_od(h2, OD_DIGITAL_INPUT_RAW, 0);
        bus.set_od(h1, OD_STATUSWORD, 0x8000);
        bus.set_od(h2, OD_STATUSWORD, 0x8000);
        let clock = InstantClock::new();
        let err = rm.homing(1, &clock).await.unwrap_err();
        assert!(matches!(err, HomingError::Timeout(MotorId::One)));
        // find_home_position must have halted motor 1 before returning the
        // timeout: the halt controlword sequence was issued.
        assert!(bus.writes(h1).contains(&(adc_bus::OD_CONTROLWORD, 0x1F)));
    }

    #[tokio::test]
    async fn second_homing_call_is_idempotent_with_no_motion() {
        let (bus, mut rm, h1, h2) = manager();
        bus.set_od(h1, OD_DIGITAL_INPUT_RAW, 192);
        bus.set_od(h2, OD_DIGITAL_INPUT_RAW, 192);
        bus.set_od(h1, OD_POSITION_ACTUAL_VALUE, 500);
        bus.set_od(h2, OD_POSITION_ACTUAL_VALUE, 700);
        let clock = InstantClock::new();
        rm.homing(1, &clock).await.unwrap();
        let writes_before = bus.write_count();
        rm.homing(1, &clock).await.unwrap();
        assert_eq!(
            bus.write_count(),
            writes_before,
            "P2: nothing moved, so the second homing call issues no writes"
        );
    }

    #[tokio::test]
    async fn parking_skips_moves_within_the_already_close_threshold() {
        let (bus, mut rm, h1, h2) = manager();
        bus.set_od(h1, OD_DIGITAL_INPUT_RAW, 192);
        bus.set_od(h2, OD_DIGITAL_INPUT_RAW, 192);
        // Park target is home - 500; place the motor already 5 counts away.
        bus.set_od(h1, OD_POSITION_ACTUAL_VALUE, 1_000);
        bus.set_od(h2, OD_POSITION_ACTUAL_VALUE, 2_000);
        let clock = InstantClock::new();
        rm.homing(1, &clock).await.unwrap();
        // Home counts are now 1000 and 2000; park targets are 500 and 1500.
        bus.set_od(h1, OD_POSITION_ACTUAL_VALUE, 505);
        bus.set_od(h2, OD_POSITION_ACTUAL_VALUE, 1_495);
        let writes_before = bus.write_count();
        rm.parking(1, &clock).await.unwrap();
        assert_eq!(bus.write_count(), writes_before, "within threshold, no move issued");
    }
}
