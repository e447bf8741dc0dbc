//! Calibration constants for homing, parking, and zeroing.

use std::time::Duration;

/// Digital input sentinel value meaning "already at the home sensor"
/// (`0x3240/05`).
pub const BUSSTOP_SENTINEL: u32 = 192;

/// Calibrated offset from home used to park the prism safely.
pub const PARK_OFFSET: i64 = -500;

/// Calibrated zero (optical neutral) offset for motor 1.
pub const ZERO_OFFSET_1: i64 = 7_635;

/// Calibrated zero (optical neutral) offset for motor 2.
pub const ZERO_OFFSET_2: i64 = 1_926;

/// Wall-clock budget for `find_home_position` before it fails with a
/// timeout.
pub const HOME_SEARCH_TIMEOUT: Duration = Duration::from_secs(300);

/// Interval between digital-input polls during homing.
pub const HOME_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Below this many counts, a parking/zeroing move is skipped as "already
/// close" rather than issued.
pub const SHORTEST_PATH_THRESHOLD: i64 = 10;
