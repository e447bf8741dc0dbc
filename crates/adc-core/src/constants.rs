//! Calibration and dispatch constants owned by the orchestrator layer.
//!
//! Position-space constants (`POS_MOD`, `COUNTS_PER_REV`, `COUNTS_PER_DEG`)
//! live in `adc-bus`; homing/parking/zeroing constants live in
//! `adc-homing::constants`. This module holds the constants that are only
//! meaningful once both motors are being driven together.

/// Upper clamp applied to any velocity passed to `activate` (§4.4.2).
pub const MAX_VELOCITY: u32 = 5;

/// Lower clamp applied to any velocity passed to `activate` (§4.4.2):
/// a non-positive `vel_set` is raised to this floor.
pub const MIN_VELOCITY: u32 = 1;

/// `selected_bus_index` used when no configuration file is present or the
/// file fails to parse (§6/§7: config load failures are non-fatal).
pub const DEFAULT_BUS_INDEX: u32 = 1;

/// Minimum number of rows a lookup table file must contain (§6).
pub const LOOKUP_MIN_ROWS: usize = 4;
