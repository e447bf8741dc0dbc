//! Position-space constants shared by every layer above the bus facade.

/// Size of the 32-bit unsigned position ring (`2^32`).
pub const POS_MOD: u64 = 1u64 << 32;

/// Encoder counts in one full mechanical revolution.
pub const COUNTS_PER_REV: u32 = 16_200;

/// Encoder counts per degree (`COUNTS_PER_REV / 360`).
pub const COUNTS_PER_DEG: u32 = COUNTS_PER_REV / 360;
