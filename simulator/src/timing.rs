//! Timing constants for the simulator.
//!
//! The render loop runs on virtual time: the pacer advances the tick
//! counter instead of sleeping, so a ten-second run finishes immediately
//! and produces the same frames on every machine.

/// Virtual run length when no duration is given on the command line.
pub const DEFAULT_RUN_MS: u32 = 6_000;

/// Virtual time between two PNG snapshots.
pub const SNAPSHOT_INTERVAL_MS: u32 = 250;

/// Virtual time between two statistics lines.
pub const STATS_INTERVAL_MS: u32 = 1_000;

/// Directory snapshots are written to.
pub const SNAPSHOT_DIR: &str = "snapshots";
