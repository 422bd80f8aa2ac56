//! Application configuration.
//!
//! - `timing`: Tick, loop and refresh cadence plus stripe sizing constants
//! - `board`: Runtime board profiles (display, render mode, buffers)

pub mod board;
pub mod timing;

pub use board::{
    ATOM_DISPLAY,
    BoardProfile,
    BufferConfig,
    DisplayConfig,
    LoopTiming,
    M5_CORE2,
    RenderMode,
    profile_by_name,
};
pub use timing::{
    BYTES_PER_PIXEL,
    FLUSH_RETRIES,
    GUARDED_LOOP_MS,
    REFRESH_PERIOD_MS,
    SINGLE_CONTEXT_LOOP_MS,
    STRIPE_ROWS,
    TICK_PERIOD_MS,
};
