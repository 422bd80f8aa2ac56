//! Timing and buffer sizing constants.
//!
//! The values come from the gauge demo's reference configuration: a 1 ms
//! tick, a 5 ms loop quantum when rendering shares the setup context and
//! 10 ms when it runs in its own guarded task, and stripe buffers of ten
//! display rows.

// =============================================================================
// Tick Source
// =============================================================================

/// Period of the tick source in milliseconds. Each tick event advances the
/// tick counter by exactly this amount.
pub const TICK_PERIOD_MS: u32 = 1;

// =============================================================================
// Render Loop
// =============================================================================

/// Loop quantum when the render loop runs in the setup context (no guard).
pub const SINGLE_CONTEXT_LOOP_MS: u32 = 5;

/// Loop quantum when the render loop runs in a dedicated, guarded task.
pub const GUARDED_LOOP_MS: u32 = 10;

/// Minimum time between two redraws. Animations are still evaluated on every
/// cycle; only the pixel work is throttled.
pub const REFRESH_PERIOD_MS: u32 = 30;

/// How many times a failed stripe write is retried before it is dropped.
pub const FLUSH_RETRIES: u8 = 1;

// =============================================================================
// Frame Buffers
// =============================================================================

/// Rows per stripe buffer. A buffer holds `width * STRIPE_ROWS` pixels.
pub const STRIPE_ROWS: u16 = 10;

/// Bytes per pixel in the stripe buffers (RGB565).
pub const BYTES_PER_PIXEL: usize = 2;
