//! Animation timeline.
//!
//! An [`Animation`] maps elapsed milliseconds to an integer value. One cycle
//! of the timeline looks like this:
//!
//! ```text
//! | delay | forward (duration) | playback delay | playback | repeat delay |
//!   start    start -> end          hold end       end -> start  hold
//! ```
//!
//! The initial delay happens once; the rest repeats `repeat` times. The
//! playback segments are skipped when `playback_ms` is zero. A finite
//! animation ends after its last playback (or forward run), without the
//! trailing repeat delay, and then holds its final value.
//!
//! The value is a pure function of elapsed time, so evaluating it at a
//! coarser cadence than the tick never accumulates drift.
//!
//! # Interpolation
//!
//! Progress is mapped to 0..=1024 and shaped by the [`Path`]:
//!
//! ```text
//! value = start + (path(progress) * (end - start)) >> 10
//! ```
//!
//! The ease curves are cubic Bezier curves evaluated in the same 10-bit
//! fixed point, so there is no float math on the hot path.

/// Fixed-point scale of animation progress.
const PROGRESS_MAX: i64 = 1024;

/// How often the timeline repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Repeat {
    /// Run this many cycles (at least one is always run).
    Count(u16),
    /// Run forever.
    Infinite,
}

/// Shape of the interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Path {
    /// Constant speed.
    #[default]
    Linear,
    /// Slow start.
    EaseIn,
    /// Slow end.
    EaseOut,
    /// Slow start and end.
    EaseInOut,
    /// Hold the start value, jump to the end value when the run completes.
    Step,
}

impl Path {
    /// Shape `progress` (0..=1024).
    fn apply(
        self,
        progress: i64,
    ) -> i64 {
        match self {
            Self::Linear => progress,
            Self::EaseIn => bezier3(progress, 0, 50, 100, 1024),
            Self::EaseOut => bezier3(progress, 0, 900, 950, 1024),
            Self::EaseInOut => bezier3(progress, 0, 50, 952, 1024),
            Self::Step => {
                if progress >= PROGRESS_MAX {
                    PROGRESS_MAX
                } else {
                    0
                }
            }
        }
    }
}

/// Cubic Bezier in 10-bit fixed point.
fn bezier3(
    t: i64,
    u0: i64,
    u1: i64,
    u2: i64,
    u3: i64,
) -> i64 {
    let rem = PROGRESS_MAX - t;
    let rem2 = (rem * rem) >> 10;
    let rem3 = (rem2 * rem) >> 10;
    let t2 = (t * t) >> 10;
    let t3 = (t2 * t) >> 10;

    let v1 = (rem3 * u0) >> 10;
    let v2 = (3 * rem2 * t * u1) >> 20;
    let v3 = (3 * rem * t2 * u2) >> 20;
    let v4 = (t3 * u3) >> 10;
    v1 + v2 + v3 + v4
}

/// Value between `start` and `end` after `elapsed` of `time` milliseconds.
fn interpolate(
    start: i32,
    end: i32,
    elapsed: u32,
    time: u32,
    path: Path,
) -> i32 {
    if time == 0 || elapsed >= time {
        return end;
    }
    let progress = elapsed as i64 * PROGRESS_MAX / time as i64;
    let step = path.apply(progress);
    let delta = end as i64 - start as i64;
    (start as i64 + ((step * delta) >> 10)) as i32
}

// =============================================================================
// Animation
// =============================================================================

/// Timeline from `start` to `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Animation {
    pub start: i32,
    pub end: i32,
    /// Forward run length.
    pub duration_ms: u32,
    /// One-time delay before the first cycle. The start value is applied
    /// during the delay.
    pub delay_ms: u32,
    /// Length of the run back to `start`; zero disables playback.
    pub playback_ms: u32,
    /// Hold at `end` before playback.
    pub playback_delay_ms: u32,
    /// Hold between cycles.
    pub repeat_delay_ms: u32,
    pub repeat: Repeat,
    pub path: Path,
}

impl Animation {
    /// Single linear run from `start` to `end`.
    pub const fn new(
        start: i32,
        end: i32,
        duration_ms: u32,
    ) -> Self {
        Self {
            start,
            end,
            duration_ms,
            delay_ms: 0,
            playback_ms: 0,
            playback_delay_ms: 0,
            repeat_delay_ms: 0,
            repeat: Repeat::Count(1),
            path: Path::Linear,
        }
    }

    pub const fn with_delay(
        mut self,
        delay_ms: u32,
    ) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Run back to `start` over `playback_ms` after holding `delay_ms`.
    pub const fn with_playback(
        mut self,
        playback_ms: u32,
        delay_ms: u32,
    ) -> Self {
        self.playback_ms = playback_ms;
        self.playback_delay_ms = delay_ms;
        self
    }

    pub const fn with_repeat(
        mut self,
        repeat: Repeat,
        delay_ms: u32,
    ) -> Self {
        self.repeat = repeat;
        self.repeat_delay_ms = delay_ms;
        self
    }

    pub const fn with_path(
        mut self,
        path: Path,
    ) -> Self {
        self.path = path;
        self
    }

    /// Length of one full cycle including its repeat delay.
    pub const fn cycle_ms(&self) -> u32 { self.active_ms().saturating_add(self.repeat_delay_ms) }

    /// Length of one cycle without the repeat delay.
    const fn active_ms(&self) -> u32 {
        if self.playback_ms > 0 {
            self.playback_start_ms().saturating_add(self.playback_ms)
        } else {
            self.duration_ms
        }
    }

    /// Offset of the playback run within a cycle.
    const fn playback_start_ms(&self) -> u32 { self.duration_ms.saturating_add(self.playback_delay_ms) }

    /// Value once a finite animation has completed.
    const fn final_value(&self) -> i32 {
        if self.playback_ms > 0 { self.start } else { self.end }
    }

    /// `true` once a finite animation has completed. Infinite animations
    /// never finish.
    pub fn is_finished(
        &self,
        elapsed_ms: u32,
    ) -> bool {
        match self.repeat {
            Repeat::Infinite => false,
            Repeat::Count(count) => {
                let Some(t) = elapsed_ms.checked_sub(self.delay_ms) else {
                    return false;
                };
                let cycles = count.max(1) as u64;
                let total = cycles * self.cycle_ms() as u64 - self.repeat_delay_ms as u64;
                t as u64 >= total
            }
        }
    }

    /// Value `elapsed_ms` after the animation was started.
    pub fn value_at(
        &self,
        elapsed_ms: u32,
    ) -> i32 {
        let Some(t) = elapsed_ms.checked_sub(self.delay_ms) else {
            return self.start;
        };
        if self.is_finished(elapsed_ms) {
            return self.final_value();
        }

        let cycle = self.cycle_ms();
        if cycle == 0 {
            return self.final_value();
        }
        let p = t % cycle;

        if p < self.duration_ms {
            return interpolate(self.start, self.end, p, self.duration_ms, self.path);
        }
        if self.playback_ms == 0 {
            return self.end;
        }

        let playback_start = self.playback_start_ms();
        if p < playback_start {
            return self.end;
        }
        if p < playback_start.saturating_add(self.playback_ms) {
            return interpolate(self.end, self.start, p - playback_start, self.playback_ms, self.path);
        }
        self.start
    }
}

// =============================================================================
// Tests
// =============================================================================
