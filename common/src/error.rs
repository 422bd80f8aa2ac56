//! Error types for setup, flushing, widget mutation and power bring-up.
//!
//! Setup errors are fatal by convention: the firmware turns them into a
//! panic. Everything that can happen once the loop is running
//! ([`DisplayError`], [`GuiError`]) is reported and the loop keeps going.

use core::fmt;

// =============================================================================
// Setup
// =============================================================================

/// Failure during the one-time setup phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SetupError {
    /// The panel did not acknowledge initialization.
    PanelInit,
    /// A frame buffer could not be allocated.
    OutOfMemory {
        /// Bytes requested for the buffer.
        requested: usize,
        /// Bytes left in the pool at the time of the request.
        available: usize,
    },
    /// The buffer must be DMA-capable and the allocator has no such memory.
    NoDmaMemory {
        /// Bytes requested for the buffer.
        requested: usize,
    },
    /// The board profile is unusable (zero size, bad buffer count, ...).
    InvalidConfig(&'static str),
    /// The tick source could not be started.
    TickSource,
    /// Building the initial widget tree failed.
    Gui(GuiError),
}

impl fmt::Display for SetupError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::PanelInit => f.write_str("panel did not acknowledge initialization"),
            Self::OutOfMemory { requested, available } => {
                write!(f, "frame buffer allocation failed: {requested} bytes requested, {available} available")
            }
            Self::NoDmaMemory { requested } => {
                write!(f, "frame buffer allocation failed: {requested} bytes of DMA-capable memory unavailable")
            }
            Self::InvalidConfig(reason) => write!(f, "invalid board configuration: {reason}"),
            Self::TickSource => f.write_str("tick source could not be started"),
            Self::Gui(err) => write!(f, "widget tree construction failed: {err}"),
        }
    }
}

impl core::error::Error for SetupError {}

impl From<GuiError> for SetupError {
    fn from(err: GuiError) -> Self { Self::Gui(err) }
}

// =============================================================================
// Display writes
// =============================================================================

/// Steady-state failure writing a stripe to the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// The bus transfer failed.
    Transport,
    /// The transfer did not complete in time.
    Timeout,
    /// The area lies outside the panel.
    OutOfBounds,
}

impl fmt::Display for DisplayError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Transport => f.write_str("display transport write failed"),
            Self::Timeout => f.write_str("display write timed out"),
            Self::OutOfBounds => f.write_str("flush area outside the panel"),
        }
    }
}

impl core::error::Error for DisplayError {}

// =============================================================================
// Widget tree
// =============================================================================

/// Invalid operation on the widget tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GuiError {
    /// No widget with this handle exists.
    InvalidHandle,
    /// The handle refers to a different widget kind.
    WrongKind,
    /// The meter has no indicator at this index.
    IndicatorOutOfRange,
    /// A fixed-capacity table (widgets, indicators, animations, text) is full.
    Capacity,
}

impl fmt::Display for GuiError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::InvalidHandle => f.write_str("unknown widget handle"),
            Self::WrongKind => f.write_str("widget has a different kind"),
            Self::IndicatorOutOfRange => f.write_str("indicator index out of range"),
            Self::Capacity => f.write_str("widget table capacity exceeded"),
        }
    }
}

impl core::error::Error for GuiError {}

// =============================================================================
// Power bring-up
// =============================================================================

/// Failure applying a power-management register sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerError<E> {
    /// The bus transaction for `reg` failed.
    Bus {
        /// Register being accessed.
        reg: u8,
        /// Underlying bus error.
        source: E,
    },
}

impl<E: fmt::Debug> fmt::Display for PowerError<E> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Bus { reg, source } => write!(f, "power register 0x{reg:02X} access failed: {source:?}"),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for PowerError<E> {}
