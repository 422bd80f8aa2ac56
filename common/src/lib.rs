//! Render loop and gauge widgets for the ESP32 gauge demo.
//!
//! This crate holds everything that does not touch hardware, shared between
//! the ESP32 firmware and the desktop simulator:
//!
//! - [`tick`]: millisecond tick counter and the tick source seam
//! - [`buffer`]: stripe buffer allocation
//! - [`flush`]: flush requests and the panel sink seam
//! - [`engine`]: animations, invalidation and stripe rendering
//! - [`coordinator`]: setup sequence and the periodic render loop
//! - [`widgets`]: meter and label widgets
//! - [`power`]: PMU bring-up sequences
//! - [`demo`]: the two-gauge demo scene
//! - [`config`]: board profiles and timing constants
//!
//! # no_std Compatibility
//!
//! The crate is `no_std` with `alloc` (stripe buffers are allocated once at
//! setup). Tests run on the host with `std`.

#![cfg_attr(not(test), no_std)]
// Crate-level lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

extern crate alloc;

#[macro_use]
mod fmt;

pub mod anim;
pub mod area;
pub mod buffer;
pub mod canvas;
pub mod colors;
pub mod config;
pub mod coordinator;
pub mod demo;
pub mod engine;
pub mod error;
pub mod flush;
pub mod invalidate;
pub mod power;
pub mod stats;
pub mod tick;
pub mod widgets;

// Re-export commonly used items
pub use config::*;
pub use coordinator::{GuiAccess, Pacer, Prepared, RenderLoop, SharedGui, setup};
pub use engine::{CycleReport, Gui, SceneHandles, SceneSpec};
pub use error::{DisplayError, GuiError, PowerError, SetupError};
pub use flush::{FlushReady, FlushRequest, FlushSink};
pub use tick::{TickCounter, TickSource};
