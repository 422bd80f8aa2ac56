//! Color constants for the gauge screen.
//!
//! The palette follows the "main" shades of the Material palette used by the
//! light default theme the demo was designed against. Values are converted
//! from 24-bit RGB by dropping the low bits (`r >> 3`, `g >> 2`, `b >> 3`).
//!
//! ## Rgb565 Color Format
//!
//! Rgb565 uses 16 bits per pixel: 5 bits red, 6 bits green, 5 bits blue.
//! This is the native format of the ILI9342C panel and requires no
//! conversion when the stripe buffer is handed to the transport.

use embedded_graphics::pixelcolor::{Rgb565, RgbColor};
use embedded_graphics::prelude::IntoStorage;

// =============================================================================
// Standard Colors (from RgbColor trait)
// =============================================================================

/// Pure black. Major ticks and their labels.
pub const BLACK: Rgb565 = Rgb565::BLACK;

/// Pure white. Meter card background.
pub const WHITE: Rgb565 = Rgb565::WHITE;

// =============================================================================
// Palette (Material "main" shades)
// =============================================================================

/// Pink #E91E63. Minor scale ticks.
pub const PINK: Rgb565 = Rgb565::new(29, 7, 12);

/// Blue #2196F3. Low-range arc and scale lines.
pub const BLUE: Rgb565 = Rgb565::new(4, 37, 30);

/// Red #F44336. High-range arc and scale lines.
pub const RED: Rgb565 = Rgb565::new(30, 16, 6);

/// Grey #9E9E9E. Needle and centre knob.
pub const GREY: Rgb565 = Rgb565::new(19, 39, 19);

// =============================================================================
// Theme Colors
// =============================================================================

/// Screen background #ECEFF1.
pub const SCREEN_BG: Rgb565 = Rgb565::new(29, 59, 30);

/// Card border #E0E0E0.
pub const CARD_BORDER: Rgb565 = Rgb565::new(28, 56, 28);

/// Default text #212121.
pub const TEXT: Rgb565 = Rgb565::new(4, 8, 4);

// =============================================================================
// Monochrome reduction
// =============================================================================

/// Luma above which a color maps to white on monochrome panels (0-255 scale).
const MONO_THRESHOLD: u32 = 128;

/// Reduce a color to black or white by perceived brightness.
///
/// Uses integer BT.601 weights on the 565 channels expanded to 8 bits.
pub fn to_monochrome(color: Rgb565) -> Rgb565 {
    let raw = color.into_storage();
    let r = u32::from((raw >> 11) & 0x1F) << 3;
    let g = u32::from((raw >> 5) & 0x3F) << 2;
    let b = u32::from(raw & 0x1F) << 3;
    let luma = (r * 299 + g * 587 + b * 114) / 1000;
    if luma >= MONO_THRESHOLD { WHITE } else { BLACK }
}
