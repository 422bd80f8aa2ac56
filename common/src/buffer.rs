//! Stripe buffer allocation.
//!
//! The engine renders into one or two buffers of `width * stripe_rows`
//! pixels, allocated once during setup and owned by the engine afterwards.
//! With two buffers the engine alternates between them so a board with an
//! asynchronous transport can fill one while the other is on the wire.

use alloc::vec::Vec;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::RgbColor;

use crate::config::{BYTES_PER_PIXEL, BufferConfig, DisplayConfig};
use crate::error::SetupError;

// =============================================================================
// Allocators
// =============================================================================

/// Source of stripe buffer memory.
///
/// The firmware hands out memory from the DMA-capable heap region; tests use
/// a [`BudgetAllocator`] to simulate a nearly exhausted heap.
pub trait BufferAllocator {
    /// Bytes still available.
    fn available(&self) -> usize;

    /// Allocate a zeroed buffer of `pixels` pixels, from DMA-capable memory
    /// when `dma_capable` is set.
    fn allocate(
        &mut self,
        pixels: usize,
        dma_capable: bool,
    ) -> Result<Vec<Rgb565>, SetupError>;
}

/// Allocator with a fixed byte budget on top of the global heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetAllocator {
    remaining: usize,
    dma_capable: bool,
}

impl BudgetAllocator {
    /// Allow up to `bytes` bytes of DMA-capable memory in total. The ESP32
    /// heap lives in internal DRAM, which the SPI DMA can reach.
    pub const fn new(bytes: usize) -> Self {
        Self {
            remaining: bytes,
            dma_capable: true,
        }
    }

    /// Allow up to `bytes` bytes of memory the DMA engine cannot reach,
    /// such as external PSRAM.
    pub const fn without_dma(bytes: usize) -> Self {
        Self {
            remaining: bytes,
            dma_capable: false,
        }
    }
}

impl BufferAllocator for BudgetAllocator {
    fn available(&self) -> usize { self.remaining }

    fn allocate(
        &mut self,
        pixels: usize,
        dma_capable: bool,
    ) -> Result<Vec<Rgb565>, SetupError> {
        let requested = pixels.checked_mul(BYTES_PER_PIXEL).unwrap_or(usize::MAX);
        if dma_capable && !self.dma_capable {
            return Err(SetupError::NoDmaMemory { requested });
        }
        let out_of_memory = SetupError::OutOfMemory {
            requested,
            available: self.remaining,
        };
        if requested > self.remaining {
            return Err(out_of_memory);
        }

        let mut buffer = Vec::new();
        buffer.try_reserve_exact(pixels).map_err(|_| out_of_memory)?;
        buffer.resize(pixels, Rgb565::BLACK);

        self.remaining -= requested;
        Ok(buffer)
    }
}

// =============================================================================
// Draw Buffers
// =============================================================================

/// The engine's stripe buffers.
pub struct DrawBuffers {
    buffers: [Vec<Rgb565>; 2],
    count: usize,
    next: usize,
    stripe_rows: u16,
    width: u16,
}

impl DrawBuffers {
    /// Allocate the buffers described by `config` for `display`.
    ///
    /// Fails without keeping any memory if the second buffer cannot be
    /// allocated.
    pub fn allocate<A: BufferAllocator>(
        allocator: &mut A,
        config: &BufferConfig,
        display: &DisplayConfig,
    ) -> Result<Self, SetupError> {
        config.validate(display)?;

        let pixels = config.pixels(display);
        let first = allocator.allocate(pixels, config.dma_capable)?;
        let second = if config.count == 2 {
            allocator.allocate(pixels, config.dma_capable)?
        } else {
            Vec::new()
        };

        debug!("allocated {} stripe buffer(s) of {} bytes", config.count, config.bytes(display));

        Ok(Self {
            buffers: [first, second],
            count: config.count as usize,
            next: 0,
            stripe_rows: config.stripe_rows,
            width: display.width,
        })
    }

    /// Number of buffers (1 or 2).
    #[inline]
    pub fn count(&self) -> usize { self.count }

    /// Rows held by one buffer.
    #[inline]
    pub fn stripe_rows(&self) -> u16 { self.stripe_rows }

    /// Pixels held by one buffer.
    #[inline]
    pub fn capacity(&self) -> usize { self.width as usize * self.stripe_rows as usize }

    /// Buffer for the next stripe, alternating when there are two.
    pub fn next_mut(&mut self) -> &mut [Rgb565] {
        let index = self.next;
        self.next = (self.next + 1) % self.count;
        &mut self.buffers[index]
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ATOM_DISPLAY, M5_CORE2};

    #[test]
    fn test_exhausted_memory_fails_deterministically() {
        let mut alloc = BudgetAllocator::new(1_024);
        let err = DrawBuffers::allocate(&mut alloc, &ATOM_DISPLAY.buffers, &ATOM_DISPLAY.display).err();
        assert_eq!(
            err,
            Some(SetupError::OutOfMemory {
                requested: 25_600,
                available: 1_024,
            })
        );
        // Nothing was taken from the budget
        assert_eq!(alloc.available(), 1_024);
    }

    #[test]
    fn test_second_buffer_failure_reports_remaining() {
        let stripe = M5_CORE2.buffers.bytes(&M5_CORE2.display);
        let mut alloc = BudgetAllocator::new(stripe + 100);
        let err = DrawBuffers::allocate(&mut alloc, &M5_CORE2.buffers, &M5_CORE2.display).err();
        assert_eq!(
            err,
            Some(SetupError::OutOfMemory {
                requested: stripe,
                available: 100,
            })
        );
    }

    #[test]
    fn test_single_buffer_sizes() {
        let mut alloc = BudgetAllocator::new(64 * 1024);
        let mut buffers = DrawBuffers::allocate(&mut alloc, &ATOM_DISPLAY.buffers, &ATOM_DISPLAY.display)
            .expect("allocation");
        assert_eq!(buffers.count(), 1);
        assert_eq!(buffers.capacity(), 12_800);
        assert_eq!(buffers.next_mut().len(), 12_800);
        assert_eq!(alloc.available(), 64 * 1024 - 25_600);
    }

    #[test]
    fn test_double_buffers_alternate() {
        let mut alloc = BudgetAllocator::new(64 * 1024);
        let mut buffers =
            DrawBuffers::allocate(&mut alloc, &M5_CORE2.buffers, &M5_CORE2.display).expect("allocation");

        let first = buffers.next_mut().as_ptr();
        let second = buffers.next_mut().as_ptr();
        let third = buffers.next_mut().as_ptr();
        assert_ne!(first, second);
        assert_eq!(first, third);
    }

    #[test]
    fn test_dma_buffers_need_dma_memory() {
        let mut alloc = BudgetAllocator::without_dma(64 * 1024);
        let err = DrawBuffers::allocate(&mut alloc, &M5_CORE2.buffers, &M5_CORE2.display).err();
        assert_eq!(
            err,
            Some(SetupError::NoDmaMemory {
                requested: M5_CORE2.buffers.bytes(&M5_CORE2.display),
            })
        );
        assert_eq!(alloc.available(), 64 * 1024);

        // Plain memory is fine when the transport does not need DMA
        let buffers = DrawBuffers::allocate(&mut alloc, &ATOM_DISPLAY.buffers, &ATOM_DISPLAY.display);
        assert!(buffers.is_ok());
        assert_eq!(alloc.available(), 64 * 1024 - 25_600);
    }

    #[test]
    fn test_invalid_layout_rejected_before_allocating() {
        let mut config = M5_CORE2.buffers;
        config.count = 0;
        let mut alloc = BudgetAllocator::new(64 * 1024);
        let err = DrawBuffers::allocate(&mut alloc, &config, &M5_CORE2.display).err();
        assert!(matches!(err, Some(SetupError::InvalidConfig(_))));
        assert_eq!(alloc.available(), 64 * 1024);
    }
}
