//! Host platform services.
//!
//! The drivers in this crate are probed against a platform device: a bundle
//! of named clocks, memory-mapped register resources, interrupt lines and a
//! coherent DMA allocator. [`Platform`] is the seam to whatever provides
//! those services; the drivers themselves never touch global state.

use core::ptr::NonNull;

use crate::error::Result;
use crate::mmio::RegWindow;

/// A gated peripheral clock.
pub trait Clock {
    /// Prepares and enables the clock.
    fn enable(&mut self) -> Result<()>;

    /// Disables the clock. Must be callable on an already-disabled clock.
    fn disable(&mut self);
}

/// A resolved interrupt line.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrqLine(pub u32);

/// One memory-mapped I/O resource of a platform device.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemResource {
    /// Bus address of the first register.
    pub start: u32,
    /// Resource length in bytes.
    pub len: usize,
}

/// A write-combined coherent allocation.
///
/// The CPU view and the bus address alias the same memory. The scan-out
/// engine reads it continuously while software writes pixels; no further
/// synchronization is provided between the two.
#[derive(Debug)]
pub struct DmaRegion {
    /// CPU pointer to the start of the region.
    pub cpu: NonNull<u8>,
    /// Bus address handed to the hardware.
    pub bus: u32,
    /// Region length in bytes.
    pub len: usize,
}

unsafe impl Send for DmaRegion {}

/// Services a platform device receives from its host.
///
/// Lookup failures map onto the crate error taxonomy:
/// [`Error::ResourceUnavailable`](crate::Error::ResourceUnavailable) for
/// clocks, resources and interrupt lines,
/// [`Error::OutOfMemory`](crate::Error::OutOfMemory) for allocations.
pub trait Platform {
    /// Clock handle type handed out by this platform.
    type Clock: Clock;

    /// Looks up a clock by name, e.g. `"ltdc-clk"` or `"tx-clk"`.
    fn clock(&mut self, name: &str) -> Result<Self::Clock>;

    /// Returns the `index`th memory resource of the device.
    fn mem_resource(&mut self, index: usize) -> Result<MemResource>;

    /// Maps a memory resource into a register window.
    fn ioremap(&mut self, res: &MemResource) -> Result<RegWindow>;

    /// Unmaps a window obtained from [`ioremap`](Platform::ioremap).
    fn iounmap(&mut self, win: RegWindow);

    /// Looks up an interrupt line by name, e.g. `"ltdc-irq"`.
    fn irq(&mut self, name: &str) -> Result<IrqLine>;

    /// Allocates `len` bytes of write-combined coherent memory.
    fn alloc_coherent(&mut self, len: usize) -> Result<DmaRegion>;

    /// Releases a region obtained from
    /// [`alloc_coherent`](Platform::alloc_coherent).
    fn free_coherent(&mut self, region: DmaRegion);
}
