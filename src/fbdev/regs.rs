//! LTDC register map.
//!
//! Offsets and bit layouts are fixed by the hardware; see RM0385 for the
//! register descriptions. Values for the four timing registers pack a
//! vertical count in the low half-word and a horizontal count in the high
//! half-word.

use bitflags::bitflags;

use super::var::PanelMode;
use crate::mmio::RegWindow;

/// Synchronization size.
pub const LTDC_SSCR: usize = 0x08;
/// Accumulated back porch.
pub const LTDC_BPCR: usize = 0x0c;
/// Accumulated active width.
pub const LTDC_AWCR: usize = 0x10;
/// Accumulated total width.
pub const LTDC_TWCR: usize = 0x14;
/// Global control.
pub const LTDC_GCR: usize = 0x18;
/// Background color.
pub const LTDC_BCCR: usize = 0x2c;
/// Interrupt enable.
pub const LTDC_IER: usize = 0x34;
/// Interrupt clear.
pub const LTDC_ICR: usize = 0x3c;
/// Layer 1 control.
pub const LTDC_L1CR: usize = 0x84;
/// Layer 1 pixel format.
pub const LTDC_L1PFCR: usize = 0x94;
/// Layer 1 default fill color.
pub const LTDC_L1DCCR: usize = 0x9c;
/// Layer 1 frame buffer start address.
pub const LTDC_L1CFBAR: usize = 0xac;
/// Layer 1 frame buffer length and pitch.
pub const LTDC_L1CFBLR: usize = 0xb0;

/// Controller enable bit in [`LTDC_GCR`].
pub const GCR_LTDCEN: u32 = 1;
/// Layer enable bit in [`LTDC_L1CR`].
pub const L1CR_LEN: u32 = 1;
/// ARGB8888 selector for [`LTDC_L1PFCR`].
pub const PF_ARGB8888: u32 = 0;

/// Lowest window length that covers every register this driver touches.
const LTDC_MIN_LEN: usize = LTDC_L1CFBLR + 4;

bitflags! {
    /// Interrupt cause bits, shared by [`LTDC_IER`] and [`LTDC_ICR`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Irq: u32 {
        /// Programmed scan line reached.
        const LINE = 1 << 0;
        /// FIFO underrun during scan-out.
        const FIFO_UNDERRUN = 1 << 1;
        /// AHB transfer error while fetching pixel data.
        const TRANSFER_ERROR = 1 << 2;
        /// Shadow register reload complete.
        const REGISTER_RELOAD = 1 << 3;
    }
}

/// The four raster timing register values derived from a panel mode.
///
/// Each stage accumulates the previous one plus its own span, so the packed
/// counts never decrease from SSCR through TWCR.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingRegs {
    pub sscr: u32,
    pub bpcr: u32,
    pub awcr: u32,
    pub twcr: u32,
}

impl TimingRegs {
    /// Computes the timing register values for `mode`.
    ///
    /// Sync lengths must be at least one raster unit; [`PanelMode`]
    /// construction enforces this.
    pub fn from_mode(mode: &PanelMode) -> Self {
        let pack = |v: u32, h: u32| (v - 1) | ((h - 1) << 16);

        let vsync = mode.vsync_len;
        let hsync = mode.hsync_len;
        let vbp = vsync + mode.upper_margin;
        let hbp = hsync + mode.left_margin;
        let vaw = vbp + mode.yres;
        let haw = hbp + mode.xres;
        let vtot = vaw + mode.lower_margin;
        let htot = haw + mode.right_margin;

        TimingRegs {
            sscr: pack(vsync, hsync),
            bpcr: pack(vbp, hbp),
            awcr: pack(vaw, haw),
            twcr: pack(vtot, htot),
        }
    }
}

/// Packs a line pitch into the [`LTDC_L1CFBLR`] length/pitch layout.
pub fn pack_line_length(pitch: u32) -> u32 {
    (pitch + 3) | (pitch << 16)
}

/// Scan-out addresses derived from the buffer base and the vertical offset.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanoutAddrs {
    /// Address the layer fetches from: base plus `yoffset` lines.
    pub fb_start: u32,
    /// Start of the second buffer half, one visible frame past
    /// [`fb_start`](ScanoutAddrs::fb_start).
    pub double_buffer: u32,
}

impl ScanoutAddrs {
    /// Computes both addresses. Pure in its inputs, so repeated calls with
    /// unchanged state yield identical register writes.
    pub fn compute(smem_start: u32, yoffset: u32, yres: u32, line_length: u32) -> Self {
        let fb_start = smem_start + yoffset * line_length;
        ScanoutAddrs {
            fb_start,
            double_buffer: fb_start + yres * line_length,
        }
    }
}

/// Typed access to a mapped LTDC register block.
///
/// Multi-register sequences run under a critical section so they appear
/// atomic to the interrupt handler sharing the window.
#[derive(Debug)]
pub struct LtdcRegs {
    win: RegWindow,
}

impl LtdcRegs {
    /// Wraps a mapped LTDC window.
    ///
    /// # Panics
    ///
    /// Panics if the window is too short to cover the layer registers.
    pub fn new(win: RegWindow) -> Self {
        assert!(win.len() >= LTDC_MIN_LEN);
        LtdcRegs { win }
    }

    /// Releases the underlying window for unmapping.
    pub fn into_window(self) -> RegWindow {
        self.win
    }

    fn read(&self, offset: usize) -> u32 {
        // In bounds: offsets are the constants above, checked against the
        // window length in `new`.
        unsafe { self.win.read(offset) }
    }

    fn write(&self, offset: usize, val: u32) {
        unsafe { self.win.write(offset, val) }
    }

    /// Programs the four raster timing registers.
    pub fn program_timing(&self, timing: &TimingRegs) {
        critical_section::with(|_| {
            self.write(LTDC_SSCR, timing.sscr);
            self.write(LTDC_BPCR, timing.bpcr);
            self.write(LTDC_AWCR, timing.awcr);
            self.write(LTDC_TWCR, timing.twcr);
        })
    }

    /// Sets the background color shown outside the layer window.
    pub fn set_background_color(&self, rgb: u32) {
        self.write(LTDC_BCCR, rgb);
    }

    /// Unmasks the given interrupt causes.
    pub fn unmask_interrupts(&self, irq: Irq) {
        self.write(LTDC_IER, irq.bits());
    }

    /// Acknowledges the given interrupt causes. Single write, safe from
    /// interrupt context.
    pub fn ack_interrupts(&self, irq: Irq) {
        self.write(LTDC_ICR, irq.bits());
    }

    /// Powers on the controller.
    pub fn enable_controller(&self) {
        self.write(LTDC_GCR, GCR_LTDCEN);
    }

    /// Points layer 1 at `addr` with the given pitch and the fixed ARGB8888
    /// format.
    pub fn program_layer(&self, addr: u32, line_length: u32) {
        critical_section::with(|_| {
            self.write(LTDC_L1CFBAR, addr);
            self.write(LTDC_L1CFBLR, pack_line_length(line_length));
            self.write(LTDC_L1PFCR, PF_ARGB8888);
            self.write(LTDC_L1DCCR, 0);
        })
    }

    /// Sets or clears the layer enable bit.
    pub fn set_layer_enable(&self, enable: bool) {
        critical_section::with(|_| {
            let mut val = self.read(LTDC_L1CR);
            if enable {
                val |= L1CR_LEN;
            } else {
                val &= !L1CR_LEN;
            }
            self.write(LTDC_L1CR, val);
        })
    }

    /// Returns whether layer 1 is enabled.
    pub fn layer_enabled(&self) -> bool {
        self.read(LTDC_L1CR) & L1CR_LEN != 0
    }
}
