//! Screen information and mode validation.
//!
//! The shapes follow the framebuffer convention the driver surface speaks:
//! a variable part describing the requested mode and a fixed part describing
//! the device. Only 32 bit-per-pixel truecolor passes validation; the
//! bit-field layout is fixed and non-negotiable.

use core::fmt::Write;

use crate::board::DisplayTiming;
use crate::error::{Error, Result};

/// Generated mode name, `"<width>x<height>@<refresh>"`.
pub type ModeName = heapless::String<24>;

/// Converts a pixel clock period in picoseconds to kHz.
pub fn picos2khz(picos: u32) -> u32 {
    1_000_000_000 / picos
}

/// Converts a pixel clock in kHz to a period in picoseconds.
pub fn khz2picos(khz: u32) -> u32 {
    1_000_000_000 / khz
}

/// Largest power of two not exceeding `n`; zero for zero.
pub fn floor_pow2(n: u32) -> u32 {
    match n {
        0 => 0,
        n => 1 << n.ilog2(),
    }
}

/// Derives the bits-per-pixel budget from an optional memory bandwidth
/// limit in bytes per second.
///
/// The limit caps `8 * max_bandwidth / (pixel clock in Hz)` bits per pixel;
/// the result is rounded down to a power of two and clamped to 32. Without
/// a limit the depth defaults to 32. `pixclock` is the mode's pixel clock
/// period in picoseconds and must be nonzero.
pub fn derive_bpp(max_bandwidth: Option<u32>, pixclock: u32) -> u32 {
    match max_bandwidth {
        None => 32,
        Some(bw) => {
            let bpp = floor_pow2(bw / (1000 / 8) / picos2khz(pixclock));
            if bpp > 32 {
                32
            } else {
                bpp
            }
        }
    }
}

/// One color channel position inside a pixel.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bitfield {
    /// Bit offset of the channel's least significant bit.
    pub offset: u8,
    /// Channel width in bits.
    pub length: u8,
    /// Most significant bit is right of the offset.
    pub msb_right: bool,
}

/// Framebuffer memory interpretation.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Visual {
    /// Packed pixels with channel bitfields.
    #[default]
    Truecolor,
    /// Palette indexed.
    Pseudocolor,
}

/// Variable screen information: the mode a caller requests or queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VarScreenInfo {
    /// Visible width in pixels.
    pub xres: u32,
    /// Visible height in lines.
    pub yres: u32,
    /// Virtual width in pixels.
    pub xres_virtual: u32,
    /// Virtual height in lines.
    pub yres_virtual: u32,
    /// Horizontal pan offset in pixels.
    pub xoffset: u32,
    /// Vertical pan offset in lines.
    pub yoffset: u32,
    /// Depth in bits per pixel.
    pub bits_per_pixel: u32,
    /// Grayscale rather than color.
    pub grayscale: bool,
    pub red: Bitfield,
    pub green: Bitfield,
    pub blue: Bitfield,
    pub transp: Bitfield,
    /// Pixel clock period in picoseconds.
    pub pixclock: u32,
    /// Horizontal back porch in pixels.
    pub left_margin: u32,
    /// Horizontal front porch in pixels.
    pub right_margin: u32,
    /// Vertical back porch in lines.
    pub upper_margin: u32,
    /// Vertical front porch in lines.
    pub lower_margin: u32,
    /// Horizontal sync length in pixels.
    pub hsync_len: u32,
    /// Vertical sync length in lines.
    pub vsync_len: u32,
    /// Physical height in mm, -1 when unknown.
    pub height: i32,
    /// Physical width in mm, -1 when unknown.
    pub width: i32,
}

impl VarScreenInfo {
    /// Builds the variable information advertised for a panel mode.
    pub fn from_mode(mode: &PanelMode, bpp: u32, width_mm: i32, height_mm: i32) -> Self {
        VarScreenInfo {
            xres: mode.xres,
            yres: mode.yres,
            xres_virtual: mode.xres,
            yres_virtual: mode.yres,
            bits_per_pixel: bpp,
            pixclock: mode.pixclock,
            left_margin: mode.left_margin,
            right_margin: mode.right_margin,
            upper_margin: mode.upper_margin,
            lower_margin: mode.lower_margin,
            hsync_len: mode.hsync_len,
            vsync_len: mode.vsync_len,
            height: height_mm,
            width: width_mm,
            ..Default::default()
        }
    }
}

/// Fixed screen information: properties of the device itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixScreenInfo {
    /// Identification string.
    pub id: &'static str,
    /// Bus address of the frame buffer.
    pub smem_start: u32,
    /// Frame buffer length in bytes.
    pub smem_len: u32,
    /// Bytes from one line to the next.
    pub line_length: u32,
    /// Bus address of the register window.
    pub mmio_start: u32,
    /// Register window length in bytes.
    pub mmio_len: u32,
    /// Memory interpretation.
    pub visual: Visual,
}

impl FixScreenInfo {
    /// Fixed information for a device with nothing acquired yet.
    pub fn new(id: &'static str) -> Self {
        FixScreenInfo {
            id,
            smem_start: 0,
            smem_len: 0,
            line_length: 0,
            mmio_start: 0,
            mmio_len: 0,
            visual: Visual::Truecolor,
        }
    }
}

/// Applies the fixed channel layout for the requested depth.
///
/// Only 32bpp is accepted: 8-8-8-8 with blue in the low byte, then green,
/// red and transparency. Any other depth fails with
/// [`Error::InvalidArgument`] and leaves `var` untouched.
pub fn set_bitfields(var: &mut VarScreenInfo) -> Result<()> {
    if var.bits_per_pixel != 32 {
        return Err(Error::InvalidArgument);
    }

    let channel = |offset| Bitfield {
        offset,
        length: 8,
        msb_right: false,
    };
    var.blue = channel(0);
    var.green = channel(8);
    var.red = channel(16);
    var.transp = channel(24);

    Ok(())
}

/// Checks a requested virtual geometry against the allocated buffer.
///
/// The product is formed in 64 bits so oversized requests cannot wrap the
/// comparison.
pub fn check_geometry(var: &VarScreenInfo, smem_len: u32) -> Result<()> {
    let needed = u64::from(var.xres_virtual)
        * u64::from(var.bits_per_pixel / 8)
        * u64::from(var.yres_virtual);

    if needed > u64::from(smem_len) {
        return Err(Error::InvalidArgument);
    }
    Ok(())
}

/// A validated panel mode, derived from a board timing description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelMode {
    /// Mode name, `"480x272@60"` style.
    pub name: ModeName,
    /// Refresh rate in Hz, rounded to nearest.
    pub refresh: u32,
    pub xres: u32,
    pub yres: u32,
    /// Pixel clock period in picoseconds.
    pub pixclock: u32,
    pub left_margin: u32,
    pub right_margin: u32,
    pub upper_margin: u32,
    pub lower_margin: u32,
    pub hsync_len: u32,
    pub vsync_len: u32,
}

impl PanelMode {
    /// Converts a board timing block into a panel mode.
    ///
    /// The active area must be nonzero, sync pulses at least one raster
    /// unit wide and the pixel clock at least 1 kHz; anything else fails
    /// with [`Error::InvalidArgument`].
    pub fn from_timing(t: &DisplayTiming) -> Result<Self> {
        let khz = t.pixelclock / 1000;
        if khz == 0 || t.hactive == 0 || t.vactive == 0 || t.hsync_len == 0 || t.vsync_len == 0 {
            return Err(Error::InvalidArgument);
        }

        let htotal = t.hactive + t.hfront_porch + t.hback_porch + t.hsync_len;
        let vtotal = t.vactive + t.vfront_porch + t.vback_porch + t.vsync_len;
        let total = htotal * vtotal;
        let refresh = (t.pixelclock + total / 2) / total;

        let mut name = ModeName::new();
        write!(name, "{}x{}@{}", t.hactive, t.vactive, refresh)
            .map_err(|_| Error::InvalidArgument)?;

        Ok(PanelMode {
            name,
            refresh,
            xres: t.hactive,
            yres: t.vactive,
            pixclock: khz2picos(khz),
            left_margin: t.hback_porch,
            right_margin: t.hfront_porch,
            upper_margin: t.vback_porch,
            lower_margin: t.vfront_porch,
            hsync_len: t.hsync_len,
            vsync_len: t.vsync_len,
        })
    }
}
