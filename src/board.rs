//! Board description input.
//!
//! The records here are the devicetree-equivalent hardware description the
//! drivers consume. Parsing the description belongs to the host; by the time
//! a driver probes, the values have already been extracted.

/// Compatibility string matched by the display driver.
pub const COMPAT_LTDC: &str = "st,ltdc";

/// Compatibility string matched by the Ethernet glue.
pub const COMPAT_DWMAC: &str = "st,stm32-dwmac";

/// Compatibility string of a directly connected DPI panel, the only panel
/// type the display driver accepts.
pub const COMPAT_PANEL_DPI: &str = "panel-dpi";

/// Raster timing of a panel, as carried by a `panel-timing` block.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayTiming {
    /// Pixel clock in Hz.
    pub pixelclock: u32,
    /// Active width in pixels.
    pub hactive: u32,
    /// Active height in lines.
    pub vactive: u32,
    /// Horizontal front porch in pixels.
    pub hfront_porch: u32,
    /// Horizontal back porch in pixels.
    pub hback_porch: u32,
    /// Horizontal sync length in pixels.
    pub hsync_len: u32,
    /// Vertical front porch in lines.
    pub vfront_porch: u32,
    /// Vertical back porch in lines.
    pub vback_porch: u32,
    /// Vertical sync length in lines.
    pub vsync_len: u32,
}

/// The remote end of the display graph: the connected panel.
#[derive(Debug, Clone, Copy)]
pub struct PanelEndpoint<'a> {
    /// Panel compatibility string.
    pub compatible: &'a str,
    /// The panel's timing block, if it carries one.
    pub timing: Option<&'a DisplayTiming>,
}

/// Board description of the display controller device.
#[derive(Debug, Clone, Copy, Default)]
pub struct LtdcNode<'a> {
    /// First endpoint of the device's display graph.
    pub endpoint: Option<PanelEndpoint<'a>>,
    /// Optional scan-out bandwidth budget in bytes per second.
    pub max_memory_bandwidth: Option<u32>,
}

/// PHY interface mode selected for the Ethernet MAC.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhyInterfaceMode {
    Mii,
    Rmii,
    Gmii,
    Rgmii,
}

/// Reference into the system controller block: the register offset holding
/// the PHY interface select bit.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SysconRef {
    /// Byte offset of the PHY select register inside the syscon block.
    pub offset: u32,
}

/// Board description of the Ethernet MAC device.
#[derive(Debug, Clone, Copy)]
pub struct EthNode {
    /// Interface mode between MAC and PHY.
    pub interface: PhyInterfaceMode,
    /// Optional syscon reference for PHY interface selection.
    pub syscon: Option<SysconRef>,
}
