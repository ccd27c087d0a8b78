//! DWMAC glue layer.
//!
//! The Ethernet MAC itself is driven by a portable core; this module only
//! resolves the SoC-specific pieces around it: the transmit and receive
//! clocks, the MAC's register resource and interrupt line, and the system
//! controller bit selecting the PHY interface. It performs no protocol
//! logic.

use log::{error, warn};

use crate::board::{EthNode, PhyInterfaceMode};
use crate::error::{Error, Result};
use crate::platform::{Clock, IrqLine, MemResource, Platform};

/// PHY interface select bit inside the syscon PHY register.
pub const MII_PHY_SEL_MASK: u32 = 1 << 23;

/// System controller register region, accessed by offset.
pub trait Syscon {
    /// Read-modify-writes the register at `offset`: clears `mask`, sets
    /// `val & mask`.
    fn update_bits(&mut self, offset: u32, mask: u32, val: u32) -> Result<()>;
}

/// Resources handed to the MAC core at probe time.
#[derive(Debug, Clone, Copy)]
pub struct MacResources {
    /// The MAC register block.
    pub regs: MemResource,
    /// The MAC interrupt line.
    pub irq: IrqLine,
}

/// Platform configuration consumed by the MAC core.
#[derive(Debug, Clone, Copy)]
pub struct MacPlatConfig {
    /// Interface mode between MAC and PHY.
    pub interface: PhyInterfaceMode,
}

/// The portable MAC driver core this glue wraps.
pub trait MacCore {
    /// Handle to a probed MAC device.
    type Device;

    /// Probes the MAC with the given resources and platform configuration.
    fn probe(&mut self, res: &MacResources, cfg: &MacPlatConfig) -> Result<Self::Device>;

    /// Removes a previously probed MAC device.
    fn remove(&mut self, dev: Self::Device);
}

/// Glue context for one MAC instance: the clock pair bracketing the core's
/// probe/remove lifecycle.
pub struct StmDwmac<P: Platform, C: MacCore> {
    platform: P,
    core: C,
    mac: Option<C::Device>,
    tx_clk: Option<P::Clock>,
    rx_clk: Option<P::Clock>,
}

impl<P: Platform, C: MacCore> StmDwmac<P, C> {
    /// Probes the MAC described by `node`.
    ///
    /// Resolves the MAC resources and both clocks, selects the PHY
    /// interface through the syscon when the board describes one, enables
    /// the clocks and hands over to the core. A core probe failure
    /// disables the clocks again before propagating.
    pub fn probe<S: Syscon>(
        platform: P,
        core: C,
        syscon: Option<S>,
        node: &EthNode,
    ) -> Result<Self> {
        let mut glue = StmDwmac {
            platform,
            core,
            mac: None,
            tx_clk: None,
            rx_clk: None,
        };

        // On failure the partially built context is dropped here, which
        // disables whatever was already enabled.
        glue.bring_up(syscon, node)?;
        Ok(glue)
    }

    fn bring_up<S: Syscon>(&mut self, mut syscon: Option<S>, node: &EthNode) -> Result<()> {
        let res = MacResources {
            regs: self.platform.mem_resource(0)?,
            irq: self.platform.irq("macirq")?,
        };
        let cfg = MacPlatConfig {
            interface: node.interface,
        };

        let (mut tx_clk, mut rx_clk) = match (
            self.platform.clock("tx-clk"),
            self.platform.clock("rx-clk"),
        ) {
            (Ok(tx), Ok(rx)) => (tx, rx),
            _ => {
                error!("dwmac: could not get tx-clk/rx-clk clocks");
                return Err(Error::NoDevice);
            }
        };

        match (&mut syscon, node.syscon) {
            (Some(syscon), Some(phy_sel)) => {
                let val = match node.interface {
                    PhyInterfaceMode::Mii => 0,
                    _ => MII_PHY_SEL_MASK,
                };
                syscon.update_bits(phy_sel.offset, MII_PHY_SEL_MASK, val)?;
            }
            (None, Some(_)) => warn!("dwmac: can't get MII syscon"),
            _ => (),
        }

        tx_clk.enable()?;
        self.tx_clk = Some(tx_clk);

        rx_clk.enable()?;
        self.rx_clk = Some(rx_clk);

        self.mac = Some(self.core.probe(&res, &cfg)?);
        Ok(())
    }

    /// Removes the MAC and disables both clocks.
    pub fn remove(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(mac) = self.mac.take() {
            self.core.remove(mac);
        }
        if let Some(mut rx_clk) = self.rx_clk.take() {
            rx_clk.disable();
        }
        if let Some(mut tx_clk) = self.tx_clk.take() {
            tx_clk.disable();
        }
    }
}

impl<P: Platform, C: MacCore> Drop for StmDwmac<P, C> {
    fn drop(&mut self) {
        self.release();
    }
}
