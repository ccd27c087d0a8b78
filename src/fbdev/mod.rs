//! LTDC framebuffer driver.
//!
//! Brings the LCD-TFT display controller from reset to an actively
//! scanning-out state and back. The driver owns one device context per
//! controller instance: the mapped register window, the display clock, the
//! two interrupt lines, a coherent pixel buffer and the color lookup table.
//! Bring-up acquires those resources strictly top-down; teardown releases
//! them in reverse, and a failure anywhere in between releases exactly what
//! was acquired so far.
//!
//! Scan-out is fixed to ARGB8888. The frame buffer is write-combined and
//! deliberately unsynchronized between software writers and the scan-out
//! engine.

pub mod regs;
pub mod var;

use core::ptr::NonNull;

use log::{error, info};

use crate::board::{LtdcNode, COMPAT_PANEL_DPI};
use crate::error::{Error, Result};
use crate::platform::{Clock, DmaRegion, IrqLine, Platform};

use self::regs::{Irq, LtdcRegs, ScanoutAddrs, TimingRegs};
use self::var::{
    check_geometry, derive_bpp, set_bitfields, FixScreenInfo, PanelMode, VarScreenInfo, Visual,
};

/// Identification string advertised to the owning subsystem.
pub const FB_ID: &str = "LTDC FB";

// Scan-out format is ARGB8888 regardless of the advertised depth.
const BYTES_PER_PIXEL: u32 = 4;

// Entries requested from the subsystem color map allocator.
const CMAP_ENTRIES: u16 = 256;

/// Panel properties derived from the board description. Immutable once
/// constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelDescriptor {
    /// Validated raster mode.
    pub mode: PanelMode,
    /// Advertised depth in bits per pixel, possibly bandwidth limited.
    pub bpp: u32,
    /// Physical width in mm, -1 when unknown.
    pub width_mm: i32,
    /// Physical height in mm, -1 when unknown.
    pub height_mm: i32,
}

impl PanelDescriptor {
    /// Reads the panel description out of the device's board node.
    ///
    /// Only directly connected DPI panels are supported; a present but
    /// foreign panel fails with [`Error::NotSupported`], a missing endpoint
    /// or timing block with [`Error::NoDevice`].
    pub fn from_node(node: &LtdcNode<'_>) -> Result<Self> {
        let endpoint = node.endpoint.ok_or(Error::NoDevice)?;
        if endpoint.compatible != COMPAT_PANEL_DPI {
            return Err(Error::NotSupported);
        }
        let timing = endpoint.timing.ok_or(Error::NoDevice)?;

        let mode = PanelMode::from_timing(timing)?;
        let bpp = derive_bpp(node.max_memory_bandwidth, mode.pixclock);

        Ok(PanelDescriptor {
            mode,
            bpp,
            width_mm: -1,
            height_mm: -1,
        })
    }
}

/// Token for color map storage allocated by the owning subsystem.
#[derive(Debug)]
pub struct ColorMap {
    /// Number of entries in the map.
    pub entries: u16,
}

/// Device identifier assigned by the owning subsystem at registration.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FbId(pub u32);

/// The subsystem owning registered framebuffer devices.
pub trait FbRegistry {
    /// Registers a device and returns its identifier.
    fn register(&mut self, fix: &FixScreenInfo, var: &VarScreenInfo) -> Result<FbId>;

    /// Removes a previously registered device.
    fn unregister(&mut self, id: FbId);

    /// Allocates color map storage with `entries` entries.
    fn alloc_cmap(&mut self, entries: u16) -> Result<ColorMap>;

    /// Releases color map storage.
    fn dealloc_cmap(&mut self, cmap: ColorMap);
}

/// A write-combined view into the frame buffer, handed to user space by the
/// memory-map operation.
#[derive(Debug)]
pub struct WcMapping {
    /// CPU pointer to the first byte of the view.
    pub cpu: NonNull<u8>,
    /// Bus address of the first byte of the view.
    pub bus: u32,
    /// View length in bytes.
    pub len: usize,
}

/// Device context of one LTDC instance.
pub struct LtdcFb<P: Platform, R: FbRegistry> {
    platform: P,
    registry: R,
    panel: PanelDescriptor,
    var: VarScreenInfo,
    fix: FixScreenInfo,
    pseudo_palette: [u32; 16],
    clk: Option<P::Clock>,
    regs: Option<LtdcRegs>,
    irq: Option<IrqLine>,
    error_irq: Option<IrqLine>,
    fb_mem: Option<DmaRegion>,
    cmap: Option<ColorMap>,
    id: Option<FbId>,
}

impl<P: Platform, R: FbRegistry> LtdcFb<P, R> {
    /// Probes the display controller described by `node`.
    ///
    /// Executes the bring-up sequence: display clock, register window,
    /// interrupt lines, coherent frame buffer, timing and layer
    /// programming, controller enable, subsystem registration. Any failure
    /// releases the resources acquired up to that point, in reverse order,
    /// and is propagated.
    pub fn probe(platform: P, registry: R, node: &LtdcNode<'_>) -> Result<Self> {
        let panel = PanelDescriptor::from_node(node)?;

        let mut fb = LtdcFb {
            platform,
            registry,
            panel,
            var: VarScreenInfo::default(),
            fix: FixScreenInfo::new(FB_ID),
            pseudo_palette: [0; 16],
            clk: None,
            regs: None,
            irq: None,
            error_irq: None,
            fb_mem: None,
            cmap: None,
            id: None,
        };

        // On failure the partially built context is dropped here, which
        // releases whatever bring_up had acquired.
        fb.bring_up()?;
        Ok(fb)
    }

    fn bring_up(&mut self) -> Result<()> {
        let mut clk = self.platform.clock("ltdc-clk")?;
        clk.enable()?;
        self.clk = Some(clk);

        let res = self.platform.mem_resource(0).map_err(|e| {
            error!("ltdc: register resource unusable");
            e
        })?;
        let win = self.platform.ioremap(&res).map_err(|e| {
            error!("ltdc: unable to remap registers");
            e
        })?;
        self.fix.mmio_start = res.start;
        self.fix.mmio_len = res.len as u32;
        self.regs = Some(LtdcRegs::new(win));

        match (
            self.platform.irq("ltdc-irq"),
            self.platform.irq("ltdc-error-irq"),
        ) {
            (Ok(irq), Ok(error_irq)) => {
                self.irq = Some(irq);
                self.error_irq = Some(error_irq);
            }
            _ => {
                error!("ltdc: error looking up interrupt lines");
                return Err(Error::ResourceUnavailable);
            }
        }

        let framesize = self.panel.mode.xres * self.panel.mode.yres * BYTES_PER_PIXEL;
        let mem = self
            .platform
            .alloc_coherent(framesize as usize)
            .map_err(|e| {
                error!("ltdc: unable to allocate framebuffer");
                e
            })?;
        self.fix.smem_start = mem.bus;
        self.fix.smem_len = framesize;
        self.fb_mem = Some(mem);

        self.var = VarScreenInfo::from_mode(
            &self.panel.mode,
            self.panel.bpp,
            self.panel.width_mm,
            self.panel.height_mm,
        );
        // A bandwidth-limited depth below 32 leaves the bitfields unset;
        // check_var rejects any later mode request at such a depth.
        let _ = set_bitfields(&mut self.var);

        self.cmap = Some(self.registry.alloc_cmap(CMAP_ENTRIES)?);

        {
            let regs = self.regs()?;
            regs.program_timing(&TimingRegs::from_mode(&self.panel.mode));
            regs.set_background_color(0);
            regs.unmask_interrupts(Irq::all());
        }

        self.set_par()?;

        {
            let regs = self.regs()?;
            regs.enable_controller();
            regs.set_layer_enable(true);
        }

        let id = self
            .registry
            .register(&self.fix, &self.var)
            .map_err(|_| {
                error!("ltdc: cannot register framebuffer");
                Error::RegistrationFailed
            })?;
        self.id = Some(id);

        info!("ltdc: {} display", self.panel.mode.name);
        Ok(())
    }

    fn regs(&self) -> Result<&LtdcRegs> {
        self.regs.as_ref().ok_or(Error::ResourceUnavailable)
    }

    /// Validates a requested mode against the device without applying it.
    ///
    /// Adjusts the channel bitfields of an accepted request; a rejected
    /// request leaves device state untouched.
    pub fn check_var(&self, var: &mut VarScreenInfo) -> Result<()> {
        check_geometry(var, self.fix.smem_len)?;
        set_bitfields(var)
    }

    /// Validates and applies a new variable mode.
    pub fn set_var(&mut self, mut var: VarScreenInfo) -> Result<()> {
        self.check_var(&mut var)?;
        self.var = var;
        self.set_par()
    }

    /// Applies the current variable mode to the hardware: recomputes the
    /// line pitch and visual, then reprograms the layer.
    pub fn set_par(&mut self) -> Result<()> {
        self.fix.line_length = self.var.xres_virtual * self.var.bits_per_pixel / 8;
        self.fix.visual = if self.var.bits_per_pixel <= 8 {
            Visual::Pseudocolor
        } else {
            Visual::Truecolor
        };
        self.update_scanout()
    }

    /// Pans the visible window to `yoffset` lines into the virtual screen.
    pub fn pan_display(&mut self, yoffset: u32) -> Result<()> {
        if yoffset + self.var.yres > self.var.yres_virtual {
            return Err(Error::InvalidArgument);
        }
        self.var.yoffset = yoffset;
        self.update_scanout()
    }

    // Rewrites the layer registers from the current scan-out state.
    // Identical state produces identical register writes.
    fn update_scanout(&self) -> Result<()> {
        let addrs = ScanoutAddrs::compute(
            self.fix.smem_start,
            self.var.yoffset,
            self.var.yres,
            self.fix.line_length,
        );
        self.regs()?.program_layer(addrs.fb_start, self.fix.line_length);
        Ok(())
    }

    /// Indexed color registers are not supported by this scan-out path.
    pub fn set_color_register(
        &mut self,
        _regno: u32,
        _red: u16,
        _green: u16,
        _blue: u16,
        _transp: u16,
    ) -> Result<()> {
        Err(Error::InvalidArgument)
    }

    /// Display blanking stub. Accepts every blank level without touching
    /// the controller.
    pub fn blank(&mut self, _blank: u32) -> Result<()> {
        Ok(())
    }

    /// Maps `len` bytes of the frame buffer starting at `offset` for user
    /// space, range-checked against the allocation.
    pub fn mmap(&self, offset: usize, len: usize) -> Result<WcMapping> {
        let total = self.fix.smem_len as usize;
        if offset > total || len > total - offset {
            return Err(Error::InvalidArgument);
        }
        let mem = self.fb_mem.as_ref().ok_or(Error::ResourceUnavailable)?;

        // offset <= total keeps the pointer inside the allocation
        let cpu = unsafe { NonNull::new_unchecked(mem.cpu.as_ptr().add(offset)) };
        Ok(WcMapping {
            cpu,
            bus: mem.bus + offset as u32,
            len,
        })
    }

    /// Shared handler for the frame-line and error interrupt lines.
    ///
    /// Acknowledges all four cause bits unconditionally and reports whether
    /// the device handled the interrupt. No per-cause bookkeeping is kept.
    pub fn interrupt_handler(&self) -> bool {
        match self.regs.as_ref() {
            Some(regs) => {
                regs.ack_interrupts(Irq::all());
                true
            }
            None => false,
        }
    }

    /// The panel this device drives.
    pub fn panel(&self) -> &PanelDescriptor {
        &self.panel
    }

    /// Current variable screen information.
    pub fn var(&self) -> &VarScreenInfo {
        &self.var
    }

    /// Current fixed screen information.
    pub fn fix(&self) -> &FixScreenInfo {
        &self.fix
    }

    /// The resolved frame-line and error interrupt lines.
    pub fn irq_lines(&self) -> Option<(IrqLine, IrqLine)> {
        Some((self.irq?, self.error_irq?))
    }

    /// The 16-entry truecolor lookup table consoles draw through.
    pub fn pseudo_palette(&mut self) -> &mut [u32; 16] {
        &mut self.pseudo_palette
    }

    /// Tears the device down: layer off, unregister, release color map,
    /// frame buffer, register window and clock.
    pub fn remove(mut self) {
        self.release();
    }

    // Reverse of bring_up. Every step is guarded, so partial bring-up
    // states and repeated calls release each resource exactly once.
    fn release(&mut self) {
        if let Some(regs) = &self.regs {
            regs.set_layer_enable(false);
        }
        if let Some(id) = self.id.take() {
            self.registry.unregister(id);
        }
        if let Some(cmap) = self.cmap.take() {
            self.registry.dealloc_cmap(cmap);
        }
        if let Some(mem) = self.fb_mem.take() {
            self.platform.free_coherent(mem);
        }
        if let Some(regs) = self.regs.take() {
            self.platform.iounmap(regs.into_window());
        }
        if let Some(mut clk) = self.clk.take() {
            clk.disable();
        }
        self.irq = None;
        self.error_irq = None;
    }
}

impl<P: Platform, R: FbRegistry> Drop for LtdcFb<P, R> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::boxed::Box;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::vec;
    use std::vec::Vec;

    use super::regs::{
        pack_line_length, GCR_LTDCEN, L1CR_LEN, LTDC_AWCR, LTDC_BCCR, LTDC_BPCR, LTDC_GCR,
        LTDC_ICR, LTDC_IER, LTDC_L1CFBAR, LTDC_L1CFBLR, LTDC_L1CR, LTDC_L1PFCR, LTDC_SSCR,
        LTDC_TWCR,
    };
    use super::*;
    use crate::board::{DisplayTiming, PanelEndpoint};
    use crate::mmio::RegWindow;
    use crate::platform::MemResource;

    const DMA_BUS: u32 = 0xc000_0000;
    const MMIO_START: u32 = 0x4001_6800;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Event {
        ClockEnabled,
        ClockDisabled,
        Mapped,
        Unmapped,
        DmaAllocated,
        DmaFreed,
        CmapAllocated,
        CmapFreed,
        Registered,
        Unregistered,
    }
    use Event::*;

    struct State {
        events: Vec<Event>,
        regs: Box<[u32; 64]>,
        dma: Option<Box<[u8]>>,
        fail_clock: bool,
        fail_irq: bool,
        fail_alloc: bool,
        fail_cmap: bool,
        fail_register: bool,
    }

    impl Default for State {
        fn default() -> Self {
            State {
                events: Vec::new(),
                regs: Box::new([0; 64]),
                dma: None,
                fail_clock: false,
                fail_irq: false,
                fail_alloc: false,
                fail_cmap: false,
                fail_register: false,
            }
        }
    }

    #[derive(Clone, Default)]
    struct Shared(Rc<RefCell<State>>);

    impl Shared {
        fn events(&self) -> Vec<Event> {
            self.0.borrow().events.clone()
        }

        fn reg(&self, offset: usize) -> u32 {
            self.0.borrow().regs[offset / 4]
        }
    }

    struct FakeClock(Shared);

    impl Clock for FakeClock {
        fn enable(&mut self) -> Result<()> {
            self.0 .0.borrow_mut().events.push(ClockEnabled);
            Ok(())
        }

        fn disable(&mut self) {
            self.0 .0.borrow_mut().events.push(ClockDisabled);
        }
    }

    struct FakePlatform(Shared);

    impl Platform for FakePlatform {
        type Clock = FakeClock;

        fn clock(&mut self, name: &str) -> Result<FakeClock> {
            assert_eq!(name, "ltdc-clk");
            if self.0 .0.borrow().fail_clock {
                return Err(Error::ResourceUnavailable);
            }
            Ok(FakeClock(self.0.clone()))
        }

        fn mem_resource(&mut self, index: usize) -> Result<MemResource> {
            assert_eq!(index, 0);
            Ok(MemResource {
                start: MMIO_START,
                len: 256,
            })
        }

        fn ioremap(&mut self, res: &MemResource) -> Result<RegWindow> {
            let mut s = self.0 .0.borrow_mut();
            s.events.push(Mapped);
            let base = s.regs.as_mut_ptr();
            Ok(unsafe { RegWindow::new(base, res.len) })
        }

        fn iounmap(&mut self, _win: RegWindow) {
            self.0 .0.borrow_mut().events.push(Unmapped);
        }

        fn irq(&mut self, name: &str) -> Result<IrqLine> {
            let fail = self.0 .0.borrow().fail_irq;
            match name {
                "ltdc-irq" => Ok(IrqLine(88)),
                "ltdc-error-irq" if !fail => Ok(IrqLine(89)),
                _ => Err(Error::ResourceUnavailable),
            }
        }

        fn alloc_coherent(&mut self, len: usize) -> Result<DmaRegion> {
            let mut s = self.0 .0.borrow_mut();
            if s.fail_alloc {
                return Err(Error::OutOfMemory);
            }
            s.events.push(DmaAllocated);
            s.dma = Some(vec![0u8; len].into_boxed_slice());
            let cpu = NonNull::new(s.dma.as_mut().unwrap().as_mut_ptr()).unwrap();
            Ok(DmaRegion {
                cpu,
                bus: DMA_BUS,
                len,
            })
        }

        fn free_coherent(&mut self, _region: DmaRegion) {
            let mut s = self.0 .0.borrow_mut();
            s.dma.take().expect("coherent region freed twice");
            s.events.push(DmaFreed);
        }
    }

    struct FakeRegistry(Shared);

    impl FbRegistry for FakeRegistry {
        fn register(&mut self, fix: &FixScreenInfo, _var: &VarScreenInfo) -> Result<FbId> {
            assert_eq!(fix.id, FB_ID);
            if self.0 .0.borrow().fail_register {
                return Err(Error::RegistrationFailed);
            }
            self.0 .0.borrow_mut().events.push(Registered);
            Ok(FbId(0))
        }

        fn unregister(&mut self, id: FbId) {
            assert_eq!(id, FbId(0));
            self.0 .0.borrow_mut().events.push(Unregistered);
        }

        fn alloc_cmap(&mut self, entries: u16) -> Result<ColorMap> {
            assert_eq!(entries, 256);
            if self.0 .0.borrow().fail_cmap {
                return Err(Error::OutOfMemory);
            }
            self.0 .0.borrow_mut().events.push(CmapAllocated);
            Ok(ColorMap { entries })
        }

        fn dealloc_cmap(&mut self, _cmap: ColorMap) {
            self.0 .0.borrow_mut().events.push(CmapFreed);
        }
    }

    const TIMING: DisplayTiming = DisplayTiming {
        pixelclock: 9_000_000,
        hactive: 480,
        vactive: 272,
        hfront_porch: 32,
        hback_porch: 13,
        hsync_len: 41,
        vfront_porch: 2,
        vback_porch: 10,
        vsync_len: 10,
    };

    fn dpi_node(timing: &DisplayTiming) -> LtdcNode<'_> {
        LtdcNode {
            endpoint: Some(PanelEndpoint {
                compatible: "panel-dpi",
                timing: Some(timing),
            }),
            max_memory_bandwidth: None,
        }
    }

    fn probe(shared: &Shared, node: &LtdcNode<'_>) -> Result<LtdcFb<FakePlatform, FakeRegistry>> {
        LtdcFb::probe(FakePlatform(shared.clone()), FakeRegistry(shared.clone()), node)
    }

    #[test]
    fn probe_programs_the_pipeline() {
        let shared = Shared::default();
        let fb = probe(&shared, &dpi_node(&TIMING)).unwrap();

        assert_eq!(
            shared.events(),
            [ClockEnabled, Mapped, DmaAllocated, CmapAllocated, Registered]
        );

        let t = TimingRegs::from_mode(&fb.panel().mode);
        assert_eq!(shared.reg(LTDC_SSCR), t.sscr);
        assert_eq!(shared.reg(LTDC_BPCR), t.bpcr);
        assert_eq!(shared.reg(LTDC_AWCR), t.awcr);
        assert_eq!(shared.reg(LTDC_TWCR), t.twcr);

        assert_eq!(shared.reg(LTDC_BCCR), 0);
        assert_eq!(shared.reg(LTDC_IER), 0xf);
        assert_eq!(shared.reg(LTDC_GCR), GCR_LTDCEN);
        assert_eq!(shared.reg(LTDC_L1CR), L1CR_LEN);
        assert_eq!(shared.reg(LTDC_L1CFBAR), DMA_BUS);
        assert_eq!(shared.reg(LTDC_L1CFBLR), pack_line_length(480 * 4));
        assert_eq!(shared.reg(LTDC_L1PFCR), 0);

        assert_eq!(fb.fix().smem_len, 480 * 272 * 4);
        assert_eq!(fb.fix().line_length, 480 * 4);
        assert_eq!(fb.fix().mmio_start, MMIO_START);
        assert_eq!(fb.var().xres, 480);
        assert_eq!(fb.var().bits_per_pixel, 32);
        assert_eq!(fb.var().blue.offset, 0);
        assert_eq!(fb.var().transp.offset, 24);
        assert_eq!(fb.irq_lines(), Some((IrqLine(88), IrqLine(89))));
        assert_eq!(fb.panel().width_mm, -1);
        assert_eq!(fb.panel().height_mm, -1);
    }

    #[test]
    fn remove_releases_in_reverse_order() {
        let shared = Shared::default();
        let fb = probe(&shared, &dpi_node(&TIMING)).unwrap();

        fb.remove();

        assert_eq!(
            shared.events(),
            [
                ClockEnabled,
                Mapped,
                DmaAllocated,
                CmapAllocated,
                Registered,
                Unregistered,
                CmapFreed,
                DmaFreed,
                Unmapped,
                ClockDisabled,
            ]
        );
        // layer was disabled before the window went away
        assert_eq!(shared.reg(LTDC_L1CR), 0);
    }

    #[test]
    fn failed_allocation_releases_only_whats_acquired() {
        let shared = Shared::default();
        shared.0.borrow_mut().fail_alloc = true;

        let err = probe(&shared, &dpi_node(&TIMING)).err().unwrap();
        assert_eq!(err, Error::OutOfMemory);

        assert_eq!(
            shared.events(),
            [ClockEnabled, Mapped, Unmapped, ClockDisabled]
        );
    }

    #[test]
    fn failed_cmap_allocation_unwinds_the_buffer() {
        let shared = Shared::default();
        shared.0.borrow_mut().fail_cmap = true;

        let err = probe(&shared, &dpi_node(&TIMING)).err().unwrap();
        assert_eq!(err, Error::OutOfMemory);

        assert_eq!(
            shared.events(),
            [ClockEnabled, Mapped, DmaAllocated, DmaFreed, Unmapped, ClockDisabled]
        );
    }

    #[test]
    fn failed_registration_unwinds_everything() {
        let shared = Shared::default();
        shared.0.borrow_mut().fail_register = true;

        let err = probe(&shared, &dpi_node(&TIMING)).err().unwrap();
        assert_eq!(err, Error::RegistrationFailed);

        assert_eq!(
            shared.events(),
            [
                ClockEnabled,
                Mapped,
                DmaAllocated,
                CmapAllocated,
                CmapFreed,
                DmaFreed,
                Unmapped,
                ClockDisabled,
            ]
        );
    }

    #[test]
    fn failed_irq_lookup_aborts_probe() {
        let shared = Shared::default();
        shared.0.borrow_mut().fail_irq = true;

        let err = probe(&shared, &dpi_node(&TIMING)).err().unwrap();
        assert_eq!(err, Error::ResourceUnavailable);
        assert_eq!(
            shared.events(),
            [ClockEnabled, Mapped, Unmapped, ClockDisabled]
        );
    }

    #[test]
    fn missing_clock_is_fatal() {
        let shared = Shared::default();
        shared.0.borrow_mut().fail_clock = true;

        let err = probe(&shared, &dpi_node(&TIMING)).err().unwrap();
        assert_eq!(err, Error::ResourceUnavailable);
        assert_eq!(shared.events(), []);
    }

    #[test]
    fn foreign_panels_are_rejected() {
        let shared = Shared::default();

        let node = LtdcNode {
            endpoint: Some(PanelEndpoint {
                compatible: "acme,lvds-bridge",
                timing: Some(&TIMING),
            }),
            max_memory_bandwidth: None,
        };
        assert_eq!(probe(&shared, &node).err().unwrap(), Error::NotSupported);

        assert_eq!(
            probe(&shared, &LtdcNode::default()).err().unwrap(),
            Error::NoDevice
        );
        assert_eq!(shared.events(), []);
    }

    #[test]
    fn mode_requests_validate_depth_and_budget() {
        let shared = Shared::default();
        let fb = probe(&shared, &dpi_node(&TIMING)).unwrap();

        let mut sixteen = *fb.var();
        sixteen.bits_per_pixel = 16;
        assert_eq!(
            fb.check_var(&mut sixteen),
            Err(Error::InvalidArgument)
        );

        let mut oversized = *fb.var();
        oversized.yres_virtual = 273;
        assert_eq!(
            fb.check_var(&mut oversized),
            Err(Error::InvalidArgument)
        );

        let mut exact = *fb.var();
        assert_eq!(fb.check_var(&mut exact), Ok(()));
    }

    #[test]
    fn set_var_applies_an_accepted_mode() {
        let shared = Shared::default();
        let mut fb = probe(&shared, &dpi_node(&TIMING)).unwrap();

        let requested = *fb.var();
        fb.set_var(requested).unwrap();
        assert_eq!(fb.fix().line_length, 480 * 4);
        assert_eq!(fb.fix().visual, Visual::Truecolor);

        let mut bad = requested;
        bad.bits_per_pixel = 24;
        assert_eq!(fb.set_var(bad), Err(Error::InvalidArgument));
        // the rejected request left the applied mode alone
        assert_eq!(fb.var().bits_per_pixel, 32);
    }

    #[test]
    fn repeated_set_par_writes_identical_layer_state() {
        let shared = Shared::default();
        let mut fb = probe(&shared, &dpi_node(&TIMING)).unwrap();

        fb.set_par().unwrap();
        let first = (
            shared.reg(LTDC_L1CFBAR),
            shared.reg(LTDC_L1CFBLR),
            shared.reg(LTDC_L1PFCR),
        );

        fb.set_par().unwrap();
        let second = (
            shared.reg(LTDC_L1CFBAR),
            shared.reg(LTDC_L1CFBLR),
            shared.reg(LTDC_L1PFCR),
        );

        assert_eq!(first, second);
        assert_eq!(first.0, DMA_BUS);
    }

    #[test]
    fn panning_is_bounded_by_the_virtual_screen() {
        let shared = Shared::default();
        let mut fb = probe(&shared, &dpi_node(&TIMING)).unwrap();

        // one frame allocated: only offset zero fits
        assert_eq!(fb.pan_display(0), Ok(()));
        assert_eq!(shared.reg(LTDC_L1CFBAR), DMA_BUS);
        assert_eq!(fb.pan_display(1), Err(Error::InvalidArgument));
        assert_eq!(fb.var().yoffset, 0);
    }

    #[test]
    fn mmap_is_range_checked() {
        let shared = Shared::default();
        let fb = probe(&shared, &dpi_node(&TIMING)).unwrap();
        let total = fb.fix().smem_len as usize;

        let whole = fb.mmap(0, total).unwrap();
        assert_eq!(whole.bus, DMA_BUS);
        assert_eq!(whole.len, total);

        let tail = fb.mmap(4096, total - 4096).unwrap();
        assert_eq!(tail.bus, DMA_BUS + 4096);

        assert!(fb.mmap(0, total + 1).is_err());
        assert!(fb.mmap(total + 1, 0).is_err());
        assert!(fb.mmap(total, 1).is_err());
        assert!(fb.mmap(total, 0).is_ok());
    }

    #[test]
    fn interrupt_handler_acks_every_cause() {
        let shared = Shared::default();
        let fb = probe(&shared, &dpi_node(&TIMING)).unwrap();

        assert_eq!(shared.reg(LTDC_ICR), 0);
        assert!(fb.interrupt_handler());
        assert_eq!(shared.reg(LTDC_ICR), 0xf);
    }

    #[test]
    fn color_registers_are_rejected_and_blank_is_a_stub() {
        let shared = Shared::default();
        let mut fb = probe(&shared, &dpi_node(&TIMING)).unwrap();

        assert_eq!(
            fb.set_color_register(0, 0xffff, 0, 0, 0),
            Err(Error::InvalidArgument)
        );
        assert_eq!(fb.blank(1), Ok(()));
        assert_eq!(fb.pseudo_palette()[0], 0);
    }

    #[test]
    fn bandwidth_budget_limits_the_advertised_depth() {
        let shared = Shared::default();
        let node = LtdcNode {
            max_memory_bandwidth: Some(10_000_000),
            ..dpi_node(&TIMING)
        };

        let fb = probe(&shared, &node).unwrap();
        assert_eq!(fb.panel().bpp, 8);
        assert_eq!(fb.var().bits_per_pixel, 8);

        // the fixed-format policy then rejects the mode it advertises
        let mut var = *fb.var();
        assert_eq!(fb.check_var(&mut var), Err(Error::InvalidArgument));
    }
}
