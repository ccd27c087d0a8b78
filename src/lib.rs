#![no_std]

//! Platform drivers for STM32 SoCs.
//!
//! Two drivers share this crate: the LTDC framebuffer driver in [`fbdev`]
//! and the glue layer for the on-SoC DesignWare Ethernet MAC in `dwmac`
//! (cargo feature `ethernet`, on by default). Both are thin
//! hardware-enablement shims: they resolve clocks, register windows,
//! interrupt lines and DMA memory through the [`platform`] seam, configure
//! the hardware from a [`board`] description, and hand the interesting work
//! to their owning subsystems.
//!
//! The crate is `no_std` and free of global state; every driver instance is
//! an explicit device context.

pub mod board;
#[cfg(feature = "ethernet")]
pub mod dwmac;
pub mod error;
pub mod fbdev;
pub mod mmio;
pub mod platform;

pub use crate::error::{Error, Result};
