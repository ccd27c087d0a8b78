//! Driver errors.

/// Errors returned by the platform drivers in this crate.
///
/// Every failure during bring-up is propagated to the caller and causes an
/// ordered release of the resources acquired so far; nothing is retried.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The board description is missing or does not describe this device.
    NoDevice,

    /// The described hardware is not supported by this driver.
    NotSupported,

    /// A required clock, register window or interrupt line could not be
    /// obtained.
    ResourceUnavailable,

    /// A coherent buffer or color map could not be allocated.
    OutOfMemory,

    /// The requested pixel format or geometry failed validation. No device
    /// state was changed.
    InvalidArgument,

    /// The owning subsystem rejected the device registration.
    RegistrationFailed,
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
