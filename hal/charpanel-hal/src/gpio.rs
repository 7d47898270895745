//! GPIO line reservation and control
//!
//! Provides the capability trait the driver uses to reserve physical
//! lines, configure them as outputs, and drive their levels. The host
//! side (a memory-mapped controller, a kernel GPIO subsystem, a test
//! fake) implements this trait.

/// Identifier of a physical GPIO line within the host's bank.
pub type LineId = u32;

/// Errors reported by the host GPIO subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GpioError {
    /// The line is already reserved by another owner
    InUse,
    /// The line identifier does not exist in this bank
    InvalidLine,
    /// The line cannot be driven as a push-pull output
    DirectionUnsupported,
}

/// Host GPIO capability
///
/// Reservation is exclusive: a successful [`reserve`](Self::reserve)
/// must be paired with a later [`free`](Self::free). Level control is
/// infallible once a line has been configured as an output; there is
/// no acknowledgment channel on a parallel LCD bus, so the driver
/// assumes every `set_level` takes effect.
pub trait GpioBank {
    /// Reserve a line for exclusive use, tagging it with a label for
    /// host diagnostics.
    fn reserve(&mut self, line: LineId, label: &str) -> Result<(), GpioError>;

    /// Configure a reserved line as a push-pull output driven at the
    /// given initial level (`true` = high).
    fn configure_output(&mut self, line: LineId, high: bool) -> Result<(), GpioError>;

    /// Drive a configured output line (`true` = high).
    fn set_level(&mut self, line: LineId, high: bool);

    /// Return a reserved line to the host.
    fn free(&mut self, line: LineId);
}

// Forwarding impl so a bank can be lent to the driver by reference.
impl<G: GpioBank> GpioBank for &mut G {
    fn reserve(&mut self, line: LineId, label: &str) -> Result<(), GpioError> {
        (**self).reserve(line, label)
    }

    fn configure_output(&mut self, line: LineId, high: bool) -> Result<(), GpioError> {
        (**self).configure_output(line, high)
    }

    fn set_level(&mut self, line: LineId, high: bool) {
        (**self).set_level(line, high)
    }

    fn free(&mut self, line: LineId) {
        (**self).free(line)
    }
}
