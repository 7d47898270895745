//! HD44780 parallel-bus character LCD driver
//!
//! Drives an HD44780-class panel over ten GPIO lines (register select,
//! enable strobe, eight data lines) and exposes it as a stream-writable
//! device: bytes written to an open session are rendered as characters.
//!
//! The driver is split along the hardware seams:
//!
//! - [`pins`] - fixed role-to-line assignment and all-or-nothing
//!   acquisition of the ten lines, with reverse-order rollback
//! - [`protocol`] - the timing-critical byte-transfer primitive
//!   (data bus setup, enable strobe, bus clear) and its instruction
//!   and character framings
//! - [`session`] - single-open exclusivity, the power-on init
//!   sequence, and the bounded write-to-display pipeline
//!
//! Host facilities come in through the `charpanel-hal` capability
//! traits, so the whole stack runs unchanged against recording fakes
//! on the host.
//!
//! Every bus operation blocks the calling thread for the configured
//! settle interval around each strobe; there is no cancellation once a
//! write has started.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod pins;
pub mod protocol;
pub mod session;

#[cfg(test)]
pub(crate) mod mock;

// Re-export key types at crate root for convenience
pub use pins::{AcquireError, PinAssignment, PinBank, PinRole};
pub use protocol::{ProtocolConfig, ProtocolEngine};
pub use session::{DeviceSession, OpenError, SessionState, WriteError};
