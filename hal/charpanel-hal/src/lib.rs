//! Charpanel host capability traits
//!
//! This crate defines the narrow interfaces the LCD driver core needs
//! from its host platform. A real deployment implements them over the
//! host GPIO subsystem and caller-memory access; tests implement them
//! with recording fakes so the pin-level protocol can be verified
//! without hardware.
//!
//! # Traits
//!
//! - [`gpio::GpioBank`] - line reservation, direction setup, level control
//! - [`uaccess::CallerBuffer`] - copying bytes from a caller's buffer
//!
//! Delays are taken from `embedded_hal::delay::DelayNs` directly; no
//! bespoke delay trait is defined here.

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod uaccess;

// Re-export key traits at crate root for convenience
pub use gpio::{GpioBank, GpioError, LineId};
pub use uaccess::{CallerBuffer, DirectCopy};
