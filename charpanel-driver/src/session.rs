//! Device session: exclusivity, lifecycle, and the write pipeline
//!
//! A [`DeviceSession`] is the externally visible face of the driver.
//! It is created once at module load (acquiring the pins and running
//! the power-on sequence), accepts at most one open consumer at a
//! time, and renders each write by clearing the panel and streaming
//! the freshly copied bytes through the protocol engine.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use charpanel_hal::gpio::GpioBank;
use charpanel_hal::uaccess::CallerBuffer;
use embedded_hal::delay::DelayNs;
use heapless::Vec;

use crate::pins::{AcquireError, PinAssignment, PinBank};
use crate::protocol::{cmd, ProtocolConfig, ProtocolEngine};

/// Capacity of the per-write staging buffer, in bytes
///
/// Longer writes are truncated silently; the buffer is repopulated on
/// every call and never persists across writes.
pub const WRITE_BUFFER_CAPACITY: usize = 18;

/// Greeting streamed to the panel at load time
pub const GREETING: &[u8] = b"LCD ready...";

/// Exclusivity state of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionState {
    /// No consumer attached; `open` will succeed
    Closed,
    /// One consumer attached; further opens fail with Busy
    Open,
}

/// Error from [`DeviceSession::open`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OpenError {
    /// The session is already open
    Busy,
}

/// Error from [`DeviceSession::write`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WriteError {
    /// The session has not been opened
    NotOpen,
}

/// Single-open write session over an initialized panel
///
/// Open and close are atomic compare-and-swap transitions, so racing
/// callers cannot both acquire the session. The write path itself
/// takes `&mut self`; nothing else is shared.
pub struct DeviceSession<G: GpioBank, D: DelayNs> {
    engine: ProtocolEngine<G, D>,
    open: AtomicBool,
    ref_count: AtomicU32,
    buffer: Vec<u8, WRITE_BUFFER_CAPACITY>,
}

impl<G: GpioBank, D: DelayNs> DeviceSession<G, D> {
    /// Module-load path: acquire all ten lines, run the power-on
    /// instruction sequence, and paint the greeting.
    ///
    /// On any acquisition failure every reserved line has been freed
    /// and no instruction was ever put on the bus.
    pub fn load(
        gpio: G,
        delay: D,
        assignment: PinAssignment,
        config: ProtocolConfig,
    ) -> Result<Self, AcquireError> {
        let pins = PinBank::acquire(gpio, assignment)?;
        let mut engine = ProtocolEngine::new(pins, delay, config);
        engine.initialize(GREETING);
        #[cfg(feature = "defmt")]
        defmt::info!("display session ready");
        Ok(Self {
            engine,
            open: AtomicBool::new(false),
            ref_count: AtomicU32::new(0),
            buffer: Vec::new(),
        })
    }

    /// Current exclusivity state
    pub fn state(&self) -> SessionState {
        if self.open.load(Ordering::Acquire) {
            SessionState::Open
        } else {
            SessionState::Closed
        }
    }

    /// Usage count surfaced for the host's module-in-use accounting
    pub fn ref_count(&self) -> u32 {
        self.ref_count.load(Ordering::Acquire)
    }

    /// Attach the single consumer: Closed -> Open.
    ///
    /// Fails with [`OpenError::Busy`] and leaves the state untouched
    /// if the session is already open.
    pub fn open(&self) -> Result<(), OpenError> {
        self.open
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| OpenError::Busy)?;
        self.ref_count.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    /// Detach the consumer: Open -> Closed. Always succeeds.
    ///
    /// The usage count saturates at zero, so a stray close on an
    /// already-closed session cannot drive it negative.
    pub fn close(&self) {
        self.open.store(false, Ordering::Release);
        let _ = self
            .ref_count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
    }

    /// Render caller bytes onto the panel.
    ///
    /// At most [`WRITE_BUFFER_CAPACITY`] bytes are taken from `data`;
    /// the rest is dropped silently. The host copier stages the bytes
    /// and reports how many it failed to copy. The panel is cleared
    /// and repainted even when the copy was partial or the buffer is
    /// empty; a partial copy only lowers the returned count, it is not
    /// an error. The last staged byte is never painted (the byte count
    /// still includes it) - long-standing behavior of the reference
    /// board, kept until its intent is confirmed.
    ///
    /// Blocks for the full settle schedule of every transfer; a write
    /// cannot be aborted once started.
    pub fn write<C: CallerBuffer>(
        &mut self,
        copier: &mut C,
        data: &[u8],
    ) -> Result<usize, WriteError> {
        if self.state() == SessionState::Closed {
            return Err(WriteError::NotOpen);
        }

        let n = data.len().min(WRITE_BUFFER_CAPACITY);
        self.buffer.clear();
        // Capacity bounds n, the resize cannot fail.
        let _ = self.buffer.resize(n, 0);
        let unread = copier.copy_from_caller(&mut self.buffer[..n], &data[..n]);

        self.engine.send_instruction(cmd::CLEAR_DISPLAY);
        for i in 0..n.saturating_sub(1) {
            self.engine.send_char(self.buffer[i]);
        }

        Ok(n.saturating_sub(unread))
    }

    /// Module-unload path: blank the panel, free all ten lines in
    /// reverse acquisition order, and hand the GPIO capability back.
    pub fn unload(self) -> G {
        #[cfg(feature = "defmt")]
        defmt::info!("releasing display session");
        self.engine.shutdown()
    }

    /// The protocol engine backing this session
    pub fn engine(&self) -> &ProtocolEngine<G, D> {
        &self.engine
    }
}
