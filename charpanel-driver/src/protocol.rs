//! Byte-transfer protocol for the HD44780 parallel bus
//!
//! This is the timing-critical core. A logical "send this byte" turns
//! into: put the eight bits on the data lines (bit n onto Dn,
//! least-significant first), pulse the enable strobe with settle
//! delays around each edge, then clear the data bus. Register select
//! picks between instruction framing (RS low) and character framing
//! (RS high), with one extra settle after each mode switch.
//!
//! There is no acknowledgment channel on the bus, so nothing here can
//! fail or retry: correctness rests entirely on bit order and on the
//! settle margins around the strobe.

use charpanel_hal::gpio::GpioBank;
use embedded_hal::delay::DelayNs;

use crate::pins::{PinBank, PinRole};

/// Controller instruction opcodes
pub mod cmd {
    /// Function set: 8-bit bus width
    pub const FUNCTION_SET_8BIT: u8 = 0x30;
    /// Display on, cursor on, cursor blink on
    pub const DISPLAY_AND_CURSOR_ON: u8 = 0x0F;
    /// Clear the display and home the cursor
    pub const CLEAR_DISPLAY: u8 = 0x01;
}

/// Default settle interval around strobe edges and mode switches, in
/// milliseconds. Generous for any HD44780-class controller.
pub const STROBE_SETTLE_MS: u32 = 100;

/// Protocol timing configuration
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProtocolConfig {
    /// Settle interval in ms; the bus must be stable this long before
    /// and after each enable edge
    pub settle_ms: u32,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            settle_ms: STROBE_SETTLE_MS,
        }
    }
}

/// Translates logical byte transfers into sequenced pin transitions
///
/// Owns the acquired [`PinBank`] and a delay source. Every operation
/// blocks the caller for its settle intervals and applies transfers to
/// the bus strictly in call order.
pub struct ProtocolEngine<G: GpioBank, D: DelayNs> {
    pins: PinBank<G>,
    delay: D,
    settle_ms: u32,
}

impl<G: GpioBank, D: DelayNs> ProtocolEngine<G, D> {
    /// Wrap an acquired pin bank and a delay source.
    pub fn new(pins: PinBank<G>, delay: D, config: ProtocolConfig) -> Self {
        Self {
            pins,
            delay,
            settle_ms: config.settle_ms,
        }
    }

    fn settle(&mut self) {
        self.delay.delay_ms(self.settle_ms);
    }

    /// Pulse the enable line: settle, E high, settle, E low, settle.
    ///
    /// The leading settle guarantees the data lines set just before
    /// the call are stable when the controller samples them.
    fn strobe(&mut self) {
        self.settle();
        self.pins.set(PinRole::Enable, true);
        self.settle();
        self.pins.set(PinRole::Enable, false);
        self.settle();
    }

    /// Put `value` on the bus, strobe it in, then clear the bus.
    ///
    /// Bit n of `value` drives data line Dn (LSB first onto D0). After
    /// the strobe all eight data lines are driven low again so the bus
    /// idles in a known state.
    pub fn send_byte(&mut self, value: u8) {
        for bit in 0..8 {
            self.pins.set_data(bit, value & (1 << bit) != 0);
        }
        self.strobe();
        for bit in 0..8 {
            self.pins.set_data(bit, false);
        }
    }

    /// Transfer one instruction opcode (RS low).
    pub fn send_instruction(&mut self, opcode: u8) {
        self.pins.set(PinRole::Rs, false);
        self.settle();
        self.send_byte(opcode);
    }

    /// Transfer one character of display data (RS high).
    pub fn send_char(&mut self, ch: u8) {
        self.pins.set(PinRole::Rs, true);
        self.settle();
        self.send_byte(ch);
    }

    /// Power-on sequence: function set, display on, clear, then the
    /// greeting characters.
    pub fn initialize(&mut self, greeting: &[u8]) {
        self.send_instruction(cmd::FUNCTION_SET_8BIT);
        self.send_instruction(cmd::DISPLAY_AND_CURSOR_ON);
        self.send_instruction(cmd::CLEAR_DISPLAY);
        for &ch in greeting {
            self.send_char(ch);
        }
    }

    /// Blank the panel and release every line, handing the GPIO
    /// capability back.
    pub fn shutdown(mut self) -> G {
        self.send_instruction(cmd::CLEAR_DISPLAY);
        self.pins.release()
    }

    /// The pin bank driven by this engine
    pub fn pins(&self) -> &PinBank<G> {
        &self.pins
    }
}
