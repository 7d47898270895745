//! Recording fakes for the host capabilities
//!
//! `MockGpio` logs every reservation, direction setup, level change,
//! and free, and can be told to fail the nth reserve or configure
//! call. Tests replay the log to recover what the panel would have
//! observed: the byte on the data bus at each enable rising edge and
//! the register-select level framing it.

use std::collections::BTreeMap;
use std::string::{String, ToString};
use std::vec::Vec;

use charpanel_hal::gpio::{GpioBank, GpioError, LineId};
use charpanel_hal::uaccess::CallerBuffer;
use embedded_hal::delay::DelayNs;

use crate::pins::PinAssignment;

/// One host-visible GPIO action, in call order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GpioEvent {
    Reserve { line: LineId, label: String },
    Configure { line: LineId, high: bool },
    Set { line: LineId, high: bool },
    Free { line: LineId },
}

/// Recording GPIO bank with programmable failure points
pub struct MockGpio {
    pub events: Vec<GpioEvent>,
    /// Fail the nth reserve call (0-based)
    pub fail_reserve_at: Option<usize>,
    /// Fail the nth configure call (0-based)
    pub fail_configure_at: Option<usize>,
    reserve_calls: usize,
    configure_calls: usize,
}

impl MockGpio {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            fail_reserve_at: None,
            fail_configure_at: None,
            reserve_calls: 0,
            configure_calls: 0,
        }
    }

    pub fn reserved_lines(&self) -> Vec<LineId> {
        self.events
            .iter()
            .filter_map(|ev| match ev {
                GpioEvent::Reserve { line, .. } => Some(*line),
                _ => None,
            })
            .collect()
    }

    pub fn reserved_labels(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|ev| match ev {
                GpioEvent::Reserve { label, .. } => Some(label.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn configured_lines(&self) -> Vec<LineId> {
        self.events
            .iter()
            .filter_map(|ev| match ev {
                GpioEvent::Configure { line, .. } => Some(*line),
                _ => None,
            })
            .collect()
    }

    pub fn configured_levels(&self) -> Vec<bool> {
        self.events
            .iter()
            .filter_map(|ev| match ev {
                GpioEvent::Configure { high, .. } => Some(*high),
                _ => None,
            })
            .collect()
    }

    pub fn freed_lines(&self) -> Vec<LineId> {
        self.events
            .iter()
            .filter_map(|ev| match ev {
                GpioEvent::Free { line } => Some(*line),
                _ => None,
            })
            .collect()
    }

    /// Every explicit level change, in call order
    pub fn level_events(&self) -> Vec<(LineId, bool)> {
        self.events
            .iter()
            .filter_map(|ev| match ev {
                GpioEvent::Set { line, high } => Some((*line, *high)),
                _ => None,
            })
            .collect()
    }

    /// Final driven level of a line, if it was ever driven
    pub fn level(&self, line: LineId) -> Option<bool> {
        self.replay(|_, _| {}).get(&line).copied()
    }

    /// Bytes committed by enable rising edges, regardless of framing
    pub fn strobed_bytes(&self, assignment: &PinAssignment) -> Vec<u8> {
        self.transfers(assignment)
            .into_iter()
            .map(|(_, byte)| byte)
            .collect()
    }

    /// Decode the log into committed transfers.
    ///
    /// Each enable rising edge samples the data bus (bit n from line
    /// Dn) and the register-select level: `(true, byte)` is a
    /// character, `(false, byte)` an instruction. Undriven lines read
    /// low, matching the driven-low output configuration.
    pub fn transfers(&self, assignment: &PinAssignment) -> Vec<(bool, u8)> {
        let mut out = Vec::new();
        self.replay(|levels, edge| {
            if edge == assignment.enable {
                let mut byte = 0u8;
                for (bit, &line) in assignment.data.iter().enumerate() {
                    if levels.get(&line).copied().unwrap_or(false) {
                        byte |= 1 << bit;
                    }
                }
                let rs = levels.get(&assignment.rs).copied().unwrap_or(false);
                out.push((rs, byte));
            }
        });
        out
    }

    /// Walk the event log tracking line levels; `on_rising` fires for
    /// every 0->1 transition with the levels as of just before it.
    fn replay<F: FnMut(&BTreeMap<LineId, bool>, LineId)>(
        &self,
        mut on_rising: F,
    ) -> BTreeMap<LineId, bool> {
        let mut levels: BTreeMap<LineId, bool> = BTreeMap::new();
        for ev in &self.events {
            match ev {
                GpioEvent::Configure { line, high } | GpioEvent::Set { line, high } => {
                    let was_high = levels.get(line).copied().unwrap_or(false);
                    if *high && !was_high {
                        on_rising(&levels, *line);
                    }
                    levels.insert(*line, *high);
                }
                _ => {}
            }
        }
        levels
    }
}

impl GpioBank for MockGpio {
    fn reserve(&mut self, line: LineId, label: &str) -> Result<(), GpioError> {
        let call = self.reserve_calls;
        self.reserve_calls += 1;
        if self.fail_reserve_at == Some(call) {
            return Err(GpioError::InUse);
        }
        self.events.push(GpioEvent::Reserve {
            line,
            label: label.to_string(),
        });
        Ok(())
    }

    fn configure_output(&mut self, line: LineId, high: bool) -> Result<(), GpioError> {
        let call = self.configure_calls;
        self.configure_calls += 1;
        if self.fail_configure_at == Some(call) {
            return Err(GpioError::DirectionUnsupported);
        }
        self.events.push(GpioEvent::Configure { line, high });
        Ok(())
    }

    fn set_level(&mut self, line: LineId, high: bool) {
        self.events.push(GpioEvent::Set { line, high });
    }

    fn free(&mut self, line: LineId) {
        self.events.push(GpioEvent::Free { line });
    }
}

/// Counting delay source; no wall-clock time passes
#[derive(Debug, Default)]
pub struct MockDelay {
    /// Number of delay calls observed
    pub calls: u32,
    /// Total requested delay in nanoseconds
    pub total_ns: u64,
}

impl MockDelay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.calls += 1;
        self.total_ns += u64::from(ns);
    }

    // Count ms-granularity calls directly so `calls` maps 1:1 onto
    // settle intervals instead of the default ns-chunking.
    fn delay_ms(&mut self, ms: u32) {
        self.calls += 1;
        self.total_ns += u64::from(ms) * 1_000_000;
    }
}

/// Copier that leaves the tail of every destination unread
pub struct ShortCopy {
    /// Bytes at the end of each copy to report as not copied
    pub unread: usize,
}

impl CallerBuffer for ShortCopy {
    fn copy_from_caller(&mut self, dest: &mut [u8], src: &[u8]) -> usize {
        let n = dest.len();
        let unread = self.unread.min(n);
        let copied = n - unread;
        dest[..copied].copy_from_slice(&src[..copied]);
        unread
    }
}
