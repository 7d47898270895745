//! Pin roles, line assignment, and all-or-nothing acquisition
//!
//! The panel needs ten GPIO lines: register select, the enable strobe,
//! and eight data lines. This module fixes the mapping of those roles
//! onto physical line identifiers and reserves the whole set from the
//! host atomically: either all ten lines come up reserved and driven
//! low as outputs, or every line touched so far is freed again in
//! reverse order and the failure is reported with the role it hit.

use charpanel_hal::gpio::{GpioBank, LineId};
use heapless::Vec;

/// Number of GPIO lines the panel occupies
pub const PIN_COUNT: usize = 10;

/// Logical role of one of the ten panel lines
///
/// The enum order is the fixed acquisition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinRole {
    /// Register select: low = instruction, high = character data
    Rs,
    /// Enable strobe: rising-then-falling pulse commits the data bus
    Enable,
    Data0,
    Data1,
    Data2,
    Data3,
    Data4,
    Data5,
    Data6,
    Data7,
}

impl PinRole {
    /// All roles in acquisition order
    pub const ALL: [PinRole; PIN_COUNT] = [
        PinRole::Rs,
        PinRole::Enable,
        PinRole::Data0,
        PinRole::Data1,
        PinRole::Data2,
        PinRole::Data3,
        PinRole::Data4,
        PinRole::Data5,
        PinRole::Data6,
        PinRole::Data7,
    ];

    /// Label passed to the host when reserving the line
    pub fn label(self) -> &'static str {
        match self {
            PinRole::Rs => "RS",
            PinRole::Enable => "E",
            PinRole::Data0 => "D0",
            PinRole::Data1 => "D1",
            PinRole::Data2 => "D2",
            PinRole::Data3 => "D3",
            PinRole::Data4 => "D4",
            PinRole::Data5 => "D5",
            PinRole::Data6 => "D6",
            PinRole::Data7 => "D7",
        }
    }
}

/// Mapping of the ten logical roles onto physical line identifiers
///
/// Fixed at construction; the bank never re-maps after acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinAssignment {
    /// Register-select line
    pub rs: LineId,
    /// Enable-strobe line
    pub enable: LineId,
    /// Data lines, index n carries bit n of each transferred byte
    pub data: [LineId; 8],
}

impl Default for PinAssignment {
    /// The production wiring of the reference board
    fn default() -> Self {
        Self {
            rs: 6,
            enable: 0,
            data: [11, 9, 10, 22, 27, 4, 3, 2],
        }
    }
}

impl PinAssignment {
    /// Physical line carrying the given role
    pub fn line(&self, role: PinRole) -> LineId {
        match role {
            PinRole::Rs => self.rs,
            PinRole::Enable => self.enable,
            PinRole::Data0 => self.data[0],
            PinRole::Data1 => self.data[1],
            PinRole::Data2 => self.data[2],
            PinRole::Data3 => self.data[3],
            PinRole::Data4 => self.data[4],
            PinRole::Data5 => self.data[5],
            PinRole::Data6 => self.data[6],
            PinRole::Data7 => self.data[7],
        }
    }

    /// Check that no two roles share a physical line
    pub fn lines_distinct(&self) -> bool {
        let roles = PinRole::ALL;
        for i in 0..roles.len() {
            for j in (i + 1)..roles.len() {
                if self.line(roles[i]) == self.line(roles[j]) {
                    return false;
                }
            }
        }
        true
    }
}

/// Errors from acquiring the pin bank
///
/// Whenever one of these is returned, every line reserved up to the
/// failure point has already been freed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AcquireError {
    /// Two roles in the assignment map to the same physical line
    DuplicateLine,
    /// The host refused to reserve the line for this role
    Reserve {
        /// Role whose reservation failed
        role: PinRole,
    },
    /// The line for this role could not be configured as an output
    Direction {
        /// Role whose direction setup failed
        role: PinRole,
    },
}

/// Ownership token over the ten reserved, output-configured lines
///
/// A `PinBank` exists only between a fully successful
/// [`acquire`](Self::acquire) and [`release`](Self::release); it is
/// never partially valid. Level control is infallible once the bank
/// exists.
pub struct PinBank<G: GpioBank> {
    gpio: G,
    assignment: PinAssignment,
}

impl<G: GpioBank> PinBank<G> {
    /// Reserve all ten lines and configure them as outputs driven low.
    ///
    /// Reservation and direction setup run in role order. A failure at
    /// any step frees everything reserved so far in reverse order and
    /// reports the role that failed; the host is left exactly as it
    /// was before the call.
    pub fn acquire(mut gpio: G, assignment: PinAssignment) -> Result<Self, AcquireError> {
        if !assignment.lines_distinct() {
            return Err(AcquireError::DuplicateLine);
        }

        let mut reserved: Vec<LineId, PIN_COUNT> = Vec::new();
        for role in PinRole::ALL {
            let line = assignment.line(role);
            if gpio.reserve(line, role.label()).is_err() {
                #[cfg(feature = "defmt")]
                defmt::warn!("line reservation failed for {}", role.label());
                Self::rollback(&mut gpio, &reserved);
                return Err(AcquireError::Reserve { role });
            }
            // Capacity matches the role count, the push cannot fail.
            let _ = reserved.push(line);
        }

        for role in PinRole::ALL {
            if gpio.configure_output(assignment.line(role), false).is_err() {
                #[cfg(feature = "defmt")]
                defmt::warn!("output setup failed for {}", role.label());
                Self::rollback(&mut gpio, &reserved);
                return Err(AcquireError::Direction { role });
            }
        }

        Ok(Self { gpio, assignment })
    }

    /// Single cleanup path: free reserved lines in reverse order.
    fn rollback(gpio: &mut G, reserved: &[LineId]) {
        for &line in reserved.iter().rev() {
            gpio.free(line);
        }
    }

    /// Drive one line of the bank (`true` = high).
    pub fn set(&mut self, role: PinRole, high: bool) {
        self.gpio.set_level(self.assignment.line(role), high);
    }

    /// Drive data line `bit` (0..=7), the line carrying bit `bit` of a
    /// transferred byte.
    pub fn set_data(&mut self, bit: u8, high: bool) {
        self.gpio.set_level(self.assignment.data[bit as usize], high);
    }

    /// The assignment this bank was acquired with
    pub fn assignment(&self) -> &PinAssignment {
        &self.assignment
    }

    /// Free all ten lines in reverse acquisition order and hand the
    /// GPIO capability back. Consumes the bank.
    pub fn release(mut self) -> G {
        for role in PinRole::ALL.iter().rev() {
            let line = self.assignment.line(*role);
            self.gpio.free(line);
        }
        self.gpio
    }
}
