//! Peripheral interrupt line identifiers

use core::fmt;

use cortex_m::interrupt::InterruptNumber;

use crate::{CtlError, CtlResult};

/// Number of peripheral interrupt lines wired to the NVIC
pub const IRQ_COUNT: u16 = 139;

/// Lines covered by one set-enable or clear-enable register
pub const LINES_PER_ENABLE_REGISTER: u16 = 32;

/// Lines covered by one priority register (one byte each)
pub const LINES_PER_PRIORITY_REGISTER: u16 = 4;

/// Width in bits of a single priority field
pub const PRIORITY_FIELD_WIDTH: u32 = 8;

/// Number of `ISERn`/`ICERn` registers backing `IRQ_COUNT` lines
pub const ENABLE_REGISTER_COUNT: usize =
    IRQ_COUNT.div_ceil(LINES_PER_ENABLE_REGISTER) as usize;

/// Number of `IPRn` registers backing `IRQ_COUNT` lines
pub const PRIORITY_REGISTER_COUNT: usize =
    IRQ_COUNT.div_ceil(LINES_PER_PRIORITY_REGISTER) as usize;

/// A peripheral interrupt line known to be below [`IRQ_COUNT`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Irq(u16);

impl Irq {
    /// Validate a raw interrupt line number
    pub const fn new(line: u16) -> CtlResult<Self> {
        if line < IRQ_COUNT {
            Ok(Irq(line))
        } else {
            Err(CtlError::InvalidIrq(line))
        }
    }

    /// Convert a device-crate interrupt enum
    pub fn from_number<I: InterruptNumber>(interrupt: I) -> CtlResult<Self> {
        Self::new(interrupt.number())
    }

    /// Raw line number
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Index of the `ISERn`/`ICERn` register holding this line
    pub const fn enable_register(self) -> usize {
        (self.0 / LINES_PER_ENABLE_REGISTER) as usize
    }

    /// One-hot mask of this line inside its enable register
    pub const fn enable_mask(self) -> u32 {
        1 << (self.0 % LINES_PER_ENABLE_REGISTER)
    }

    /// Index of the `IPRn` register holding this line's priority byte
    pub const fn priority_register(self) -> usize {
        (self.0 / LINES_PER_PRIORITY_REGISTER) as usize
    }

    /// Bit offset of this line's priority byte inside its register
    pub const fn priority_shift(self) -> u32 {
        (self.0 % LINES_PER_PRIORITY_REGISTER) as u32 * PRIORITY_FIELD_WIDTH
    }
}

// SAFETY: `Irq::new` rejects every number at or above `IRQ_COUNT`, so the
// returned number always names an interrupt the device implements.
unsafe impl InterruptNumber for Irq {
    fn number(self) -> u16 {
        self.0
    }
}

impl TryFrom<u16> for Irq {
    type Error = CtlError;

    fn try_from(line: u16) -> CtlResult<Self> {
        Self::new(line)
    }
}

impl fmt::Display for Irq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IRQ{}", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Irq {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "IRQ{=u16}", self.0);
    }
}
