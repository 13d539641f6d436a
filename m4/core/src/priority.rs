//! Interrupt and exception priority levels

use core::fmt;

use crate::{CtlError, CtlResult};

/// Priority bits implemented by the device, taken from the top of each field
pub const PRIORITY_BITS: u32 = 3;

/// Offset of the implemented bits inside an 8-bit priority field
pub const PRIORITY_FIELD_OFFSET: u32 = 8 - PRIORITY_BITS;

/// Priority level of an interrupt line or system exception.
///
/// Lower values preempt higher ones. Only the numeric level is stored; the
/// hardware does all ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(u8);

impl Priority {
    /// Most urgent level
    pub const HIGHEST: Priority = Priority(0);

    /// Least urgent level
    pub const LOWEST: Priority = Priority((1 << PRIORITY_BITS) - 1);

    /// Validate a priority level
    pub const fn new(level: u8) -> CtlResult<Self> {
        if level <= Self::LOWEST.0 {
            Ok(Priority(level))
        } else {
            Err(CtlError::InvalidPriority(level))
        }
    }

    /// Raw priority level
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Value of the full 8-bit hardware field
    pub const fn encoded(self) -> u8 {
        self.0 << PRIORITY_FIELD_OFFSET
    }

    /// Decode an 8-bit hardware field, ignoring unimplemented low bits
    pub const fn from_encoded(field: u8) -> Self {
        Priority(field >> PRIORITY_FIELD_OFFSET)
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::HIGHEST
    }
}

impl TryFrom<u8> for Priority {
    type Error = CtlError;

    fn try_from(level: u8) -> CtlResult<Self> {
        Self::new(level)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Priority({})", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Priority {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "Priority({=u8})", self.0);
    }
}

/// Build a priority constant, rejecting out-of-range levels at compile time
#[macro_export]
macro_rules! priority {
    ($value:literal) => {
        match $crate::Priority::new($value) {
            Ok(p) => p,
            Err(_) => panic!("priority out of range"),
        }
    };
}
