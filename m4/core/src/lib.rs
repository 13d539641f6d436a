#![no_std]

//! # M4 Core
//!
//! Platform data shared by the Cortex-M4 interrupt controller and SysTick
//! drivers: validated identifiers for interrupt lines, system exceptions and
//! priorities, the register map of the System Control Space, and the
//! [`RegisterBank`] seam the drivers use to reach it.
//!
//! The constants describe the TM4C123GH6PM: 139 peripheral interrupt lines
//! and 3 implemented priority bits.

use core::fmt;

pub mod exception;
pub mod irq;
pub mod priority;
pub mod regs;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

pub use exception::{Exception, PriorityField};
pub use irq::Irq;
pub use priority::Priority;
pub use regs::{Mmio, Register, RegisterBank};

#[cfg(any(test, feature = "sim"))]
pub use sim::SimRegisters;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result type used by the control layer
pub type CtlResult<T> = Result<T, CtlError>;

/// Errors reported by the interrupt controller and timer drivers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtlError {
    /// Interrupt line outside `0..IRQ_COUNT`
    InvalidIrq(u16),
    /// Exception number without a configurable handler
    InvalidException(u8),
    /// Priority wider than the implemented priority bits
    InvalidPriority(u8),
    /// Duration is zero or its reload value does not fit the 24-bit register
    DurationOutOfRange(u32),
    /// Timer is in a mode that excludes the requested operation
    ModeConflict,
}

impl fmt::Display for CtlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CtlError::InvalidIrq(n) => write!(f, "Invalid interrupt line {}", n),
            CtlError::InvalidException(n) => write!(f, "Invalid exception number {}", n),
            CtlError::InvalidPriority(p) => write!(f, "Invalid priority {}", p),
            CtlError::DurationOutOfRange(ms) => write!(f, "Duration {}ms out of range", ms),
            CtlError::ModeConflict => write!(f, "Timer mode conflict"),
        }
    }
}

#[cfg(feature = "std")]
extern crate std;

#[cfg(feature = "std")]
impl std::error::Error for CtlError {}

#[cfg(feature = "defmt")]
impl defmt::Format for CtlError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            CtlError::InvalidIrq(n) => defmt::write!(fmt, "InvalidIrq({=u16})", n),
            CtlError::InvalidException(n) => defmt::write!(fmt, "InvalidException({=u8})", n),
            CtlError::InvalidPriority(p) => defmt::write!(fmt, "InvalidPriority({=u8})", p),
            CtlError::DurationOutOfRange(ms) => {
                defmt::write!(fmt, "DurationOutOfRange({=u32})", ms)
            }
            CtlError::ModeConflict => defmt::write!(fmt, "ModeConflict"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_equality() {
        assert_eq!(CtlError::InvalidIrq(200), CtlError::InvalidIrq(200));
        assert_ne!(CtlError::InvalidIrq(200), CtlError::InvalidPriority(200));
    }
}
