//! Configurable system exceptions and their System Control Block fields

use core::fmt;

use crate::priority::{PRIORITY_BITS, PRIORITY_FIELD_OFFSET};
use crate::regs::Register;
use crate::{CtlError, CtlResult};

/// `SHCSR.MEMFAULTENA`
pub const MEM_FAULT_ENABLE: u32 = 1 << 16;
/// `SHCSR.BUSFAULTENA`
pub const BUS_FAULT_ENABLE: u32 = 1 << 17;
/// `SHCSR.USGFAULTENA`
pub const USAGE_FAULT_ENABLE: u32 = 1 << 18;

/// System exceptions whose priority software may configure.
///
/// NMI, HardFault and Reset have fixed priorities and are not represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Exception {
    MemoryManagement,
    BusFault,
    UsageFault,
    SVCall,
    DebugMonitor,
    PendSV,
    SysTick,
}

/// Location of a priority field inside a system handler priority register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityField {
    pub register: Register,
    pub shift: u32,
    pub mask: u32,
}

impl PriorityField {
    const fn lane(register: Register, byte: u32) -> Self {
        let shift = byte * 8 + PRIORITY_FIELD_OFFSET;
        Self {
            register,
            shift,
            mask: ((1 << PRIORITY_BITS) - 1) << shift,
        }
    }
}

impl Exception {
    /// Every configurable exception, in vector order
    pub const ALL: [Exception; 7] = [
        Exception::MemoryManagement,
        Exception::BusFault,
        Exception::UsageFault,
        Exception::SVCall,
        Exception::DebugMonitor,
        Exception::PendSV,
        Exception::SysTick,
    ];

    /// Architectural exception number (vector table index)
    pub const fn number(self) -> u8 {
        match self {
            Exception::MemoryManagement => 4,
            Exception::BusFault => 5,
            Exception::UsageFault => 6,
            Exception::SVCall => 11,
            Exception::DebugMonitor => 12,
            Exception::PendSV => 14,
            Exception::SysTick => 15,
        }
    }

    /// Priority field of this exception in `SHPR1..3`
    pub const fn priority_field(self) -> PriorityField {
        match self {
            Exception::MemoryManagement => PriorityField::lane(Register::SystemPriority1, 0),
            Exception::BusFault => PriorityField::lane(Register::SystemPriority1, 1),
            Exception::UsageFault => PriorityField::lane(Register::SystemPriority1, 2),
            Exception::SVCall => PriorityField::lane(Register::SystemPriority2, 3),
            Exception::DebugMonitor => PriorityField::lane(Register::SystemPriority3, 0),
            Exception::PendSV => PriorityField::lane(Register::SystemPriority3, 2),
            Exception::SysTick => PriorityField::lane(Register::SystemPriority3, 3),
        }
    }

    /// Enable bit in `SHCSR`.
    ///
    /// `None` for SVCall, DebugMonitor, PendSV and SysTick: the core has no
    /// independent enable for them and they are active whenever their vector
    /// is populated.
    pub const fn enable_bit(self) -> Option<u32> {
        match self {
            Exception::MemoryManagement => Some(MEM_FAULT_ENABLE),
            Exception::BusFault => Some(BUS_FAULT_ENABLE),
            Exception::UsageFault => Some(USAGE_FAULT_ENABLE),
            Exception::SVCall
            | Exception::DebugMonitor
            | Exception::PendSV
            | Exception::SysTick => None,
        }
    }

    /// True for the fault handlers gated by `SHCSR`
    pub const fn is_fault(self) -> bool {
        self.enable_bit().is_some()
    }
}

impl TryFrom<u8> for Exception {
    type Error = CtlError;

    fn try_from(number: u8) -> CtlResult<Self> {
        Exception::ALL
            .into_iter()
            .find(|exception| exception.number() == number)
            .ok_or(CtlError::InvalidException(number))
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Exception::MemoryManagement => "MemoryManagement",
            Exception::BusFault => "BusFault",
            Exception::UsageFault => "UsageFault",
            Exception::SVCall => "SVCall",
            Exception::DebugMonitor => "DebugMonitor",
            Exception::PendSV => "PendSV",
            Exception::SysTick => "SysTick",
        };
        f.write_str(name)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Exception {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "Exception({=u8})", self.number());
    }
}
