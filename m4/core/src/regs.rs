//! System Control Space register map and access seam
//!
//! Drivers never touch addresses directly. They name a [`Register`] and go
//! through a [`RegisterBank`], which is [`Mmio`] on the target and
//! [`SimRegisters`](crate::SimRegisters) on the host.

use cortex_m::peripheral::{NVIC, SCB, SYST};

use crate::irq::{ENABLE_REGISTER_COUNT, PRIORITY_REGISTER_COUNT};

/// 32-bit registers used by the control layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    /// `ISERn`: writing 1 enables a line, reads return the enable state
    InterruptSetEnable(usize),
    /// `ICERn`: writing 1 disables a line, reads return the enable state
    InterruptClearEnable(usize),
    /// `IPRn`: four 8-bit priority fields
    InterruptPriority(usize),
    /// `SHPR1`: MemManage, BusFault, UsageFault priorities
    SystemPriority1,
    /// `SHPR2`: SVCall priority
    SystemPriority2,
    /// `SHPR3`: DebugMonitor, PendSV, SysTick priorities
    SystemPriority3,
    /// `SHCSR`: fault handler enables
    SystemHandlerControl,
    /// `SYST_CSR`
    SysTickControl,
    /// `SYST_RVR`
    SysTickReload,
    /// `SYST_CVR`
    SysTickCurrent,
}

const ISER_OFFSET: usize = 0x000;
const ICER_OFFSET: usize = 0x080;
const IPR_OFFSET: usize = 0x300;

// Relative to `SCB::PTR` (CPUID at 0xE000_ED00 + 4)
const SHPR1_OFFSET: usize = 0x14;
const SHPR2_OFFSET: usize = 0x18;
const SHPR3_OFFSET: usize = 0x1C;
const SHCSR_OFFSET: usize = 0x20;

const SYST_CSR_OFFSET: usize = 0x0;
const SYST_RVR_OFFSET: usize = 0x4;
const SYST_CVR_OFFSET: usize = 0x8;

impl Register {
    /// Whether the register index exists on this device
    pub const fn is_implemented(self) -> bool {
        match self {
            Register::InterruptSetEnable(n) | Register::InterruptClearEnable(n) => {
                n < ENABLE_REGISTER_COUNT
            }
            Register::InterruptPriority(n) => n < PRIORITY_REGISTER_COUNT,
            _ => true,
        }
    }

    /// Physical address on an ARMv7-M core
    pub fn address(self) -> usize {
        let nvic = NVIC::PTR as usize;
        let scb = SCB::PTR as usize;
        let syst = SYST::PTR as usize;

        match self {
            Register::InterruptSetEnable(n) => nvic + ISER_OFFSET + 4 * n,
            Register::InterruptClearEnable(n) => nvic + ICER_OFFSET + 4 * n,
            Register::InterruptPriority(n) => nvic + IPR_OFFSET + 4 * n,
            Register::SystemPriority1 => scb + SHPR1_OFFSET,
            Register::SystemPriority2 => scb + SHPR2_OFFSET,
            Register::SystemPriority3 => scb + SHPR3_OFFSET,
            Register::SystemHandlerControl => scb + SHCSR_OFFSET,
            Register::SysTickControl => syst + SYST_CSR_OFFSET,
            Register::SysTickReload => syst + SYST_RVR_OFFSET,
            Register::SysTickCurrent => syst + SYST_CVR_OFFSET,
        }
    }
}

/// Word access to the control registers.
///
/// Implementations must be usable from both thread and interrupt context.
pub trait RegisterBank {
    /// Read a full register word
    fn read(&self, reg: Register) -> u32;

    /// Write a full register word
    fn write(&self, reg: Register, value: u32);

    /// Read-modify-write a register word.
    ///
    /// The read and the write happen inside one critical section, so two
    /// writers updating different fields of the same word cannot lose each
    /// other's update. Every partial update of a shared word must go through
    /// here.
    fn modify<F>(&self, reg: Register, f: F)
    where
        F: FnOnce(u32) -> u32,
    {
        critical_section::with(|_| {
            let value = self.read(reg);
            self.write(reg, f(value));
        });
    }

    /// Make preceding writes take effect before the next instruction
    fn barrier(&self) {}
}

impl<B: RegisterBank + ?Sized> RegisterBank for &B {
    fn read(&self, reg: Register) -> u32 {
        (**self).read(reg)
    }

    fn write(&self, reg: Register, value: u32) {
        (**self).write(reg, value)
    }

    fn modify<F>(&self, reg: Register, f: F)
    where
        F: FnOnce(u32) -> u32,
    {
        (**self).modify(reg, f)
    }

    fn barrier(&self) {
        (**self).barrier()
    }
}

/// Volatile access to the memory-mapped registers of the running core
#[derive(Debug)]
pub struct Mmio {
    _private: (),
}

impl Mmio {
    /// Create the register accessor.
    ///
    /// # Safety
    ///
    /// The caller must be running on an ARMv7-M core and must ensure no other
    /// code writes the NVIC, SHPR/SHCSR or SysTick registers behind the
    /// drivers' back.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl RegisterBank for Mmio {
    fn read(&self, reg: Register) -> u32 {
        debug_assert!(reg.is_implemented());
        // SAFETY: `address` yields an aligned System Control Space register
        // and `Mmio::new` guarantees we run on a core that implements it.
        unsafe { core::ptr::read_volatile(reg.address() as *const u32) }
    }

    fn write(&self, reg: Register, value: u32) {
        debug_assert!(reg.is_implemented());
        // SAFETY: as in `read`.
        unsafe { core::ptr::write_volatile(reg.address() as *mut u32, value) }
    }

    fn barrier(&self) {
        cortex_m::asm::dsb();
        cortex_m::asm::isb();
    }
}
