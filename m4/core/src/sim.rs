//! Host-side model of the NVIC, SCB and SysTick registers
//!
//! Reproduces the hardware behaviour the drivers depend on:
//! - `ISERn`/`ICERn` share one enable word; writing 1 sets/clears, reads
//!   return the enable state.
//! - `SYST_RVR` keeps 24 bits, any write to `SYST_CVR` clears it.
//! - `SYST_CSR.COUNTFLAG` is read-only and clears when `SYST_CSR` is read.
//!   While the counter is enabled the flag rises after a configurable number
//!   of `SYST_CSR` reads, standing in for the countdown reaching zero.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::irq::{ENABLE_REGISTER_COUNT, PRIORITY_REGISTER_COUNT};
use crate::regs::{Register, RegisterBank};

const CSR_ENABLE: u32 = 1 << 0;
const CSR_COUNTFLAG: u32 = 1 << 16;
const RELOAD_MASK: u32 = 0x00FF_FFFF;

/// `SYST_CSR` polls per simulated countdown unless overridden
pub const DEFAULT_POLLS_PER_WRAP: u32 = 3;

/// Simulated register file
#[derive(Debug)]
pub struct SimRegisters {
    enable: [AtomicU32; ENABLE_REGISTER_COUNT],
    priority: [AtomicU32; PRIORITY_REGISTER_COUNT],
    shpr: [AtomicU32; 3],
    shcsr: AtomicU32,
    syst_csr: AtomicU32,
    syst_rvr: AtomicU32,
    syst_cvr: AtomicU32,
    polls_per_wrap: AtomicU32,
    polls_left: AtomicU32,
    csr_reads: AtomicU32,
    writes: AtomicU32,
}

impl SimRegisters {
    /// All registers at their reset value (zero)
    pub const fn new() -> Self {
        Self {
            enable: [const { AtomicU32::new(0) }; ENABLE_REGISTER_COUNT],
            priority: [const { AtomicU32::new(0) }; PRIORITY_REGISTER_COUNT],
            shpr: [const { AtomicU32::new(0) }; 3],
            shcsr: AtomicU32::new(0),
            syst_csr: AtomicU32::new(0),
            syst_rvr: AtomicU32::new(0),
            syst_cvr: AtomicU32::new(0),
            polls_per_wrap: AtomicU32::new(DEFAULT_POLLS_PER_WRAP),
            polls_left: AtomicU32::new(DEFAULT_POLLS_PER_WRAP),
            csr_reads: AtomicU32::new(0),
            writes: AtomicU32::new(0),
        }
    }

    /// Number of `SYST_CSR` reads before `COUNTFLAG` rises (minimum 1)
    pub fn set_polls_per_wrap(&self, polls: u32) {
        let polls = polls.max(1);
        self.polls_per_wrap.store(polls, Ordering::SeqCst);
        self.polls_left.store(polls, Ordering::SeqCst);
    }

    /// Total reads of `SYST_CSR` so far
    pub fn control_reads(&self) -> u32 {
        self.csr_reads.load(Ordering::SeqCst)
    }

    /// Total register writes so far
    pub fn write_count(&self) -> u32 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Inspect a register without read side effects
    pub fn peek(&self, reg: Register) -> u32 {
        self.cell(reg).load(Ordering::SeqCst)
    }

    /// Overwrite a register without write side effects, as hardware would
    /// when counting or when another bus master touches it
    pub fn poke(&self, reg: Register, value: u32) {
        self.cell(reg).store(value, Ordering::SeqCst);
    }

    fn cell(&self, reg: Register) -> &AtomicU32 {
        match reg {
            Register::InterruptSetEnable(n) | Register::InterruptClearEnable(n) => &self.enable[n],
            Register::InterruptPriority(n) => &self.priority[n],
            Register::SystemPriority1 => &self.shpr[0],
            Register::SystemPriority2 => &self.shpr[1],
            Register::SystemPriority3 => &self.shpr[2],
            Register::SystemHandlerControl => &self.shcsr,
            Register::SysTickControl => &self.syst_csr,
            Register::SysTickReload => &self.syst_rvr,
            Register::SysTickCurrent => &self.syst_cvr,
        }
    }

    fn read_control(&self) -> u32 {
        self.csr_reads.fetch_add(1, Ordering::SeqCst);
        let csr = self.syst_csr.load(Ordering::SeqCst);
        if csr & CSR_ENABLE == 0 {
            return self.syst_csr.fetch_and(!CSR_COUNTFLAG, Ordering::SeqCst);
        }

        // A concurrent `set_polls_per_wrap` must not be lost to a stale count.
        let left = match self.polls_left.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| {
            Some(left.saturating_sub(1))
        }) {
            Ok(previous) | Err(previous) => previous.saturating_sub(1),
        };
        if left == 0 {
            self.polls_left
                .store(self.polls_per_wrap.load(Ordering::SeqCst), Ordering::SeqCst);
            self.syst_cvr
                .store(self.syst_rvr.load(Ordering::SeqCst), Ordering::SeqCst);
            self.syst_csr.fetch_and(!CSR_COUNTFLAG, Ordering::SeqCst);
            csr | CSR_COUNTFLAG
        } else {
            self.syst_csr.fetch_and(!CSR_COUNTFLAG, Ordering::SeqCst)
        }
    }

    fn write_control(&self, value: u32) {
        let was_enabled = self.syst_csr.load(Ordering::SeqCst) & CSR_ENABLE != 0;
        let current_flag = self.syst_csr.load(Ordering::SeqCst) & CSR_COUNTFLAG;
        self.syst_csr
            .store((value & !CSR_COUNTFLAG) | current_flag, Ordering::SeqCst);
        if !was_enabled && value & CSR_ENABLE != 0 {
            self.polls_left
                .store(self.polls_per_wrap.load(Ordering::SeqCst), Ordering::SeqCst);
        }
    }
}

impl Default for SimRegisters {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterBank for SimRegisters {
    fn read(&self, reg: Register) -> u32 {
        match reg {
            Register::SysTickControl => self.read_control(),
            _ => self.peek(reg),
        }
    }

    fn write(&self, reg: Register, value: u32) {
        self.writes.fetch_add(1, Ordering::SeqCst);
        match reg {
            Register::InterruptSetEnable(n) => {
                self.enable[n].fetch_or(value, Ordering::SeqCst);
            }
            Register::InterruptClearEnable(n) => {
                self.enable[n].fetch_and(!value, Ordering::SeqCst);
            }
            Register::SysTickControl => self.write_control(value),
            Register::SysTickReload => self.syst_rvr.store(value & RELOAD_MASK, Ordering::SeqCst),
            Register::SysTickCurrent => {
                self.syst_cvr.store(0, Ordering::SeqCst);
                self.syst_csr.fetch_and(!CSR_COUNTFLAG, Ordering::SeqCst);
            }
            _ => self.poke(reg, value),
        }
    }
}
