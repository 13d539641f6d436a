#![no_std]

//! # M4 SysTick
//!
//! Driver for the Cortex-M4 system timer in two mutually exclusive modes:
//!
//! - **interrupt mode** ([`SysTick::init`]): the counter reloads every
//!   period and raises the SysTick exception, whose handler calls
//!   [`SysTick::handler`], which runs the registered [`TickCallback`];
//! - **busy-wait mode** ([`SysTick::start_busy_wait`]): the counter runs once
//!   without raising the exception while the caller spins on `COUNTFLAG`.
//!
//! ```text
//! Uninitialized --init--> Armed --stop--> Stopped --start--> Armed
//!       |                   |                |
//!       +--start_busy_wait--+-- (rejected) --+--start_busy_wait--> Stopped
//! any but BusyWaiting --deinit--> Uninitialized
//! ```
//!
//! A busy-wait runs to completion: `init`, `start`, `stop` and `deinit`
//! issued from an interrupt preempting it return [`CtlError::ModeConflict`].
//!
//! A `SysTick` is `Sync` and is meant to live in a `static` shared with the
//! exception handler.

use core::cell::Cell;
use core::fmt;
use core::sync::atomic::{AtomicU8, Ordering};

use critical_section::Mutex;
use log::{debug, trace, warn};
use m4_core::{CtlError, CtlResult, Register, RegisterBank};

pub mod config;

pub use config::{ClockSource, SysTickConfig, SysTickConfigBuilder, MAX_RELOAD};

/// `SYST_CSR.ENABLE`
pub const CTRL_ENABLE: u32 = 1 << 0;
/// `SYST_CSR.TICKINT`
pub const CTRL_TICKINT: u32 = 1 << 1;
/// `SYST_CSR.CLKSOURCE`
pub const CTRL_CLKSOURCE: u32 = 1 << 2;
/// `SYST_CSR.COUNTFLAG`, read-only, cleared by reading `SYST_CSR`
pub const CTRL_COUNTFLAG: u32 = 1 << 16;

/// Callback run from the SysTick exception.
///
/// It executes in handler mode at the SysTick priority: it must return
/// quickly and must not block. It may reconfigure the timer (`init`, `stop`,
/// `start`, `set_callback`, `deinit`); `start_busy_wait` is refused while the
/// timer is armed.
pub type TickCallback = &'static (dyn Fn() + Sync);

/// Operating state of the timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum TimerState {
    /// Registers zeroed, nothing configured
    Uninitialized = 0,
    /// Counting with the SysTick exception enabled
    Armed = 1,
    /// Counter halted, reload and current value retained
    Stopped = 2,
    /// Inside `start_busy_wait`; only visible to code preempting the wait
    BusyWaiting = 3,
}

impl TimerState {
    const fn from_raw(raw: u8) -> Self {
        match raw {
            1 => TimerState::Armed,
            2 => TimerState::Stopped,
            3 => TimerState::BusyWaiting,
            _ => TimerState::Uninitialized,
        }
    }
}

impl fmt::Display for TimerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimerState::Uninitialized => "uninitialized",
            TimerState::Armed => "armed",
            TimerState::Stopped => "stopped",
            TimerState::BusyWaiting => "busy-waiting",
        };
        f.write_str(name)
    }
}

/// The system timer
pub struct SysTick<R> {
    regs: R,
    config: SysTickConfig,
    state: AtomicU8,
    callback: Mutex<Cell<Option<TickCallback>>>,
}

impl<R: RegisterBank> SysTick<R> {
    /// Create an uninitialized timer; no register is touched
    pub const fn new(regs: R, config: SysTickConfig) -> Self {
        Self {
            regs,
            config,
            state: AtomicU8::new(TimerState::Uninitialized as u8),
            callback: Mutex::new(Cell::new(None)),
        }
    }

    /// Clock configuration
    pub fn config(&self) -> &SysTickConfig {
        &self.config
    }

    /// Underlying register bank
    pub fn registers(&self) -> &R {
        &self.regs
    }

    /// Current operating state
    pub fn state(&self) -> TimerState {
        TimerState::from_raw(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: TimerState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn clock_bits(&self) -> u32 {
        match self.config.clock_source {
            ClockSource::Processor => CTRL_CLKSOURCE,
            ClockSource::External => 0,
        }
    }

    /// Halt the counter, program a fresh period and clear the current value
    fn program(&self, reload: u32) {
        self.regs.write(Register::SysTickControl, 0);
        self.regs.write(Register::SysTickReload, reload);
        self.regs.write(Register::SysTickCurrent, 0);
    }

    /// Arm periodic interrupts every `duration_ms`.
    ///
    /// Also reconfigures an armed or stopped timer. Refused with
    /// [`CtlError::ModeConflict`] while a busy-wait is in progress.
    pub fn init(&self, duration_ms: u32) -> CtlResult<()> {
        let reload = self.config.reload_for(duration_ms).map_err(|err| {
            warn!("systick: {}", err);
            err
        })?;

        critical_section::with(|_| -> CtlResult<()> {
            self.refuse_during_busy_wait("init")?;
            self.program(reload);
            self.regs.write(
                Register::SysTickControl,
                CTRL_ENABLE | CTRL_TICKINT | self.clock_bits(),
            );
            self.set_state(TimerState::Armed);
            Ok(())
        })?;
        debug!("systick: armed, {}ms period, reload {}", duration_ms, reload);
        Ok(())
    }

    /// Block the caller for `duration_ms` by polling `COUNTFLAG`.
    ///
    /// Runs to completion once started and leaves the timer disabled.
    /// Refused with [`CtlError::ModeConflict`] while the timer is armed, which
    /// also covers calls from a tick callback.
    pub fn start_busy_wait(&self, duration_ms: u32) -> CtlResult<()> {
        let reload = self.config.reload_for(duration_ms).map_err(|err| {
            warn!("systick: {}", err);
            err
        })?;

        let claimed = critical_section::with(|_| match self.state() {
            state @ (TimerState::Armed | TimerState::BusyWaiting) => Err(state),
            _ => {
                self.set_state(TimerState::BusyWaiting);
                Ok(())
            }
        });
        if let Err(state) = claimed {
            warn!("systick: busy-wait refused while {}", state);
            return Err(CtlError::ModeConflict);
        }
        trace!("systick: busy-wait {}ms, reload {}", duration_ms, reload);

        self.program(reload);
        self.regs
            .write(Register::SysTickControl, CTRL_ENABLE | self.clock_bits());

        // Spins outside any critical section so interrupts stay serviceable.
        while self.regs.read(Register::SysTickControl) & CTRL_COUNTFLAG == 0 {
            core::hint::spin_loop();
        }

        // Disable, keeping the clock selection for a later `start`.
        self.regs.write(Register::SysTickControl, self.clock_bits());
        self.set_state(TimerState::Stopped);
        Ok(())
    }

    /// Replace the tick callback; `None` unregisters it.
    ///
    /// The next [`handler`](Self::handler) run after this returns sees the new
    /// value. A handler already running keeps the callback it started with.
    pub fn set_callback(&self, callback: Option<TickCallback>) {
        critical_section::with(|cs| self.callback.borrow(cs).set(callback));
        trace!("systick: callback {}", if callback.is_some() { "set" } else { "cleared" });
    }

    /// Whether a tick callback is registered
    pub fn has_callback(&self) -> bool {
        critical_section::with(|cs| self.callback.borrow(cs).get().is_some())
    }

    /// SysTick exception entry point.
    ///
    /// Runs the registered callback, if any. The callback slot is only held
    /// while copying the reference out, so the callback itself may call back
    /// into the timer.
    pub fn handler(&self) {
        let callback = critical_section::with(|cs| self.callback.borrow(cs).get());
        if let Some(callback) = callback {
            callback();
        }
    }

    /// Resume counting from the current value.
    ///
    /// Refused with [`CtlError::ModeConflict`] while a busy-wait is in
    /// progress; the wait owns the counter until it completes.
    pub fn start(&self) -> CtlResult<()> {
        critical_section::with(|_| -> CtlResult<()> {
            self.refuse_during_busy_wait("start")?;
            let mut ctrl = 0;
            self.regs.modify(Register::SysTickControl, |value| {
                ctrl = (value & !CTRL_COUNTFLAG) | CTRL_ENABLE;
                ctrl
            });
            if self.state() == TimerState::Stopped && ctrl & CTRL_TICKINT != 0 {
                self.set_state(TimerState::Armed);
            }
            Ok(())
        })?;
        trace!("systick: started");
        Ok(())
    }

    /// Pause counting; reload and current value are kept.
    ///
    /// Refused with [`CtlError::ModeConflict`] while a busy-wait is in
    /// progress.
    pub fn stop(&self) -> CtlResult<()> {
        critical_section::with(|_| -> CtlResult<()> {
            self.refuse_during_busy_wait("stop")?;
            self.regs.modify(Register::SysTickControl, |value| {
                value & !(CTRL_ENABLE | CTRL_COUNTFLAG)
            });
            if self.state() == TimerState::Armed {
                self.set_state(TimerState::Stopped);
            }
            Ok(())
        })?;
        trace!("systick: stopped");
        Ok(())
    }

    /// Disable the timer, zero its registers and drop the callback.
    ///
    /// Refused with [`CtlError::ModeConflict`] while a busy-wait is in
    /// progress.
    pub fn deinit(&self) -> CtlResult<()> {
        critical_section::with(|cs| -> CtlResult<()> {
            self.refuse_during_busy_wait("deinit")?;
            self.regs.write(Register::SysTickControl, 0);
            self.regs.write(Register::SysTickReload, 0);
            self.regs.write(Register::SysTickCurrent, 0);
            self.callback.borrow(cs).set(None);
            self.set_state(TimerState::Uninitialized);
            Ok(())
        })?;
        debug!("systick: deinitialized");
        Ok(())
    }

    /// Caller holds a critical section, so no busy-wait can be claimed
    /// between this check and the register access that follows it.
    fn refuse_during_busy_wait(&self, operation: &str) -> CtlResult<()> {
        if self.state() == TimerState::BusyWaiting {
            warn!("systick: {} refused during busy-wait", operation);
            return Err(CtlError::ModeConflict);
        }
        Ok(())
    }

    /// Whether the counter is enabled.
    ///
    /// Reads `SYST_CSR`, which clears a pending `COUNTFLAG`. During a
    /// busy-wait that read would swallow the flag the wait is polling for and
    /// stretch it by a full period, so the register is left alone and `true`
    /// is reported instead.
    pub fn is_running(&self) -> bool {
        critical_section::with(|_| {
            self.state() == TimerState::BusyWaiting
                || self.regs.read(Register::SysTickControl) & CTRL_ENABLE != 0
        })
    }

    /// Programmed reload value
    pub fn reload_value(&self) -> u32 {
        self.regs.read(Register::SysTickReload)
    }

    /// Current countdown value
    pub fn current_value(&self) -> u32 {
        self.regs.read(Register::SysTickCurrent)
    }
}

impl<R> fmt::Debug for SysTick<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SysTick")
            .field("config", &self.config)
            .field("state", &TimerState::from_raw(self.state.load(Ordering::Relaxed)))
            .finish_non_exhaustive()
    }
}
