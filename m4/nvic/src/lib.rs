#![no_std]

//! # M4 NVIC
//!
//! Interrupt controller management for the Cortex-M4: masking and unmasking
//! peripheral interrupt lines, and assigning priorities to lines and to the
//! configurable system exceptions.
//!
//! Every operation maps an identifier onto one register word and one field
//! inside it. Fields of other lines packed into the same word are never
//! disturbed:
//! - enable and disable write a one-hot mask into the write-1-to-set `ISERn`
//!   or write-1-to-clear `ICERn` bank, so no read-modify-write is needed;
//! - priority and `SHCSR` updates are read-modify-writes performed through
//!   [`RegisterBank::modify`], which excludes concurrent writers with a
//!   critical section.
//!
//! All methods take `&self`; one `Nvic` can be shared between thread mode
//! and interrupt handlers.

use log::{debug, trace};
use m4_core::irq::PRIORITY_FIELD_WIDTH;
use m4_core::{Exception, Irq, Priority, Register, RegisterBank};

const PRIORITY_FIELD_MASK: u32 = (1 << PRIORITY_FIELD_WIDTH) - 1;

/// Effect of enabling or disabling a system exception
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExceptionEnable {
    /// The exception's `SHCSR` enable bit was written
    Applied,
    /// The exception has no enable bit and is always active; nothing was
    /// written
    AlwaysActive,
}

/// Nested Vectored Interrupt Controller driver
#[derive(Debug)]
pub struct Nvic<R> {
    regs: R,
}

impl<R: RegisterBank> Nvic<R> {
    /// Wrap a register bank
    pub const fn new(regs: R) -> Self {
        Self { regs }
    }

    /// Underlying register bank
    pub fn registers(&self) -> &R {
        &self.regs
    }

    /// Release the register bank
    pub fn free(self) -> R {
        self.regs
    }

    /// Unmask an interrupt line.
    ///
    /// The change is in effect when this returns: a pending interrupt of
    /// sufficient priority may run its handler before the call returns.
    pub fn enable_irq(&self, irq: Irq) {
        self.regs
            .write(Register::InterruptSetEnable(irq.enable_register()), irq.enable_mask());
        self.regs.barrier();
        debug!("nvic: enabled {}", irq);
    }

    /// Mask an interrupt line.
    ///
    /// After this returns the line's handler will not start until the line is
    /// enabled again.
    pub fn disable_irq(&self, irq: Irq) {
        self.regs
            .write(Register::InterruptClearEnable(irq.enable_register()), irq.enable_mask());
        self.regs.barrier();
        debug!("nvic: disabled {}", irq);
    }

    /// Whether an interrupt line is unmasked
    pub fn is_irq_enabled(&self, irq: Irq) -> bool {
        self.regs.read(Register::InterruptSetEnable(irq.enable_register())) & irq.enable_mask()
            != 0
    }

    /// Set the priority of an interrupt line
    pub fn set_irq_priority(&self, irq: Irq, priority: Priority) {
        let shift = irq.priority_shift();
        self.regs
            .modify(Register::InterruptPriority(irq.priority_register()), |word| {
                (word & !(PRIORITY_FIELD_MASK << shift)) | (u32::from(priority.encoded()) << shift)
            });
        debug!("nvic: {} priority {}", irq, priority.raw());
    }

    /// Current priority of an interrupt line
    pub fn irq_priority(&self, irq: Irq) -> Priority {
        let word = self
            .regs
            .read(Register::InterruptPriority(irq.priority_register()));
        Priority::from_encoded(((word >> irq.priority_shift()) & PRIORITY_FIELD_MASK) as u8)
    }

    /// Enable a system exception.
    ///
    /// Fault handlers are gated by their `SHCSR` bit. SVCall, DebugMonitor,
    /// PendSV and SysTick have no such bit; for them this writes nothing and
    /// returns [`ExceptionEnable::AlwaysActive`].
    pub fn enable_exception(&self, exception: Exception) -> ExceptionEnable {
        match exception.enable_bit() {
            Some(bit) => {
                self.regs
                    .modify(Register::SystemHandlerControl, |word| word | bit);
                debug!("nvic: enabled {}", exception);
                ExceptionEnable::Applied
            }
            None => {
                trace!("nvic: {} has no enable bit", exception);
                ExceptionEnable::AlwaysActive
            }
        }
    }

    /// Disable a system exception.
    ///
    /// A disabled fault escalates to HardFault. As with
    /// [`enable_exception`](Self::enable_exception), exceptions without an
    /// `SHCSR` bit are left alone and reported as
    /// [`ExceptionEnable::AlwaysActive`].
    pub fn disable_exception(&self, exception: Exception) -> ExceptionEnable {
        match exception.enable_bit() {
            Some(bit) => {
                self.regs
                    .modify(Register::SystemHandlerControl, |word| word & !bit);
                debug!("nvic: disabled {}", exception);
                ExceptionEnable::Applied
            }
            None => {
                trace!("nvic: {} has no enable bit", exception);
                ExceptionEnable::AlwaysActive
            }
        }
    }

    /// Whether a system exception is enabled; always true for exceptions
    /// without an enable bit
    pub fn is_exception_enabled(&self, exception: Exception) -> bool {
        match exception.enable_bit() {
            Some(bit) => self.regs.read(Register::SystemHandlerControl) & bit != 0,
            None => true,
        }
    }

    /// Set the priority of a system exception
    pub fn set_exception_priority(&self, exception: Exception, priority: Priority) {
        let field = exception.priority_field();
        self.regs.modify(field.register, |word| {
            (word & !field.mask) | ((u32::from(priority.raw()) << field.shift) & field.mask)
        });
        debug!("nvic: {} priority {}", exception, priority.raw());
    }

    /// Current priority of a system exception
    pub fn exception_priority(&self, exception: Exception) -> Priority {
        let field = exception.priority_field();
        let level = (self.regs.read(field.register) & field.mask) >> field.shift;
        // The mask keeps at most the implemented priority bits.
        Priority::new(level as u8).unwrap_or(Priority::LOWEST)
    }
}
