//! Blinky Example - SysTick and NVIC control on a TM4C123 LaunchPad
//!
//! Unmasks the GPIO Port F line, ranks it below SysTick, then alternates
//! between a 500ms busy-wait and a 10ms periodic tick that counts in the
//! background.

#![no_std]
#![no_main]

use core::sync::atomic::{AtomicU32, Ordering};

use cortex_m_rt::{entry, exception};
use m4_core::{priority, Exception, Irq, Mmio, Priority};
use m4_nvic::Nvic;
use m4_systick::{SysTick, SysTickConfig};
use panic_halt as _; // Panic handler for embedded

/// GPIO Port F interrupt line on the TM4C123GH6PM
const GPIO_PORTF_IRQ: u16 = 30;

const TICK_PRIORITY: Priority = priority!(2);
const BUTTON_PRIORITY: Priority = priority!(5);

// SAFETY: this binary is the only code touching the NVIC, SCB and SysTick
// registers.
static NVIC: Nvic<Mmio> = Nvic::new(unsafe { Mmio::new() });
static SYSTICK: SysTick<Mmio> = SysTick::new(unsafe { Mmio::new() }, SysTickConfig::DEFAULT);

static TICKS: AtomicU32 = AtomicU32::new(0);

fn on_tick() {
    TICKS.fetch_add(1, Ordering::Relaxed);
}

#[exception]
fn SysTick() {
    SYSTICK.handler();
}

#[entry]
fn main() -> ! {
    let button = match Irq::new(GPIO_PORTF_IRQ) {
        Ok(irq) => irq,
        Err(_) => panic!("GPIO Port F line missing"),
    };
    NVIC.set_irq_priority(button, BUTTON_PRIORITY);
    NVIC.enable_irq(button);

    NVIC.set_exception_priority(Exception::SysTick, TICK_PRIORITY);
    NVIC.enable_exception(Exception::UsageFault);
    NVIC.enable_exception(Exception::BusFault);

    SYSTICK.set_callback(Some(&on_tick));

    loop {
        // 500ms of blocking delay, then 50 ticks of background counting.
        if SYSTICK.start_busy_wait(500).is_err() {
            panic!("500ms delay rejected");
        }

        let start = TICKS.load(Ordering::Relaxed);
        if SYSTICK.init(10).is_err() {
            panic!("10ms tick rejected");
        }
        while TICKS.load(Ordering::Relaxed).wrapping_sub(start) < 50 {
            cortex_m::asm::wfi();
        }
        if SYSTICK.stop().is_err() {
            panic!("tick stop rejected");
        }
    }
}
