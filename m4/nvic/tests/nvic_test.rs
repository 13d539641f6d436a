//! NVIC driver tests against the simulated register file
//! These tests run on the host, the driver code itself stays no_std

use m4_core::irq::{IRQ_COUNT, LINES_PER_PRIORITY_REGISTER};
use m4_core::{Exception, Irq, Priority, Register, RegisterBank, SimRegisters};
use m4_nvic::{ExceptionEnable, Nvic};

fn irq(n: u16) -> Irq {
    Irq::new(n).unwrap()
}

fn prio(p: u8) -> Priority {
    Priority::new(p).unwrap()
}

#[test]
fn test_enable_every_line_preserves_neighbours() {
    for line in 0..IRQ_COUNT {
        let regs = SimRegisters::new();
        let target = irq(line);
        let bank = Register::InterruptSetEnable(target.enable_register());
        let others = 0xA5A5_A5A5 & !target.enable_mask();
        regs.poke(bank, others);

        let nvic = Nvic::new(&regs);
        nvic.enable_irq(target);

        assert!(nvic.is_irq_enabled(target), "line {line} not enabled");
        assert_eq!(regs.peek(bank) & !target.enable_mask(), others, "line {line} disturbed bank");
    }
}

#[test]
fn test_disable_every_line_preserves_neighbours() {
    for line in 0..IRQ_COUNT {
        let regs = SimRegisters::new();
        let target = irq(line);
        let bank = Register::InterruptSetEnable(target.enable_register());
        regs.poke(bank, u32::MAX);

        let nvic = Nvic::new(&regs);
        nvic.disable_irq(target);

        assert!(!nvic.is_irq_enabled(target), "line {line} still enabled");
        assert_eq!(regs.peek(bank), !target.enable_mask());
    }
}

#[test]
fn test_disable_writes_only_clear_bank() {
    let regs = SimRegisters::new();
    let nvic = Nvic::new(&regs);
    nvic.enable_irq(irq(100));
    nvic.enable_irq(irq(101));
    nvic.enable_irq(irq(127));

    nvic.disable_irq(irq(101));

    assert!(nvic.is_irq_enabled(irq(100)));
    assert!(!nvic.is_irq_enabled(irq(101)));
    assert!(nvic.is_irq_enabled(irq(127)));
}

#[test]
fn test_last_bank_addressable() {
    let regs = SimRegisters::new();
    let nvic = Nvic::new(&regs);
    nvic.enable_irq(irq(IRQ_COUNT - 1));
    assert_eq!(regs.read(Register::InterruptSetEnable(4)), 1 << 10);
}

#[test]
fn test_out_of_range_line_is_unrepresentable() {
    assert!(Irq::new(IRQ_COUNT).is_err());
    assert!(Irq::new(159).is_err());
}

#[test]
fn test_priorities_in_shared_register_are_independent() {
    for word in 0..(IRQ_COUNT / LINES_PER_PRIORITY_REGISTER) {
        let regs = SimRegisters::new();
        let nvic = Nvic::new(&regs);
        let base = word * LINES_PER_PRIORITY_REGISTER;

        for lane in 0..LINES_PER_PRIORITY_REGISTER {
            nvic.set_irq_priority(irq(base + lane), prio(lane as u8 + 2));
        }
        nvic.set_irq_priority(irq(base + 1), prio(7));

        assert_eq!(nvic.irq_priority(irq(base)), prio(2));
        assert_eq!(nvic.irq_priority(irq(base + 1)), prio(7));
        assert_eq!(nvic.irq_priority(irq(base + 2)), prio(4));
        assert_eq!(nvic.irq_priority(irq(base + 3)), prio(5));
    }
}

#[test]
fn test_priority_overwrites_previous_value() {
    let regs = SimRegisters::new();
    let nvic = Nvic::new(&regs);
    nvic.set_irq_priority(irq(21), prio(7));
    nvic.set_irq_priority(irq(21), prio(1));
    assert_eq!(nvic.irq_priority(irq(21)), prio(1));
    assert_eq!(regs.peek(Register::InterruptPriority(5)), 0x20 << 8);
}

#[test]
fn test_priority_keeps_foreign_bits() {
    let regs = SimRegisters::new();
    regs.poke(Register::InterruptPriority(2), 0xFFFF_FFFF);
    let nvic = Nvic::new(&regs);

    nvic.set_irq_priority(irq(10), Priority::HIGHEST);

    assert_eq!(regs.peek(Register::InterruptPriority(2)), 0xFF00_FFFF);
}

#[test]
fn test_fault_exceptions_toggle_one_bit() {
    let cases = [
        (Exception::MemoryManagement, 1 << 16),
        (Exception::BusFault, 1 << 17),
        (Exception::UsageFault, 1 << 18),
    ];

    for (exception, bit) in cases {
        let regs = SimRegisters::new();
        regs.poke(Register::SystemHandlerControl, 0x0000_0F00);
        let nvic = Nvic::new(&regs);

        assert_eq!(nvic.enable_exception(exception), ExceptionEnable::Applied);
        assert_eq!(regs.peek(Register::SystemHandlerControl), 0x0000_0F00 | bit);
        assert!(nvic.is_exception_enabled(exception));

        assert_eq!(nvic.disable_exception(exception), ExceptionEnable::Applied);
        assert_eq!(regs.peek(Register::SystemHandlerControl), 0x0000_0F00);
        assert!(!nvic.is_exception_enabled(exception));
    }
}

#[test]
fn test_system_exceptions_leave_shcsr_alone() {
    let always_active = [
        Exception::SVCall,
        Exception::DebugMonitor,
        Exception::PendSV,
        Exception::SysTick,
    ];

    let regs = SimRegisters::new();
    regs.poke(Register::SystemHandlerControl, 0x0007_0000);
    let nvic = Nvic::new(&regs);

    for exception in always_active {
        assert_eq!(nvic.enable_exception(exception), ExceptionEnable::AlwaysActive);
        assert_eq!(nvic.disable_exception(exception), ExceptionEnable::AlwaysActive);
        assert!(nvic.is_exception_enabled(exception));
    }

    assert_eq!(regs.peek(Register::SystemHandlerControl), 0x0007_0000);
    assert_eq!(regs.write_count(), 0);
}

#[test]
fn test_exception_priorities_do_not_cross_contaminate() {
    let regs = SimRegisters::new();
    let nvic = Nvic::new(&regs);

    for (level, exception) in Exception::ALL.into_iter().enumerate() {
        nvic.set_exception_priority(exception, prio(level as u8 + 1));
    }

    for (level, exception) in Exception::ALL.into_iter().enumerate() {
        assert_eq!(nvic.exception_priority(exception), prio(level as u8 + 1));
    }

    // MemManage=1, BusFault=2, UsageFault=3
    assert_eq!(regs.peek(Register::SystemPriority1), 0x0060_4020);
    // SVCall=4
    assert_eq!(regs.peek(Register::SystemPriority2), 0x8000_0000);
    // DebugMonitor=5, PendSV=6, SysTick=7
    assert_eq!(regs.peek(Register::SystemPriority3), 0xE0C0_00A0);
}

#[test]
fn test_exception_priority_keeps_reserved_bits() {
    let regs = SimRegisters::new();
    regs.poke(Register::SystemPriority3, 0x001F_1F1F);
    let nvic = Nvic::new(&regs);

    nvic.set_exception_priority(Exception::PendSV, Priority::LOWEST);

    assert_eq!(regs.peek(Register::SystemPriority3), 0x00FF_1F1F);
}

#[test]
fn test_shared_nvic_across_threads() {
    use std::sync::Arc;
    use std::thread;

    let nvic = Arc::new(Nvic::new(SimRegisters::new()));
    let handles: Vec<_> = (0..4u16)
        .map(|lane| {
            let nvic = Arc::clone(&nvic);
            thread::spawn(move || {
                for round in 0..200u16 {
                    let level = ((round + lane) % 8) as u8;
                    nvic.set_irq_priority(irq(40 + lane), prio(level));
                }
                nvic.set_irq_priority(irq(40 + lane), prio(lane as u8));
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    for lane in 0..4u16 {
        assert_eq!(nvic.irq_priority(irq(40 + lane)), prio(lane as u8));
    }
}
