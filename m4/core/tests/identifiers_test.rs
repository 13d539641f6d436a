//! Identifier and register map tests for m4-core
//! These tests run on x86 host with std for testing, but verify no_std compatible code

use m4_core::irq::{ENABLE_REGISTER_COUNT, IRQ_COUNT, PRIORITY_REGISTER_COUNT};
use m4_core::{CtlError, Exception, Irq, Priority, Register, RegisterBank, SimRegisters};

#[test]
fn test_every_irq_maps_to_implemented_registers() {
    for line in 0..IRQ_COUNT {
        let irq = Irq::new(line).unwrap();
        assert!(Register::InterruptSetEnable(irq.enable_register()).is_implemented());
        assert!(Register::InterruptPriority(irq.priority_register()).is_implemented());
        assert!(irq.priority_shift() <= 24);
        assert_eq!(irq.enable_mask().count_ones(), 1);
    }
}

#[test]
fn test_bank_counts_cover_all_lines() {
    assert!(ENABLE_REGISTER_COUNT * 32 >= IRQ_COUNT as usize);
    assert!(PRIORITY_REGISTER_COUNT * 4 >= IRQ_COUNT as usize);
}

#[test]
fn test_priority_rejects_unimplemented_bits() {
    for level in 0..=u8::MAX {
        match Priority::new(level) {
            Ok(p) => assert_eq!(Priority::from_encoded(p.encoded()), p),
            Err(err) => {
                assert!(level > 7);
                assert_eq!(err, CtlError::InvalidPriority(level));
            }
        }
    }
}

#[test]
fn test_exception_numbers_roundtrip() {
    for exception in Exception::ALL {
        assert_eq!(Exception::try_from(exception.number()), Ok(exception));
    }
}

#[test]
fn test_exception_fields_are_disjoint() {
    for a in Exception::ALL {
        for b in Exception::ALL {
            if a == b {
                continue;
            }
            let (fa, fb) = (a.priority_field(), b.priority_field());
            if fa.register == fb.register {
                assert_eq!(fa.mask & fb.mask, 0, "{a} overlaps {b}");
            }
        }
    }
}

#[test]
fn test_modify_is_read_modify_write() {
    let regs = SimRegisters::new();
    regs.poke(Register::InterruptPriority(3), 0x1122_3344);
    regs.modify(Register::InterruptPriority(3), |word| word & 0xFFFF_00FF);
    assert_eq!(regs.peek(Register::InterruptPriority(3)), 0x1122_0044);
}

#[test]
fn test_error_display() {
    assert_eq!(CtlError::InvalidIrq(140).to_string(), "Invalid interrupt line 140");
    assert_eq!(CtlError::ModeConflict.to_string(), "Timer mode conflict");
    assert_eq!(
        CtlError::DurationOutOfRange(2000).to_string(),
        "Duration 2000ms out of range"
    );
}
