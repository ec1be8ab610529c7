use dotmatrix_core::cpu::Lr35902;
mod common;
use common::TestBus;

#[test]
fn test_dispatch_costs_five_machine_cycles() {
    let mut cpu = Lr35902::new();
    let mut bus = TestBus::new();
    cpu.sp = 0xFFFE;
    cpu.ime = true;
    bus.inte = 0x04; // timer
    bus.intf = 0x04;
    bus.load(0x0150, &[0x00]); // NOP
    cpu.pc = 0x0150;

    cpu.step(&mut bus);

    // 1 for the NOP, 5 for the dispatch.
    assert_eq!(bus.mcycles, 6);
    assert_eq!(cpu.pc, 0x0050);
    assert!(!cpu.ime);
    assert_eq!(bus.intf, 0);
    // Return address pushed.
    assert_eq!(bus.memory[0xFFFD], 0x01);
    assert_eq!(bus.memory[0xFFFC], 0x51);
}

#[test]
fn test_priority_low_bit_first() {
    let mut cpu = Lr35902::new();
    let mut bus = TestBus::new();
    cpu.sp = 0xFFFE;
    cpu.ime = true;
    bus.inte = 0x1F;
    bus.intf = 0x12; // STAT (bit 1) and Joypad (bit 4)
    bus.load(0, &[0x00]);

    cpu.step(&mut bus);

    assert_eq!(cpu.pc, 0x0048); // STAT vector
    assert_eq!(bus.intf, 0x10); // joypad still pending
}

#[test]
fn test_masked_interrupt_does_not_dispatch() {
    let mut cpu = Lr35902::new();
    let mut bus = TestBus::new();
    cpu.ime = true;
    bus.inte = 0x01;
    bus.intf = 0x04; // pending but not enabled
    bus.load(0, &[0x00]);

    cpu.step(&mut bus);

    assert_eq!(cpu.pc, 1);
    assert_eq!(bus.intf, 0x04);
}

#[test]
fn test_ei_delay_one_instruction() {
    let mut cpu = Lr35902::new();
    let mut bus = TestBus::new();
    cpu.sp = 0xFFFE;
    bus.inte = 0x01;
    bus.intf = 0x01;
    // EI ; NOP ; NOP
    bus.load(0, &[0xFB, 0x00, 0x00]);

    cpu.step(&mut bus); // EI — IME still off
    assert!(!cpu.ime);
    assert_eq!(cpu.pc, 1);

    cpu.step(&mut bus); // NOP completes, then the interrupt fires
    assert_eq!(cpu.pc, 0x0040);
    assert!(!cpu.ime);
}

#[test]
fn test_ei_then_di_cancels() {
    let mut cpu = Lr35902::new();
    let mut bus = TestBus::new();
    bus.inte = 0x01;
    bus.intf = 0x01;
    bus.load(0, &[0xFB, 0xF3, 0x00]); // EI ; DI ; NOP

    cpu.step(&mut bus);
    cpu.step(&mut bus);
    cpu.step(&mut bus);

    assert!(!cpu.ime);
    assert_eq!(cpu.pc, 3); // never dispatched
}

#[test]
fn test_reti_enables_immediately() {
    let mut cpu = Lr35902::new();
    let mut bus = TestBus::new();
    cpu.sp = 0xC000;
    bus.memory[0xC000] = 0x00;
    bus.memory[0xC001] = 0x20;
    bus.inte = 0x01;
    bus.intf = 0x01;
    bus.load(0, &[0xD9]); // RETI

    cpu.step(&mut bus);

    // RETI returned to 0x2000, then the pending interrupt dispatched
    // right away and pushed that return address back.
    assert_eq!(cpu.pc, 0x0040);
    assert!(!cpu.ime);
    assert_eq!(bus.intf, 0);
    assert_eq!(bus.memory[0xC001], 0x20);
    assert_eq!(bus.memory[0xC000], 0x00);
}

#[test]
fn test_halt_blocks_until_interrupt_flag() {
    let mut cpu = Lr35902::new();
    let mut bus = TestBus::new();
    cpu.ime = false;
    bus.inte = 0x04;
    bus.load(0, &[0x76, 0x00]); // HALT ; NOP

    cpu.step(&mut bus);
    assert!(cpu.halted);

    // Blocked steps tick one machine cycle each.
    let before = bus.mcycles;
    cpu.step(&mut bus);
    assert!(cpu.halted);
    assert_eq!(bus.mcycles, before + 1);

    // Wake without dispatch (IME clear).
    bus.intf = 0x04;
    cpu.step(&mut bus);
    assert!(!cpu.halted);

    cpu.step(&mut bus); // the NOP after HALT
    assert_eq!(cpu.pc, 2);
    assert_eq!(bus.intf, 0x04); // untouched
}

#[test]
fn test_halt_with_ime_dispatches_on_wake() {
    let mut cpu = Lr35902::new();
    let mut bus = TestBus::new();
    cpu.sp = 0xFFFE;
    cpu.ime = true;
    bus.inte = 0x01;
    bus.load(0x0300, &[0x76]);
    cpu.pc = 0x0300;

    cpu.step(&mut bus);
    assert!(cpu.halted);

    bus.intf = 0x01;
    cpu.step(&mut bus);

    assert!(!cpu.halted);
    assert_eq!(cpu.pc, 0x0040);
    // The wake-up PC (after HALT) was pushed.
    assert_eq!(bus.memory[0xFFFD], 0x03);
    assert_eq!(bus.memory[0xFFFC], 0x01);
}

#[test]
fn test_halt_bug_reexecutes_next_byte() {
    let mut cpu = Lr35902::new();
    let mut bus = TestBus::new();
    cpu.ime = false;
    bus.inte = 0x04;
    bus.intf = 0x04; // already pending at HALT entry
    // HALT ; INC A — the INC runs twice.
    bus.load(0, &[0x76, 0x3C]);

    cpu.step(&mut bus); // HALT (bug armed, no halt)
    assert!(!cpu.halted);

    cpu.step(&mut bus); // INC A, PC not advanced
    assert_eq!(cpu.a, 1);
    assert_eq!(cpu.pc, 1);

    cpu.step(&mut bus); // INC A again
    assert_eq!(cpu.a, 2);
    assert_eq!(cpu.pc, 2);
}

#[test]
fn test_stop_freezes_until_button() {
    let mut cpu = Lr35902::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0x10, 0x00, 0x3C]); // STOP ; (operand) ; INC A

    cpu.step(&mut bus);
    assert_eq!(cpu.pc, 2); // operand skipped

    // Frozen: no bus traffic, no progress.
    let before = bus.mcycles;
    cpu.step(&mut bus);
    cpu.step(&mut bus);
    assert_eq!(bus.mcycles, before);
    assert_eq!(cpu.pc, 2);
}
