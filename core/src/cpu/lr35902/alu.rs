use crate::core::bus::Bus;
use crate::cpu::lr35902::{Flag, Lr35902};

impl Lr35902 {
    // --- Flag Helpers ---

    fn do_add(&mut self, val: u8, with_carry: bool) {
        let a = self.a;
        let c_in = if with_carry && self.flag(Flag::C) { 1u8 } else { 0 };
        let result_u16 = a as u16 + val as u16 + c_in as u16;
        let result = result_u16 as u8;

        let mut f = 0;
        if result == 0 { f |= Flag::Z as u8; }
        // H: carry out of bit 3
        if (a & 0xF) + (val & 0xF) + c_in > 0xF { f |= Flag::H as u8; }
        // C: carry out of bit 7
        if result_u16 > 0xFF { f |= Flag::C as u8; }

        self.a = result;
        self.f = f;
    }

    fn do_sub(&mut self, val: u8, with_carry: bool) {
        let a = self.a;
        let c_in = if with_carry && self.flag(Flag::C) { 1u8 } else { 0 };
        let result_u16 = (a as u16).wrapping_sub(val as u16).wrapping_sub(c_in as u16);
        let result = result_u16 as u8;

        let mut f = Flag::N as u8;
        if result == 0 { f |= Flag::Z as u8; }
        // H: borrow from bit 4
        if (a & 0xF) < (val & 0xF) + c_in { f |= Flag::H as u8; }
        // C: full borrow
        if result_u16 > 0xFF { f |= Flag::C as u8; }

        self.a = result;
        self.f = f;
    }

    fn do_cp(&mut self, val: u8) {
        let a = self.a;
        self.do_sub(val, false);
        self.a = a;
    }

    fn update_flags_logic(&mut self, result: u8, is_and: bool) {
        let mut f = 0;
        if result == 0 { f |= Flag::Z as u8; }
        if is_and { f |= Flag::H as u8; } // AND sets H, XOR/OR clear it
        self.f = f;
    }

    fn perform_alu_op(&mut self, op: u8, val: u8) {
        match op {
            0 => self.do_add(val, false), // ADD
            1 => self.do_add(val, true),  // ADC
            2 => self.do_sub(val, false), // SUB
            3 => self.do_sub(val, true),  // SBC
            4 => { self.a &= val; self.update_flags_logic(self.a, true); }  // AND
            5 => { self.a ^= val; self.update_flags_logic(self.a, false); } // XOR
            6 => { self.a |= val; self.update_flags_logic(self.a, false); } // OR
            7 => self.do_cp(val), // CP
            _ => unreachable!(),
        }
    }

    // --- Instructions ---

    /// ALU A, r — ADD, ADC, SUB, SBC, AND, XOR, OR, CP.
    /// Opcode mask: 10 xxx zzz
    pub(crate) fn op_alu_r<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let alu_op = (opcode >> 3) & 0x07;
        let val = self.read_reg8(bus, opcode & 0x07);
        self.perform_alu_op(alu_op, val);
    }

    /// ALU A, n
    pub(crate) fn op_alu_n<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let alu_op = (opcode >> 3) & 0x07;
        let val = self.fetch_imm8(bus);
        self.perform_alu_op(alu_op, val);
    }

    /// INC r — Z 0 H -. Opcode mask: 00 rrr 100
    pub(crate) fn op_inc_r<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let r = (opcode >> 3) & 0x07;
        let val = self.read_reg8(bus, r);
        let result = val.wrapping_add(1);
        self.write_reg8(bus, r, result);
        self.set_flag(Flag::Z, result == 0);
        self.set_flag(Flag::N, false);
        self.set_flag(Flag::H, val & 0xF == 0xF);
    }

    /// DEC r — Z 1 H -. Opcode mask: 00 rrr 101
    pub(crate) fn op_dec_r<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let r = (opcode >> 3) & 0x07;
        let val = self.read_reg8(bus, r);
        let result = val.wrapping_sub(1);
        self.write_reg8(bus, r, result);
        self.set_flag(Flag::Z, result == 0);
        self.set_flag(Flag::N, true);
        self.set_flag(Flag::H, val & 0xF == 0);
    }

    /// ADD HL, rr — Z untouched, H from bit 11, C from bit 15.
    /// The 16-bit ALU takes a second machine cycle.
    pub(crate) fn op_add_hl_rr<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let hl = self.hl();
        let val = self.rp((opcode >> 4) & 0x03);
        let result = hl.wrapping_add(val);
        self.set_flag(Flag::N, false);
        self.set_flag(Flag::H, (hl & 0x0FFF) + (val & 0x0FFF) > 0x0FFF);
        self.set_flag(Flag::C, hl as u32 + val as u32 > 0xFFFF);
        self.set_hl(result);
        bus.internal();
    }

    /// INC rr — no flags, one internal cycle.
    pub(crate) fn op_inc_rr<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let rp = (opcode >> 4) & 0x03;
        self.set_rp(rp, self.rp(rp).wrapping_add(1));
        bus.internal();
    }

    /// DEC rr — no flags, one internal cycle.
    pub(crate) fn op_dec_rr<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let rp = (opcode >> 4) & 0x03;
        self.set_rp(rp, self.rp(rp).wrapping_sub(1));
        bus.internal();
    }

    /// Signed offset added to SP with 8-bit unsigned flag rules: Z and N
    /// cleared, H/C from the low-byte add.
    pub(crate) fn sp_plus_e(&mut self, e: u8) -> u16 {
        let sp = self.sp;
        let offset = e as i8 as i16 as u16;
        let result = sp.wrapping_add(offset);
        self.set_flag(Flag::Z, false);
        self.set_flag(Flag::N, false);
        self.set_flag(Flag::H, (sp & 0xF) + (e as u16 & 0xF) > 0xF);
        self.set_flag(Flag::C, (sp & 0xFF) + (e as u16 & 0xFF) > 0xFF);
        result
    }

    /// ADD SP, e8 — 4 M: fetch, operand, two internal cycles.
    pub(crate) fn op_add_sp_e<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let e = self.fetch_imm8(bus);
        self.sp = self.sp_plus_e(e);
        bus.internal();
        bus.internal();
    }

    /// RLCA — 0 0 0 C. Unlike CB RLC A, Z is always cleared.
    pub(crate) fn op_rlca(&mut self) {
        let carry = self.a >> 7;
        self.a = self.a << 1 | carry;
        self.f = if carry != 0 { Flag::C as u8 } else { 0 };
    }

    /// RRCA — 0 0 0 C.
    pub(crate) fn op_rrca(&mut self) {
        let carry = self.a & 1;
        self.a = self.a >> 1 | carry << 7;
        self.f = if carry != 0 { Flag::C as u8 } else { 0 };
    }

    /// RLA — rotate through carry.
    pub(crate) fn op_rla(&mut self) {
        let carry_in = if self.flag(Flag::C) { 1 } else { 0 };
        let carry_out = self.a >> 7;
        self.a = self.a << 1 | carry_in;
        self.f = if carry_out != 0 { Flag::C as u8 } else { 0 };
    }

    /// RRA — rotate through carry.
    pub(crate) fn op_rra(&mut self) {
        let carry_in: u8 = if self.flag(Flag::C) { 0x80 } else { 0 };
        let carry_out = self.a & 1;
        self.a = self.a >> 1 | carry_in;
        self.f = if carry_out != 0 { Flag::C as u8 } else { 0 };
    }

    /// DAA — BCD-correct A after an add or subtract, steered by N and H.
    pub(crate) fn op_daa(&mut self) {
        let mut a = self.a;
        let mut carry = self.flag(Flag::C);
        if !self.flag(Flag::N) {
            if carry || a > 0x99 {
                a = a.wrapping_add(0x60);
                carry = true;
            }
            if self.flag(Flag::H) || a & 0x0F > 0x09 {
                a = a.wrapping_add(0x06);
            }
        } else {
            if carry {
                a = a.wrapping_sub(0x60);
            }
            if self.flag(Flag::H) {
                a = a.wrapping_sub(0x06);
            }
        }
        self.a = a;
        self.set_flag(Flag::Z, a == 0);
        self.set_flag(Flag::H, false);
        self.set_flag(Flag::C, carry);
    }

    /// CPL — complement A; N and H set.
    pub(crate) fn op_cpl(&mut self) {
        self.a = !self.a;
        self.set_flag(Flag::N, true);
        self.set_flag(Flag::H, true);
    }

    /// SCF — set carry; N and H cleared.
    pub(crate) fn op_scf(&mut self) {
        self.set_flag(Flag::N, false);
        self.set_flag(Flag::H, false);
        self.set_flag(Flag::C, true);
    }

    /// CCF — complement carry; N and H cleared.
    pub(crate) fn op_ccf(&mut self) {
        let c = self.flag(Flag::C);
        self.set_flag(Flag::N, false);
        self.set_flag(Flag::H, false);
        self.set_flag(Flag::C, !c);
    }
}
