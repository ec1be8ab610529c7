use crate::core::bus::Bus;
use crate::cpu::lr35902::{Flag, Lr35902};

impl Lr35902 {
    /// 0xCB-prefixed table: rotates/shifts (00 ooo rrr), BIT (01 bbb rrr),
    /// RES (10 bbb rrr), SET (11 bbb rrr).
    ///
    /// Register forms cost 2 M including the prefix fetch; (HL) forms add
    /// the memory read and, except for BIT, the write-back.
    pub(crate) fn execute_cb<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let r = opcode & 0x07;
        match opcode >> 6 {
            0 => {
                let val = self.read_reg8(bus, r);
                let result = self.cb_rotate_shift((opcode >> 3) & 0x07, val);
                self.write_reg8(bus, r, result);
            }
            1 => {
                // BIT b, r — Z 0 1 -, no write-back
                let bit = (opcode >> 3) & 0x07;
                let val = self.read_reg8(bus, r);
                self.set_flag(Flag::Z, val & (1 << bit) == 0);
                self.set_flag(Flag::N, false);
                self.set_flag(Flag::H, true);
            }
            2 => {
                // RES b, r — no flags
                let bit = (opcode >> 3) & 0x07;
                let val = self.read_reg8(bus, r);
                self.write_reg8(bus, r, val & !(1 << bit));
            }
            3 => {
                // SET b, r — no flags
                let bit = (opcode >> 3) & 0x07;
                let val = self.read_reg8(bus, r);
                self.write_reg8(bus, r, val | 1 << bit);
            }
            _ => unreachable!(),
        }
    }

    /// RLC, RRC, RL, RR, SLA, SRA, SWAP, SRL — all set Z 0 0 C
    /// (SWAP always clears C).
    fn cb_rotate_shift(&mut self, op: u8, val: u8) -> u8 {
        let carry_in = if self.flag(Flag::C) { 1u8 } else { 0 };
        let (result, carry_out) = match op {
            0 => (val << 1 | val >> 7, val & 0x80 != 0),          // RLC
            1 => (val >> 1 | val << 7, val & 0x01 != 0),          // RRC
            2 => (val << 1 | carry_in, val & 0x80 != 0),          // RL
            3 => (val >> 1 | carry_in << 7, val & 0x01 != 0),     // RR
            4 => (val << 1, val & 0x80 != 0),                     // SLA
            5 => (val >> 1 | (val & 0x80), val & 0x01 != 0),      // SRA
            6 => (val << 4 | val >> 4, false),                    // SWAP
            7 => (val >> 1, val & 0x01 != 0),                     // SRL
            _ => unreachable!(),
        };
        self.f = 0;
        self.set_flag(Flag::Z, result == 0);
        self.set_flag(Flag::C, carry_out);
        result
    }
}
