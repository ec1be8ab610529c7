use crate::core::bus::Bus;
use crate::cpu::lr35902::Lr35902;

impl Lr35902 {
    /// LD r, r' — 1 M, or 2 M when either side is (HL).
    /// Opcode mask: 01 ddd sss
    pub(crate) fn op_ld_r_r<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let val = self.read_reg8(bus, opcode & 0x07);
        self.write_reg8(bus, (opcode >> 3) & 0x07, val);
    }

    /// LD r, n — 2 M (3 M for (HL)).
    /// Opcode mask: 00 rrr 110
    pub(crate) fn op_ld_r_n<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let val = self.fetch_imm8(bus);
        self.write_reg8(bus, (opcode >> 3) & 0x07, val);
    }

    /// LD rr, nn — 3 M.
    /// Opcode mask: 00 rr0 001
    pub(crate) fn op_ld_rr_nn<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let val = self.fetch_imm16(bus);
        self.set_rp((opcode >> 4) & 0x03, val);
    }

    /// LD (rr), A for BC/DE/HL± — 2 M.
    pub(crate) fn op_ld_ind_a<B: Bus + ?Sized>(&mut self, bus: &mut B, addr: u16) {
        bus.write(addr, self.a);
    }

    /// LD A, (rr) for BC/DE/HL± — 2 M.
    pub(crate) fn op_ld_a_ind<B: Bus + ?Sized>(&mut self, bus: &mut B, addr: u16) {
        self.a = bus.read(addr);
    }

    /// LD (nn), SP — 5 M, low byte first.
    pub(crate) fn op_ld_nn_sp<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let addr = self.fetch_imm16(bus);
        bus.write(addr, self.sp as u8);
        bus.write(addr.wrapping_add(1), (self.sp >> 8) as u8);
    }

    /// LDH (n), A — 3 M, high page store.
    pub(crate) fn op_ldh_n_a<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let offset = self.fetch_imm8(bus);
        bus.write(0xFF00 | offset as u16, self.a);
    }

    /// LDH A, (n) — 3 M, high page load.
    pub(crate) fn op_ldh_a_n<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let offset = self.fetch_imm8(bus);
        self.a = bus.read(0xFF00 | offset as u16);
    }

    /// LD (C), A — 2 M.
    pub(crate) fn op_ldh_c_a<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        bus.write(0xFF00 | self.c as u16, self.a);
    }

    /// LD A, (C) — 2 M.
    pub(crate) fn op_ldh_a_c<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.a = bus.read(0xFF00 | self.c as u16);
    }

    /// LD (nn), A — 4 M.
    pub(crate) fn op_ld_nn_a<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let addr = self.fetch_imm16(bus);
        bus.write(addr, self.a);
    }

    /// LD A, (nn) — 4 M.
    pub(crate) fn op_ld_a_nn<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let addr = self.fetch_imm16(bus);
        self.a = bus.read(addr);
    }

    /// LD HL, SP+e8 — 3 M, flags from the 8-bit unsigned low-byte add.
    pub(crate) fn op_ld_hl_sp_e<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let e = self.fetch_imm8(bus);
        let result = self.sp_plus_e(e);
        self.set_hl(result);
        bus.internal();
    }

    /// LD SP, HL — 2 M.
    pub(crate) fn op_ld_sp_hl<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.sp = self.hl();
        bus.internal();
    }
}
