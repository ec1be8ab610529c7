use crate::cartridge::header::{Header, MapperKind};
use crate::cartridge::registry::MapperEntry;
use crate::cartridge::Mapper;

/// MBC1 / MBC1M bank controller.
///
/// Two bank registers: a 5-bit low register for the switchable window
/// and a 2-bit high register whose meaning depends on the mode bit —
/// mode 0 extends the ROM bank, mode 1 additionally banks the low ROM
/// window and (on ≥32 KiB-RAM carts) the RAM window. The multicart
/// variant (MBC1M) wires only 4 low bits and shifts the high register
/// down by one, detected from the duplicated logo in the header.
pub struct Mbc1 {
    ram_enable: bool,
    /// 5-bit bank register; a written 0 is forced to 1 before storage.
    bank_lo: u8,
    /// 2-bit bank register.
    bank_hi: u8,
    /// Mode 1 applies `bank_hi` to the low window and RAM.
    mode: bool,
    multicart: bool,
    /// RAM banking needs a 32 KiB cart (and never applies to multicarts).
    banked_ram: bool,
}

impl Mbc1 {
    pub fn new(header: &Header) -> Self {
        Self {
            ram_enable: false,
            bank_lo: 1,
            bank_hi: 0,
            mode: false,
            multicart: header.mbc1_multicart,
            banked_ram: !header.mbc1_multicart && header.ram_size >= 0x8000,
        }
    }

    fn shift(&self) -> u8 {
        if self.multicart { 4 } else { 5 }
    }

    fn lo_mask(&self) -> u8 {
        if self.multicart { 0x0F } else { 0x1F }
    }

    pub fn write_control(&mut self, addr: u16, val: u8) {
        match addr >> 13 {
            0 => self.ram_enable = val & 0x0F == 0x0A,
            1 => {
                let bank = val & 0x1F;
                self.bank_lo = if bank == 0 { 1 } else { bank };
            }
            2 => self.bank_hi = val & 0x03,
            3 => self.mode = val & 0x01 != 0,
            _ => unreachable!("ROM control write out of range: {addr:#06X}"),
        }
    }

    pub fn rom_offset(&self, addr: u16, rom_len: usize) -> usize {
        let bank = if addr < 0x4000 {
            if self.mode {
                (self.bank_hi as usize) << self.shift()
            } else {
                0
            }
        } else {
            ((self.bank_hi as usize) << self.shift()) | (self.bank_lo & self.lo_mask()) as usize
        };
        (bank * 0x4000 + (addr & 0x3FFF) as usize) % rom_len
    }

    pub fn ram_enabled(&self) -> bool {
        self.ram_enable
    }

    pub fn ram_offset(&self, addr: u16) -> usize {
        let bank = if self.mode && self.banked_ram {
            self.bank_hi as usize
        } else {
            0
        };
        bank * 0x2000 + (addr & 0x1FFF) as usize
    }
}

inventory::submit! {
    MapperEntry {
        name: "MBC1",
        matches: |header| header.kind == MapperKind::Mbc1,
        build: |header| Mapper::Mbc1(Mbc1::new(header)),
    }
}
