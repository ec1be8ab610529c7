use crate::cartridge::header::{Header, MapperKind};
use crate::cartridge::registry::MapperEntry;
use crate::cartridge::Mapper;

/// MBC5 bank controller: a 9-bit ROM bank with no bank-0 remap, and a
/// 4-bit RAM bank. The rumble variants route RAM-bank bit 3 to the motor;
/// that bit simply does nothing here.
pub struct Mbc5 {
    ram_enable: bool,
    /// 9-bit ROM bank; bank 0 stays bank 0.
    rom_bank: u16,
    ram_bank: u8,
}

impl Mbc5 {
    pub fn new(_header: &Header) -> Self {
        Self {
            ram_enable: false,
            rom_bank: 1,
            ram_bank: 0,
        }
    }

    pub fn write_control(&mut self, addr: u16, val: u8) {
        match addr >> 13 {
            0 => self.ram_enable = val & 0x0F == 0x0A,
            1 => {
                if addr < 0x3000 {
                    self.rom_bank = (self.rom_bank & 0x100) | val as u16;
                } else {
                    self.rom_bank = (self.rom_bank & 0x0FF) | ((val as u16 & 1) << 8);
                }
            }
            2 => self.ram_bank = val & 0x0F,
            3 => {}
            _ => unreachable!("ROM control write out of range: {addr:#06X}"),
        }
    }

    pub fn rom_offset(&self, addr: u16, rom_len: usize) -> usize {
        let bank = if addr < 0x4000 {
            0
        } else {
            self.rom_bank as usize
        };
        (bank * 0x4000 + (addr & 0x3FFF) as usize) % rom_len
    }

    pub fn ram_enabled(&self) -> bool {
        self.ram_enable
    }

    pub fn ram_offset(&self, addr: u16) -> usize {
        self.ram_bank as usize * 0x2000 + (addr & 0x1FFF) as usize
    }
}

inventory::submit! {
    MapperEntry {
        name: "MBC5",
        matches: |header| header.kind == MapperKind::Mbc5,
        build: |header| Mapper::Mbc5(Mbc5::new(header)),
    }
}
