use crate::cartridge::header::{Header, MapperKind};
use crate::cartridge::registry::MapperEntry;
use crate::cartridge::Mapper;

/// MMM01 multi-game controller.
///
/// Powers up unmapped, exposing the highest 32 KiB of ROM (the menu) as
/// a plain 32 KiB cart. The menu picks a game, programs the bank base
/// and mask, then writes the map latch; from that point the mask and
/// multiplexer configuration are frozen and the selected game sees an
/// ordinary MBC1-like controller restricted to its slice.
///
/// Bank bits, in 16 KiB-bank units: low = bits 0-4 (from 0x2000 writes),
/// mid = bits 5-6 (same write, top bits), high = bits 7-8 (from 0x4000
/// writes). The 0x6000 register carries the mode bit, the low-bank lock
/// mask, and the multiplex bit that substitutes the RAM bank register
/// for the mid ROM bits.
pub struct Mmm01 {
    mapped: bool,
    ram_enable: bool,
    bank_low: u8,
    bank_mid: u8,
    bank_high: u8,
    ram_bank: u8,
    mode: bool,
    /// Set bits of the low bank register are frozen once mapped.
    low_mask: u8,
    multiplex: bool,
}

impl Mmm01 {
    pub fn new(_header: &Header) -> Self {
        Self {
            mapped: false,
            ram_enable: false,
            bank_low: 0,
            bank_mid: 0,
            bank_high: 0,
            ram_bank: 0,
            mode: false,
            low_mask: 0,
            multiplex: false,
        }
    }

    pub fn write_control(&mut self, addr: u16, val: u8) {
        match addr >> 13 {
            0 => {
                self.ram_enable = val & 0x0F == 0x0A;
                if !self.mapped && val & 0x40 != 0 {
                    self.mapped = true;
                }
            }
            1 => {
                if self.mapped {
                    self.bank_low =
                        (self.bank_low & self.low_mask) | (val & 0x1F & !self.low_mask);
                } else {
                    self.bank_low = val & 0x1F;
                }
                self.bank_mid = (val >> 5) & 0x03;
            }
            2 => {
                self.ram_bank = val & 0x03;
                self.bank_high = (val >> 4) & 0x03;
            }
            3 => {
                self.mode = val & 0x01 != 0;
                if !self.mapped {
                    self.low_mask = (val >> 1) & 0x1E;
                    self.multiplex = val & 0x40 != 0;
                }
            }
            _ => unreachable!("ROM control write out of range: {addr:#06X}"),
        }
    }

    fn effective_mid(&self) -> usize {
        if self.multiplex {
            self.ram_bank as usize
        } else {
            self.bank_mid as usize
        }
    }

    pub fn rom_offset(&self, addr: u16, rom_len: usize) -> usize {
        if !self.mapped {
            // Unmapped: the last 32 KiB shadow the whole ROM window.
            return (rom_len.saturating_sub(0x8000) + addr as usize) % rom_len;
        }
        let base = (self.bank_high as usize) << 7 | self.effective_mid() << 5;
        let bank = if addr < 0x4000 {
            // The low window shows the locked base of the selected game.
            base | (self.bank_low & self.low_mask) as usize
        } else {
            base | self.bank_low as usize
        };
        (bank * 0x4000 + (addr & 0x3FFF) as usize) % rom_len
    }

    pub fn ram_enabled(&self) -> bool {
        self.ram_enable
    }

    pub fn ram_offset(&self, addr: u16) -> usize {
        let bank = if self.multiplex {
            self.bank_mid as usize
        } else {
            self.ram_bank as usize
        };
        bank * 0x2000 + (addr & 0x1FFF) as usize
    }
}

inventory::submit! {
    MapperEntry {
        name: "MMM01",
        matches: |header| header.kind == MapperKind::Mmm01,
        build: |header| Mapper::Mmm01(Mmm01::new(header)),
    }
}
