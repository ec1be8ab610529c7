use crate::cartridge::header::{Header, MapperKind};
use crate::cartridge::registry::MapperEntry;
use crate::cartridge::rtc::Rtc;
use crate::cartridge::Mapper;

/// MBC3 bank controller, optionally with the battery-backed RTC.
///
/// A 7-bit ROM bank register (0 maps to 1) and a combined RAM/RTC select:
/// values 0-3 pick a RAM bank, 0x08-0x0C map one RTC counter register
/// into the whole external-RAM window.
pub struct Mbc3 {
    ram_enable: bool,
    rom_bank: u8,
    /// RAM bank 0-3 or RTC register select 0x08-0x0C.
    select: u8,
    pub(crate) rtc: Option<Rtc>,
}

impl Mbc3 {
    pub fn new(header: &Header) -> Self {
        Self {
            ram_enable: false,
            rom_bank: 1,
            select: 0,
            rtc: header.has_rtc.then(Rtc::new),
        }
    }

    pub fn write_control(&mut self, addr: u16, val: u8) {
        match addr >> 13 {
            0 => self.ram_enable = val & 0x0F == 0x0A,
            1 => {
                let bank = val & 0x7F;
                self.rom_bank = if bank == 0 { 1 } else { bank };
            }
            2 => self.select = val & 0x0F,
            3 => {
                if let Some(rtc) = &mut self.rtc {
                    rtc.write_latch(val);
                }
            }
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

    pub fn read_ram(&self, addr: u16, ram: &[u8]) -> u8 {
        match self.select {
            0..=3 => {
                let offset = self.select as usize * 0x2000 + (addr & 0x1FFF) as usize;
                ram.get(offset).copied().unwrap_or(0xFF)
            }
            0x08..=0x0C => match &self.rtc {
                Some(rtc) => rtc.read(self.select),
                None => 0xFF,
            },
            _ => 0xFF,
        }
    }

    pub fn write_ram(&mut self, addr: u16, val: u8, ram: &mut [u8]) {
        match self.select {
            0..=3 => {
                let offset = self.select as usize * 0x2000 + (addr & 0x1FFF) as usize;
                if let Some(slot) = ram.get_mut(offset) {
                    *slot = val;
                }
            }
            0x08..=0x0C => {
                if let Some(rtc) = &mut self.rtc {
                    rtc.write(self.select, val);
                }
            }
            _ => {}
        }
    }

    pub fn tick_second(&mut self) {
        if let Some(rtc) = &mut self.rtc {
            rtc.tick_second();
        }
    }
}

inventory::submit! {
    MapperEntry {
        name: "MBC3",
        matches: |header| header.kind == MapperKind::Mbc3,
        build: |header| Mapper::Mbc3(Mbc3::new(header)),
    }
}
