//! Cartridge bus: header decoding, bank-switching controllers, battery
//! RAM and the MBC3 real-time clock.
//!
//! The controller is picked once at construction through the inventory
//! registry; after that every access dispatches through one `match` on
//! the [`Mapper`] enum — the write decode inside each controller is a
//! further dense `match` on the top three address bits.

pub mod header;
pub mod mbc1;
pub mod mbc3;
pub mod mbc5;
pub mod mmm01;
pub mod registry;
pub mod rtc;

use log::info;

pub use header::{Header, MapperKind};
use mbc1::Mbc1;
use mbc3::Mbc3;
use mbc5::Mbc5;
use mmm01::Mmm01;
use registry::MapperEntry;

/// Errors surfaced at cartridge construction or save load. Runtime
/// access is infallible: every address decodes to something.
#[derive(Debug)]
pub enum CartError {
    /// A structurally invalid header field.
    BadRomHeader { offset: u16, byte: u8 },
    /// The cartridge-type byte names a mapper this core does not carry.
    UnsupportedMapper(u8),
    /// A save image whose RAM portion does not match the header's size.
    SaveSizeMismatch { expected: usize, actual: usize },
}

impl std::fmt::Display for CartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRomHeader { offset, byte } => {
                write!(f, "bad ROM header byte {byte:#04X} at {offset:#06X}")
            }
            Self::UnsupportedMapper(byte) => {
                write!(f, "unsupported mapper type {byte:#04X}")
            }
            Self::SaveSizeMismatch { expected, actual } => {
                write!(f, "save image: expected {expected} bytes of RAM, got {actual}")
            }
        }
    }
}

impl std::error::Error for CartError {}

/// Bank-controller state, one variant per supported family.
pub enum Mapper {
    RomOnly,
    Mbc1(Mbc1),
    Mbc3(Mbc3),
    Mbc5(Mbc5),
    Mmm01(Mmm01),
}

inventory::submit! {
    MapperEntry {
        name: "ROM",
        matches: |header| header.kind == MapperKind::RomOnly,
        build: |_| Mapper::RomOnly,
    }
}

/// A loaded cartridge: immutable ROM, optional battery RAM, controller
/// state, and the parsed header.
pub struct Cartridge {
    rom: Vec<u8>,
    ram: Vec<u8>,
    mapper: Mapper,
    header: Header,
}

impl Cartridge {
    /// Inspect the header, size the RAM, and attach the bank controller.
    pub fn from_rom(rom: Vec<u8>) -> Result<Self, CartError> {
        let header = header::parse(&rom)?;
        let entry = registry::find(&header)
            .ok_or(CartError::UnsupportedMapper(header.cart_type))?;
        info!(
            "cartridge \"{}\": {} ({:#04X}), {} ROM banks, {} RAM, battery={}, rtc={}",
            header.title,
            entry.name,
            header.cart_type,
            header.rom_banks,
            header.ram_size,
            header.has_battery,
            header.has_rtc,
        );
        let mapper = (entry.build)(&header);
        let ram = vec![0; header.ram_size];
        Ok(Self {
            rom,
            ram,
            mapper,
            header,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn has_battery(&self) -> bool {
        self.header.has_battery
    }

    /// Reads in 0x0000-0x7FFF.
    pub fn read_rom(&self, addr: u16) -> u8 {
        let offset = match &self.mapper {
            Mapper::RomOnly => (addr as usize) % self.rom.len(),
            Mapper::Mbc1(m) => m.rom_offset(addr, self.rom.len()),
            Mapper::Mbc3(m) => m.rom_offset(addr, self.rom.len()),
            Mapper::Mbc5(m) => m.rom_offset(addr, self.rom.len()),
            Mapper::Mmm01(m) => m.rom_offset(addr, self.rom.len()),
        };
        self.rom[offset]
    }

    /// Writes in 0x0000-0x7FFF decode as controller commands.
    pub fn write_rom(&mut self, addr: u16, val: u8) {
        match &mut self.mapper {
            Mapper::RomOnly => {}
            Mapper::Mbc1(m) => m.write_control(addr, val),
            Mapper::Mbc3(m) => m.write_control(addr, val),
            Mapper::Mbc5(m) => m.write_control(addr, val),
            Mapper::Mmm01(m) => m.write_control(addr, val),
        }
    }

    /// Reads in 0xA000-0xBFFF. Disabled or absent RAM decodes to 0xFF.
    pub fn read_ram(&self, addr: u16) -> u8 {
        match &self.mapper {
            Mapper::RomOnly => 0xFF,
            Mapper::Mbc1(m) => {
                if m.ram_enabled() {
                    self.ram.get(m.ram_offset(addr)).copied().unwrap_or(0xFF)
                } else {
                    0xFF
                }
            }
            Mapper::Mbc3(m) => {
                if m.ram_enabled() {
                    m.read_ram(addr, &self.ram)
                } else {
                    0xFF
                }
            }
            Mapper::Mbc5(m) => {
                if m.ram_enabled() {
                    self.ram.get(m.ram_offset(addr)).copied().unwrap_or(0xFF)
                } else {
                    0xFF
                }
            }
            Mapper::Mmm01(m) => {
                if m.ram_enabled() {
                    self.ram.get(m.ram_offset(addr)).copied().unwrap_or(0xFF)
                } else {
                    0xFF
                }
            }
        }
    }

    pub fn write_ram(&mut self, addr: u16, val: u8) {
        match &mut self.mapper {
            Mapper::RomOnly => {}
            Mapper::Mbc1(m) => {
                if m.ram_enabled() {
                    let offset = m.ram_offset(addr);
                    if let Some(slot) = self.ram.get_mut(offset) {
                        *slot = val;
                    }
                }
            }
            Mapper::Mbc3(m) => {
                if m.ram_enabled() {
                    m.write_ram(addr, val, &mut self.ram);
                }
            }
            Mapper::Mbc5(m) => {
                if m.ram_enabled() {
                    let offset = m.ram_offset(addr);
                    if let Some(slot) = self.ram.get_mut(offset) {
                        *slot = val;
                    }
                }
            }
            Mapper::Mmm01(m) => {
                if m.ram_enabled() {
                    let offset = m.ram_offset(addr);
                    if let Some(slot) = self.ram.get_mut(offset) {
                        *slot = val;
                    }
                }
            }
        }
    }

    /// 1 Hz tick derived from the system timer; only the RTC cares.
    pub fn tick_second(&mut self) {
        if let Mapper::Mbc3(m) = &mut self.mapper {
            m.tick_second();
        }
    }

    /// Battery image: raw RAM, plus the 48-byte RTC footer on RTC carts.
    /// The wall-clock stamp is taken at this call.
    pub fn save_ram(&self) -> Vec<u8> {
        let mut image = self.ram.clone();
        if let Mapper::Mbc3(m) = &self.mapper
            && let Some(rtc) = &m.rtc
        {
            image.extend_from_slice(&rtc.save_footer());
        }
        image
    }

    /// Restore a battery image written by [`save_ram`](Self::save_ram).
    pub fn load_save_ram(&mut self, data: &[u8]) -> Result<(), CartError> {
        let expected = self.ram.len();
        let has_rtc = matches!(&self.mapper, Mapper::Mbc3(m) if m.rtc.is_some());
        let base_ok = data.len() == expected;
        let with_footer_ok = has_rtc && data.len() == expected + 48;
        if !base_ok && !with_footer_ok {
            return Err(CartError::SaveSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        self.ram.copy_from_slice(&data[..expected]);
        if with_footer_ok
            && let Mapper::Mbc3(m) = &mut self.mapper
            && let Some(rtc) = &mut m.rtc
        {
            let mut footer = [0u8; 48];
            footer.copy_from_slice(&data[expected..]);
            rtc.load_footer(&footer);
        }
        Ok(())
    }
}
