//! Cartridge header decoding (0x0100-0x014F).
//!
//! The fields consulted are the logo area (for multicart detection), the
//! CGB flag, the cartridge-type byte, the ROM/RAM size codes, and the
//! header checksum. Structural problems are errors; a bad checksum only
//! warns, since real carts occasionally ship with one.

use log::warn;

use crate::cartridge::CartError;

/// The mapper family named by the cartridge-type byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MapperKind {
    RomOnly,
    Mbc1,
    Mbc3,
    Mbc5,
    Mmm01,
}

/// Parsed header fields the rest of the crate works from.
#[derive(Clone, Debug)]
pub struct Header {
    pub title: String,
    pub cart_type: u8,
    pub kind: MapperKind,
    pub rom_banks: usize,
    pub ram_size: usize,
    pub cgb: bool,
    pub has_battery: bool,
    pub has_rtc: bool,
    /// Duplicate logo at 0x40104 — an MBC1 multicart (MBC1M).
    pub mbc1_multicart: bool,
}

/// RAM size in bytes per header code 0x0149.
const RAM_SIZES: [usize; 6] = [0, 0x800, 0x2000, 0x8000, 0x20000, 0x10000];

const LOGO_OFFSET: usize = 0x0104;
const LOGO_LEN: usize = 0x30;

pub fn parse(rom: &[u8]) -> Result<Header, CartError> {
    if rom.len() < 0x0150 {
        return Err(CartError::BadRomHeader {
            offset: 0x014F,
            byte: rom.last().copied().unwrap_or(0),
        });
    }

    let cart_type = rom[0x0147];
    let (kind, has_battery, has_rtc) = decode_type(cart_type)?;

    let rom_size_code = rom[0x0148];
    if rom_size_code > 0x08 {
        return Err(CartError::BadRomHeader {
            offset: 0x0148,
            byte: rom_size_code,
        });
    }
    let rom_banks = 2usize << rom_size_code;

    let ram_size_code = rom[0x0149] as usize;
    if ram_size_code >= RAM_SIZES.len() {
        return Err(CartError::BadRomHeader {
            offset: 0x0149,
            byte: rom[0x0149],
        });
    }
    let ram_size = RAM_SIZES[ram_size_code];

    let mut checksum = 0u8;
    for &byte in &rom[0x0134..0x014D] {
        checksum = checksum.wrapping_sub(byte).wrapping_sub(1);
    }
    if checksum != rom[0x014D] {
        warn!(
            "header checksum mismatch: computed {:#04X}, stored {:#04X}",
            checksum, rom[0x014D]
        );
    }

    let title = String::from_utf8_lossy(&rom[0x0134..0x0143])
        .trim_end_matches('\0')
        .to_string();

    // An MBC1 multicart repeats the logo at the start of its second
    // 256 KiB image.
    let mbc1_multicart = kind == MapperKind::Mbc1
        && rom.len() >= 0x40000 + LOGO_OFFSET + LOGO_LEN
        && rom[LOGO_OFFSET..LOGO_OFFSET + LOGO_LEN]
            == rom[0x40000 + LOGO_OFFSET..0x40000 + LOGO_OFFSET + LOGO_LEN];

    Ok(Header {
        title,
        cart_type,
        kind,
        rom_banks,
        ram_size,
        cgb: rom[0x0143] & 0x80 != 0,
        has_battery,
        has_rtc,
        mbc1_multicart,
    })
}

/// Cartridge-type byte 0x0147 → (mapper, battery, RTC).
fn decode_type(cart_type: u8) -> Result<(MapperKind, bool, bool), CartError> {
    Ok(match cart_type {
        0x00 | 0x08 => (MapperKind::RomOnly, false, false),
        0x09 => (MapperKind::RomOnly, true, false),
        0x01 | 0x02 => (MapperKind::Mbc1, false, false),
        0x03 => (MapperKind::Mbc1, true, false),
        0x0B | 0x0C => (MapperKind::Mmm01, false, false),
        0x0D => (MapperKind::Mmm01, true, false),
        0x0F | 0x10 => (MapperKind::Mbc3, true, true),
        0x11 | 0x12 => (MapperKind::Mbc3, false, false),
        0x13 => (MapperKind::Mbc3, true, false),
        0x19 | 0x1A | 0x1C | 0x1D => (MapperKind::Mbc5, false, false),
        0x1B | 0x1E => (MapperKind::Mbc5, true, false),
        other => return Err(CartError::UnsupportedMapper(other)),
    })
}
