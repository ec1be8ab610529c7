pub mod cartridge;
pub mod gameboy;

pub use cartridge::{CartError, Cartridge};
pub use gameboy::GameBoy;

/// Hardware revision the session emulates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Model {
    /// Original monochrome handheld.
    Dmg,
    /// Color variant: double speed, VRAM banks, color palettes, HDMA.
    Cgb,
}
