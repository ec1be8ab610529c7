pub mod apu;
pub mod dma;
pub mod joypad;
pub mod ppu;
pub mod serial;
pub mod timer;

pub use apu::Apu;
pub use dma::{Hdma, OamDma};
pub use joypad::Joypad;
pub use ppu::Ppu;
pub use serial::Serial;
pub use timer::Timer;
