pub mod core;
pub mod cpu;
pub mod device;

pub mod prelude {
    pub use crate::core::machine::{AudioSink, InputButton, Machine, PixelSink, TraceSink};
    pub use crate::core::{Bus, BusTag, Irq};
    pub use crate::cpu::Lr35902;
}
