pub mod bus;
pub mod machine;

pub use bus::{Bus, BusTag, Irq};
pub use machine::{AudioSink, InputButton, Machine, PixelSink, TraceSink};
