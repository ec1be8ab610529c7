/// Classifies a memory region for OAM-DMA conflict detection.
///
/// Every page of the address space carries exactly one tag. While an OAM
/// DMA is in flight, a CPU access to a page whose tag matches the DMA
/// source page observes the byte the engine is moving instead of the true
/// target; `Internal` pages (HRAM/IO) are never blocked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusTag {
    /// Cartridge ROM/RAM and work RAM (the external address/data bus).
    External,
    /// Video RAM.
    Video,
    /// Object attribute memory.
    Oam,
    /// High RAM and the I/O register page.
    Internal,
}

/// Interrupt bit indices, priority low-bit-first.
pub struct Irq;

impl Irq {
    pub const VBLANK: u8 = 0;
    pub const STAT: u8 = 1;
    pub const TIMER: u8 = 2;
    pub const SERIAL: u8 = 3;
    pub const JOYPAD: u8 = 4;

    /// Dispatch vector for an interrupt bit index.
    pub fn vector(bit: u8) -> u16 {
        0x0040 + 8 * bit as u16
    }
}

/// Bus interface the CPU executes against.
///
/// `read`, `write` and `internal` each advance the master clock by one
/// machine cycle (four dot clocks, two in double-speed), cycling every
/// device before the access resolves. `idle` advances the dot counter
/// only — bookkeeping for frozen states where no device may tick.
pub trait Bus {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, data: u8);

    /// CPU-internal machine cycle (16-bit ALU second half, dispatch delay).
    fn internal(&mut self);

    /// Advance the dot counter without cycling devices.
    fn idle(&mut self);

    /// `IE & IF & 0x1F` — the set of serviceable interrupt lines.
    fn pending_irqs(&self) -> u8;

    /// Clear one IF bit at dispatch.
    fn ack_irq(&mut self, bit: u8);

    /// Set one IF bit (device request).
    fn raise_irq(&mut self, bit: u8);

    /// A KEY1 speed switch has been armed and awaits STOP.
    /// Default suits systems without a double-speed mode.
    fn speed_switch_armed(&self) -> bool {
        false
    }

    /// Consume an armed speed switch (STOP executed).
    fn perform_speed_switch(&mut self) {}

    /// Any selected joypad line is held low — wakes STOP.
    fn any_button_held(&self) -> bool {
        false
    }
}
