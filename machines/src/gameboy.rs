use dotmatrix_core::core::bus::{Bus, BusTag, Irq};
use dotmatrix_core::core::machine::{
    AudioSink, InputButton, Machine, NullAudio, NullPixels, NullTrace, PixelSink, TraceSink,
};
use dotmatrix_core::cpu::{Lr35902, Lr35902State};
use dotmatrix_core::device::dma::HdmaRequest;
use dotmatrix_core::device::{Apu, Hdma, Joypad, OamDma, Ppu, Serial, Timer};
use log::warn;

use crate::cartridge::{CartError, Cartridge};
use crate::Model;

/// Game Boy (DMG) / Game Boy Color (CGB) system.
///
/// Hardware: Sharp LR35902 @ 4.194304 MHz (8.388608 MHz machine clock in
/// CGB double speed), 160×144 LCD, four-channel PSG, pluggable cartridge
/// with bank-switching controller.
///
/// The session owns the CPU and a [`SystemBus`] holding every device as
/// a sibling field; `step()` borrows the bus into the CPU, so previously
/// cross-pointing devices meet only inside one machine-cycle tick and no
/// reference cycles exist.
pub struct GameBoy {
    cpu: Lr35902,
    bus: SystemBus,
}

/// Everything on the far side of the CPU pins.
pub struct SystemBus {
    cgb: bool,
    cart: Cartridge,
    ppu: Ppu,
    apu: Apu,
    timer: Timer,
    serial: Serial,
    joypad: Joypad,
    oam_dma: OamDma,
    hdma: Hdma,

    /// 8 KiB on DMG; 8 banks of 4 KiB on CGB (SVBK selects the upper).
    wram: Vec<u8>,
    svbk: u8,
    hram: [u8; 0x7F],

    /// Interrupt file.
    intf: u8,
    inte: u8,

    boot_rom: Option<Vec<u8>>,
    boot_enabled: bool,

    /// KEY1 state.
    double_speed: bool,
    speed_armed: bool,

    /// Master clock, counted in single-speed dot units (4 per machine
    /// cycle regardless of speed, so a frame is 70224 or 140448).
    cycles: u64,

    video: Box<dyn PixelSink>,
    audio: Box<dyn AudioSink>,
    trace: Box<dyn TraceSink>,
}

/// Dots per frame at single speed (154 rows × 456 dots).
pub const DOTS_PER_FRAME: u64 = 70224;

const WRAM_BANK_SIZE: usize = 0x1000;

/// Page classification for OAM-DMA conflict detection.
pub fn bus_tag(addr: u16) -> BusTag {
    match addr >> 8 {
        0x00..=0x7F | 0xA0..=0xFD => BusTag::External,
        0x80..=0x9F => BusTag::Video,
        0xFE => BusTag::Oam,
        _ => BusTag::Internal,
    }
}

/// DMA sources above 0xDFFF alias work RAM, like the echo region.
fn dma_source(addr: u16) -> u16 {
    if addr >= 0xE000 { addr - 0x2000 } else { addr }
}

const INPUT_MAP: &[InputButton] = &[
    InputButton { id: 0, name: "A" },
    InputButton { id: 1, name: "B" },
    InputButton { id: 2, name: "Select" },
    InputButton { id: 3, name: "Start" },
    InputButton { id: 4, name: "Right" },
    InputButton { id: 5, name: "Left" },
    InputButton { id: 6, name: "Up" },
    InputButton { id: 7, name: "Down" },
];

impl GameBoy {
    /// Build a session from a ROM image. The hardware model follows the
    /// header's CGB flag unless overridden.
    pub fn new(rom: Vec<u8>, model: Option<Model>) -> Result<Self, CartError> {
        let cart = Cartridge::from_rom(rom)?;
        let model = model.unwrap_or(if cart.header().cgb {
            Model::Cgb
        } else {
            Model::Dmg
        });
        let cgb = model == Model::Cgb;
        let wram_banks = if cgb { 8 } else { 2 };

        let mut gb = Self {
            cpu: Lr35902::new(),
            bus: SystemBus {
                cgb,
                cart,
                ppu: Ppu::new(cgb),
                apu: Apu::new(cgb),
                timer: Timer::new(),
                serial: Serial::new(),
                joypad: Joypad::new(),
                oam_dma: OamDma::new(),
                hdma: Hdma::new(),
                wram: vec![0; wram_banks * WRAM_BANK_SIZE],
                svbk: 1,
                hram: [0; 0x7F],
                intf: 0,
                inte: 0,
                boot_rom: None,
                boot_enabled: false,
                double_speed: false,
                speed_armed: false,
                cycles: 0,
                video: Box::new(NullPixels),
                audio: Box::new(NullAudio),
                trace: Box::new(NullTrace),
            },
        };
        gb.power_on();
        Ok(gb)
    }

    /// Install a boot ROM image; the session restarts at the overlay
    /// entry point with cold-boot register values.
    pub fn with_boot_rom(mut self, image: Vec<u8>) -> Self {
        self.bus.boot_rom = Some(image);
        self.power_on();
        self
    }

    pub fn set_pixel_sink(&mut self, sink: Box<dyn PixelSink>) {
        self.bus.video = sink;
    }

    pub fn set_audio_sink(&mut self, sink: Box<dyn AudioSink>) {
        self.bus.audio = sink;
    }

    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) {
        self.bus.trace = sink;
    }

    pub fn model(&self) -> Model {
        if self.bus.cgb { Model::Cgb } else { Model::Dmg }
    }

    /// Execute one instruction (or one blocked machine cycle). Devices
    /// advance inside the CPU's bus accesses; the overshoot past a frame
    /// boundary is at most one instruction.
    pub fn step(&mut self) {
        let pc = self.cpu.pc;
        let opcode = self.bus.peek(pc);
        self.bus.trace.instruction(pc, opcode);
        self.cpu.step(&mut self.bus);
    }

    /// Master clock in single-speed dot units since the last rebase.
    pub fn cycles(&self) -> u64 {
        self.bus.cycles
    }

    /// Rebase the frame counter after a completed frame.
    pub fn reset_cycles(&mut self, dots: u64) {
        self.bus.cycles = self.bus.cycles.saturating_sub(dots);
    }

    /// Dots per frame under the current speed setting.
    pub fn dots_per_frame(&self) -> u64 {
        if self.bus.double_speed {
            DOTS_PER_FRAME * 2
        } else {
            DOTS_PER_FRAME
        }
    }

    pub fn press_button(&mut self, mask: u8) {
        if self.bus.joypad.press(mask) {
            self.bus.intf |= 1 << Irq::JOYPAD;
        }
    }

    pub fn release_button(&mut self, mask: u8) {
        self.bus.joypad.release(mask);
    }

    /// Bytes the serial port has transmitted so far.
    pub fn serial_output(&self) -> &[u8] {
        self.bus.serial.output()
    }

    pub fn take_serial_output(&mut self) -> Vec<u8> {
        self.bus.serial.take_output()
    }

    /// Retained frame, one u16 per pixel (DMG shade or CGB 15-bit RGB).
    pub fn framebuffer(&self) -> &[u16] {
        self.bus.ppu.framebuffer()
    }

    pub fn cpu_state(&self) -> Lr35902State {
        self.cpu.snapshot()
    }

    /// Unclocked bus read, for debugger-style hosts. Mode locks still
    /// apply; the clock does not advance.
    pub fn peek(&self, addr: u16) -> u8 {
        self.bus.peek(addr)
    }

    /// Unclocked bus write (cheat devices, test fixtures).
    pub fn poke(&mut self, addr: u16, val: u8) {
        self.bus.write_decoded(addr, val);
    }

    /// Render the instruction at `addr` for trace/debug output. Returns
    /// the text and the instruction length in bytes.
    pub fn disassemble_at(&self, addr: u16) -> (String, u16) {
        dotmatrix_core::cpu::lr35902::disasm::disassemble(addr, |a| self.bus.peek(a))
    }

    pub fn save_ram(&self) -> Vec<u8> {
        self.bus.cart.save_ram()
    }

    pub fn load_save_ram(&mut self, data: &[u8]) -> Result<(), CartError> {
        self.bus.cart.load_save_ram(data)
    }

    /// Cold boot. With a boot ROM installed execution starts inside the
    /// overlay; otherwise registers and I/O assume their post-boot state.
    fn power_on(&mut self) {
        let bus = &mut self.bus;
        bus.ppu.reset();
        bus.apu.reset();
        bus.timer.reset();
        bus.serial.reset();
        bus.joypad.reset();
        bus.oam_dma.reset();
        bus.hdma.reset();
        bus.wram.fill(0);
        bus.hram.fill(0);
        bus.svbk = 1;
        bus.intf = 0;
        bus.inte = 0;
        bus.double_speed = false;
        bus.speed_armed = false;
        bus.cycles = 0;

        if bus.boot_rom.is_some() {
            bus.boot_enabled = true;
            self.cpu.reset_boot();
            bus.ppu.write_reg(0xFF40, 0x00);
            return;
        }

        bus.boot_enabled = false;
        if bus.cgb {
            self.cpu.reset_cgb();
        } else {
            self.cpu.reset_dmg();
        }
        bus.intf = 0x01;

        // The boot ROM leaves the PSG running with channel 1 triggered.
        for &(addr, val) in &[
            (0xFF26u16, 0x80u8),
            (0xFF10, 0x80),
            (0xFF11, 0xBF),
            (0xFF12, 0xF3),
            (0xFF14, 0xBF),
            (0xFF16, 0x3F),
            (0xFF17, 0x00),
            (0xFF19, 0xB8),
            (0xFF1A, 0x7F),
            (0xFF1B, 0xFF),
            (0xFF1C, 0x9F),
            (0xFF1E, 0xB8),
            (0xFF20, 0xFF),
            (0xFF21, 0x00),
            (0xFF22, 0x00),
            (0xFF23, 0xBF),
            (0xFF24, 0x77),
            (0xFF25, 0xF3),
        ] {
            bus.apu.write_reg(addr, val);
        }
    }
}

impl SystemBus {
    /// One machine cycle: Timer → PPU → APU → serial → DMA engines, then
    /// the frame counter. Device interrupt lines collect into IF.
    fn tick_mcycle(&mut self) {
        let dots: u8 = if self.double_speed { 2 } else { 4 };

        let t = self.timer.cycle(self.double_speed);
        if t.irq {
            self.intf |= 1 << Irq::TIMER;
        }

        let pev = self.ppu.tick(dots, self.video.as_mut());
        self.intf |= pev.irq;

        if t.frame_seq {
            self.apu.frame_step();
        }
        self.apu.cycle(dots, self.audio.as_mut());

        if self.serial.cycle() {
            self.intf |= 1 << Irq::SERIAL;
        }
        if t.second {
            self.cart.tick_second();
        }

        if self.oam_dma.active() {
            let byte = self.peek_raw(dma_source(self.oam_dma.source_addr()));
            self.ppu.write_oam_dma(self.oam_dma.index(), byte);
            self.oam_dma.advance(byte);
        }

        if pev.hblank && self.hdma.active() {
            self.hdma_block();
        }

        self.cycles += 4;
    }

    /// Move one 16-byte HDMA block into VRAM.
    fn hdma_block(&mut self) {
        let (src, dst) = self.hdma.take_block();
        for i in 0..16 {
            let byte = self.peek_raw(src.wrapping_add(i));
            self.ppu.write_vram_dma(dst + i, byte);
        }
    }

    /// Address decode without side effects or clocking — DMA sources,
    /// trace peeks.
    fn peek_raw(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x7FFF => self.read_rom_overlay(addr),
            0x8000..=0x9FFF => self.ppu.read_vram(addr),
            0xA000..=0xBFFF => self.cart.read_ram(addr),
            0xC000..=0xFDFF => self.wram[self.wram_offset(addr)],
            _ => 0xFF,
        }
    }

    /// Trace-sink peek; I/O space is safe to read here too.
    fn peek(&self, addr: u16) -> u8 {
        match addr {
            0xFE00..=0xFFFF => self.read_decoded(addr),
            _ => self.peek_raw(addr),
        }
    }

    fn wram_offset(&self, addr: u16) -> usize {
        // 0xE000-0xFDFF mirrors 0xC000-0xDDFF.
        let addr = if addr >= 0xE000 { addr - 0x2000 } else { addr };
        if addr < 0xD000 {
            (addr - 0xC000) as usize
        } else {
            let bank = if self.cgb {
                (match self.svbk & 0x07 {
                    0 => 1,
                    b => b,
                }) as usize
            } else {
                1
            };
            bank * WRAM_BANK_SIZE + (addr - 0xD000) as usize
        }
    }

    fn read_rom_overlay(&self, addr: u16) -> u8 {
        if self.boot_enabled
            && let Some(boot) = &self.boot_rom
        {
            let offset = addr as usize;
            let in_overlay = offset < 0x100
                || (self.cgb && (0x200..0x900).contains(&offset) && boot.len() > 0x200);
            if in_overlay && offset < boot.len() {
                return boot[offset];
            }
        }
        self.cart.read_rom(addr)
    }

    /// Page-dispatched read, mode locks applied, no clocking.
    fn read_decoded(&self, addr: u16) -> u8 {
        match addr >> 13 {
            0..=3 => self.read_rom_overlay(addr),
            4 => self.ppu.read_vram(addr),
            5 => self.cart.read_ram(addr),
            6 => self.wram[self.wram_offset(addr)],
            _ => match addr {
                0xE000..=0xFDFF => self.wram[self.wram_offset(addr)],
                0xFE00..=0xFE9F => self.ppu.read_oam(addr),
                // Unusable region and open decodes.
                0xFEA0..=0xFEFF => 0xFF,
                0xFF00..=0xFF7F => self.read_io(addr),
                0xFF80..=0xFFFE => self.hram[(addr - 0xFF80) as usize],
                _ => self.inte,
            },
        }
    }

    fn write_decoded(&mut self, addr: u16, val: u8) {
        match addr >> 13 {
            0..=3 => self.cart.write_rom(addr, val),
            4 => self.ppu.write_vram(addr, val),
            5 => self.cart.write_ram(addr, val),
            6 => {
                let offset = self.wram_offset(addr);
                self.wram[offset] = val;
            }
            _ => match addr {
                0xE000..=0xFDFF => {
                    let offset = self.wram_offset(addr);
                    self.wram[offset] = val;
                }
                0xFE00..=0xFE9F => self.ppu.write_oam(addr, val),
                0xFEA0..=0xFEFF => {}
                0xFF00..=0xFF7F => self.write_io(addr, val),
                0xFF80..=0xFFFE => self.hram[(addr - 0xFF80) as usize] = val,
                _ => self.inte = val,
            },
        }
    }

    /// The I/O page demultiplexes on the low byte.
    fn read_io(&self, addr: u16) -> u8 {
        match addr {
            0xFF00 => self.joypad.read(),
            0xFF01 => self.serial.read_sb(),
            0xFF02 => self.serial.read_sc(),
            0xFF04 => self.timer.read_div(),
            0xFF05 => self.timer.read_tima(),
            0xFF06 => self.timer.read_tma(),
            0xFF07 => self.timer.read_tac(),
            0xFF0F => self.intf | 0xE0,
            0xFF10..=0xFF3F => self.apu.read_reg(addr),
            0xFF46 => self.oam_dma.register(),
            0xFF40..=0xFF4B => self.ppu.read_reg(addr),
            0xFF4D if self.cgb => {
                0x7E | ((self.double_speed as u8) << 7) | self.speed_armed as u8
            }
            0xFF4F => self.ppu.read_reg(addr),
            0xFF55 if self.cgb => self.hdma.read_control(),
            0xFF68..=0xFF6C => self.ppu.read_reg(addr),
            0xFF70 if self.cgb => 0xF8 | self.svbk,
            0xFF76 | 0xFF77 => self.apu.read_reg(addr),
            _ => 0xFF,
        }
    }

    fn write_io(&mut self, addr: u16, val: u8) {
        match addr {
            0xFF00 => {
                if self.joypad.write(val) {
                    self.intf |= 1 << Irq::JOYPAD;
                }
            }
            0xFF01 => self.serial.write_sb(val),
            0xFF02 => self.serial.write_sc(val),
            0xFF04 => {
                if self.timer.write_div(self.double_speed) {
                    self.apu.frame_step();
                }
            }
            0xFF05 => self.timer.write_tima(val),
            0xFF06 => self.timer.write_tma(val),
            0xFF07 => self.timer.write_tac(val),
            0xFF0F => self.intf = val & 0x1F,
            0xFF10..=0xFF3F => self.apu.write_reg(addr, val),
            0xFF46 => self.oam_dma.start(val),
            0xFF40..=0xFF4B => self.intf |= self.ppu.write_reg(addr, val),
            0xFF4D if self.cgb => self.speed_armed = val & 0x01 != 0,
            0xFF4F => {
                self.ppu.write_reg(addr, val);
            }
            0xFF50 => {
                if val & 0x01 != 0 {
                    self.boot_enabled = false;
                }
            }
            0xFF51 if self.cgb => self.hdma.write_src_high(val),
            0xFF52 if self.cgb => self.hdma.write_src_low(val),
            0xFF53 if self.cgb => self.hdma.write_dst_high(val),
            0xFF54 if self.cgb => self.hdma.write_dst_low(val),
            0xFF55 if self.cgb => match self.hdma.write_control(val) {
                HdmaRequest::General => {
                    // Copy everything now; the CPU stalls two machine
                    // cycles per byte pair.
                    let mut blocks = 0u32;
                    while self.hdma.active() {
                        self.hdma_block();
                        blocks += 1;
                    }
                    for _ in 0..blocks * 8 {
                        self.tick_mcycle();
                    }
                }
                HdmaRequest::Hblank | HdmaRequest::Cancelled => {}
            },
            0xFF68..=0xFF6C => {
                self.ppu.write_reg(addr, val);
            }
            0xFF70 if self.cgb => self.svbk = val & 0x07,
            0xFF76 | 0xFF77 => {}
            _ => {}
        }
    }
}

impl Bus for SystemBus {
    fn read(&mut self, addr: u16) -> u8 {
        self.tick_mcycle();
        if self.oam_dma.active() {
            let src_tag = bus_tag(dma_source(self.oam_dma.source_addr()));
            if bus_tag(addr) == src_tag {
                return self.oam_dma.conflict_byte();
            }
        }
        self.read_decoded(addr)
    }

    fn write(&mut self, addr: u16, val: u8) {
        self.tick_mcycle();
        self.write_decoded(addr, val);
    }

    fn internal(&mut self) {
        self.tick_mcycle();
    }

    fn idle(&mut self) {
        self.cycles += 4;
    }

    fn pending_irqs(&self) -> u8 {
        self.inte & self.intf & 0x1F
    }

    fn ack_irq(&mut self, bit: u8) {
        self.intf &= !(1 << bit);
    }

    fn raise_irq(&mut self, bit: u8) {
        self.intf |= 1 << bit;
    }

    fn speed_switch_armed(&self) -> bool {
        self.speed_armed
    }

    /// STOP consumes the armed switch: the machine-cycle divider flips
    /// and the APU sequencer tap moves (the timer reads the flag).
    fn perform_speed_switch(&mut self) {
        self.speed_armed = false;
        self.double_speed = !self.double_speed;
    }

    fn any_button_held(&self) -> bool {
        self.joypad.any_held()
    }
}

impl Machine for GameBoy {
    fn display_size(&self) -> (u32, u32) {
        (160, 144)
    }

    fn run_frame(&mut self) {
        let target = self.dots_per_frame();
        while self.bus.cycles < target {
            self.step();
        }
        self.reset_cycles(target);
    }

    fn render_frame(&self, buffer: &mut [u8]) {
        // DMG shades, darkest last.
        const SHADES: [u8; 4] = [0xFF, 0xAA, 0x55, 0x00];
        for (i, &px) in self.bus.ppu.framebuffer().iter().enumerate() {
            let (r, g, b) = if self.bus.cgb {
                (
                    expand5((px & 0x1F) as u8),
                    expand5(((px >> 5) & 0x1F) as u8),
                    expand5(((px >> 10) & 0x1F) as u8),
                )
            } else {
                let shade = SHADES[(px & 0x03) as usize];
                (shade, shade, shade)
            };
            buffer[i * 3] = r;
            buffer[i * 3 + 1] = g;
            buffer[i * 3 + 2] = b;
        }
    }

    fn set_input(&mut self, button: u8, pressed: bool) {
        if button >= 8 {
            return;
        }
        if pressed {
            self.press_button(1 << button);
        } else {
            self.release_button(1 << button);
        }
    }

    fn input_map(&self) -> &[InputButton] {
        INPUT_MAP
    }

    fn reset(&mut self) {
        if !self.bus.cart.has_battery() {
            // Non-battery RAM does not survive a power cycle.
            let blank = vec![0; self.bus.cart.save_ram().len()];
            let _ = self.bus.cart.load_save_ram(&blank);
        }
        self.power_on();
    }

    fn save_nvram(&self) -> Option<Vec<u8>> {
        if self.bus.cart.has_battery() {
            Some(self.save_ram())
        } else {
            None
        }
    }

    fn load_nvram(&mut self, data: &[u8]) {
        if let Err(e) = self.load_save_ram(data) {
            warn!("ignoring NVRAM image: {e}");
        }
    }

    fn frame_rate_hz(&self) -> f64 {
        4_194_304.0 / DOTS_PER_FRAME as f64
    }
}

/// 5-bit color channel to 8 bits.
fn expand5(c: u8) -> u8 {
    (c << 3) | (c >> 2)
}
