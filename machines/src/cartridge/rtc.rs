//! MBC3 real-time clock.
//!
//! Five counter registers (seconds, minutes, hours, day low, day high)
//! tick at 1 Hz off the timer's second event while the halt bit is
//! clear. Reads go through a shadow copy frozen by the 0→1 latch strobe.
//! Save files carry the counters plus a wall-clock stamp so elapsed real
//! time is credited on the next load.

use std::time::{SystemTime, UNIX_EPOCH};

use log::debug;

const SECONDS_PER_DAY: u64 = 86_400;

/// Day counter wraps at 512; the wrap sets the overflow (carry) bit.
const DAY_WRAP: u64 = 512;

pub struct Rtc {
    secs: u8,
    mins: u8,
    hours: u8,
    days: u16,
    /// Day-high control bits: bit 6 halt, bit 7 overflow.
    halt: bool,
    overflow: bool,
    latched: [u8; 5],
    /// Last value written to the latch port; a 0→1 sequence strobes.
    latch_gate: u8,
}

impl Rtc {
    pub fn new() -> Self {
        Self {
            secs: 0,
            mins: 0,
            hours: 0,
            days: 0,
            halt: false,
            overflow: false,
            latched: [0; 5],
            latch_gate: 0xFF,
        }
    }

    fn live_regs(&self) -> [u8; 5] {
        [
            self.secs,
            self.mins,
            self.hours,
            self.days as u8,
            ((self.days >> 8) as u8 & 0x01)
                | if self.halt { 0x40 } else { 0 }
                | if self.overflow { 0x80 } else { 0 },
        ]
    }

    /// Register select 0x08-0x0C, through the latched shadow.
    pub fn read(&self, select: u8) -> u8 {
        self.latched[(select - 0x08) as usize % 5]
    }

    /// Writes land in the live counters, with the per-register masks the
    /// hardware applies.
    pub fn write(&mut self, select: u8, val: u8) {
        match select {
            0x08 => self.secs = val & 0x3F,
            0x09 => self.mins = val & 0x3F,
            0x0A => self.hours = val & 0x1F,
            0x0B => self.days = (self.days & 0x100) | val as u16,
            0x0C => {
                self.days = (self.days & 0xFF) | ((val as u16 & 1) << 8);
                self.halt = val & 0x40 != 0;
                self.overflow = val & 0x80 != 0;
            }
            _ => {}
        }
    }

    /// The latch port at 0x6000-0x7FFF: writing 0 then 1 freezes the
    /// shadow copy.
    pub fn write_latch(&mut self, val: u8) {
        if self.latch_gate == 0 && val == 1 {
            self.latched = self.live_regs();
        }
        self.latch_gate = val;
    }

    /// 1 Hz tick from the timer.
    pub fn tick_second(&mut self) {
        if !self.halt {
            self.advance_seconds(1);
        }
    }

    /// Credit elapsed seconds, with carries into minutes/hours/days and
    /// the 512-day overflow bit.
    pub fn advance_seconds(&mut self, elapsed: u64) {
        let mut total = self.secs as u64
            + 60 * self.mins as u64
            + 3600 * self.hours as u64
            + SECONDS_PER_DAY * self.days as u64
            + elapsed;
        let days = total / SECONDS_PER_DAY;
        if days >= DAY_WRAP {
            self.overflow = true;
        }
        total -= (days / DAY_WRAP) * DAY_WRAP * SECONDS_PER_DAY;
        self.secs = (total % 60) as u8;
        self.mins = (total / 60 % 60) as u8;
        self.hours = (total / 3600 % 24) as u8;
        self.days = (total / SECONDS_PER_DAY) as u16;
    }

    /// 48-byte save footer: five u32-LE live registers, five u32-LE
    /// latched copies, then a u64-LE wall-clock stamp.
    pub fn save_footer(&self) -> [u8; 48] {
        let mut footer = [0u8; 48];
        let live = self.live_regs();
        for i in 0..5 {
            footer[i * 4..i * 4 + 4].copy_from_slice(&(live[i] as u32).to_le_bytes());
            footer[20 + i * 4..20 + i * 4 + 4]
                .copy_from_slice(&(self.latched[i] as u32).to_le_bytes());
        }
        footer[40..48].copy_from_slice(&unix_now().to_le_bytes());
        footer
    }

    /// Restore from a save footer and credit wall-clock time that passed
    /// while the emulator was down.
    pub fn load_footer(&mut self, footer: &[u8; 48]) {
        // Each register is stored as a u32-LE whose value fits in a byte.
        let reg = |i: usize| footer[i * 4];
        self.secs = reg(0) & 0x3F;
        self.mins = reg(1) & 0x3F;
        self.hours = reg(2) & 0x1F;
        let day_high = reg(4);
        self.days = reg(3) as u16 | ((day_high as u16 & 1) << 8);
        self.halt = day_high & 0x40 != 0;
        self.overflow = day_high & 0x80 != 0;
        for i in 0..5 {
            self.latched[i] = footer[20 + i * 4];
        }

        let mut stamp_bytes = [0u8; 8];
        stamp_bytes.copy_from_slice(&footer[40..48]);
        let stamp = u64::from_le_bytes(stamp_bytes);
        let now = unix_now();
        if !self.halt && now > stamp {
            let elapsed = now - stamp;
            debug!("RTC catch-up: {elapsed} wall-clock seconds");
            self.advance_seconds(elapsed);
        }
    }
}

impl Default for Rtc {
    fn default() -> Self {
        Self::new()
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
