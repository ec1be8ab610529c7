use dotmatrix_core::core::machine::AudioSink;
use dotmatrix_core::device::Apu;

struct CountAudio {
    samples: usize,
    last: (i8, i8),
}

impl CountAudio {
    fn new() -> Self {
        Self {
            samples: 0,
            last: (0, 0),
        }
    }
}

impl AudioSink for CountAudio {
    fn push_sample(&mut self, right: i8, left: i8) {
        self.samples += 1;
        self.last = (right, left);
    }
}

fn powered_apu() -> Apu {
    let mut apu = Apu::new(false);
    apu.write_reg(0xFF26, 0x80);
    apu
}

#[test]
fn test_sample_every_32_machine_cycles_even_when_off() {
    let mut apu = Apu::new(false);
    let mut sink = CountAudio::new();
    for _ in 0..320 {
        apu.cycle(4, &mut sink);
    }
    assert_eq!(sink.samples, 10);
}

#[test]
fn test_nr52_reports_power_and_channels() {
    let mut apu = Apu::new(false);
    assert_eq!(apu.read_reg(0xFF26), 0x70);

    apu.write_reg(0xFF26, 0x80);
    assert_eq!(apu.read_reg(0xFF26), 0xF0);

    // Trigger channel 1 with a live DAC.
    apu.write_reg(0xFF12, 0xF0);
    apu.write_reg(0xFF14, 0x80);
    assert_eq!(apu.read_reg(0xFF26), 0xF1);
}

#[test]
fn test_register_readback_masks() {
    let mut apu = powered_apu();
    // Zero writes: reads come back as the documented OR masks.
    let expected: &[(u16, u8)] = &[
        (0xFF10, 0x80),
        (0xFF11, 0x3F),
        (0xFF12, 0x00),
        (0xFF13, 0xFF),
        (0xFF14, 0xBF),
        (0xFF16, 0x3F),
        (0xFF18, 0xFF),
        (0xFF19, 0xBF),
        (0xFF1A, 0x7F),
        (0xFF1B, 0xFF),
        (0xFF1C, 0x9F),
        (0xFF1D, 0xFF),
        (0xFF1E, 0xBF),
        (0xFF20, 0xFF),
        (0xFF21, 0x00),
        (0xFF22, 0x00),
        (0xFF23, 0xBF),
        (0xFF24, 0x00),
        (0xFF25, 0x00),
    ];
    for &(addr, mask) in expected {
        apu.write_reg(addr, 0x00);
        assert_eq!(apu.read_reg(addr), mask, "readback of {addr:#06X}");
    }
    // All-ones writes read back 0xFF everywhere.
    for &(addr, _) in expected {
        apu.write_reg(addr, 0xFF);
        assert_eq!(apu.read_reg(addr), 0xFF, "saturated readback of {addr:#06X}");
    }
}

#[test]
fn test_length_counter_silences_channel() {
    let mut apu = powered_apu();
    apu.write_reg(0xFF17, 0xF0); // ch2 DAC on
    apu.write_reg(0xFF16, 0x3E); // length load 62 → counter 2
    apu.write_reg(0xFF19, 0xC0); // trigger with length enable

    assert_eq!(apu.read_reg(0xFF26) & 0x02, 0x02);

    // Steps 0 and 2 are length steps.
    apu.frame_step(); // step 0: 2 → 1
    assert_eq!(apu.read_reg(0xFF26) & 0x02, 0x02);
    apu.frame_step(); // step 1
    apu.frame_step(); // step 2: 1 → 0, channel off
    assert_eq!(apu.read_reg(0xFF26) & 0x02, 0x00);
}

#[test]
fn test_trigger_with_zero_length_reloads_max() {
    let mut apu = powered_apu();
    apu.write_reg(0xFF17, 0xF0);
    apu.write_reg(0xFF16, 0x3F); // counter 1
    apu.write_reg(0xFF19, 0xC0); // trigger, enable
    apu.frame_step(); // step 0 drains it to zero
    assert_eq!(apu.read_reg(0xFF26) & 0x02, 0x00);

    apu.write_reg(0xFF19, 0xC0); // retrigger with counter at 0 → reload 64
    assert_eq!(apu.read_reg(0xFF26) & 0x02, 0x02);
    // One length step must not silence it again.
    apu.frame_step();
    assert_eq!(apu.read_reg(0xFF26) & 0x02, 0x02);
}

#[test]
fn test_length_enable_rising_midframe_clocks_once() {
    let mut apu = powered_apu();
    apu.write_reg(0xFF17, 0xF0);
    apu.write_reg(0xFF16, 0x3E); // counter 2
    apu.write_reg(0xFF19, 0x80); // trigger, length disabled

    apu.frame_step(); // step 0 fires (enable off, no decrement); next step is 1

    // 0→1 enable while the next step is not a length step: one extra
    // decrement, counter 2 → 1.
    apu.write_reg(0xFF19, 0x40);
    assert_eq!(apu.read_reg(0xFF26) & 0x02, 0x02);

    apu.frame_step(); // step 1: no length
    apu.frame_step(); // step 2: 1 → 0
    assert_eq!(apu.read_reg(0xFF26) & 0x02, 0x00);
}

#[test]
fn test_sweep_overflow_disables_on_trigger_only_with_shift() {
    let mut apu = powered_apu();
    apu.write_reg(0xFF12, 0xF0); // DAC on
    // Max frequency, additive sweep, shift 0: the overflow pre-check is
    // skipped entirely.
    apu.write_reg(0xFF10, 0x10);
    apu.write_reg(0xFF13, 0xFF);
    apu.write_reg(0xFF14, 0x87); // trigger, freq high = 7
    assert_eq!(apu.read_reg(0xFF26) & 0x01, 0x01);

    // Same frequency with shift 1: next_freq overflows and the channel
    // dies at trigger time.
    apu.write_reg(0xFF10, 0x11);
    apu.write_reg(0xFF14, 0x87);
    assert_eq!(apu.read_reg(0xFF26) & 0x01, 0x00);
}

#[test]
fn test_sweep_step_raises_frequency() {
    let mut apu = powered_apu();
    apu.write_reg(0xFF12, 0xF0);
    // Period 1, shift 2, frequency 0x100.
    apu.write_reg(0xFF10, 0x12);
    apu.write_reg(0xFF13, 0x00);
    apu.write_reg(0xFF14, 0x81);

    // Sweep steps land on sequencer steps 2 and 6.
    for _ in 0..3 {
        apu.frame_step();
    }
    // 0x100 + (0x100 >> 2) = 0x140; low byte visible via NR13? No —
    // write-only. Channel must still be alive after one sweep.
    assert_eq!(apu.read_reg(0xFF26) & 0x01, 0x01);
}

#[test]
fn test_power_off_clears_registers_but_keeps_wave_ram() {
    let mut apu = powered_apu();
    apu.write_reg(0xFF24, 0x77);
    apu.write_reg(0xFF25, 0xF3);
    apu.write_reg(0xFF30, 0xAB);
    apu.write_reg(0xFF3F, 0xCD);

    apu.write_reg(0xFF26, 0x00);

    assert_eq!(apu.read_reg(0xFF24), 0x00);
    assert_eq!(apu.read_reg(0xFF25), 0x00);
    // Wave RAM survives the power cycle.
    assert_eq!(apu.read_reg(0xFF30), 0xAB);
    assert_eq!(apu.read_reg(0xFF3F), 0xCD);

    // Writes bounce while powered down.
    apu.write_reg(0xFF24, 0x55);
    assert_eq!(apu.read_reg(0xFF24), 0x00);

    apu.write_reg(0xFF26, 0x80);
    apu.write_reg(0xFF24, 0x55);
    assert_eq!(apu.read_reg(0xFF24), 0x55);
}

#[test]
fn test_mixer_routes_per_nr51() {
    let mut apu = powered_apu();
    let mut sink = CountAudio::new();
    // Wave channel with a constant full-scale pattern is the easiest
    // deterministic source.
    for offset in 0..16 {
        apu.write_reg(0xFF30 + offset, 0xFF);
    }
    apu.write_reg(0xFF1A, 0x80); // DAC on
    apu.write_reg(0xFF1C, 0x20); // full volume
    apu.write_reg(0xFF24, 0x77); // max master volume both sides
    apu.write_reg(0xFF25, 0x04); // ch3 → right only
    apu.write_reg(0xFF1D, 0xFF); // fastest sample clock
    apu.write_reg(0xFF1E, 0x87); // trigger

    for _ in 0..64 {
        apu.cycle(4, &mut sink);
    }
    let (right, left) = sink.last;
    assert_eq!(left, 0);
    // 15 × (7+1) / 32 = 3.
    assert_eq!(right, 3);
}

#[test]
fn test_pcm_registers_only_on_color_hardware() {
    let apu = Apu::new(false);
    assert_eq!(apu.read_reg(0xFF76), 0xFF);

    let apu = Apu::new(true);
    assert_eq!(apu.read_reg(0xFF76), 0x00);
    assert_eq!(apu.read_reg(0xFF77), 0x00);
}
