/// Describes a single input button that a machine accepts.
pub struct InputButton {
    /// Machine-defined button identifier, passed to `set_input()`.
    pub id: u8,
    /// Human-readable name for display/configuration (e.g., "A", "Start").
    pub name: &'static str,
}

/// Machine-agnostic interface for emulated systems.
///
/// The frontend is a pure rendering engine that does not know about the
/// hardware behind it (mappers, palette formats, FIFO pipelines).
pub trait Machine {
    /// Native display resolution as (width, height) in pixels.
    fn display_size(&self) -> (u32, u32);

    /// Run one frame of emulation (advance the clock by one frame's worth
    /// of dot clocks).
    fn run_frame(&mut self);

    /// Render the retained frame into an RGB24 pixel buffer.
    ///
    /// The buffer must be at least `width * height * 3` bytes. Pixels are
    /// stored left-to-right, top-to-bottom, 3 bytes per pixel (R, G, B).
    fn render_frame(&self, buffer: &mut [u8]);

    /// Handle an input event. `button` is a machine-defined ID from
    /// `input_map()`. `pressed` is true for key-down, false for key-up.
    fn set_input(&mut self, button: u8, pressed: bool);

    /// The list of input buttons this machine accepts.
    fn input_map(&self) -> &[InputButton];

    /// Reset the machine to its initial power-on state.
    fn reset(&mut self);

    /// Battery-backed RAM image to persist on exit, if the hardware has any.
    fn save_nvram(&self) -> Option<Vec<u8>>;

    /// Restore a battery-backed RAM image.
    fn load_nvram(&mut self, data: &[u8]);

    /// Nominal display refresh rate.
    fn frame_rate_hz(&self) -> f64;
}

/// Receives one value per visible pixel, in scan order.
///
/// `value` is the post-palette shade (0-3) on monochrome hardware or a
/// 15-bit RGB word on color hardware.
pub trait PixelSink {
    /// A new frame is about to start (before row 0).
    fn begin_frame(&mut self) {}

    fn push_pixel(&mut self, value: u16, row: u8, col: u8);

    /// The last visible row has been emitted.
    fn end_frame(&mut self) {}
}

/// Receives one stereo sample pair every 32 machine cycles (32 768 Hz).
pub trait AudioSink {
    fn push_sample(&mut self, right: i8, left: i8);
}

/// Receives one record per retired instruction. The default methods make
/// a unit struct a usable no-op sink.
pub trait TraceSink {
    fn instruction(&mut self, _pc: u16, _opcode: u8) {}
}

/// Discards everything.
pub struct NullTrace;

impl TraceSink for NullTrace {}

/// Discards pixels; the machine still retains its own framebuffer.
pub struct NullPixels;

impl PixelSink for NullPixels {
    fn push_pixel(&mut self, _value: u16, _row: u8, _col: u8) {}
}

/// Discards samples.
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn push_sample(&mut self, _right: i8, _left: i8) {}
}
