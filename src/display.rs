use core::fmt::Write;

use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Baseline, Text},
};
use heapless::String;

use crate::constants::DISPLAY_LINE_CAPACITY;
use crate::reading::Reading;

/// Vertical distance between two text lines, in pixels
const LINE_PITCH: i32 = 12;

pub type Line = String<DISPLAY_LINE_CAPACITY>;

#[derive(Debug)]
pub enum DisplayError {
    Unavailable,
    Draw,
}

/// Monochrome panel with an off-screen buffer.
pub trait Panel: DrawTarget<Color = BinaryColor> {
    /// (Re)initialises the controller.
    fn init(&mut self) -> Result<(), DisplayError>;

    /// Pushes the buffer to the glass.
    fn flush(&mut self) -> Result<(), DisplayError>;
}

/// The four lines shown for a reading.
pub fn layout(device_id: &str, reading: &Reading) -> Result<[Line; 4], DisplayError> {
    let mut lines: [Line; 4] = Default::default();

    write!(lines[0], "Device:{}", device_id).map_err(|_| DisplayError::Draw)?;
    write!(
        lines[1],
        "T:{:.1}C H:{:.0}%",
        reading.temperature_c, reading.humidity_pct
    )
    .map_err(|_| DisplayError::Draw)?;
    write!(
        lines[2],
        "I:{:.0}mA V:{:.2}V",
        reading.current_ma, reading.voltage_v
    )
    .map_err(|_| DisplayError::Draw)?;
    write!(lines[3], "Vib:{}", u8::from(reading.vibration)).map_err(|_| DisplayError::Draw)?;

    Ok(lines)
}

/// Mirrors the latest reading on the local display. Best-effort: failures are
/// logged at debug level and the panel is re-initialised on the next reading.
pub struct DisplayPresenter<P> {
    panel: P,
    device_id: &'static str,
    ready: bool,
}

impl<P: Panel> DisplayPresenter<P> {
    pub fn new(panel: P, device_id: &'static str) -> Self {
        Self {
            panel,
            device_id,
            ready: false,
        }
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn present(&mut self, reading: &Reading) -> Result<(), DisplayError> {
        let result = self.render(reading);
        if let Err(e) = &result {
            log::debug!("Display update skipped: {:?}", e);
        }
        result
    }

    fn render(&mut self, reading: &Reading) -> Result<(), DisplayError> {
        if !self.ready {
            self.panel.init()?;
            self.ready = true;
        }

        let lines = layout(self.device_id, reading)?;
        let style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);

        self.panel
            .clear(BinaryColor::Off)
            .map_err(|_| DisplayError::Draw)?;

        for (row, line) in lines.iter().enumerate() {
            Text::with_baseline(
                line,
                Point::new(0, row as i32 * LINE_PITCH),
                style,
                Baseline::Top,
            )
            .draw(&mut self.panel)
            .map_err(|_| DisplayError::Draw)?;
        }

        if let Err(e) = self.panel.flush() {
            // Force a re-init on the next reading
            self.ready = false;
            return Err(e);
        }

        Ok(())
    }
}
