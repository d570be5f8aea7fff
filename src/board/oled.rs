use esp_hal::{i2c::master::I2c, Blocking};
use ssd1306::{mode::BufferedGraphicsMode, prelude::*, I2CDisplayInterface, Ssd1306};

use crate::constants::DISPLAY_I2C_ADDRESS;
use crate::display::{DisplayError, Panel};

/// 128x64 SSD1306 on a blocking I2C bus, drawn through a RAM buffer.
pub type Oled = Ssd1306<
    I2CInterface<I2c<'static, Blocking>>,
    DisplaySize128x64,
    BufferedGraphicsMode<DisplaySize128x64>,
>;

pub fn new(i2c: I2c<'static, Blocking>) -> Oled {
    let interface = I2CDisplayInterface::new_custom_address(i2c, DISPLAY_I2C_ADDRESS);
    Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
        .into_buffered_graphics_mode()
}

impl Panel for Oled {
    fn init(&mut self) -> Result<(), DisplayError> {
        Ssd1306::init(self).map_err(|_| DisplayError::Unavailable)
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        Ssd1306::flush(self).map_err(|_| DisplayError::Unavailable)
    }
}
