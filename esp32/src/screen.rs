//! 128x32 SSD1306 display, four text lines like the original panel layout.

use embedded_graphics::mono_font::ascii::FONT_5X8;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::Text;
use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::*;
use ssd1306::{I2CDisplayInterface, Ssd1306};

use weather_monitor_common::screen::{Screen, ScreenView};

pub struct OledScreen<I> {
    display: Ssd1306<I2CInterface<I>, DisplaySize128x32, BufferedGraphicsMode<DisplaySize128x32>>,
}

impl<I: embedded_hal::i2c::I2c> OledScreen<I> {
    pub fn new(i2c: I) -> anyhow::Result<Self> {
        let interface = I2CDisplayInterface::new(i2c);
        let mut display = Ssd1306::new(interface, DisplaySize128x32, DisplayRotation::Rotate0)
            .into_buffered_graphics_mode();
        display
            .init()
            .map_err(|e| anyhow::anyhow!("display init: {e:?}"))?;

        Ok(Self { display })
    }

    /// Splash frame shown until the first sample lands.
    pub fn loading_frame(&mut self) {
        self.display.clear(BinaryColor::Off).ok();
        self.draw_line("Weather Monitor", 14);
        self.draw_line("starting...", 22);
        self.display.flush().ok();
    }

    fn draw_line(&mut self, text: &str, baseline: i32) {
        let style = MonoTextStyle::new(&FONT_5X8, BinaryColor::On);
        Text::new(text, Point::new(0, baseline), style)
            .draw(&mut self.display)
            .ok();
    }
}

impl<I: embedded_hal::i2c::I2c> Screen for OledScreen<I> {
    /// Best effort: a failed draw or flush costs one frame and nothing else.
    fn render(&mut self, view: ScreenView<'_>) {
        self.display.clear(BinaryColor::Off).ok();

        match view {
            ScreenView::NoData => self.draw_line("no data", 14),
            ScreenView::Reading(reading) => {
                let lines = [
                    format!("Temp: {:.2} C", reading.temperature),
                    format!("Humidity: {:.2} %", reading.humidity),
                    format!("Pressure: {:.2} hPa", reading.pressure),
                    format!("Altitude: {:.2} m", reading.altitude),
                ];
                for (i, line) in lines.iter().enumerate() {
                    self.draw_line(line, 7 + i as i32 * 8);
                }
            }
        }

        self.display.flush().ok();
    }
}
