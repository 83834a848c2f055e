use core::fmt::{self, Write};

use display_interface::DisplayError;
use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use embedded_hal::i2c::I2c;
use heapless::String;
use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::*;
use ssd1306::{I2CDisplayInterface, Ssd1306};

use crate::sensors::Reading;

/// 7-bit I2C address of the OLED
pub const DISPLAY_ADDRESS: u8 = 0x3C;

/// Pixel rows per text line with the 6x10 font
pub const LINE_HEIGHT: i32 = 10;

pub const TITLE: &str = "DHT11 Sensor";
pub const SEPARATOR: &str = "------------";
pub const SPLASH: &str = "Initializing...";
pub const READ_ERROR: &str = "Failed to read DHT!";

/// Longest formatted line we ever build
const LINE_CAPACITY: usize = 24;

/// Presentation side of the monitor. Everything is drawn into a buffer and
/// only reaches the glass on [`Panel::flush`].
pub trait Panel {
    type Error;

    /// Brings the device up. The only operation that can fail.
    fn init(&mut self) -> Result<(), Self::Error>;

    fn clear(&mut self);

    /// Moves the text cursor, in pixels
    fn set_cursor(&mut self, x: i32, y: i32);

    /// Writes `text` at the cursor and moves to the start of the next line
    fn write_line(&mut self, text: &str);

    fn flush(&mut self);
}

/// Startup screen
pub fn render_splash<P: Panel>(panel: &mut P) {
    panel.clear();
    panel.set_cursor(0, 0);
    panel.write_line(TITLE);
    panel.write_line(SPLASH);
    panel.flush();
}

/// Draws one reading, or the error line when either value is missing.
/// Flushes exactly once, at the end.
pub fn render_reading<P: Panel>(reading: &Reading, panel: &mut P) {
    panel.clear();
    panel.set_cursor(0, 0);

    match reading.values() {
        Some((temperature, humidity)) => {
            panel.write_line(TITLE);
            panel.write_line(SEPARATOR);
            panel.write_line(&format_line(format_args!("Temp: {:.2} C", temperature)));
            panel.write_line(&format_line(format_args!("Humidity: {:.2} %", humidity)));
        }
        None => panel.write_line(READ_ERROR),
    }

    panel.flush();
}

/// Formats into a fixed buffer. Anything past the capacity would not fit on
/// the panel anyway, so overflow just truncates.
fn format_line(args: fmt::Arguments) -> String<LINE_CAPACITY> {
    let mut line = String::new();
    let _ = line.write_fmt(args);
    line
}

type Oled<I2C> =
    Ssd1306<I2CInterface<I2C>, DisplaySize128x64, BufferedGraphicsMode<DisplaySize128x64>>;

/// 128x64 SSD1306 on I2C, no reset line
pub struct OledPanel<I2C> {
    display: Oled<I2C>,
    cursor: Point,
}

impl<I2C: I2c> OledPanel<I2C> {
    pub fn new(i2c: I2C) -> Self {
        let interface = I2CDisplayInterface::new_custom_address(i2c, DISPLAY_ADDRESS);
        let display = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
            .into_buffered_graphics_mode();
        Self {
            display,
            cursor: Point::zero(),
        }
    }

    fn style() -> MonoTextStyle<'static, BinaryColor> {
        MonoTextStyle::new(&FONT_6X10, BinaryColor::On)
    }
}

impl<I2C: I2c> Panel for OledPanel<I2C> {
    type Error = DisplayError;

    fn init(&mut self) -> Result<(), DisplayError> {
        self.display.init()
    }

    fn clear(&mut self) {
        // Drawing into the framebuffer cannot fail
        let _ = DrawTarget::clear(&mut self.display, BinaryColor::Off);
        self.cursor = Point::zero();
    }

    fn set_cursor(&mut self, x: i32, y: i32) {
        self.cursor = Point::new(x, y);
    }

    fn write_line(&mut self, text: &str) {
        let _ = Text::with_baseline(text, self.cursor, Self::style(), Baseline::Top)
            .draw(&mut self.display);
        self.cursor = Point::new(0, self.cursor.y + LINE_HEIGHT);
    }

    fn flush(&mut self) {
        if let Err(_e) = self.display.flush() {
            #[cfg(feature = "defmt")]
            defmt::warn!("Display flush failed: {}", defmt::Debug2Format(&_e));
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use embedded_hal::i2c::{ErrorKind, ErrorType, NoAcknowledgeSource, Operation};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records what the monitor asked the panel to do
    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum Op {
        Clear,
        Cursor(i32, i32),
        Line(std::string::String),
        Flush,
    }

    #[derive(Default)]
    pub(crate) struct MockPanel {
        pub(crate) ops: Vec<Op>,
        pub(crate) missing: bool,
    }

    impl MockPanel {
        pub(crate) fn lines(&self) -> Vec<&str> {
            self.ops
                .iter()
                .filter_map(|op| match op {
                    Op::Line(text) => Some(text.as_str()),
                    _ => None,
                })
                .collect()
        }

        pub(crate) fn flushes(&self) -> usize {
            self.ops.iter().filter(|op| **op == Op::Flush).count()
        }
    }

    impl Panel for MockPanel {
        type Error = ();

        fn init(&mut self) -> Result<(), ()> {
            if self.missing {
                Err(())
            } else {
                Ok(())
            }
        }

        fn clear(&mut self) {
            self.ops.push(Op::Clear);
        }

        fn set_cursor(&mut self, x: i32, y: i32) {
            self.ops.push(Op::Cursor(x, y));
        }

        fn write_line(&mut self, text: &str) {
            self.ops.push(Op::Line(text.into()));
        }

        fn flush(&mut self) {
            self.ops.push(Op::Flush);
        }
    }

    /// I2C bus with at most one device on it
    struct FakeBus {
        present: bool,
        addresses: Rc<RefCell<Vec<u8>>>,
    }

    impl FakeBus {
        fn new(present: bool) -> Self {
            Self {
                present,
                addresses: Rc::default(),
            }
        }
    }

    impl ErrorType for FakeBus {
        type Error = ErrorKind;
    }

    impl I2c for FakeBus {
        fn transaction(
            &mut self,
            address: u8,
            _operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            self.addresses.borrow_mut().push(address);
            if self.present {
                Ok(())
            } else {
                Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address))
            }
        }
    }

    #[test]
    fn valid_reading_renders_four_lines() {
        let mut panel = MockPanel::default();
        let reading = Reading {
            temperature: Some(23.0),
            humidity: Some(55.0),
        };
        render_reading(&reading, &mut panel);
        assert_eq!(
            panel.lines(),
            [TITLE, SEPARATOR, "Temp: 23.00 C", "Humidity: 55.00 %"]
        );
        assert_eq!(panel.ops.first(), Some(&Op::Clear));
        assert_eq!(panel.ops.last(), Some(&Op::Flush));
        assert_eq!(panel.flushes(), 1);
    }

    #[test]
    fn decimals_are_fixed_at_two_places() {
        let mut panel = MockPanel::default();
        let reading = Reading {
            temperature: Some(-4.5),
            humidity: Some(41.0),
        };
        render_reading(&reading, &mut panel);
        assert_eq!(panel.lines()[2], "Temp: -4.50 C");
        assert_eq!(panel.lines()[3], "Humidity: 41.00 %");
    }

    #[test]
    fn missing_temperature_renders_only_the_error() {
        let mut panel = MockPanel::default();
        let reading = Reading {
            temperature: None,
            humidity: Some(55.0),
        };
        render_reading(&reading, &mut panel);
        assert_eq!(panel.lines(), [READ_ERROR]);
        assert_eq!(panel.ops.last(), Some(&Op::Flush));
        assert_eq!(panel.flushes(), 1);
    }

    #[test]
    fn missing_humidity_renders_only_the_error() {
        let mut panel = MockPanel::default();
        let reading = Reading {
            temperature: Some(23.0),
            humidity: None,
        };
        render_reading(&reading, &mut panel);
        assert_eq!(panel.lines(), [READ_ERROR]);
        assert_eq!(panel.flushes(), 1);
    }

    #[test]
    fn splash_shows_title() {
        let mut panel = MockPanel::default();
        render_splash(&mut panel);
        assert_eq!(panel.lines(), [TITLE, SPLASH]);
        assert_eq!(panel.flushes(), 1);
    }

    #[test]
    fn oled_init_fails_without_device() {
        let mut panel = OledPanel::new(FakeBus::new(false));
        assert!(panel.init().is_err());
    }

    #[test]
    fn oled_talks_to_its_address() {
        let bus = FakeBus::new(true);
        let addresses = bus.addresses.clone();
        let mut panel = OledPanel::new(bus);
        assert!(panel.init().is_ok());
        panel.clear();
        panel.write_line(TITLE);
        panel.flush();

        let addresses = addresses.borrow();
        assert!(!addresses.is_empty());
        assert!(addresses.iter().all(|a| *a == DISPLAY_ADDRESS));
    }

    #[test]
    fn write_line_advances_the_cursor() {
        let mut panel = OledPanel::new(FakeBus::new(true));
        panel.set_cursor(6, 0);
        panel.write_line(TITLE);
        assert_eq!(panel.cursor, Point::new(0, LINE_HEIGHT));
        panel.clear();
        assert_eq!(panel.cursor, Point::zero());
    }
}
