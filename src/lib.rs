#![cfg_attr(not(test), no_std)]

//! # hygro-display
//! ## DHT11 temperature and humidity on a 128x64 OLED
//!
//! Features:
//! - DHT11 single-wire driver on any `embedded-hal` open-drain pin
//! - SSD1306 text rendering over I2C
//! - Fixed 2 s poll interval with one acquisition and one redraw per tick
//! - Halts cleanly when the display is missing at startup

pub mod dht11;
pub mod monitor;
pub mod rendering;
pub mod sensors;
pub mod timer;
