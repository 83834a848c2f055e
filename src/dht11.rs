//! DHT11 single-wire driver
//!
//! The sensor shares one data line with the host. The line idles high through
//! a pull-up; the host wakes the sensor by pulling it low, then listens for a
//! 40-bit frame: humidity (integral, decimal), temperature (integral, decimal)
//! and a checksum byte.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::timer::{
    DHT_LEVEL_TIMEOUT_US, DHT_ONE_THRESHOLD_US, DHT_START_LOW_MS, DHT_START_RELEASE_US,
};

/// Errors from one DHT11 transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dht11Error<E> {
    /// The line did not change level in time
    Timeout,
    /// The frame arrived but its checksum byte disagrees
    Checksum,
    /// The data pin itself reported an error
    Pin(E),
}

/// One decoded frame
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    /// Degrees Celsius
    pub temperature: f32,
    /// Percent relative humidity
    pub humidity: f32,
}

impl Measurement {
    /// Decodes a raw 5-byte frame, checking the trailing checksum
    pub fn from_frame<E>(frame: &[u8; 5]) -> Result<Self, Dht11Error<E>> {
        let sum = frame[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
        if sum != frame[4] {
            return Err(Dht11Error::Checksum);
        }

        let humidity = frame[0] as f32 + frame[1] as f32 * 0.1;

        // Bit 7 of the decimal byte flags sub-zero readings
        let mut temperature = frame[2] as f32;
        if frame[3] & 0x80 != 0 {
            temperature = -1.0 - temperature;
        }
        temperature += (frame[3] & 0x0F) as f32 * 0.1;

        Ok(Self {
            temperature,
            humidity,
        })
    }
}

/// DHT11 on an open-drain style pin: `set_low` drives the line, `set_high`
/// releases it to the pull-up, and the pin can be read back at any time.
pub struct Dht11<P, D> {
    pin: P,
    delay: D,
}

impl<P, D, E> Dht11<P, D>
where
    P: InputPin<Error = E> + OutputPin<Error = E>,
    D: DelayNs,
{
    pub fn new(pin: P, delay: D) -> Self {
        Self { pin, delay }
    }

    /// Releases the line so the sensor sees an idle bus
    pub fn idle(&mut self) -> Result<(), Dht11Error<E>> {
        self.pin.set_high().map_err(Dht11Error::Pin)
    }

    #[cfg(test)]
    pub(crate) fn pin(&self) -> &P {
        &self.pin
    }

    /// Runs one full transaction and decodes the result
    pub fn measure(&mut self) -> Result<Measurement, Dht11Error<E>> {
        let frame = self.read_frame()?;
        Measurement::from_frame(&frame)
    }

    fn read_frame(&mut self) -> Result<[u8; 5], Dht11Error<E>> {
        // Wake up
        self.pin.set_low().map_err(Dht11Error::Pin)?;
        self.delay.delay_ms(DHT_START_LOW_MS);
        self.pin.set_high().map_err(Dht11Error::Pin)?;
        self.delay.delay_us(DHT_START_RELEASE_US);

        // Sensor pulls low ~80us, then high ~80us, before the first bit
        self.wait_while(true)?;
        self.wait_while(false)?;
        self.wait_while(true)?;

        let mut frame = [0u8; 5];
        for bit in 0..40 {
            // ~50us low lead-in, then a high pulse whose length is the bit
            self.wait_while(false)?;
            let high_us = self.wait_while(true)?;
            if high_us > DHT_ONE_THRESHOLD_US {
                frame[bit / 8] |= 1 << (7 - bit % 8);
            }
        }

        Ok(frame)
    }

    /// Waits for the line to leave `level`, returning the time spent in us
    fn wait_while(&mut self, level: bool) -> Result<u32, Dht11Error<E>> {
        let mut elapsed = 0;
        while self.pin.is_high().map_err(Dht11Error::Pin)? == level {
            if elapsed >= DHT_LEVEL_TIMEOUT_US {
                return Err(Dht11Error::Timeout);
            }
            self.delay.delay_us(1);
            elapsed += 1;
        }
        Ok(elapsed)
    }
}
