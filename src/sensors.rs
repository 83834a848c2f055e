use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::dht11::{Dht11, Measurement};

/// Acquisition side of the monitor: two scalar queries, each either a
/// value or `None` when the sensor could not be read.
pub trait Hygrometer {
    /// Prepares the sensor before the first poll
    fn begin(&mut self) {}

    /// Degrees Celsius
    fn read_temperature(&mut self) -> Option<f32>;

    /// Percent relative humidity
    fn read_humidity(&mut self) -> Option<f32>;
}

/// One temperature/humidity sample. Produced per tick and thrown away
/// after rendering.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Reading {
    pub temperature: Option<f32>,
    pub humidity: Option<f32>,
}

impl Reading {
    /// Queries temperature, then humidity
    pub fn acquire<S: Hygrometer>(sensor: &mut S) -> Self {
        let temperature = sensor.read_temperature();
        let humidity = sensor.read_humidity();
        Self {
            temperature,
            humidity,
        }
    }

    /// Both fields, or nothing. A reading missing either half is not shown.
    pub fn values(&self) -> Option<(f32, f32)> {
        match (self.temperature, self.humidity) {
            (Some(t), Some(h)) if !t.is_nan() && !h.is_nan() => Some((t, h)),
            _ => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.values().is_some()
    }
}

/// DHT11 behind the [`Hygrometer`] queries.
///
/// The sensor delivers both values in a single frame, so a temperature query
/// runs a bus transaction and keeps its outcome, failure included, for the
/// humidity query that follows it. Humidity asked for on its own runs its own
/// transaction.
pub struct Dht11Sensor<P, D> {
    dht: Dht11<P, D>,
    pending: Option<Option<Measurement>>,
}

impl<P, D, E> Dht11Sensor<P, D>
where
    P: InputPin<Error = E> + OutputPin<Error = E>,
    D: DelayNs,
{
    pub fn new(pin: P, delay: D) -> Self {
        Self {
            dht: Dht11::new(pin, delay),
            pending: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn pin(&self) -> &P {
        self.dht.pin()
    }

    fn sample(&mut self) -> Option<Measurement> {
        match self.dht.measure() {
            Ok(measurement) => Some(measurement),
            Err(_e) => {
                #[cfg(feature = "defmt")]
                match _e {
                    crate::dht11::Dht11Error::Timeout => defmt::debug!("DHT11 timeout"),
                    crate::dht11::Dht11Error::Checksum => defmt::debug!("DHT11 checksum mismatch"),
                    crate::dht11::Dht11Error::Pin(_) => defmt::debug!("DHT11 pin error"),
                }
                None
            }
        }
    }
}

impl<P, D, E> Hygrometer for Dht11Sensor<P, D>
where
    P: InputPin<Error = E> + OutputPin<Error = E>,
    D: DelayNs,
{
    /// Leaves the data line released so the first poll starts from idle
    fn begin(&mut self) {
        self.pending = None;
        if self.dht.idle().is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("Could not release the DHT11 line");
        }
    }

    fn read_temperature(&mut self) -> Option<f32> {
        let outcome = self.sample();
        self.pending = Some(outcome);
        outcome.map(|m| m.temperature)
    }

    fn read_humidity(&mut self) -> Option<f32> {
        let outcome = match self.pending.take() {
            Some(outcome) => outcome,
            None => self.sample(),
        };
        outcome.map(|m| m.humidity)
    }
}
