//! Poll-and-render lifecycle
//!
//! [`Monitor::initialize`] runs once at power-on, then [`Monitor::tick`] runs
//! forever: sleep, read the sensor, redraw the screen. A missing display at
//! startup halts the monitor for good.

use embedded_hal::delay::DelayNs;

use crate::rendering::{render_reading, render_splash, Panel};
use crate::sensors::{Hygrometer, Reading};
use crate::timer::{SENSOR_DELAY, SPLASH_DELAY};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Between ticks
    Idle,
    /// Acquisition and render in progress
    Cycle,
    /// Display never came up. Nothing runs any more.
    Halted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MonitorError {
    /// The panel did not answer on its bus address
    DisplayNotFound,
}

/// Owns the sensor, the panel and the delay source for the whole run
pub struct Monitor<S, P, D> {
    sensor: S,
    panel: P,
    delay: D,
    state: State,
}

impl<S, P, D> Monitor<S, P, D>
where
    S: Hygrometer,
    P: Panel,
    D: DelayNs,
{
    pub fn new(sensor: S, panel: P, delay: D) -> Self {
        Self {
            sensor,
            panel,
            delay,
            state: State::Idle,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Starts the sensor, brings up the panel and shows the splash screen
    pub fn initialize(&mut self) -> Result<(), MonitorError> {
        if self.state == State::Halted {
            return Err(MonitorError::DisplayNotFound);
        }

        #[cfg(feature = "defmt")]
        defmt::info!("hygro-display starting");

        self.sensor.begin();

        if self.panel.init().is_err() {
            #[cfg(feature = "defmt")]
            defmt::error!(
                "Display not found at {=u8:#x}",
                crate::rendering::DISPLAY_ADDRESS
            );
            self.state = State::Halted;
            return Err(MonitorError::DisplayNotFound);
        }

        render_splash(&mut self.panel);
        self.delay.delay_ms(SPLASH_DELAY);
        self.state = State::Idle;
        Ok(())
    }

    /// One sleep, one acquisition, one render. Does nothing once halted.
    pub fn tick(&mut self) {
        if self.state == State::Halted {
            return;
        }

        // The sensor needs the full interval between polls
        self.delay.delay_ms(SENSOR_DELAY);

        self.state = State::Cycle;
        let reading = Reading::acquire(&mut self.sensor);
        render_reading(&reading, &mut self.panel);
        self.state = State::Idle;
    }

    /// Initializes, then ticks forever. If the display is missing this
    /// parks in an empty loop until the board is reset.
    pub fn run(&mut self) -> ! {
        if self.initialize().is_err() {
            #[allow(clippy::empty_loop)]
            loop {}
        }

        loop {
            self.tick();
        }
    }
}
