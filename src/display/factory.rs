/*
 *  display/factory.rs
 *
 *  departure-board - live departures on a dot matrix
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display driver factory for creating drivers from configuration
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use crate::config::{DisplayConfig, DriverKind};
use crate::display::drivers::headless::HeadlessDriver;
use crate::display::error::DisplayError;
use crate::display::traits::DisplayDriver;
use log::info;

#[cfg(feature = "driver-ssd1322")]
use crate::config::BusConfig;
#[cfg(feature = "driver-ssd1322")]
use crate::display::drivers::ssd1322::open_spidev;

/// Type alias for boxed display driver trait objects
pub type BoxedDriver = Box<dyn DisplayDriver>;

/// Factory for creating display drivers from configuration
pub struct DisplayDriverFactory;

impl DisplayDriverFactory {
    /// Create and initialise the driver `config` asks for.
    ///
    /// No driver configured means headless. Brightness is applied when
    /// set and the panel supports it.
    pub fn create_from_config(config: &DisplayConfig) -> Result<BoxedDriver, DisplayError> {
        let kind = config.driver.unwrap_or(DriverKind::Headless);
        let mut driver = Self::build(config, kind)?;

        driver.init()?;
        if let Some(level) = config.brightness {
            if driver.capabilities().supports_brightness {
                driver.set_brightness(level)?;
            }
        }
        let (w, h) = driver.dimensions();
        info!("{:?} display ready, {}x{}", kind, w, h);
        Ok(driver)
    }

    fn build(config: &DisplayConfig, kind: DriverKind) -> Result<BoxedDriver, DisplayError> {
        match kind {
            DriverKind::Headless => Ok(Box::new(HeadlessDriver::from_config(config))),

            #[cfg(feature = "driver-ssd1322")]
            DriverKind::Ssd1322 => match config.bus.as_ref() {
                Some(BusConfig::Spi { bus, speed_hz, dc_pin, rst_pin }) => Ok(Box::new(open_spidev(
                    bus,
                    *speed_hz,
                    *dc_pin,
                    *rst_pin,
                    config.rotate_deg.unwrap_or(0),
                )?)),
                None => Err(DisplayError::InvalidConfiguration(
                    "SSD1322 requires an SPI bus configuration".to_string(),
                )),
            },

            #[cfg(not(feature = "driver-ssd1322"))]
            DriverKind::Ssd1322 => Err(DisplayError::InvalidConfiguration(
                "SSD1322 driver not enabled. Enable with --features driver-ssd1322".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_headless() {
        let config = DisplayConfig { width: Some(128), height: Some(32), brightness: Some(90), ..Default::default() };
        let driver = DisplayDriverFactory::create_from_config(&config).unwrap();
        assert_eq!(driver.dimensions(), (128, 32));
    }

    #[cfg(not(feature = "driver-ssd1322"))]
    #[test]
    fn ssd1322_needs_the_feature() {
        let config = DisplayConfig { driver: Some(DriverKind::Ssd1322), ..Default::default() };
        assert!(matches!(
            DisplayDriverFactory::create_from_config(&config),
            Err(DisplayError::InvalidConfiguration(_))
        ));
    }
}
