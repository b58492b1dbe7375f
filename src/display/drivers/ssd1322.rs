/*
 *  display/drivers/ssd1322.rs
 *
 *  departure-board - live departures on a dot matrix
 *  (c) 2020-26 Stuart Hunter
 *
 *  SSD1322 256x64 OLED over 4-wire SPI
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

use std::thread::sleep;
use std::time::Duration;

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;
use log::info;

use crate::display::error::DisplayError;
use crate::display::traits::{check_frame, DisplayCapabilities, DisplayDriver};
use crate::vframebuf::Canvas;

const WIDTH: u32 = 256;
const HEIGHT: u32 = 64;
/// the 256 pixel panel sits in the middle of the 480 column controller
const COLUMN_START: u8 = 0x1C;
const COLUMN_END: u8 = 0x5B;
/// lit pixels are driven at full grey
const ON_LEVEL: u8 = 0x0F;
/// spidev refuses larger single transfers by default
const MAX_TRANSFER: usize = 4096;

/// SSD1322 panel driven through any embedded-hal SPI device plus a
/// data/command pin and an optional reset pin.
pub struct Ssd1322Driver<SPI, DC, RST> {
    spi: SPI,
    dc: DC,
    rst: Option<RST>,
    rotate_180: bool,
    capabilities: DisplayCapabilities,
}

impl<SPI, DC, RST> Ssd1322Driver<SPI, DC, RST>
where
    SPI: SpiDevice,
    DC: OutputPin,
    RST: OutputPin,
{
    pub fn new(spi: SPI, dc: DC, rst: Option<RST>, rotate_deg: u16) -> Result<Self, DisplayError> {
        let rotate_180 = match rotate_deg {
            0 => false,
            180 => true,
            other => {
                return Err(DisplayError::InvalidConfiguration(format!(
                    "SSD1322 rotation must be 0 or 180, got {}",
                    other
                )))
            }
        };
        Ok(Self {
            spi,
            dc,
            rst,
            rotate_180,
            capabilities: DisplayCapabilities {
                width: WIDTH,
                height: HEIGHT,
                max_fps: 60, // SPI is faster than I2C
                supports_brightness: true,
            },
        })
    }

    /// Hand back the bus and pins.
    pub fn release(self) -> (SPI, DC, Option<RST>) {
        (self.spi, self.dc, self.rst)
    }

    fn command(&mut self, cmd: u8, params: &[u8]) -> Result<(), DisplayError> {
        self.dc.set_low().map_err(|e| DisplayError::GpioError(format!("{:?}", e)))?;
        self.spi.write(&[cmd]).map_err(|e| DisplayError::SpiError(format!("{:?}", e)))?;
        if !params.is_empty() {
            self.data(params)?;
        }
        Ok(())
    }

    fn data(&mut self, bytes: &[u8]) -> Result<(), DisplayError> {
        self.dc.set_high().map_err(|e| DisplayError::GpioError(format!("{:?}", e)))?;
        for chunk in bytes.chunks(MAX_TRANSFER) {
            self.spi.write(chunk).map_err(|e| DisplayError::SpiError(format!("{:?}", e)))?;
        }
        Ok(())
    }

    fn reset(&mut self) -> Result<(), DisplayError> {
        if let Some(rst) = self.rst.as_mut() {
            let gpio = |e: RST::Error| DisplayError::GpioError(format!("{:?}", e));
            rst.set_low().map_err(gpio)?;
            sleep(Duration::from_millis(1));
            rst.set_high().map_err(gpio)?;
            sleep(Duration::from_millis(1));
        }
        Ok(())
    }

    fn write_frame(&mut self, gray: &[u8]) -> Result<(), DisplayError> {
        self.command(0x15, &[COLUMN_START, COLUMN_END])?;
        self.command(0x75, &[0x00, (HEIGHT - 1) as u8])?;
        self.command(0x5C, &[])?;
        self.data(gray)
    }
}

impl<SPI, DC, RST> DisplayDriver for Ssd1322Driver<SPI, DC, RST>
where
    SPI: SpiDevice + Send,
    DC: OutputPin + Send,
    RST: OutputPin + Send,
{
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        self.reset()?;
        let remap: &[u8] = if self.rotate_180 { &[0x06, 0x11] } else { &[0x14, 0x11] };

        self.command(0xFD, &[0x12])?; // unlock
        self.command(0xAE, &[])?; // display off
        self.command(0xB3, &[0x91])?; // clock divider
        self.command(0xCA, &[0x3F])?; // mux ratio, 64 rows
        self.command(0xA2, &[0x00])?; // display offset
        self.command(0xA1, &[0x00])?; // start line
        self.command(0xA0, remap)?;
        self.command(0xB5, &[0x00])?; // GPIO off
        self.command(0xAB, &[0x01])?; // internal VDD
        self.command(0xB4, &[0xA0, 0xFD])?; // external VSL
        self.command(0xC1, &[0x9F])?; // contrast
        self.command(0xC7, &[0x0F])?; // master contrast
        self.command(0xB9, &[])?; // linear grey table
        self.command(0xB1, &[0xE2])?; // phase length
        self.command(0xD1, &[0x82, 0x20])?; // display enhancement B
        self.command(0xBB, &[0x1F])?; // pre-charge voltage
        self.command(0xB6, &[0x08])?; // second pre-charge period
        self.command(0xBE, &[0x07])?; // VCOMH
        self.command(0xA6, &[])?; // normal display

        DisplayDriver::clear(self)?;
        self.command(0xAF, &[])?; // display on
        info!("SSD1322 initialised{}", if self.rotate_180 { ", rotated 180" } else { "" });
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        let blank = vec![0u8; (WIDTH * HEIGHT / 2) as usize];
        self.write_frame(&blank)
    }

    fn flush(&mut self, frame: &Canvas) -> Result<(), DisplayError> {
        check_frame(&self.capabilities, frame)?;
        let gray = frame.to_gray4_bytes(ON_LEVEL);
        self.write_frame(&gray)
    }

    fn set_brightness(&mut self, value: u8) -> Result<(), DisplayError> {
        self.command(0xC1, &[value])
    }
}

#[cfg(feature = "driver-ssd1322")]
pub use spidev_bus::open_spidev;

#[cfg(feature = "driver-ssd1322")]
mod spidev_bus {
    use super::*;
    use linux_embedded_hal::spidev::{SpiModeFlags, SpidevOptions};
    use linux_embedded_hal::sysfs_gpio::Direction;
    use linux_embedded_hal::{SpidevDevice, SysfsPin};

    pub type LinuxSsd1322 = Ssd1322Driver<SpidevDevice, SysfsPin, SysfsPin>;

    fn output_pin(number: u32) -> Result<SysfsPin, DisplayError> {
        let pin = SysfsPin::new(number as u64);
        pin.0.export()
            .and_then(|_| pin.0.set_direction(Direction::Out))
            .map_err(|e| DisplayError::GpioError(format!("pin {}: {}", number, e)))?;
        Ok(pin)
    }

    /// Open the panel on a Linux spidev bus with sysfs GPIO pins.
    pub fn open_spidev(
        bus: &str,
        speed_hz: Option<u32>,
        dc_pin: u32,
        rst_pin: Option<u32>,
        rotate_deg: u16,
    ) -> Result<LinuxSsd1322, DisplayError> {
        info!("Opening SSD1322 on {} with DC pin {} and RST pin {:?}", bus, dc_pin, rst_pin);
        let mut spi = SpidevDevice::open(bus)
            .map_err(|e| DisplayError::InitializationFailed(format!("{}: {:?}", bus, e)))?;
        let options = SpidevOptions::new()
            .bits_per_word(8)
            .max_speed_hz(speed_hz.unwrap_or(8_000_000))
            .mode(SpiModeFlags::SPI_MODE_0)
            .build();
        spi.0.configure(&options)
            .map_err(|e| DisplayError::SpiError(format!("{}", e)))?;

        let dc = output_pin(dc_pin)?;
        let rst = rst_pin.map(output_pin).transpose()?;
        Ssd1322Driver::new(spi, dc, rst, rotate_deg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_graphics::pixelcolor::BinaryColor;
    use embedded_graphics::prelude::*;
    use embedded_hal::spi::Operation;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq)]
    enum Wire {
        Cmd(u8),
        Data(Vec<u8>),
    }

    #[derive(Default)]
    struct Bus {
        dc_high: bool,
        wire: Vec<Wire>,
    }

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Bus>>);

    impl embedded_hal::spi::ErrorType for Recorder {
        type Error = Infallible;
    }

    impl SpiDevice for Recorder {
        fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Infallible> {
            let mut bus = self.0.lock().unwrap();
            for op in operations.iter() {
                if let Operation::Write(bytes) = op {
                    if bus.dc_high {
                        bus.wire.push(Wire::Data(bytes.to_vec()));
                    } else {
                        bus.wire.extend(bytes.iter().map(|b| Wire::Cmd(*b)));
                    }
                }
            }
            Ok(())
        }
    }

    struct DcPin(Arc<Mutex<Bus>>);

    impl embedded_hal::digital::ErrorType for DcPin {
        type Error = Infallible;
    }

    impl OutputPin for DcPin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.0.lock().unwrap().dc_high = false;
            Ok(())
        }
        fn set_high(&mut self) -> Result<(), Infallible> {
            self.0.lock().unwrap().dc_high = true;
            Ok(())
        }
    }

    fn driver(rotate: u16) -> (Ssd1322Driver<Recorder, DcPin, DcPin>, Recorder) {
        let rec = Recorder::default();
        let dc = DcPin(Arc::clone(&rec.0));
        (Ssd1322Driver::new(rec.clone(), dc, None, rotate).unwrap(), rec)
    }

    fn commands(rec: &Recorder) -> Vec<u8> {
        rec.0.lock().unwrap().wire.iter().filter_map(|w| match w {
            Wire::Cmd(c) => Some(*c),
            Wire::Data(_) => None,
        }).collect()
    }

    #[test]
    fn init_unlocks_first_and_switches_on_last() {
        let (mut d, rec) = driver(0);
        d.init().unwrap();
        let cmds = commands(&rec);
        assert_eq!(cmds.first(), Some(&0xFD));
        assert_eq!(cmds.last(), Some(&0xAF));
        let wire = rec.0.lock().unwrap().wire.clone();
        let remap = wire.iter().position(|w| *w == Wire::Cmd(0xA0)).unwrap();
        assert_eq!(wire[remap + 1], Wire::Data(vec![0x14, 0x11]));
    }

    #[test]
    fn rotation_changes_the_remap() {
        let (mut d, rec) = driver(180);
        d.init().unwrap();
        let wire = rec.0.lock().unwrap().wire.clone();
        let remap = wire.iter().position(|w| *w == Wire::Cmd(0xA0)).unwrap();
        assert_eq!(wire[remap + 1], Wire::Data(vec![0x06, 0x11]));
        assert!(Ssd1322Driver::<Recorder, DcPin, DcPin>::new(Recorder::default(), DcPin(Default::default()), None, 90).is_err());
    }

    #[test]
    fn flush_writes_a_window_then_grey_pixels() {
        let (mut d, rec) = driver(0);
        let mut frame = Canvas::new(256, 64, BinaryColor::Off);
        frame.draw_iter([Pixel(Point::new(0, 0), BinaryColor::On)]).unwrap();
        d.flush(&frame).unwrap();

        let wire = rec.0.lock().unwrap().wire.clone();
        assert_eq!(wire[0], Wire::Cmd(0x15));
        assert_eq!(wire[1], Wire::Data(vec![0x1C, 0x5B]));
        assert_eq!(wire[2], Wire::Cmd(0x75));
        assert_eq!(wire[3], Wire::Data(vec![0x00, 0x3F]));
        assert_eq!(wire[4], Wire::Cmd(0x5C));
        let pixels: Vec<u8> = wire[5..].iter().flat_map(|w| match w {
            Wire::Data(b) => b.clone(),
            Wire::Cmd(_) => Vec::new(),
        }).collect();
        assert_eq!(pixels.len(), 256 * 64 / 2);
        assert_eq!(pixels[0], 0xF0);
        assert!(pixels[1..].iter().all(|b| *b == 0));
    }

    #[test]
    fn flush_rejects_other_sizes() {
        let (mut d, _rec) = driver(0);
        let frame = Canvas::new(128, 64, BinaryColor::Off);
        assert!(d.flush(&frame).is_err());
    }
}
