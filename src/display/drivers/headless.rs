/*
 *  display/drivers/headless.rs
 *
 *  departure-board - live departures on a dot matrix
 *  (c) 2020-26 Stuart Hunter
 *
 *  Headless display driver: no hardware, frames kept for inspection
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

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use log::info;

use crate::config::DisplayConfig;
use crate::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use crate::display::error::DisplayError;
use crate::display::traits::{check_frame, DisplayCapabilities, DisplayDriver};
use crate::vframebuf::Canvas;

/// Display driver without hardware
///
/// Useful for:
/// - Unit and integration tests
/// - Running the board on a desktop, optionally dumping frames as PBM
///
/// Clones share state, so a test can keep one handle while the viewport
/// owns the other.
#[derive(Debug, Clone)]
pub struct HeadlessDriver {
    capabilities: DisplayCapabilities,
    state: Arc<Mutex<HeadlessState>>,
    snapshot_path: Option<PathBuf>,
}

/// Internal state (shared for inspection in tests)
#[derive(Debug, Default)]
pub struct HeadlessState {
    /// Number of times init() was called
    pub init_count: usize,

    /// Number of times flush() was called
    pub flush_count: usize,

    /// Number of times clear() was called
    pub clear_count: usize,

    /// Last brightness value set
    pub last_brightness: Option<u8>,

    /// Whether the driver is initialized
    pub is_initialized: bool,

    /// Simulate failures (for error testing)
    pub simulate_flush_failure: bool,

    /// Most recent frame flushed
    pub last_frame: Option<Canvas>,
}

impl HeadlessDriver {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            capabilities: DisplayCapabilities {
                width,
                height,
                max_fps: 60,
                supports_brightness: true,
            },
            state: Arc::new(Mutex::new(HeadlessState::default())),
            snapshot_path: None,
        }
    }

    pub fn from_config(config: &DisplayConfig) -> Self {
        let mut driver = Self::new(
            config.width.unwrap_or(DISPLAY_WIDTH),
            config.height.unwrap_or(DISPLAY_HEIGHT),
        );
        driver.snapshot_path = config.snapshot_path.clone();
        driver
    }

    /// Write every flushed frame to `path`.
    pub fn with_snapshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    /// Get reference to state for inspection in tests
    pub fn state(&self) -> Arc<Mutex<HeadlessState>> {
        Arc::clone(&self.state)
    }

    pub fn last_frame(&self) -> Option<Canvas> {
        self.lock().last_frame.clone()
    }

    // a panicked holder cannot leave the counters inconsistent
    fn lock(&self) -> MutexGuard<'_, HeadlessState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Save a frame as a plain PBM (P1) file
pub fn save_pbm(frame: &Canvas, path: &Path) -> std::io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);

    // PBM header
    writeln!(out, "P1")?;
    writeln!(out, "{} {}", frame.width(), frame.height())?;

    // Pixel data
    for row in frame.as_slice().chunks(frame.width().max(1)) {
        let line: Vec<&str> = row.iter().map(|p| if p.is_on() { "1" } else { "0" }).collect();
        writeln!(out, "{}", line.join(" "))?;
    }
    out.flush()
}

impl DisplayDriver for HeadlessDriver {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        let mut state = self.lock();
        state.init_count += 1;
        state.is_initialized = true;
        if let Some(path) = self.snapshot_path.as_ref() {
            info!("headless display writing frames to {}", path.display());
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        let mut state = self.lock();
        state.clear_count += 1;
        state.last_frame = None;
        Ok(())
    }

    fn flush(&mut self, frame: &Canvas) -> Result<(), DisplayError> {
        check_frame(&self.capabilities, frame)?;
        {
            let mut state = self.lock();
            if state.simulate_flush_failure {
                return Err(DisplayError::Other("Simulated flush failure".to_string()));
            }
            state.flush_count += 1;
            state.last_frame = Some(frame.clone());
        } // Release lock before touching the filesystem

        if let Some(path) = self.snapshot_path.as_ref() {
            save_pbm(frame, path)?;
        }
        Ok(())
    }

    fn set_brightness(&mut self, value: u8) -> Result<(), DisplayError> {
        self.lock().last_brightness = Some(value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::pixelcolor::BinaryColor;
    use embedded_graphics::prelude::*;
    use embedded_graphics::primitives::{Line, PrimitiveStyle};

    #[test]
    fn init_and_brightness_are_recorded() {
        let mut driver = HeadlessDriver::new(256, 64);
        let state = driver.state();
        assert!(!state.lock().unwrap().is_initialized);

        driver.init().unwrap();
        driver.set_brightness(200).unwrap();

        let s = state.lock().unwrap();
        assert_eq!(s.init_count, 1);
        assert!(s.is_initialized);
        assert_eq!(s.last_brightness, Some(200));
    }

    #[test]
    fn flush_keeps_the_frame() {
        let mut driver = HeadlessDriver::new(32, 8);
        let mut frame = Canvas::new(32, 8, BinaryColor::Off);
        Line::new(Point::new(0, 0), Point::new(7, 7))
            .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
            .draw(&mut frame)
            .unwrap();

        driver.flush(&frame).unwrap();
        assert_eq!(driver.last_frame().unwrap().count_on(), 8);
        assert_eq!(driver.state().lock().unwrap().flush_count, 1);

        DisplayDriver::clear(&mut driver).unwrap();
        assert!(driver.last_frame().is_none());
    }

    #[test]
    fn wrong_sized_frame_is_rejected() {
        let mut driver = HeadlessDriver::new(32, 8);
        let frame = Canvas::new(16, 8, BinaryColor::Off);
        assert!(matches!(
            driver.flush(&frame),
            Err(DisplayError::BufferSizeMismatch { expected: 256, actual: 128 })
        ));
    }

    #[test]
    fn simulated_failure() {
        let mut driver = HeadlessDriver::new(32, 8);
        let frame = Canvas::new(32, 8, BinaryColor::Off);
        driver.state().lock().unwrap().simulate_flush_failure = true;
        assert!(driver.flush(&frame).is_err());
        driver.state().lock().unwrap().simulate_flush_failure = false;
        assert!(driver.flush(&frame).is_ok());
    }

    #[test]
    fn snapshot_is_plain_pbm() {
        let path = std::env::temp_dir().join(format!("departure-board-{}.pbm", std::process::id()));
        let mut driver = HeadlessDriver::new(4, 2).with_snapshot(&path);
        let mut frame = Canvas::new(4, 2, BinaryColor::Off);
        frame.draw_iter([Pixel(Point::new(1, 0), BinaryColor::On)]).unwrap();
        driver.flush(&frame).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(text, "P1\n4 2\n0 1 0 0\n0 0 0 0\n");
    }
}
