/*
 *  display/viewport.rs
 *
 *  departure-board - live departures on a dot matrix
 *  (c) 2020-26 Stuart Hunter
 *
 *  Hotspot compositor: owns the canvas and the device
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

use std::time::Instant;

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::{debug, warn};

use crate::display::error::{DisplayError, RenderError};
use crate::display::factory::BoxedDriver;
use crate::display::font::FontSet;
use crate::display::hotspot::Hotspot;
use crate::vframebuf::Canvas;

/// Composites due hotspots into one canvas and flushes it whole.
pub struct Viewport {
    canvas: Canvas,
    driver: BoxedDriver,
    fonts: FontSet,
    hotspots: Vec<(Hotspot, Point)>,
}

impl Viewport {
    /// Canvas sized to the driver's panel.
    pub fn new(driver: BoxedDriver, fonts: FontSet) -> Self {
        let (w, h) = driver.dimensions();
        Self {
            canvas: Canvas::new(w, h, BinaryColor::Off),
            driver,
            fonts,
            hotspots: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 { self.canvas.width() as u32 }
    pub fn height(&self) -> u32 { self.canvas.height() as u32 }
    pub fn fonts(&self) -> &FontSet { &self.fonts }
    pub fn canvas(&self) -> &Canvas { &self.canvas }

    pub fn add_hotspot(&mut self, hotspot: Hotspot, position: Point) {
        debug!("hotspot {} {}x{} at {}", hotspot.key(), hotspot.size().width, hotspot.size().height, position);
        self.hotspots.push((hotspot, position));
    }

    /// Drop every hotspot and blank the canvas ready for a new layout.
    pub fn clear_all(&mut self) {
        self.hotspots.clear();
        self.canvas.clear_color(BinaryColor::Off);
    }

    pub fn hotspots(&self) -> impl Iterator<Item = (&Hotspot, Point)> {
        self.hotspots.iter().map(|(h, p)| (h, *p))
    }

    pub fn hotspot(&self, key: &str) -> Option<&Hotspot> {
        self.hotspots.iter().map(|(h, _)| h).find(|h| h.key() == key)
    }

    pub fn len(&self) -> usize {
        self.hotspots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hotspots.is_empty()
    }

    /// Repaint every due hotspot in registration order, then flush the
    /// full canvas. Returns how many hotspots painted cleanly.
    ///
    /// A hotspot that fails to paint is logged and keeps its previous
    /// pixels; the rest of the frame still goes out.
    pub fn refresh(&mut self, now: Instant) -> Result<usize, DisplayError> {
        let mut painted = 0;
        let fonts = &self.fonts;
        for (hotspot, position) in self.hotspots.iter_mut() {
            if !hotspot.due(now) {
                continue;
            }
            let area = Rectangle::new(*position, hotspot.size());
            match repaint(&mut self.canvas, area, |region| hotspot.paint(region, fonts, now)) {
                Ok(()) => painted += 1,
                Err(e) => warn!("skipping hotspot update: {}", e),
            }
        }
        self.driver.flush(&self.canvas)?;
        Ok(painted)
    }

    /// Blank the device itself, used on shutdown.
    pub fn clear_device(&mut self) -> Result<(), DisplayError> {
        self.canvas.clear_color(BinaryColor::Off);
        self.driver.clear()
    }
}

/// Paint into a blank scratch region and copy it over `area` only when
/// the paint succeeds.
fn repaint<F>(canvas: &mut Canvas, area: Rectangle, paint: F) -> Result<(), RenderError>
where
    F: FnOnce(&mut Canvas) -> Result<(), RenderError>,
{
    let mut scratch = Canvas::new(area.size.width, area.size.height, BinaryColor::Off);
    paint(&mut scratch)?;
    canvas.blit(&scratch, area.top_left);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::drivers::headless::HeadlessDriver;
    use crate::display::hotspot::HotspotKind;
    use std::time::Duration;

    fn viewport() -> (Viewport, HeadlessDriver) {
        let driver = HeadlessDriver::new(128, 32);
        let probe = driver.clone();
        (Viewport::new(Box::new(driver), FontSet::default()), probe)
    }

    fn welcome(key: &str, interval_ms: u64) -> Hotspot {
        Hotspot::new(key, Size::new(128, 10), Duration::from_millis(interval_ms), HotspotKind::WelcomeText("Leeds".into()))
    }

    #[test]
    fn only_due_hotspots_paint() {
        let (mut vp, probe) = viewport();
        vp.add_hotspot(welcome("fast", 100), Point::new(0, 0));
        vp.add_hotspot(welcome("slow", 10_000), Point::new(0, 12));
        let t0 = Instant::now();

        assert_eq!(vp.refresh(t0).unwrap(), 2);
        assert_eq!(vp.refresh(t0 + Duration::from_millis(50)).unwrap(), 0);
        assert_eq!(vp.refresh(t0 + Duration::from_millis(100)).unwrap(), 1);
        assert_eq!(vp.hotspot("slow").unwrap().last_painted(), Some(t0));
        // every refresh flushes
        assert_eq!(probe.state().lock().unwrap().flush_count, 3);
    }

    #[test]
    fn painting_stays_inside_the_region() {
        let (mut vp, probe) = viewport();
        vp.add_hotspot(welcome("row", 100), Point::new(0, 12));
        vp.refresh(Instant::now()).unwrap();
        let frame = probe.last_frame().unwrap();
        let above = Rectangle::new(Point::zero(), Size::new(128, 12));
        let below = Rectangle::new(Point::new(0, 22), Size::new(128, 10));
        assert_eq!(frame.count_on_in(&above), 0);
        assert_eq!(frame.count_on_in(&below), 0);
        assert!(frame.count_on() > 0);
    }

    #[test]
    fn clear_all_forgets_hotspots_and_pixels() {
        let (mut vp, _probe) = viewport();
        vp.add_hotspot(welcome("row", 100), Point::new(0, 0));
        vp.refresh(Instant::now()).unwrap();
        assert!(vp.canvas().count_on() > 0);
        vp.clear_all();
        assert!(vp.is_empty());
        assert_eq!(vp.canvas().count_on(), 0);
    }

    #[test]
    fn failed_paint_keeps_the_previous_pixels() {
        let mut canvas = Canvas::new(32, 16, BinaryColor::Off);
        let area = Rectangle::new(Point::new(4, 4), Size::new(8, 8));
        repaint(&mut canvas, area, |region| {
            let _ = region.clear(BinaryColor::On);
            Ok(())
        })
        .unwrap();
        assert_eq!(canvas.count_on_in(&area), 64);

        let err = repaint(&mut canvas, area, |region| {
            let _ = region.clear(BinaryColor::Off);
            Err(RenderError::Draw("row1.status: bus fault".into()))
        });
        assert!(err.is_err());
        assert_eq!(canvas.count_on_in(&area), 64);
        assert_eq!(canvas.count_on(), 64);
    }

    #[test]
    fn flush_failure_surfaces() {
        let (mut vp, probe) = viewport();
        probe.state().lock().unwrap().simulate_flush_failure = true;
        assert!(vp.refresh(Instant::now()).is_err());
    }

    #[test]
    fn clear_device_blanks_the_panel() {
        let (mut vp, probe) = viewport();
        vp.clear_device().unwrap();
        assert_eq!(probe.state().lock().unwrap().clear_count, 1);
    }
}
