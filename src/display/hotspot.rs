/*
 *  display/hotspot.rs
 *
 *  departure-board - live departures on a dot matrix
 *  (c) 2020-26 Stuart Hunter
 *
 *  Independently timed redraw regions
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

use std::fmt::Debug;
use std::time::{Duration, Instant};

use chrono::Local;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;

use crate::departures::Departure;
use crate::display::components::departure::{render_destination, render_platform, render_status};
use crate::display::components::signage::{render_calling_at, render_dots, render_welcome};
use crate::display::components::{ClockFace, MarqueeState};
use crate::display::error::RenderError;
use crate::display::font::FontSet;

/// What a hotspot draws, carrying only the data it needs.
#[derive(Debug, Clone, PartialEq)]
pub enum HotspotKind {
    Clock(ClockFace),
    Destination { departure: Departure, bold: bool, show_headcode: bool },
    ServiceStatus(Departure),
    Platform(Departure),
    CallingAt,
    Marquee(MarqueeState),
    WelcomeText(String),
    Dots,
}

/// A named region with its own redraw interval.
#[derive(Debug, Clone)]
pub struct Hotspot {
    key: String,
    size: Size,
    interval: Duration,
    last_painted: Option<Instant>,
    kind: HotspotKind,
}

impl Hotspot {
    pub fn new(key: impl Into<String>, size: Size, interval: Duration, kind: HotspotKind) -> Self {
        Self { key: key.into(), size, interval, last_painted: None, kind }
    }

    pub fn key(&self) -> &str { &self.key }
    pub fn size(&self) -> Size { self.size }
    pub fn interval(&self) -> Duration { self.interval }
    pub fn kind(&self) -> &HotspotKind { &self.kind }
    pub fn last_painted(&self) -> Option<Instant> { self.last_painted }

    /// Never painted, or at least `interval` since the last paint.
    pub fn due(&self, now: Instant) -> bool {
        match self.last_painted {
            None => true,
            Some(t) => now.saturating_duration_since(t) >= self.interval,
        }
    }

    /// Paint into a blank target sized to this region.
    ///
    /// The paint counts as done even when drawing fails, so a broken
    /// hotspot is retried on its own cadence and not every frame.
    pub fn paint<D>(&mut self, target: &mut D, fonts: &FontSet, now: Instant) -> Result<(), RenderError>
    where
        D: DrawTarget<Color = BinaryColor>,
        D::Error: Debug,
    {
        self.last_painted = Some(now);
        let width = self.size.width;
        let drawn = match &mut self.kind {
            HotspotKind::Clock(face) => face.render(target, width, fonts, Local::now().time()),
            HotspotKind::Destination { departure, bold, show_headcode } => {
                let font = if *bold { fonts.bold } else { fonts.regular };
                render_destination(target, departure, *show_headcode, font)
            }
            HotspotKind::ServiceStatus(departure) => render_status(target, departure, width, fonts.regular),
            HotspotKind::Platform(departure) => render_platform(target, departure, fonts.regular),
            HotspotKind::CallingAt => render_calling_at(target, fonts.regular),
            HotspotKind::Marquee(state) => state.render(target, width, fonts.regular),
            HotspotKind::WelcomeText(text) => render_welcome(target, text, width, fonts.bold),
            HotspotKind::Dots => render_dots(target, width, fonts.bold),
        };
        drawn.map_err(|e| RenderError::Draw(format!("{}: {:?}", self.key, e)))
    }
}
