/*
 *  display/components/departure.rs
 *
 *  departure-board - live departures on a dot matrix
 *  (c) 2020-26 Stuart Hunter
 *
 *  Departure row cells: destination, status and platform
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

use embedded_graphics::mono_font::MonoFont;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;

use crate::departures::Departure;
use crate::display::font::{draw_text, draw_text_right};

/// `"HH:MM  Destination"` from the left edge.
pub fn render_destination<D>(
    target: &mut D,
    departure: &Departure,
    show_headcode: bool,
    font: &'static MonoFont<'static>,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    draw_text(target, &departure.destination_text(show_headcode), 0, 0, font)
}

/// Status, right aligned.
pub fn render_status<D>(
    target: &mut D,
    departure: &Departure,
    width: u32,
    font: &'static MonoFont<'static>,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    draw_text_right(target, &departure.status().to_string(), width, font)
}

/// Platform or `BUS`; an unknown platform leaves the cell blank.
pub fn render_platform<D>(
    target: &mut D,
    departure: &Departure,
    font: &'static MonoFont<'static>,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    match departure.platform_text() {
        Some(text) => draw_text(target, &text, 0, 0, font),
        None => Ok(()),
    }
}
