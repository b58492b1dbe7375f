/*
 *  display/components/signage.rs
 *
 *  departure-board - live departures on a dot matrix
 *  (c) 2020-26 Stuart Hunter
 *
 *  Fixed board text: calling-at label, welcome lines, dots
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

use crate::constants::{CALLING_AT_TEXT, DOTS_TEXT};
use crate::display::font::{draw_text, draw_text_centered};

pub fn render_calling_at<D>(target: &mut D, font: &'static MonoFont<'static>) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    draw_text(target, CALLING_AT_TEXT, 0, 0, font)
}

/// A centred line of the blank board.
pub fn render_welcome<D>(
    target: &mut D,
    text: &str,
    width: u32,
    font: &'static MonoFont<'static>,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    draw_text_centered(target, text, width, font)
}

pub fn render_dots<D>(target: &mut D, width: u32, font: &'static MonoFont<'static>) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    draw_text_centered(target, DOTS_TEXT, width, font)
}
