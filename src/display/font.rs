/*
 *  display/font.rs
 *
 *  departure-board - live departures on a dot matrix
 *  (c) 2020-26 Stuart Hunter
 *
 *  Board fonts, text measurement and aligned text helpers
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

use std::fmt;

use embedded_graphics::{
    mono_font::{
        ascii::{FONT_5X8, FONT_6X10, FONT_8X13_BOLD},
        MonoFont, MonoTextStyle, MonoTextStyleBuilder,
    },
    pixelcolor::BinaryColor,
    prelude::*,
    text::{renderer::TextRenderer, Baseline, Text},
};

/// The fonts the board draws with.
#[derive(Clone, Copy)]
pub struct FontSet {
    /// status, platform, calling points
    pub regular: &'static MonoFont<'static>,
    /// first destination and the welcome screen
    pub bold: &'static MonoFont<'static>,
    pub clock_large: &'static MonoFont<'static>,
    pub clock_small: &'static MonoFont<'static>,
}

impl Default for FontSet {
    fn default() -> Self {
        Self {
            regular: &FONT_5X8,
            bold: &FONT_6X10,
            clock_large: &FONT_8X13_BOLD,
            clock_small: &FONT_6X10,
        }
    }
}

// MonoFont has no Debug
impl fmt::Debug for FontSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontSet")
            .field("regular", &self.regular.character_size)
            .field("bold", &self.bold.character_size)
            .field("clock_large", &self.clock_large.character_size)
            .field("clock_small", &self.clock_small.character_size)
            .finish()
    }
}

fn style(font: &'static MonoFont<'static>) -> MonoTextStyle<'static, BinaryColor> {
    MonoTextStyleBuilder::new().font(font).text_color(BinaryColor::On).build()
}

/// Width of `text` in pixels when drawn in `font`.
pub fn text_width(font: &'static MonoFont<'static>, text: &str) -> u32 {
    style(font)
        .measure_string(text, Point::zero(), Baseline::Top)
        .bounding_box
        .size
        .width
}

/// Draw `text` with its top left at (x, y).
pub fn draw_text<D>(
    target: &mut D,
    text: &str,
    x: i32,
    y: i32,
    font: &'static MonoFont<'static>,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    Text::with_baseline(text, Point::new(x, y), style(font), Baseline::Top).draw(target)?;
    Ok(())
}

/// Draw `text` flush against the right edge of a `width` wide region.
pub fn draw_text_right<D>(
    target: &mut D,
    text: &str,
    width: u32,
    font: &'static MonoFont<'static>,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let x = width as i32 - text_width(font, text) as i32;
    draw_text(target, text, x, 0, font)
}

/// Draw `text` horizontally centred in a `width` wide region.
pub fn draw_text_centered<D>(
    target: &mut D,
    text: &str,
    width: u32,
    font: &'static MonoFont<'static>,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let x = (width as i32 - text_width(font, text) as i32) / 2;
    draw_text(target, text, x, 0, font)
}
