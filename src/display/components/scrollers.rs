/*
 *  display/components/scrollers.rs
 *
 *  departure-board - live departures on a dot matrix
 *  (c) 2020-26 Stuart Hunter
 *
 *  Calling-points marquee: pause, scroll, wrap
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

use crate::constants::{MARQUEE_GUARD_BAND, MARQUEE_PAUSE_TICKS};
use crate::display::font::{draw_text, text_width};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollPhase {
    /// Holding the start of the text on screen.
    Paused { remaining: u32 },
    /// Drawing from the `offset`th character.
    Scrolling { offset: usize },
}

/// Scroll state for one line of text, measured in characters.
///
/// Every cycle holds offset 0 for [`MARQUEE_PAUSE_TICKS`] ticks, then
/// steps one character per tick until the last [`MARQUEE_GUARD_BAND`]
/// characters would lead, then pauses again from the start.
#[derive(Debug, Clone, PartialEq)]
pub struct MarqueeState {
    text: String,
    char_count: usize,
    phase: ScrollPhase,
}

impl MarqueeState {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            char_count: text.chars().count(),
            text,
            phase: ScrollPhase::Paused { remaining: MARQUEE_PAUSE_TICKS },
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn phase(&self) -> ScrollPhase {
        self.phase
    }

    pub fn offset(&self) -> usize {
        match self.phase {
            ScrollPhase::Paused { .. } => 0,
            ScrollPhase::Scrolling { offset } => offset,
        }
    }

    /// The text as drawn this tick.
    pub fn visible_text(&self) -> &str {
        let offset = self.offset();
        match self.text.char_indices().nth(offset) {
            Some((i, _)) => &self.text[i..],
            None => "",
        }
    }

    /// Step to the next tick's state.
    pub fn advance(&mut self) {
        self.phase = match self.phase {
            ScrollPhase::Paused { remaining } if remaining > 1 => {
                ScrollPhase::Paused { remaining: remaining - 1 }
            }
            ScrollPhase::Paused { .. } => self.scroll_to(1),
            ScrollPhase::Scrolling { offset } => self.scroll_to(offset + 1),
        };
    }

    fn scroll_to(&self, offset: usize) -> ScrollPhase {
        if offset >= self.char_count.saturating_sub(MARQUEE_GUARD_BAND) {
            ScrollPhase::Paused { remaining: MARQUEE_PAUSE_TICKS }
        } else {
            ScrollPhase::Scrolling { offset }
        }
    }

    /// Draw this tick's text into a `width` wide region, then advance.
    /// Text that already fits is drawn still and never scrolls.
    pub fn render<D>(&mut self, target: &mut D, width: u32, font: &'static MonoFont<'static>) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        draw_text(target, self.visible_text(), 0, 0, font)?;
        if text_width(font, &self.text) > width {
            self.advance();
        }
        Ok(())
    }
}
