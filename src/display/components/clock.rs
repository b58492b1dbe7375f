/*
 *  display/components/clock.rs
 *
 *  departure-board - live departures on a dot matrix
 *  (c) 2020-26 Stuart Hunter
 *
 *  Bottom-of-board clock
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

use arrayvec::ArrayString;
use chrono::{NaiveTime, Timelike};
use core::fmt::Write;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Circle, Line, PrimitiveStyle};

use crate::display::font::{draw_text, text_width, FontSet};

const ICON_DIAMETER: u32 = 11;
const ICON_GAP: u32 = 3;
/// seconds sit lower than the hours and minutes
const SECONDS_DROP: i32 = 4;

/// `HH:MM:SS` clock with a small dial icon, centred in its band.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClockFace {
    /// data source tag drawn before the time in debug mode
    source_tag: Option<String>,
}

impl ClockFace {
    pub fn new(source_tag: Option<String>) -> Self {
        Self { source_tag }
    }

    pub fn source_tag(&self) -> Option<&str> {
        self.source_tag.as_deref()
    }

    pub fn render<D>(&self, target: &mut D, width: u32, fonts: &FontSet, time: NaiveTime) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let mut hm = ArrayString::<8>::new();
        let mut ss = ArrayString::<4>::new();
        // both fit their capacity, write! cannot fail here
        let _ = write!(&mut hm, "{:02}:{:02}", time.hour(), time.minute());
        let _ = write!(&mut ss, ":{:02}", time.second());

        let tag = self.source_tag.as_deref().unwrap_or_default();
        let tag_w = text_width(fonts.clock_small, tag);
        let hm_w = text_width(fonts.clock_large, &hm);
        let ss_w = text_width(fonts.clock_small, &ss);
        let total = ICON_DIAMETER + ICON_GAP + tag_w + hm_w + ss_w;

        let mut x = (width as i32 - total as i32) / 2;
        draw_dial(target, Point::new(x, 1))?;
        x += (ICON_DIAMETER + ICON_GAP) as i32;

        if !tag.is_empty() {
            draw_text(target, tag, x, SECONDS_DROP, fonts.clock_small)?;
            x += tag_w as i32;
        }
        draw_text(target, &hm, x, 0, fonts.clock_large)?;
        x += hm_w as i32;
        draw_text(target, &ss, x, SECONDS_DROP, fonts.clock_small)
    }
}

// dial with hands at ten past twelve
fn draw_dial<D>(target: &mut D, top_left: Point) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let stroke = PrimitiveStyle::with_stroke(BinaryColor::On, 1);
    Circle::new(top_left, ICON_DIAMETER).into_styled(stroke).draw(target)?;
    let centre = top_left + Point::new(ICON_DIAMETER as i32 / 2, ICON_DIAMETER as i32 / 2);
    Line::new(centre, centre - Point::new(0, 4)).into_styled(stroke).draw(target)?;
    Line::new(centre, centre + Point::new(3, -1)).into_styled(stroke).draw(target)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vframebuf::Canvas;
    use embedded_graphics::primitives::Rectangle;

    fn lit_columns(canvas: &Canvas) -> (i32, i32) {
        let cols: Vec<i32> = (0..canvas.width() as i32)
            .filter(|&x| (0..canvas.height() as i32).any(|y| canvas.pixel(x, y) == Some(BinaryColor::On)))
            .collect();
        (*cols.first().unwrap(), *cols.last().unwrap())
    }

    #[test]
    fn clock_is_roughly_centred() {
        let fonts = FontSet::default();
        let mut canvas = Canvas::new(256, 14, BinaryColor::Off);
        let time = NaiveTime::from_hms_opt(12, 34, 56).unwrap();
        ClockFace::default().render(&mut canvas, 256, &fonts, time).unwrap();
        let (first, last) = lit_columns(&canvas);
        let left_margin = first;
        let right_margin = 255 - last;
        assert!((left_margin - right_margin).abs() <= 4, "{} vs {}", left_margin, right_margin);
    }

    #[test]
    fn source_tag_widens_the_clock() {
        let fonts = FontSet::default();
        let time = NaiveTime::from_hms_opt(8, 5, 0).unwrap();
        let mut plain = Canvas::new(256, 14, BinaryColor::Off);
        let mut tagged = Canvas::new(256, 14, BinaryColor::Off);
        ClockFace::default().render(&mut plain, 256, &fonts, time).unwrap();
        ClockFace::new(Some("RTT: ".into())).render(&mut tagged, 256, &fonts, time).unwrap();
        let (p0, p1) = lit_columns(&plain);
        let (t0, t1) = lit_columns(&tagged);
        assert!(t1 - t0 > p1 - p0);
    }

    #[test]
    fn stays_inside_its_band() {
        let fonts = FontSet::default();
        let mut canvas = Canvas::new(256, 20, BinaryColor::Off);
        let time = NaiveTime::from_hms_opt(23, 59, 59).unwrap();
        ClockFace::default().render(&mut canvas, 256, &fonts, time).unwrap();
        let below = Rectangle::new(Point::new(0, 14), Size::new(256, 6));
        assert_eq!(canvas.count_on_in(&below), 0);
    }
}
