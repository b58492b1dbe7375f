/*
 *  constants.rs
 *
 *  departure-board - live departures on a dot matrix
 *	(c) 2020-26 Stuart Hunter
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */

use std::time::Duration;

/// The width of the SSD1322 panel in pixels.
pub const DISPLAY_WIDTH: u32 = 256;
/// The height of the SSD1322 panel in pixels.
pub const DISPLAY_HEIGHT: u32 = 64;

/// Height of every text band (departure rows, calling at, welcome lines).
pub const ROW_HEIGHT: u32 = 10;
/// Vertical distance between the top of consecutive bands.
pub const ROW_PITCH: i32 = 12;
/// Height of the clock band along the bottom of the panel.
pub const CLOCK_HEIGHT: u32 = 14;

/// Maximum number of departure rows shown at once.
pub const MAX_DEPARTURE_ROWS: usize = 3;
/// Gap kept between the first destination and its platform column.
pub const DESTINATION_GAP: u32 = 5;

/// Widest status text, used to size the status column.
pub const STATUS_SAMPLE: &str = "Exp 00:00";
/// Widest platform text, used to size the platform column.
pub const PLATFORM_SAMPLE: &str = "Plat 88";
pub const CALLING_AT_TEXT: &str = "Calling at:";
pub const WELCOME_TEXT: &str = "Welcome to";
pub const DOTS_TEXT: &str = ".  .  .";

// Redraw cadence per hotspot
pub const STATIC_TEXT_INTERVAL: Duration = Duration::from_secs(10);
pub const STATUS_INTERVAL: Duration = Duration::from_secs(1);
pub const CALLING_AT_INTERVAL: Duration = Duration::from_secs(100);
pub const MARQUEE_INTERVAL: Duration = Duration::from_millis(10);
pub const ACTIVE_CLOCK_INTERVAL: Duration = Duration::from_millis(100);
pub const BLANK_CLOCK_INTERVAL: Duration = Duration::from_secs(1);

/// Ticks the marquee holds at the start of the text before scrolling.
pub const MARQUEE_PAUSE_TICKS: u32 = 8;
/// Characters at the tail of the marquee text that are never scrolled to.
pub const MARQUEE_GUARD_BAND: usize = 5;

pub const DEFAULT_TARGET_FPS: u32 = 10;
pub const DEFAULT_REFRESH_SECS: u64 = 120;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
