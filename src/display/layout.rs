/*
 *  display/layout.rs
 *
 *  departure-board - live departures on a dot matrix
 *  (c) 2020-26 Stuart Hunter
 *
 *  Hotspot layouts for the blank and active boards
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

use std::time::Duration;

use embedded_graphics::prelude::*;

use crate::constants::*;
use crate::departures::{calling_at_text, BoardSnapshot, Departure};
use crate::display::components::{ClockFace, MarqueeState};
use crate::display::font::text_width;
use crate::display::hotspot::{Hotspot, HotspotKind};
use crate::display::viewport::Viewport;

/// Presentation switches that do not change with the data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardSettings {
    pub show_headcode: bool,
    pub show_operator: bool,
    /// drawn before the clock when set
    pub source_tag: Option<String>,
}

fn band(width: u32) -> Size {
    Size::new(width, ROW_HEIGHT)
}

fn add_clock(vp: &mut Viewport, settings: &BoardSettings, interval: Duration) {
    let y = vp.height().saturating_sub(CLOCK_HEIGHT) as i32;
    let size = Size::new(vp.width(), CLOCK_HEIGHT);
    let face = ClockFace::new(settings.source_tag.clone());
    vp.add_hotspot(Hotspot::new("clock", size, interval, HotspotKind::Clock(face)), Point::new(0, y));
}

/// "Welcome to / <label> / dots" with a slow clock.
pub fn compose_blank(vp: &mut Viewport, label: &str, settings: &BoardSettings) {
    vp.clear_all();
    let w = vp.width();

    vp.add_hotspot(
        Hotspot::new("welcome", band(w), STATIC_TEXT_INTERVAL, HotspotKind::WelcomeText(WELCOME_TEXT.to_string())),
        Point::new(0, 0),
    );
    vp.add_hotspot(
        Hotspot::new("station", band(w), STATIC_TEXT_INTERVAL, HotspotKind::WelcomeText(label.to_string())),
        Point::new(0, ROW_PITCH),
    );
    vp.add_hotspot(
        Hotspot::new("dots", band(w), STATIC_TEXT_INTERVAL, HotspotKind::Dots),
        Point::new(0, ROW_PITCH * 2),
    );
    add_clock(vp, settings, BLANK_CLOCK_INTERVAL);
}

/// Up to three departure rows, the calling points marquee under the
/// first, and a fast clock. Returns the number of departure rows laid out.
pub fn compose_active(vp: &mut Viewport, snapshot: &BoardSnapshot, settings: &BoardSettings) -> usize {
    vp.clear_all();
    let Some(first) = snapshot.departures.first() else {
        return 0;
    };

    let width = vp.width();
    let regular = vp.fonts().regular;
    let status_w = text_width(regular, STATUS_SAMPLE);
    let platform_w = text_width(regular, PLATFORM_SAMPLE);
    let calling_w = text_width(regular, CALLING_AT_TEXT);

    // first row, in bold and a little narrower to keep clear of the platform
    let dest_w = width.saturating_sub(status_w + platform_w + DESTINATION_GAP);
    add_row(vp, 1, first, 0, dest_w, true, settings);

    vp.add_hotspot(
        Hotspot::new("calling_at", band(calling_w), CALLING_AT_INTERVAL, HotspotKind::CallingAt),
        Point::new(0, ROW_PITCH),
    );
    let stops = calling_at_text(&snapshot.calling_points, first.operator.as_deref(), settings.show_operator);
    vp.add_hotspot(
        Hotspot::new(
            "marquee",
            band(width.saturating_sub(calling_w)),
            MARQUEE_INTERVAL,
            HotspotKind::Marquee(MarqueeState::new(stops)),
        ),
        Point::new(calling_w as i32, ROW_PITCH),
    );

    let rows = snapshot.departures.len().min(MAX_DEPARTURE_ROWS);
    let dest_w = width.saturating_sub(status_w + platform_w);
    for (i, departure) in snapshot.departures.iter().enumerate().take(rows).skip(1) {
        let y = ROW_PITCH * (i as i32 + 1);
        add_row(vp, i + 1, departure, y, dest_w, false, settings);
    }

    add_clock(vp, settings, ACTIVE_CLOCK_INTERVAL);
    rows
}

fn add_row(
    vp: &mut Viewport,
    row: usize,
    departure: &Departure,
    y: i32,
    dest_w: u32,
    bold: bool,
    settings: &BoardSettings,
) {
    let width = vp.width();
    let regular = vp.fonts().regular;
    let status_w = text_width(regular, STATUS_SAMPLE);
    let platform_w = text_width(regular, PLATFORM_SAMPLE);

    vp.add_hotspot(
        Hotspot::new(
            format!("row{}.destination", row),
            band(dest_w),
            STATIC_TEXT_INTERVAL,
            HotspotKind::Destination { departure: departure.clone(), bold, show_headcode: settings.show_headcode },
        ),
        Point::new(0, y),
    );
    vp.add_hotspot(
        Hotspot::new(format!("row{}.status", row), band(status_w), STATUS_INTERVAL, HotspotKind::ServiceStatus(departure.clone())),
        Point::new(width.saturating_sub(status_w) as i32, y),
    );
    vp.add_hotspot(
        Hotspot::new(format!("row{}.platform", row), band(platform_w), STATIC_TEXT_INTERVAL, HotspotKind::Platform(departure.clone())),
        Point::new(width.saturating_sub(status_w + platform_w) as i32, y),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::departures::ServiceMode;
    use crate::display::drivers::headless::HeadlessDriver;
    use crate::display::font::FontSet;
    use chrono::NaiveTime;
    use embedded_graphics::primitives::Rectangle;

    fn viewport() -> Viewport {
        Viewport::new(Box::new(HeadlessDriver::new(256, 64)), FontSet::default())
    }

    fn departures(n: usize) -> Vec<Departure> {
        (0..n)
            .map(|i| Departure {
                scheduled: NaiveTime::from_hms_opt(9, 5 * i as u32, 0).unwrap(),
                expected: None,
                cancelled: false,
                destination: format!("Stop {}", i),
                platform: Some("1".into()),
                mode: ServiceMode::Train,
                headcode: None,
                operator: None,
                service_id: String::new(),
            })
            .collect()
    }

    fn snapshot(n: usize) -> BoardSnapshot {
        BoardSnapshot {
            station_name: "Leeds".into(),
            departures: departures(n),
            calling_points: vec!["York".into()],
        }
    }

    fn regions(vp: &Viewport) -> Vec<Rectangle> {
        vp.hotspots().map(|(h, p)| Rectangle::new(p, h.size())).collect()
    }

    #[test]
    fn blank_board_has_four_bands() {
        let mut vp = viewport();
        compose_blank(&mut vp, "LDS", &BoardSettings::default());
        let keys: Vec<&str> = vp.hotspots().map(|(h, _)| h.key()).collect();
        assert_eq!(keys, vec!["welcome", "station", "dots", "clock"]);
        let (clock, pos) = vp.hotspots().last().unwrap();
        assert_eq!(pos, Point::new(0, 50));
        assert_eq!(clock.interval(), BLANK_CLOCK_INTERVAL);
    }

    #[test]
    fn rows_follow_the_departure_count() {
        for (n, rows) in [(1, 1), (2, 2), (3, 3), (7, 3)] {
            let mut vp = viewport();
            assert_eq!(compose_active(&mut vp, &snapshot(n), &BoardSettings::default()), rows);
            // three cells per row plus calling at, marquee and clock
            assert_eq!(vp.len(), rows * 3 + 3);
        }
    }

    #[test]
    fn regions_never_overlap_or_leave_the_panel() {
        let mut vp = viewport();
        compose_active(&mut vp, &snapshot(3), &BoardSettings::default());
        let panel = Rectangle::new(Point::zero(), Size::new(256, 64));
        let all = regions(&vp);
        for (i, a) in all.iter().enumerate() {
            assert_eq!(a.intersection(&panel), *a, "{:?} leaves the panel", a);
            for b in &all[i + 1..] {
                assert!(a.intersection(b).is_zero_sized(), "{:?} overlaps {:?}", a, b);
            }
        }
    }

    #[test]
    fn marquee_sits_right_of_calling_at() {
        let mut vp = viewport();
        compose_active(&mut vp, &snapshot(1), &BoardSettings::default());
        let marquee = vp.hotspot("marquee").unwrap();
        let HotspotKind::Marquee(state) = marquee.kind() else { panic!("not a marquee") };
        assert_eq!(state.text(), "York only.");
        let calling = vp.hotspot("calling_at").unwrap();
        assert_eq!(calling.size().width + marquee.size().width, 256);
    }

    #[test]
    fn empty_snapshot_lays_out_nothing() {
        let mut vp = viewport();
        assert_eq!(compose_active(&mut vp, &snapshot(0), &BoardSettings::default()), 0);
        assert!(vp.is_empty());
    }
}
