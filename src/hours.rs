/*
 *  hours.rs
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

use std::fmt;
use std::str::FromStr;

/// Daily window, in whole hours, during which departures are fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatingHours {
    start: u32,
    end: u32,
}

impl OperatingHours {
    pub fn new(start: u32, end: u32) -> Result<Self, String> {
        if start > 24 || end > 24 {
            return Err(format!("hours must be within 0-24, got {}-{}", start, end));
        }
        Ok(Self { start, end })
    }

    /// A window that never closes.
    pub fn always() -> Self {
        Self { start: 0, end: 24 }
    }

    pub fn start(&self) -> u32 { self.start }
    pub fn end(&self) -> u32 { self.end }

    pub fn contains(&self, hour: u32) -> bool {
        is_within_operating_hours(self.start, self.end, hour)
    }
}

impl Default for OperatingHours {
    fn default() -> Self {
        Self::always()
    }
}

impl fmt::Display for OperatingHours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Parses the `"8-22"` form.
impl FromStr for OperatingHours {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| format!("expected <start>-<end>, got '{}'", s))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<u32>()
                .map_err(|_| format!("'{}' is not an hour", v.trim()))
        };
        Self::new(parse(start)?, parse(end)?)
    }
}

/// True when `hour` falls in `[start, end)`. A window with `start > end`
/// runs past midnight; `start == end` never closes.
pub fn is_within_operating_hours(start: u32, end: u32, hour: u32) -> bool {
    match start.cmp(&end) {
        std::cmp::Ordering::Equal => true,
        std::cmp::Ordering::Less => hour >= start && hour < end,
        std::cmp::Ordering::Greater => hour >= start || hour < end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daytime_window() {
        let hours: OperatingHours = "8-22".parse().unwrap();
        assert!(!hours.contains(7));
        assert!(hours.contains(8));
        assert!(hours.contains(21));
        assert!(!hours.contains(22));
    }

    #[test]
    fn overnight_window_wraps() {
        let hours: OperatingHours = "22-2".parse().unwrap();
        assert!(hours.contains(23));
        assert!(hours.contains(0));
        assert!(hours.contains(1));
        assert!(!hours.contains(2));
        assert!(!hours.contains(12));
    }

    #[test]
    fn equal_bounds_and_full_day_never_close() {
        assert!(is_within_operating_hours(5, 5, 3));
        assert!((0..24).all(|h| OperatingHours::always().contains(h)));
    }

    #[test]
    fn rejects_garbage() {
        assert!("8".parse::<OperatingHours>().is_err());
        assert!("8-late".parse::<OperatingHours>().is_err());
        assert!("8-25".parse::<OperatingHours>().is_err());
    }
}
