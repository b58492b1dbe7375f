/*
 *  pacer.rs
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
use tokio::time::Instant;

/// Caps the render loop at a target frequency.
///
/// Each frame is bracketed by [`FrameRegulator::begin`] and
/// [`FrameRegulator::end`]; `end` sleeps off whatever is left of the frame
/// budget. A frame that overruns is simply late, the next one starts
/// straight away.
#[derive(Debug)]
pub struct FrameRegulator {
    frame: Duration,
    frame_start: Option<Instant>,
    frames: u64,
    late_frames: u64,
}

// SPI to the SSD1322 manages far more than the 10fps the board needs
impl FrameRegulator {
    pub fn new(target_fps: u32) -> Self {
        Self {
            frame: Self::period_for(target_fps),
            frame_start: None,
            frames: 0,
            late_frames: 0,
        }
    }

    #[inline]
    fn period_for(fps: u32) -> Duration {
        Duration::from_micros(1_000_000u64 / fps.max(1) as u64)
    }

    pub fn frame_period(&self) -> Duration {
        self.frame
    }

    /// Mark the start of a frame. The returned instant is the "now" the
    /// frame's due checks should use.
    pub fn begin(&mut self) -> std::time::Instant {
        let now = Instant::now();
        self.frame_start = Some(now);
        now.into_std()
    }

    /// What is left of the current frame budget at `now`.
    pub fn remaining(&self, now: Instant) -> Duration {
        match self.frame_start {
            Some(start) => self.frame.saturating_sub(now.saturating_duration_since(start)),
            None => Duration::ZERO,
        }
    }

    /// Finish the frame, sleeping off the unused part of the budget.
    pub async fn end(&mut self) {
        let left = self.remaining(Instant::now());
        self.frames += 1;
        self.frame_start = None;
        if left.is_zero() {
            self.late_frames += 1;
            // still yield so a spawned fetch gets a look in
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(left).await;
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Frames whose work took the whole budget or more.
    pub fn late_frames(&self) -> u64 {
        self.late_frames
    }
}
