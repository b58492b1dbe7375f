/*
 *  display/controller.rs
 *
 *  departure-board - live departures on a dot matrix
 *  (c) 2020-26 Stuart Hunter
 *
 *  Render loop: coarse refresh of departures, fine per-frame ticks
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

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Local, Timelike};
use log::{debug, error, info, warn};
use tokio::task::JoinHandle;

use crate::constants::{DEFAULT_REFRESH_SECS, DEFAULT_TARGET_FPS, MAX_DEPARTURE_ROWS};
use crate::departures::{fetch_snapshot, DataSourceError, DepartureSource, FetchOutcome};
use crate::display::layout::{compose_active, compose_blank, BoardSettings};
use crate::display::viewport::Viewport;
use crate::hours::OperatingHours;
use crate::pacer::FrameRegulator;

/// What the board is currently showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardState {
    /// Welcome screen with a label and the clock.
    Blank { label: String },
    /// `rows` departure rows, marquee and clock.
    Active { rows: usize },
}

/// Blank when out of hours or nothing is running, otherwise one row per
/// departure up to three.
///
/// Out of hours the blank board carries `out_of_hours_label`; an empty
/// board carries the station name the feed returned.
pub fn select_state(outcome: &FetchOutcome, out_of_hours_label: &str) -> BoardState {
    match outcome {
        FetchOutcome::OutOfHours => BoardState::Blank { label: out_of_hours_label.to_string() },
        FetchOutcome::Board(snap) if snap.departures.is_empty() => {
            let name = snap.station_name.trim();
            let label = if name.is_empty() { out_of_hours_label } else { name };
            BoardState::Blank { label: label.to_string() }
        }
        FetchOutcome::Board(snap) => BoardState::Active {
            rows: snap.departures.len().min(MAX_DEPARTURE_ROWS),
        },
    }
}

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub refresh_interval: Duration,
    pub target_fps: u32,
    pub hours: OperatingHours,
    /// blank board label once data says there is nothing to show
    pub out_of_hours_label: String,
    /// blank board label until the first fetch lands
    pub station_code: String,
    pub board: BoardSettings,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_SECS),
            target_fps: DEFAULT_TARGET_FPS,
            hours: OperatingHours::always(),
            out_of_hours_label: String::new(),
            station_code: String::new(),
            board: BoardSettings::default(),
        }
    }
}

type FetchTask = JoinHandle<Result<FetchOutcome, DataSourceError>>;

/// Owns the viewport and drives it frame by frame.
///
/// Fetches run on their own task, at most one at a time, so the clock and
/// marquee keep moving while the network is slow. A finished fetch is
/// applied at the start of the next frame.
pub struct RefreshController<S: DepartureSource + 'static> {
    source: Arc<S>,
    viewport: Viewport,
    regulator: FrameRegulator,
    settings: ControllerSettings,
    state: BoardState,
    pending: Option<FetchTask>,
    last_refresh: Option<Instant>,
}

impl<S: DepartureSource + 'static> RefreshController<S> {
    pub fn new(source: S, mut viewport: Viewport, settings: ControllerSettings) -> Self {
        let label = settings.station_code.clone();
        compose_blank(&mut viewport, &label, &settings.board);
        Self {
            source: Arc::new(source),
            viewport,
            regulator: FrameRegulator::new(settings.target_fps),
            settings,
            state: BoardState::Blank { label },
            pending: None,
            last_refresh: None,
        }
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn regulator(&self) -> &FrameRegulator {
        &self.regulator
    }

    /// Rebuild the layout from a fetch result. Errors keep the current
    /// layout until the next refresh.
    pub fn apply(&mut self, result: Result<FetchOutcome, DataSourceError>) {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("departure refresh failed, keeping current board: {}", e);
                return;
            }
        };

        let next = select_state(&outcome, &self.settings.out_of_hours_label);
        match (&next, &outcome) {
            (BoardState::Active { .. }, FetchOutcome::Board(snap)) => {
                compose_active(&mut self.viewport, snap, &self.settings.board);
            }
            (BoardState::Blank { label }, _) => compose_blank(&mut self.viewport, label, &self.settings.board),
            // Active only ever comes from a board
            (BoardState::Active { .. }, FetchOutcome::OutOfHours) => {}
        }
        if next != self.state {
            info!("board {:?} -> {:?}", self.state, next);
        }
        self.state = next;
    }

    /// Apply a finished fetch, and start the next one when due.
    pub async fn poll_refresh(&mut self, now: Instant) {
        if self.pending.as_ref().is_some_and(|task| task.is_finished()) {
            if let Some(task) = self.pending.take() {
                let result = match task.await {
                    Ok(result) => result,
                    Err(join) => Err(DataSourceError::Task(join.to_string())),
                };
                self.apply(result);
            }
        }

        if self.pending.is_some() {
            return;
        }
        let due = self
            .last_refresh
            .is_none_or(|t| now.saturating_duration_since(t) >= self.settings.refresh_interval);
        if due {
            self.last_refresh = Some(now);
            let source = Arc::clone(&self.source);
            let hours = self.settings.hours;
            let hour = Local::now().hour();
            debug!("starting departure refresh");
            self.pending = Some(tokio::spawn(async move { fetch_snapshot(&*source, hours, hour).await }));
        }
    }

    /// One regulated tick.
    pub async fn frame(&mut self) {
        let now = self.regulator.begin();
        self.poll_refresh(now).await;
        if let Err(e) = self.viewport.refresh(now) {
            warn!("display flush failed: {}", e);
        }
        self.regulator.end().await;
    }

    /// Tick until the task is dropped.
    pub async fn run(&mut self) {
        info!("board running at {} fps, refreshing every {:?}", self.settings.target_fps, self.settings.refresh_interval);
        loop {
            self.frame().await;
        }
    }

    /// Stop any fetch in flight and blank the panel.
    pub fn shutdown(&mut self) {
        if let Some(task) = self.pending.take() {
            task.abort();
        }
        if let Err(e) = self.viewport.clear_device() {
            error!("failed to clear display on shutdown: {}", e);
        }
        info!(
            "board stopped after {} frames ({} late)",
            self.regulator.frames(),
            self.regulator.late_frames()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::departures::{BoardSnapshot, Departure, ServiceMode, StationBoard};
    use crate::display::drivers::headless::HeadlessDriver;
    use crate::display::font::FontSet;
    use crate::display::hotspot::HotspotKind;
    use chrono::NaiveTime;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn departures(n: usize) -> Vec<Departure> {
        (0..n)
            .map(|i| Departure {
                scheduled: NaiveTime::from_hms_opt(12, i as u32, 0).unwrap(),
                expected: None,
                cancelled: false,
                destination: "Ilkley".into(),
                platform: None,
                mode: ServiceMode::Train,
                headcode: None,
                operator: None,
                service_id: String::new(),
            })
            .collect()
    }

    struct Fake {
        rows: usize,
        fail: bool,
        fetches: Arc<AtomicUsize>,
    }

    impl DepartureSource for Fake {
        fn tag(&self) -> &'static str { "fake: " }

        async fn departures(&self) -> Result<StationBoard, DataSourceError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DataSourceError::Api("down".into()));
            }
            Ok(StationBoard { station_name: "Shipley".into(), departures: departures(self.rows) })
        }

        async fn calling_points(&self, _d: &Departure) -> Result<Vec<String>, DataSourceError> {
            Ok(vec!["Ilkley".into()])
        }
    }

    fn controller(rows: usize, fail: bool, refresh: Duration) -> (RefreshController<Fake>, Arc<AtomicUsize>) {
        let fetches = Arc::new(AtomicUsize::new(0));
        let source = Fake { rows, fail, fetches: Arc::clone(&fetches) };
        let viewport = Viewport::new(Box::new(HeadlessDriver::new(256, 64)), FontSet::default());
        let settings = ControllerSettings {
            refresh_interval: refresh,
            out_of_hours_label: "Closed".into(),
            station_code: "SHY".into(),
            ..Default::default()
        };
        (RefreshController::new(source, viewport, settings), fetches)
    }

    fn snapshot(n: usize) -> FetchOutcome {
        FetchOutcome::Board(BoardSnapshot {
            station_name: "Shipley Live".into(),
            departures: departures(n),
            calling_points: vec![],
        })
    }

    #[test]
    fn state_selection() {
        assert_eq!(select_state(&FetchOutcome::OutOfHours, "Closed"), BoardState::Blank { label: "Closed".into() });
        assert_eq!(select_state(&snapshot(0), "Closed"), BoardState::Blank { label: "Shipley Live".into() });
        assert_eq!(select_state(&snapshot(2), "Closed"), BoardState::Active { rows: 2 });
        assert_eq!(select_state(&snapshot(5), "Closed"), BoardState::Active { rows: 3 });

        let unnamed = FetchOutcome::Board(BoardSnapshot {
            station_name: "  ".into(),
            departures: vec![],
            calling_points: vec![],
        });
        assert_eq!(select_state(&unnamed, "Closed"), BoardState::Blank { label: "Closed".into() });
    }

    fn station_label(c: &RefreshController<Fake>) -> String {
        match c.viewport().hotspot("station").map(|h| h.kind()) {
            Some(HotspotKind::WelcomeText(text)) => text.clone(),
            other => panic!("unexpected station hotspot {:?}", other),
        }
    }

    #[tokio::test]
    async fn empty_board_shows_the_fetched_station_name() {
        let (mut c, _) = controller(1, false, Duration::from_secs(60));
        c.apply(Ok(snapshot(0)));
        assert_eq!(c.state(), &BoardState::Blank { label: "Shipley Live".into() });
        assert_eq!(station_label(&c), "Shipley Live");
    }

    #[tokio::test]
    async fn out_of_hours_shows_the_configured_name() {
        let (mut c, _) = controller(1, false, Duration::from_secs(60));
        c.apply(Ok(FetchOutcome::OutOfHours));
        assert_eq!(c.state(), &BoardState::Blank { label: "Closed".into() });
        assert_eq!(station_label(&c), "Closed");
    }

    #[tokio::test]
    async fn starts_blank_with_the_station_label() {
        let (c, _) = controller(1, false, Duration::from_secs(60));
        assert_eq!(c.state(), &BoardState::Blank { label: "SHY".into() });
        assert!(c.viewport().hotspot("station").is_some());
    }

    #[tokio::test]
    async fn errors_keep_the_current_board() {
        let (mut c, _) = controller(1, false, Duration::from_secs(60));
        c.apply(Ok(snapshot(2)));
        assert_eq!(c.state(), &BoardState::Active { rows: 2 });
        c.apply(Err(DataSourceError::Malformed("truncated".into())));
        assert_eq!(c.state(), &BoardState::Active { rows: 2 });
        assert!(c.viewport().hotspot("row2.destination").is_some());
    }

    #[tokio::test]
    async fn back_to_blank_drops_stale_rows() {
        let (mut c, _) = controller(1, false, Duration::from_secs(60));
        c.apply(Ok(snapshot(3)));
        c.apply(Ok(FetchOutcome::OutOfHours));
        assert_eq!(c.state(), &BoardState::Blank { label: "Closed".into() });
        assert!(c.viewport().hotspot("row1.destination").is_none());
        assert_eq!(c.viewport().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_result_lands_on_a_later_frame() {
        let (mut c, fetches) = controller(2, false, Duration::from_secs(60));
        c.frame().await;
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        for _ in 0..3 {
            c.frame().await;
        }
        assert_eq!(c.state(), &BoardState::Active { rows: 2 });
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_source_stays_blank_and_retries_on_schedule() {
        let (mut c, fetches) = controller(2, true, Duration::from_secs(1));
        // 15 frames at 10 fps span 1.4s: fetches at 0s and 1s
        for _ in 0..15 {
            c.frame().await;
        }
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
        assert_eq!(c.state(), &BoardState::Blank { label: "SHY".into() });
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_clears_the_panel() {
        let driver = HeadlessDriver::new(256, 64);
        let probe = driver.clone();
        let viewport = Viewport::new(Box::new(driver), FontSet::default());
        let source = Fake { rows: 1, fail: false, fetches: Arc::new(AtomicUsize::new(0)) };
        let mut c = RefreshController::new(source, viewport, ControllerSettings::default());
        c.frame().await;
        c.shutdown();
        let state = probe.state();
        let s = state.lock().unwrap();
        assert_eq!(s.clear_count, 1);
        assert_eq!(s.flush_count, 1);
    }
}
