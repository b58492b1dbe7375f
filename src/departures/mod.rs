/*
 *  departures/mod.rs
 *
 *  departure-board - live departures on a dot matrix
 *  (c) 2020-26 Stuart Hunter
 *
 *  Departure model and the data sources that feed it
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

use chrono::NaiveTime;
use log::{debug, info};
use reqwest::{Client, header};
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

use crate::hours::OperatingHours;

pub mod rtt;
pub mod transport_api;

pub use rtt::RttSource;
pub use transport_api::TransportApiSource;

/// Failure fetching or decoding departure data.
#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {0}")]
    Api(String),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("fetch task failed: {0}")]
    Task(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceMode {
    Train,
    Bus,
}

/// The one status a departure row shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    OnTime,
    Expected(NaiveTime),
    Cancelled,
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceStatus::OnTime => write!(f, "On time"),
            ServiceStatus::Expected(t) => write!(f, "Exp {}", t.format("%H:%M")),
            ServiceStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// One upcoming service, already normalised and abbreviated.
#[derive(Debug, Clone, PartialEq)]
pub struct Departure {
    pub scheduled: NaiveTime,
    pub expected: Option<NaiveTime>,
    pub cancelled: bool,
    pub destination: String,
    pub platform: Option<String>,
    pub mode: ServiceMode,
    pub headcode: Option<String>,
    pub operator: Option<String>,
    /// source specific handle used to look up calling points
    pub service_id: String,
}

impl Departure {
    /// Cancelled beats a differing estimate, which beats on time.
    pub fn status(&self) -> ServiceStatus {
        if self.cancelled {
            return ServiceStatus::Cancelled;
        }
        match self.expected {
            Some(expected) if expected != self.scheduled => ServiceStatus::Expected(expected),
            _ => ServiceStatus::OnTime,
        }
    }

    /// `"HH:MM  Destination"`, with the headcode when asked for.
    pub fn destination_text(&self, show_headcode: bool) -> String {
        let mut text = format!("{}  {}", self.scheduled.format("%H:%M"), self.destination);
        if show_headcode {
            if let Some(hc) = self.headcode.as_deref().filter(|h| !h.is_empty()) {
                text.push_str(&format!(" ({})", hc));
            }
        }
        text
    }

    /// `"BUS"`, `"Plat N"` or nothing when no platform is known.
    pub fn platform_text(&self) -> Option<String> {
        match self.mode {
            ServiceMode::Bus => Some("BUS".to_string()),
            ServiceMode::Train => self
                .platform
                .as_deref()
                .filter(|p| !p.is_empty())
                .map(|p| format!("Plat {}", p)),
        }
    }
}

/// What a single departures call returns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationBoard {
    pub station_name: String,
    pub departures: Vec<Departure>,
}

/// Everything a coarse refresh hands to the board.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardSnapshot {
    pub station_name: String,
    pub departures: Vec<Departure>,
    /// stops after this station for the first departure
    pub calling_points: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    OutOfHours,
    Board(BoardSnapshot),
}

/// A remote departures feed.
///
/// Futures are `Send` so a fetch can run on its own task while the
/// render loop keeps ticking.
pub trait DepartureSource: Send + Sync {
    /// Short tag shown on the clock in debug mode.
    fn tag(&self) -> &'static str;

    fn departures(&self) -> impl Future<Output = Result<StationBoard, DataSourceError>> + Send;

    fn calling_points(
        &self,
        departure: &Departure,
    ) -> impl Future<Output = Result<Vec<String>, DataSourceError>> + Send;
}

/// One coarse refresh: gate on hours, fetch the board, then the calling
/// points of the first departure.
pub async fn fetch_snapshot<S: DepartureSource>(
    source: &S,
    hours: OperatingHours,
    hour_now: u32,
) -> Result<FetchOutcome, DataSourceError> {
    if !hours.contains(hour_now) {
        debug!("{}:00 is outside operating hours {}", hour_now, hours);
        return Ok(FetchOutcome::OutOfHours);
    }

    let board = source.departures().await?;
    info!("{} departures from {}", board.departures.len(), board.station_name);

    let calling_points = match board.departures.first() {
        Some(first) => source.calling_points(first).await?,
        None => Vec::new(),
    };

    Ok(FetchOutcome::Board(BoardSnapshot {
        station_name: board.station_name,
        departures: board.departures,
        calling_points,
    }))
}

/// Marquee text for the calling points.
pub fn calling_at_text(stops: &[String], operator: Option<&str>, show_operator: bool) -> String {
    let mut text = match stops {
        [] => return String::new(),
        [only] => format!("{} only.", only),
        _ => stops.join(", "),
    };
    if show_operator {
        if let Some(op) = operator.filter(|o| !o.is_empty()) {
            text.push_str(&format!("  ({})", op));
        }
    }
    text
}

/// Station-name shortening, longest match first so overlapping keys
/// apply deterministically.
#[derive(Debug, Clone, Default)]
pub struct Abbreviations {
    pairs: Vec<(String, String)>,
}

impl Abbreviations {
    pub fn new(table: &BTreeMap<String, String>) -> Self {
        let mut pairs: Vec<(String, String)> = table
            .iter()
            .filter(|(k, _)| !k.is_empty())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        pairs.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
        Self { pairs }
    }

    pub fn apply(&self, name: &str) -> String {
        self.pairs
            .iter()
            .fold(name.to_string(), |acc, (from, to)| acc.replace(from.as_str(), to))
    }
}

/// Shared client setup for both feeds.
pub(crate) fn http_client(timeout: Duration) -> Result<Client, DataSourceError> {
    const VERSION: &str = concat!(env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"));
    let mut headers = header::HeaderMap::new();
    headers.insert("User-Agent", header::HeaderValue::from_static(VERSION));
    headers.insert("Accept", header::HeaderValue::from_static("application/json"));

    let client = Client::builder()
        .connect_timeout(timeout.min(Duration::from_secs(5)))
        .default_headers(headers)
        .timeout(timeout)
        .build()?;
    Ok(client)
}

pub(crate) fn parse_hh_mm(s: &str) -> Result<NaiveTime, DataSourceError> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|e| DataSourceError::Malformed(format!("bad time '{}': {}", s, e)))
}

pub(crate) fn parse_hhmm(s: &str) -> Result<NaiveTime, DataSourceError> {
    NaiveTime::parse_from_str(s.trim(), "%H%M")
        .map_err(|e| DataSourceError::Malformed(format!("bad time '{}': {}", s, e)))
}
