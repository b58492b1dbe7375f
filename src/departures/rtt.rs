/*
 *  departures/rtt.rs
 *
 *  departure-board - live departures on a dot matrix
 *  (c) 2020-26 Stuart Hunter
 *
 *  Realtime Trains location search and service detail
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

use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;

use super::{
    Abbreviations, DataSourceError, Departure, DepartureSource, ServiceMode, StationBoard,
    http_client, parse_hhmm,
};
use crate::config::Config;

const API_URL: &str = "https://api.rtt.io/api/v1/json";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default)]
    pub error: Option<String>,
    pub location: Option<Location>,
    /// null when nothing is running
    #[serde(default)]
    pub services: Option<Vec<Service>>,
}

#[derive(Debug, Deserialize)]
pub struct Location {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub location_detail: LocationDetail,
    pub service_uid: String,
    pub run_date: String,
    #[serde(default)]
    pub train_identity: Option<String>,
    #[serde(default)]
    pub service_type: Option<String>,
    #[serde(default)]
    pub atoc_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationDetail {
    pub gbtt_booked_departure: Option<String>,
    #[serde(default)]
    pub realtime_departure: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub cancel_reason_code: Option<String>,
    #[serde(default)]
    pub destination: Vec<Endpoint>,
}

#[derive(Debug, Deserialize)]
pub struct Endpoint {
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct ServiceDetail {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub locations: Vec<CallingLocation>,
}

#[derive(Debug, Deserialize)]
pub struct CallingLocation {
    #[serde(default)]
    pub crs: Option<String>,
    pub description: String,
}

pub fn board_from_search(resp: SearchResponse, abbr: &Abbreviations) -> Result<StationBoard, DataSourceError> {
    if let Some(err) = resp.error {
        return Err(DataSourceError::Api(err));
    }
    let location = resp
        .location
        .ok_or_else(|| DataSourceError::Malformed("missing location".into()))?;

    let departures = resp
        .services
        .unwrap_or_default()
        .into_iter()
        .filter_map(|s| match departure_from_service(s, abbr) {
            Ok(d) => Some(d),
            Err(e) => {
                // terminating services carry arrival times only
                warn!("skipping service: {}", e);
                None
            }
        })
        .collect();

    Ok(StationBoard { station_name: abbr.apply(&location.name), departures })
}

fn departure_from_service(s: Service, abbr: &Abbreviations) -> Result<Departure, DataSourceError> {
    let detail = s.location_detail;
    let booked = detail
        .gbtt_booked_departure
        .ok_or_else(|| DataSourceError::Malformed(format!("{} has no booked departure", s.service_uid)))?;
    let scheduled = parse_hhmm(&booked)?;
    let expected = detail.realtime_departure.as_deref().and_then(|t| parse_hhmm(t).ok());
    let destination = detail
        .destination
        .first()
        .map(|d| abbr.apply(&d.description))
        .unwrap_or_default();
    let mode = match s.service_type.as_deref() {
        Some(t) if t.eq_ignore_ascii_case("bus") => ServiceMode::Bus,
        _ => ServiceMode::Train,
    };

    Ok(Departure {
        scheduled,
        expected,
        cancelled: detail.cancel_reason_code.is_some(),
        destination,
        platform: detail.platform,
        mode,
        headcode: s.train_identity,
        operator: s.atoc_name,
        // runDate "2024-01-31" becomes the "2024/01/31" path segment
        service_id: format!("{}/{}", s.service_uid, s.run_date.replace('-', "/")),
    })
}

/// Calling locations after `station`.
pub fn stops_after(detail: ServiceDetail, station: &str, abbr: &Abbreviations) -> Result<Vec<String>, DataSourceError> {
    if let Some(err) = detail.error {
        return Err(DataSourceError::Api(err));
    }
    let is_here = |l: &CallingLocation| l.crs.as_deref().is_some_and(|c| c.eq_ignore_ascii_case(station));
    Ok(detail
        .locations
        .into_iter()
        .skip_while(|l| !is_here(l))
        .skip(1)
        .map(|l| abbr.apply(&l.description))
        .collect())
}

pub struct RttSource {
    client: Client,
    username: String,
    password: String,
    departure_station: String,
    destination_station: Option<String>,
    abbreviations: Abbreviations,
}

impl RttSource {
    pub fn from_config(cfg: &Config) -> Result<Self, DataSourceError> {
        let api = cfg.api.clone().unwrap_or_default();
        let journey = cfg.journey();
        Ok(Self {
            client: http_client(cfg.fetch_timeout())?,
            username: api.rtt_username.unwrap_or_default(),
            password: api.rtt_password.unwrap_or_default(),
            departure_station: journey.departure_station().to_string(),
            destination_station: journey.destination_station().map(str::to_string),
            abbreviations: Abbreviations::new(&journey.station_abbr.clone().unwrap_or_default()),
        })
    }

    fn search_url(&self) -> String {
        match self.destination_station.as_deref() {
            Some(to) => format!("{}/search/{}/to/{}", API_URL, self.departure_station, to),
            None => format!("{}/search/{}", API_URL, self.departure_station),
        }
    }
}

impl DepartureSource for RttSource {
    fn tag(&self) -> &'static str {
        "RTT: "
    }

    async fn departures(&self) -> Result<StationBoard, DataSourceError> {
        let url = self.search_url();
        debug!("GET {}", url);
        let resp = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?
            .error_for_status()?
            .json::<SearchResponse>()
            .await?;
        board_from_search(resp, &self.abbreviations)
    }

    async fn calling_points(&self, departure: &Departure) -> Result<Vec<String>, DataSourceError> {
        let url = format!("{}/service/{}", API_URL, departure.service_id);
        debug!("GET {}", url);
        let detail = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?
            .error_for_status()?
            .json::<ServiceDetail>()
            .await?;
        stops_after(detail, &self.departure_station, &self.abbreviations)
    }
}
