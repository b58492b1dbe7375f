/*
 *  departures/transport_api.rs
 *
 *  departure-board - live departures on a dot matrix
 *  (c) 2020-26 Stuart Hunter
 *
 *  TransportAPI live departures and service timetables
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
    http_client, parse_hh_mm,
};
use crate::config::Config;

const LIVE_URL: &str = "http://transportapi.com/v3/uk/train/station";

#[derive(Debug, Deserialize)]
pub struct LiveResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub station_name: Option<String>,
    #[serde(default)]
    pub departures: Option<LiveDepartures>,
}

#[derive(Debug, Deserialize)]
pub struct LiveDepartures {
    #[serde(default)]
    pub all: Vec<LiveDeparture>,
}

#[derive(Debug, Deserialize)]
pub struct LiveDeparture {
    #[serde(default)]
    pub mode: Option<String>,
    pub aimed_departure_time: Option<String>,
    #[serde(default)]
    pub expected_departure_time: Option<String>,
    pub destination_name: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub operator_name: Option<String>,
    #[serde(default)]
    pub service_timetable: Option<ServiceTimetableRef>,
}

#[derive(Debug, Deserialize)]
pub struct ServiceTimetableRef {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct TimetableResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub stops: Vec<TimetableStop>,
}

#[derive(Debug, Deserialize)]
pub struct TimetableStop {
    pub station_code: String,
    pub station_name: String,
}

/// Map a live.json payload onto the board model.
pub fn board_from_live(resp: LiveResponse, abbr: &Abbreviations) -> Result<StationBoard, DataSourceError> {
    if let Some(err) = resp.error {
        return Err(DataSourceError::Api(err));
    }
    let station_name = resp
        .station_name
        .ok_or_else(|| DataSourceError::Malformed("missing station_name".into()))?;

    let departures = resp
        .departures
        .map(|d| d.all)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|d| match departure_from_live(d, abbr) {
            Ok(d) => Some(d),
            Err(e) => {
                warn!("skipping departure: {}", e);
                None
            }
        })
        .collect();

    Ok(StationBoard { station_name: abbr.apply(&station_name), departures })
}

fn departure_from_live(d: LiveDeparture, abbr: &Abbreviations) -> Result<Departure, DataSourceError> {
    let aimed = d
        .aimed_departure_time
        .ok_or_else(|| DataSourceError::Malformed("departure without aimed_departure_time".into()))?;
    let scheduled = parse_hh_mm(&aimed)?;
    // an unparseable estimate is treated as no estimate
    let expected = d.expected_departure_time.as_deref().and_then(|t| parse_hh_mm(t).ok());
    let mode = match d.mode.as_deref() {
        Some(m) if m.eq_ignore_ascii_case("bus") => ServiceMode::Bus,
        _ => ServiceMode::Train,
    };

    Ok(Departure {
        scheduled,
        expected,
        cancelled: d.status.as_deref() == Some("CANCELLED"),
        destination: abbr.apply(d.destination_name.as_deref().unwrap_or_default()),
        platform: d.platform,
        mode,
        headcode: None,
        operator: d.operator_name,
        service_id: d.service_timetable.map(|s| s.id).unwrap_or_default(),
    })
}

/// Stops after `station`, the calling station itself excluded.
pub fn stops_after(resp: TimetableResponse, station: &str, abbr: &Abbreviations) -> Result<Vec<String>, DataSourceError> {
    if let Some(err) = resp.error {
        return Err(DataSourceError::Api(err));
    }
    Ok(resp
        .stops
        .into_iter()
        .skip_while(|s| !s.station_code.eq_ignore_ascii_case(station))
        .skip(1)
        .map(|s| abbr.apply(&s.station_name))
        .collect())
}

pub struct TransportApiSource {
    client: Client,
    app_id: String,
    api_key: String,
    departure_station: String,
    destination_station: Option<String>,
    abbreviations: Abbreviations,
}

impl TransportApiSource {
    pub fn from_config(cfg: &Config) -> Result<Self, DataSourceError> {
        let api = cfg.api.clone().unwrap_or_default();
        let journey = cfg.journey();
        Ok(Self {
            client: http_client(cfg.fetch_timeout())?,
            app_id: api.app_id.unwrap_or_default(),
            api_key: api.api_key.unwrap_or_default(),
            departure_station: journey.departure_station().to_string(),
            destination_station: journey.destination_station().map(str::to_string),
            abbreviations: Abbreviations::new(&journey.station_abbr.clone().unwrap_or_default()),
        })
    }
}

impl DepartureSource for TransportApiSource {
    fn tag(&self) -> &'static str {
        "tAPI: "
    }

    async fn departures(&self) -> Result<StationBoard, DataSourceError> {
        let url = format!("{}/{}/live.json", LIVE_URL, self.departure_station);
        debug!("GET {}", url);
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("app_id", self.app_id.as_str()),
                ("app_key", self.api_key.as_str()),
                ("calling_at", self.destination_station.as_deref().unwrap_or_default()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<LiveResponse>()
            .await?;
        board_from_live(resp, &self.abbreviations)
    }

    async fn calling_points(&self, departure: &Departure) -> Result<Vec<String>, DataSourceError> {
        if departure.service_id.is_empty() {
            warn!("departure at {} has no timetable link", departure.scheduled);
            return Ok(Vec::new());
        }
        debug!("GET {}", departure.service_id);
        let resp = self
            .client
            .get(&departure.service_id)
            .send()
            .await?
            .error_for_status()?
            .json::<TimetableResponse>()
            .await?;
        stops_after(resp, &self.departure_station, &self.abbreviations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::departures::ServiceStatus;
    use std::collections::BTreeMap;

    const LIVE: &str = r#"{
        "station_name": "Leeds",
        "departures": { "all": [
            { "mode": "train", "aimed_departure_time": "10:15", "expected_departure_time": "10:19",
              "destination_name": "Manchester Airport", "platform": "16", "status": "LATE",
              "operator_name": "TransPennine Express",
              "service_timetable": { "id": "https://transportapi.com/v3/uk/train/service/abc.json" } },
            { "mode": "bus", "aimed_departure_time": "10:20", "expected_departure_time": null,
              "destination_name": "York", "platform": null, "status": "BUS" },
            { "mode": "train", "aimed_departure_time": "10:25", "expected_departure_time": "10:25",
              "destination_name": "London Kings Cross", "platform": "8", "status": "CANCELLED" }
        ] }
    }"#;

    fn abbr() -> Abbreviations {
        let mut t = BTreeMap::new();
        t.insert("London Kings Cross".to_string(), "Kings X".to_string());
        t.insert("Airport".to_string(), "Apt".to_string());
        Abbreviations::new(&t)
    }

    #[test]
    fn maps_live_departures() {
        let resp: LiveResponse = serde_json::from_str(LIVE).unwrap();
        let board = board_from_live(resp, &abbr()).unwrap();
        assert_eq!(board.station_name, "Leeds");
        assert_eq!(board.departures.len(), 3);

        let first = &board.departures[0];
        assert_eq!(first.destination, "Manchester Apt");
        assert_eq!(first.status().to_string(), "Exp 10:19");
        assert_eq!(first.platform_text().as_deref(), Some("Plat 16"));
        assert!(first.service_id.ends_with("abc.json"));

        let bus = &board.departures[1];
        assert_eq!(bus.mode, ServiceMode::Bus);
        assert_eq!(bus.status(), ServiceStatus::OnTime);

        let third = &board.departures[2];
        assert_eq!(third.destination, "Kings X");
        assert_eq!(third.status(), ServiceStatus::Cancelled);
    }

    #[test]
    fn error_payload_is_an_api_error() {
        let resp: LiveResponse = serde_json::from_str(r#"{"error": "Invalid app_id"}"#).unwrap();
        let err = board_from_live(resp, &abbr()).unwrap_err();
        assert!(matches!(err, DataSourceError::Api(ref m) if m == "Invalid app_id"));
    }

    #[test]
    fn departures_without_an_aimed_time_are_skipped() {
        let json = r#"{
            "station_name": "Leeds",
            "departures": { "all": [
                { "mode": "train", "aimed_departure_time": null, "destination_name": "Leeds" },
                { "mode": "train", "aimed_departure_time": "25:99", "destination_name": "Nowhere" },
                { "mode": "train", "aimed_departure_time": "11:05", "destination_name": "Harrogate" }
            ] }
        }"#;
        let resp: LiveResponse = serde_json::from_str(json).unwrap();
        let board = board_from_live(resp, &abbr()).unwrap();
        assert_eq!(board.departures.len(), 1);
        assert_eq!(board.departures[0].destination, "Harrogate");
    }

    #[test]
    fn missing_departures_is_an_empty_board() {
        let resp: LiveResponse = serde_json::from_str(r#"{"station_name": "Leeds"}"#).unwrap();
        assert!(board_from_live(resp, &abbr()).unwrap().departures.is_empty());
    }

    #[test]
    fn calling_points_start_after_this_station() {
        let json = r#"{ "stops": [
            { "station_code": "YRK", "station_name": "York" },
            { "station_code": "LDS", "station_name": "Leeds" },
            { "station_code": "HUD", "station_name": "Huddersfield" },
            { "station_code": "MIA", "station_name": "Manchester Airport" }
        ] }"#;
        let resp: TimetableResponse = serde_json::from_str(json).unwrap();
        let stops = stops_after(resp, "LDS", &abbr()).unwrap();
        assert_eq!(stops, vec!["Huddersfield".to_string(), "Manchester Apt".to_string()]);
    }
}
