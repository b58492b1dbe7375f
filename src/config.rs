use serde::{Deserialize, Serialize};
use clap::{ArgAction, Parser, ValueHint};
use dirs_next::home_dir;
use std::collections::BTreeMap;
use std::{fs, path::{Path, PathBuf}, time::Duration};
use thiserror::Error;

use crate::constants::{
    DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_REFRESH_SECS, DEFAULT_TARGET_FPS,
};
use crate::hours::OperatingHours;

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Please set `{field}` in your config file: {hint}")]
    Missing { field: &'static str, hint: &'static str },
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level app configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub log_level: Option<String>,     // e.g., "info" | "debug"
    /// seconds between coarse refreshes of the departure data
    pub refresh_secs: Option<u64>,
    pub target_fps: Option<u32>,
    /// prefix the clock with the data source tag
    pub show_source: Option<bool>,
    pub display: Option<DisplayConfig>,
    pub journey: Option<JourneyConfig>,
    pub api: Option<ApiConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DisplayConfig {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub rotate_deg: Option<u16>,
    pub brightness: Option<u8>,     // 0-255
    pub driver: Option<DriverKind>,
    pub bus: Option<BusConfig>,
    /// headless only: write every flushed frame here as a PBM
    pub snapshot_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct JourneyConfig {
    /// CRS code of the station the board stands at, e.g. "LDS"
    pub departure_station: Option<String>,
    /// optional CRS code to only show services calling there
    pub destination_station: Option<String>,
    /// label shown on the blank board outside operating hours
    pub out_of_hours_name: Option<String>,
    /// "<start>-<end>" in whole hours, e.g. "8-22"
    pub operating_hours: Option<String>,
    /// long station name fragments and their short replacements
    pub station_abbr: Option<BTreeMap<String, String>>,
    pub show_headcode: Option<bool>,
    pub show_operator: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiConfig {
    pub kind: Option<ApiKind>,
    pub app_id: Option<String>,
    pub api_key: Option<String>,
    pub rtt_username: Option<String>,
    pub rtt_password: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiKind {
    TransportApi,
    Rtt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    Headless,
    Ssd1322,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BusConfig {
    Spi {
        bus: String,        // e.g. "/dev/spidev0.0"
        speed_hz: Option<u32>,
        dc_pin: u32,        // BCM numbering
        rst_pin: Option<u32>,
    },
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "departure-board", about = "Live departures on a dot matrix display", disable_help_flag = false)]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
    /// debug logging and show the data source on the clock
    #[arg(long, action = ArgAction::SetTrue)]
    pub debug: bool,
    #[arg(long)]
    pub refresh_secs: Option<u64>,
    #[arg(long)]
    pub target_fps: Option<u32>,
    #[arg(long)]
    pub departure_station: Option<String>,
    #[arg(long)]
    pub display_driver: Option<String>,
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub snapshot_path: Option<PathBuf>,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

/// Public entry point: parse CLI, read YAML, merge, validate.
pub fn load() -> Result<Config, ConfigError> {
    let cli = Cli::parse();
    let cfg = load_from(&cli)?;

    if cli.dump_config {
        // Pretty YAML of effective config (nice for debugging)
        let s = serde_yaml::to_string(&cfg)?;
        println!("{s}");
        std::process::exit(0);
    }

    Ok(cfg)
}

/// Layer defaults, YAML and `cli`, then validate.
pub fn load_from(cli: &Cli) -> Result<Config, ConfigError> {
    // 1) defaults (from `Default` impl)
    let mut cfg = Config::default();

    // 2) YAML file (explicit path or search)
    if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            let y = read_yaml(p)?;
            merge(&mut cfg, y);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        let y = read_yaml(&p)?;
        merge(&mut cfg, y);
    }

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli)?;

    // 4) Validate
    validate(&cfg)?;
    Ok(cfg)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    if let Some(home) = home_dir() {
        let p = home.join(".config/departure-board/config.yaml");
        if p.exists() { return Some(p) }
    }
    for candidate in &["departure-board.yaml", "config.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    parse_yaml(&s)
}

pub fn parse_yaml(s: &str) -> Result<Config, ConfigError> {
    let cfg: Config = serde_yaml::from_str(s)?;
    Ok(cfg)
}

/// Shallow merge `src` into `dst`, Option-by-Option.
pub fn merge(dst: &mut Config, src: Config) {
    if src.log_level.is_some()      { dst.log_level = src.log_level; }
    if src.refresh_secs.is_some()   { dst.refresh_secs = src.refresh_secs; }
    if src.target_fps.is_some()     { dst.target_fps = src.target_fps; }
    if src.show_source.is_some()    { dst.show_source = src.show_source; }
    match (&mut dst.display, src.display) {
        (None, Some(c)) => dst.display = Some(c),
        (Some(d), Some(s)) => merge_display(d, s),
        _ => {}
    }
    match (&mut dst.journey, src.journey) {
        (None, Some(c)) => dst.journey = Some(c),
        (Some(d), Some(s)) => merge_journey(d, s),
        _ => {}
    }
    match (&mut dst.api, src.api) {
        (None, Some(c)) => dst.api = Some(c),
        (Some(d), Some(s)) => merge_api(d, s),
        _ => {}
    }
}

fn merge_display(dst: &mut DisplayConfig, src: DisplayConfig) {
    if src.width.is_some()         { dst.width = src.width; }
    if src.height.is_some()        { dst.height = src.height; }
    if src.rotate_deg.is_some()    { dst.rotate_deg = src.rotate_deg; }
    if src.brightness.is_some()    { dst.brightness = src.brightness; }
    if src.driver.is_some()        { dst.driver = src.driver; }
    if src.bus.is_some()           { dst.bus = src.bus; }
    if src.snapshot_path.is_some() { dst.snapshot_path = src.snapshot_path; }
}

fn merge_journey(dst: &mut JourneyConfig, src: JourneyConfig) {
    if src.departure_station.is_some()   { dst.departure_station = src.departure_station; }
    if src.destination_station.is_some() { dst.destination_station = src.destination_station; }
    if src.out_of_hours_name.is_some()   { dst.out_of_hours_name = src.out_of_hours_name; }
    if src.operating_hours.is_some()     { dst.operating_hours = src.operating_hours; }
    if src.station_abbr.is_some()        { dst.station_abbr = src.station_abbr; }
    if src.show_headcode.is_some()       { dst.show_headcode = src.show_headcode; }
    if src.show_operator.is_some()       { dst.show_operator = src.show_operator; }
}

fn merge_api(dst: &mut ApiConfig, src: ApiConfig) {
    if src.kind.is_some()         { dst.kind = src.kind; }
    if src.app_id.is_some()       { dst.app_id = src.app_id; }
    if src.api_key.is_some()      { dst.api_key = src.api_key; }
    if src.rtt_username.is_some() { dst.rtt_username = src.rtt_username; }
    if src.rtt_password.is_some() { dst.rtt_password = src.rtt_password; }
    if src.timeout_secs.is_some() { dst.timeout_secs = src.timeout_secs; }
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) -> Result<(), ConfigError> {
    if cli.log_level.is_some()    { cfg.log_level = cli.log_level.clone(); }
    if cli.refresh_secs.is_some() { cfg.refresh_secs = cli.refresh_secs; }
    if cli.target_fps.is_some()   { cfg.target_fps = cli.target_fps; }
    if cli.debug {
        cfg.log_level = Some("debug".to_string());
        cfg.show_source = Some(true);
    }
    if let Some(station) = cli.departure_station.as_ref() {
        cfg.journey.get_or_insert_with(JourneyConfig::default).departure_station = Some(station.clone());
    }
    if cli.display_driver.is_some() || cli.snapshot_path.is_some() {
        let display = cfg.display.get_or_insert_with(DisplayConfig::default);
        if let Some(name) = cli.display_driver.as_deref() {
            display.driver = Some(match name.to_ascii_lowercase().as_str() {
                "headless" => DriverKind::Headless,
                "ssd1322" => DriverKind::Ssd1322,
                other => return Err(ConfigError::Validation(format!(
                    "unknown display driver '{}' (expected headless|ssd1322)", other
                ))),
            });
        }
        if cli.snapshot_path.is_some() { display.snapshot_path = cli.snapshot_path.clone(); }
    }
    Ok(())
}

fn is_blank(v: &Option<String>) -> bool {
    v.as_deref().is_none_or(|s| s.trim().is_empty())
}

/// Put any invariants here (required fields, ranges, etc.)
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    let journey = cfg.journey.as_ref().ok_or(ConfigError::Missing {
        field: "journey.departure_station",
        hint: "the CRS code of the station to show departures for",
    })?;
    if is_blank(&journey.departure_station) {
        return Err(ConfigError::Missing {
            field: "journey.departure_station",
            hint: "the CRS code of the station to show departures for",
        });
    }
    if let Some(hours) = journey.operating_hours.as_ref() {
        hours.parse::<OperatingHours>().map_err(|e| {
            ConfigError::Validation(format!("journey.operating_hours: {}", e))
        })?;
    }

    let api = cfg.api.as_ref().ok_or(ConfigError::Missing {
        field: "api.kind",
        hint: "either transport_api or rtt",
    })?;
    match api.kind {
        None => return Err(ConfigError::Missing { field: "api.kind", hint: "either transport_api or rtt" }),
        Some(ApiKind::TransportApi) => {
            if is_blank(&api.app_id) {
                return Err(ConfigError::Missing { field: "api.app_id", hint: "your TransportAPI application id" });
            }
            if is_blank(&api.api_key) {
                return Err(ConfigError::Missing { field: "api.api_key", hint: "your TransportAPI application key" });
            }
        }
        Some(ApiKind::Rtt) => {
            if is_blank(&api.rtt_username) {
                return Err(ConfigError::Missing { field: "api.rtt_username", hint: "your Realtime Trains API username" });
            }
            if is_blank(&api.rtt_password) {
                return Err(ConfigError::Missing { field: "api.rtt_password", hint: "your Realtime Trains API password" });
            }
        }
    }

    if cfg.refresh_secs == Some(0) {
        return Err(ConfigError::Validation("refresh_secs must be > 0".into()));
    }
    if cfg.target_fps == Some(0) {
        return Err(ConfigError::Validation("target_fps must be > 0".into()));
    }

    if let Some(display) = cfg.display.as_ref() {
        if let (Some(w), Some(h)) = (display.width, display.height) {
            if w == 0 || h == 0 {
                return Err(ConfigError::Validation("display width/height must be > 0".into()));
            }
        }
        if let Some(rot) = display.rotate_deg {
            match rot {
                0 | 180 => {},
                _ => return Err(ConfigError::Validation("display rotate_deg must be 0|180".into()))
            }
        }
        if display.driver == Some(DriverKind::Ssd1322) && display.bus.is_none() {
            return Err(ConfigError::Missing {
                field: "display.bus",
                hint: "the SPI bus and DC/RST pins the SSD1322 is wired to",
            });
        }
    }
    Ok(())
}

// Resolved values with defaults applied. Only call these after validate().
impl Config {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs.unwrap_or(DEFAULT_REFRESH_SECS))
    }

    pub fn target_fps(&self) -> u32 {
        self.target_fps.unwrap_or(DEFAULT_TARGET_FPS)
    }

    pub fn show_source(&self) -> bool {
        self.show_source.unwrap_or(false)
    }

    pub fn journey(&self) -> JourneyConfig {
        self.journey.clone().unwrap_or_default()
    }

    pub fn operating_hours(&self) -> OperatingHours {
        self.journey
            .as_ref()
            .and_then(|j| j.operating_hours.as_deref())
            .and_then(|h| h.parse().ok())
            .unwrap_or_default()
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(
            self.api.as_ref().and_then(|a| a.timeout_secs).unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS),
        )
    }
}

impl JourneyConfig {
    pub fn departure_station(&self) -> &str {
        self.departure_station.as_deref().unwrap_or_default().trim()
    }

    pub fn destination_station(&self) -> Option<&str> {
        self.destination_station.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Blank-board label outside operating hours, falls back to the station code.
    pub fn out_of_hours_name(&self) -> String {
        self.out_of_hours_name
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| self.departure_station().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAPI: &str = r#"
refresh_secs: 60
journey:
  departure_station: LDS
  operating_hours: "6-23"
  station_abbr:
    International: Intl.
api:
  kind: transport_api
  app_id: abc
  api_key: def
"#;

    #[test]
    fn parses_and_validates_transport_api() {
        let cfg = parse_yaml(TAPI).unwrap();
        validate(&cfg).unwrap();
        assert_eq!(cfg.refresh_interval(), Duration::from_secs(60));
        assert_eq!(cfg.target_fps(), DEFAULT_TARGET_FPS);
        assert_eq!(cfg.operating_hours().to_string(), "6-23");
        assert_eq!(cfg.journey().out_of_hours_name(), "LDS");
    }

    #[test]
    fn missing_station_names_the_field() {
        let mut cfg = parse_yaml(TAPI).unwrap();
        cfg.journey.as_mut().unwrap().departure_station = Some("  ".into());
        let err = validate(&cfg).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { field: "journey.departure_station", .. }));
        assert!(err.to_string().contains("journey.departure_station"));
    }

    #[test]
    fn rtt_needs_credentials() {
        let mut cfg = parse_yaml(TAPI).unwrap();
        cfg.api.as_mut().unwrap().kind = Some(ApiKind::Rtt);
        let err = validate(&cfg).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { field: "api.rtt_username", .. }));
    }

    #[test]
    fn bad_operating_hours_rejected() {
        let mut cfg = parse_yaml(TAPI).unwrap();
        cfg.journey.as_mut().unwrap().operating_hours = Some("late".into());
        assert!(matches!(validate(&cfg), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn later_layers_win() {
        let mut cfg = parse_yaml(TAPI).unwrap();
        let over = parse_yaml("refresh_secs: 30\njourney:\n  show_operator: true\n").unwrap();
        merge(&mut cfg, over);
        assert_eq!(cfg.refresh_secs, Some(30));
        let journey = cfg.journey();
        assert_eq!(journey.departure_station(), "LDS");
        assert_eq!(journey.show_operator, Some(true));
    }

    #[test]
    fn cli_debug_turns_on_source_tag() {
        let mut cfg = parse_yaml(TAPI).unwrap();
        let cli = Cli { debug: true, display_driver: Some("Headless".into()), ..Default::default() };
        apply_cli_overrides(&mut cfg, &cli).unwrap();
        assert!(cfg.show_source());
        assert_eq!(cfg.log_level.as_deref(), Some("debug"));
        assert_eq!(cfg.display.unwrap().driver, Some(DriverKind::Headless));
    }

    #[test]
    fn ssd1322_needs_a_bus() {
        let mut cfg = parse_yaml(TAPI).unwrap();
        cfg.display = Some(DisplayConfig { driver: Some(DriverKind::Ssd1322), ..Default::default() });
        assert!(matches!(validate(&cfg), Err(ConfigError::Missing { field: "display.bus", .. })));
    }
}
