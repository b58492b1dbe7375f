/*
 *  main.rs
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

use anyhow::Context;
use env_logger::Env;
use log::{error, info};
use tokio::signal::unix::{signal, SignalKind};

use departure_board::config::{self, ApiKind, Config};
use departure_board::departures::rtt::RttSource;
use departure_board::departures::transport_api::TransportApiSource;
use departure_board::departures::DepartureSource;
use departure_board::display::{
    BoardSettings, ControllerSettings, DisplayDriverFactory, FontSet, RefreshController, Viewport,
};

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

async fn signal_handler() -> Result<(), std::io::Error> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT received. Initiating graceful shutdown.");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received. Initiating graceful shutdown.");
        }
        _ = sighup.recv() => {
            info!("SIGHUP received. Initiating graceful shutdown.");
        }
    }
    Ok(())
}

fn controller_settings(cfg: &Config) -> ControllerSettings {
    let journey = cfg.journey();
    ControllerSettings {
        refresh_interval: cfg.refresh_interval(),
        target_fps: cfg.target_fps(),
        hours: cfg.operating_hours(),
        out_of_hours_label: journey.out_of_hours_name(),
        station_code: journey.departure_station().to_string(),
        board: BoardSettings {
            show_headcode: journey.show_headcode.unwrap_or(false),
            show_operator: journey.show_operator.unwrap_or(false),
            source_tag: None,
        },
    }
}

async fn run_board<S: DepartureSource + 'static>(
    source: S,
    viewport: Viewport,
    mut settings: ControllerSettings,
    show_source: bool,
) -> anyhow::Result<()> {
    if show_source {
        settings.board.source_tag = Some(source.tag().to_string());
    }
    info!(
        "departures via {}, refresh every {:?}, hours {}",
        source.tag().trim_end_matches([':', ' ']),
        settings.refresh_interval,
        settings.hours
    );

    let mut controller = RefreshController::new(source, viewport, settings);

    tokio::select! {
        res = signal_handler() => {
            if let Err(e) = res {
                error!("signal handler failed: {}", e);
            }
        }
        _ = controller.run() => {}
    }

    controller.shutdown();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = match config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let level = cfg.log_level.clone().unwrap_or_else(|| "info".to_string());
    let mut logger = env_logger::Builder::from_env(Env::default().default_filter_or(level));
    logger.format_timestamp_secs();
    if cfg.show_source() {
        logger.format_module_path(true);
    }
    logger.init();

    info!("{} v.{} built {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"), BUILD_DATE);

    let display = cfg.display.clone().unwrap_or_default();
    let driver = DisplayDriverFactory::create_from_config(&display).context("display initialisation failed")?;
    let viewport = Viewport::new(driver, FontSet::default());
    let settings = controller_settings(&cfg);
    let show_source = cfg.show_source();

    // validate() guarantees a kind
    match cfg.api.as_ref().and_then(|a| a.kind).unwrap_or(ApiKind::TransportApi) {
        ApiKind::TransportApi => {
            let source = TransportApiSource::from_config(&cfg).context("transport api setup failed")?;
            run_board(source, viewport, settings, show_source).await
        }
        ApiKind::Rtt => {
            let source = RttSource::from_config(&cfg).context("realtime trains setup failed")?;
            run_board(source, viewport, settings, show_source).await
        }
    }
}
