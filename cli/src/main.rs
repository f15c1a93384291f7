// Copyright 2023, 2024 Viktor Reusch
//
// This file is part of route_kml.
//
// route_kml is free software: you can redistribute it and/or modify it under
// the terms of the GNU Affero General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// route_kml is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more
// details.
//
// You should have received a copy of the GNU Affero General Public License
// along with route_kml. If not, see <https://www.gnu.org/licenses/>.

//! Command-line interface: builds the journey document and prints it to
//! STDOUT.

use std::io::{stdout, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use chrono_tz::Tz;
use clap::Parser;
use route_kml::photo::{PhotoSettings, CAMERA_ICON, DEFAULT_SCALED_DIR};
use route_kml::{build_route, writer, Error, RouteConfig};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "route_kml", version)]
#[command(about = "Merge per-leg tracks and geotagged photos into one KML route")]
struct Cli {
    /// Directory with one KML or GPX file per leg, named in route order
    #[arg(long, env = "ROUTE_KML_TRACKS")]
    tracks: PathBuf,

    /// Directory with the geotagged JPEG photographs
    #[arg(long, env = "ROUTE_KML_PHOTOS")]
    photos: PathBuf,

    /// URL prefix under which the photographs are published
    #[arg(long, env = "ROUTE_KML_PHOTO_BASE_URL", default_value = "")]
    photo_base_url: String,

    /// Sub-directory holding the scaled copies of the photographs
    #[arg(long, default_value = DEFAULT_SCALED_DIR)]
    scaled_dir: String,

    /// Timezone in which capture times are shown
    #[arg(long, default_value = "Europe/Madrid", value_parser = parse_timezone)]
    timezone: Tz,

    /// Log debug output to STDERR
    #[arg(short, long)]
    verbose: bool,
}

fn parse_timezone(name: &str) -> Result<Tz, String> {
    name.parse::<Tz>().map_err(|e| e.to_string())
}

fn init_logger(verbose: bool) {
    let default = if verbose {
        "route_kml=debug,info"
    } else {
        "route_kml=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}

/// Build the whole document in memory and only then print it.
fn run(cli: Cli) -> Result<(), Error> {
    let config = RouteConfig {
        track_dir: cli.tracks,
        photo_dir: cli.photos,
        photos: PhotoSettings {
            base_url: cli.photo_base_url,
            scaled_dir: cli.scaled_dir,
            timezone: cli.timezone,
            icon_href: CAMERA_ICON.to_string(),
        },
    };

    debug!(
        tracks = %config.track_dir.display(),
        photos = %config.photo_dir.display(),
        "building route"
    );
    let route = build_route(&config)?;
    let mut kml = vec![];
    writer::write_kml(&route, &mut kml)?;
    info!(bytes = kml.len(), "writing document");

    let mut out = stdout().lock();
    out.write_all(&kml)?;
    out.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Conversion failed with: {err}");
            ExitCode::FAILURE
        }
    }
}
