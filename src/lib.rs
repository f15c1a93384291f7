// Copyright 2021, 2022, 2024 Viktor Reusch
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

//! Library for combining the tracks and photographs of a multi-leg journey
//! into one [KML](https://developers.google.com/kml) document.
//!
//! A directory of per-leg track files (KML or
//! [GPX](https://www.topografix.com/gpx.asp)) is merged into one route with
//! start and end markers. A directory of geotagged JPEG photographs becomes a
//! folder of camera placemarks. Both end up below a single root folder.
//!
//! See [`build_route`] and [`writer::write_kml`] for the whole pipeline.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use gpx::errors::GpxError;
use thiserror::Error;

pub mod config;
pub mod decimate;
pub mod document;
pub mod normalize;
pub mod photo;
pub mod point;
pub mod track;
pub mod writer;

pub use config::RouteConfig;
use document::Folder;
use point::CoordinateError;

/// Name of the root folder of the document.
pub const ROUTE_FOLDER_NAME: &str = "route";

/// Error returned by every stage of the pipeline.
///
/// All errors are fatal for a run. Errors tied to an input file name it.
#[derive(Error, Debug)]
pub enum Error {
    /// A directory could not be listed.
    #[error("reading directory {}: {source}", path.display())]
    ReadDir { path: PathBuf, source: io::Error },
    /// A file could not be opened or read.
    #[error("reading {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    /// KML reading failed.
    #[error("parsing KML {}: {source}", path.display())]
    Kml { path: PathBuf, source: kml::Error },
    /// GPX reading failed.
    #[error("parsing GPX {}: {source}", path.display())]
    Gpx { path: PathBuf, source: GpxError },
    /// A coordinate of a track file is invalid.
    #[error("invalid coordinate in {}: {source}", path.display())]
    Coordinate {
        path: PathBuf,
        source: CoordinateError,
    },
    /// The EXIF block of a photo could not be read.
    #[error("reading EXIF from {}: {source}", path.display())]
    Exif { path: PathBuf, source: exif::Error },
    /// A photo carries no usable GPS position.
    #[error("finding GPS location in {}: no geotag", path.display())]
    MissingGeotag { path: PathBuf },
    /// A photo carries no usable capture time.
    #[error("finding capture time in {}: no timestamp", path.display())]
    MissingTimestamp { path: PathBuf },
    /// The scaled copy of a photo is missing or unreadable.
    #[error("reading scaled photo {}: {source}", path.display())]
    ScaledAsset {
        path: PathBuf,
        source: image::ImageError,
    },
    /// A leg without points cannot be given a start marker.
    #[error("leg {index} ({}) has no points", path.display())]
    EmptyLeg { index: usize, path: PathBuf },
    /// Writing the KML output failed.
    #[error("writing KML failed: {0}")]
    Write(#[from] io::Error),
    /// The run configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Read all inputs named by `config` and build the document tree.
///
/// Nothing is written. If any track or photo fails, the first error is
/// returned and no tree is produced.
pub fn build_route(config: &RouteConfig) -> Result<Folder, Error> {
    config.validate()?;

    let legs = track::read_legs(&config.track_dir)?;
    let tracks = normalize::normalize(&legs)?;

    let photos = photo::read_photos(&config.photo_dir, &config.photos)?;
    let photographs = photo::photographs_folder(&photos, &config.photos);

    Ok(assemble(tracks, photographs))
}

/// Put the merged tracks and the photographs below one root folder.
///
/// Both folders are taken as they are; their names are kept.
pub fn assemble(tracks: Folder, photographs: Folder) -> Folder {
    Folder {
        name: ROUTE_FOLDER_NAME.to_string(),
        placemarks: vec![],
        folders: vec![tracks, photographs],
    }
}

/// List the visible files of `dir` whose extension is one of `extensions`.
///
/// Extensions are compared case-insensitively. The result is sorted by file
/// name, which fixes leg and photo order independently of the platform.
pub(crate) fn list_dir(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>, Error> {
    let read_dir = |source: io::Error| Error::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = vec![];
    for entry in fs::read_dir(dir).map_err(read_dir)? {
        let path = entry.map_err(read_dir)?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with('.') || !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| extensions.iter().any(|x| e.eq_ignore_ascii_case(x)));
        if matches {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}
