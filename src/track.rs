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

//! Reading legs from track files.
//!
//! A leg is read either from a KML file as exported by Garmin (a folder whose
//! `Track Points` sub-folder holds one point placemark per recorded position)
//! or from a GPX file. Only the leg name and the ordered positions are kept.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use gpx::Gpx;
use kml::types::{Coord, Geometry, Placemark};
use kml::Kml;
use tracing::debug;

use crate::point::Waypoint;
use crate::{list_dir, Error};

/// File extensions accepted as track files.
pub const TRACK_EXTENSIONS: &[&str] = &["kml", "gpx"];
/// Garmin puts the individual positions of a track into this folder.
const TRACK_POINTS_FOLDER: &str = "Track Points";

/// One recorded segment of the journey.
#[derive(Debug, Clone, PartialEq)]
pub struct Leg {
    /// Position in the input listing, starting at 0.
    pub index: usize,
    pub source: PathBuf,
    pub name: String,
    pub points: Vec<Waypoint>,
}

/// Read every track file of `dir` as one leg.
///
/// Legs are ordered by file name. This order decides the route order, so the
/// files should be named accordingly (e.g. by date).
pub fn read_legs(dir: &Path) -> Result<Vec<Leg>, Error> {
    let files = list_dir(dir, TRACK_EXTENSIONS)?;

    let legs = files
        .into_iter()
        .enumerate()
        .map(|(index, path)| read_leg(index, path))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::info!(count = legs.len(), dir = %dir.display(), "read legs");
    Ok(legs)
}

/// Read a single track file. The format is chosen by extension.
pub fn read_leg(index: usize, path: PathBuf) -> Result<Leg, Error> {
    let is_gpx = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gpx"));
    let (name, points) = if is_gpx {
        read_gpx(&path)?
    } else {
        read_kml(&path)?
    };

    let name = name.unwrap_or_else(|| file_stem(&path));
    debug!(index, %name, points = points.len(), path = %path.display(), "read leg");

    Ok(Leg {
        index,
        source: path,
        name,
        points,
    })
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Read a KML leg: its name and its positions.
fn read_kml(path: &Path) -> Result<(Option<String>, Vec<Waypoint>), Error> {
    let text = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let kml: Kml = text.parse().map_err(|source| Error::Kml {
        path: path.to_path_buf(),
        source,
    })?;

    let mut scan = KmlScan::default();
    scan.visit(&kml, false);

    let coords = if scan.track_points.is_empty() {
        scan.line.unwrap_or_default()
    } else {
        scan.track_points
    };
    let points = coords
        .iter()
        .map(|c| {
            Waypoint::new(c.y, c.x)
                .map(|p| p.with_altitude(c.z))
                .map_err(|source| Error::Coordinate {
                    path: path.to_path_buf(),
                    source,
                })
        })
        .collect::<Result<_, _>>()?;

    Ok((scan.folder_name.or(scan.document_name), points))
}

/// What a walk over a KML tree collects.
#[derive(Default)]
struct KmlScan {
    folder_name: Option<String>,
    document_name: Option<String>,
    track_points: Vec<Coord>,
    /// Coordinates of the first line string, used if there are no track points.
    line: Option<Vec<Coord>>,
}

impl KmlScan {
    fn visit(&mut self, kml: &Kml, in_track_points: bool) {
        match kml {
            Kml::KmlDocument(document) => {
                for element in &document.elements {
                    self.visit(element, in_track_points);
                }
            }
            Kml::Document { elements, .. } => {
                if self.document_name.is_none() {
                    self.document_name = element_name(elements);
                }
                for element in elements {
                    self.visit(element, in_track_points);
                }
            }
            Kml::Folder { elements, .. } => {
                let name = element_name(elements);
                let track_points =
                    in_track_points || name.as_deref() == Some(TRACK_POINTS_FOLDER);
                // The points folder is structure, not a title.
                if self.folder_name.is_none() && !track_points {
                    self.folder_name = name;
                }
                for element in elements {
                    self.visit(element, track_points);
                }
            }
            Kml::Placemark(placemark) => self.visit_placemark(placemark, in_track_points),
            _ => {}
        }
    }

    fn visit_placemark(&mut self, placemark: &Placemark, in_track_points: bool) {
        match &placemark.geometry {
            Some(Geometry::Point(point)) if in_track_points => {
                self.track_points.push(point.coord.clone());
            }
            Some(geometry) if self.line.is_none() => self.line = first_line(geometry),
            _ => {}
        }
    }
}

/// Content of the first `<name>` element among `elements`.
fn element_name(elements: &[Kml]) -> Option<String> {
    elements.iter().find_map(|e| match e {
        Kml::Element(element) if element.name == "name" => element
            .content
            .as_ref()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty()),
        _ => None,
    })
}

fn first_line(geometry: &Geometry) -> Option<Vec<Coord>> {
    match geometry {
        Geometry::LineString(line) => Some(line.coords.clone()),
        Geometry::MultiGeometry(multi) => multi.geometries.iter().find_map(first_line),
        _ => None,
    }
}

/// Read a GPX leg: its name and its positions.
fn read_gpx(path: &Path) -> Result<(Option<String>, Vec<Waypoint>), Error> {
    let file = File::open(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let gpx: Gpx = gpx::read(BufReader::new(file)).map_err(|source| Error::Gpx {
        path: path.to_path_buf(),
        source,
    })?;

    let name = gpx
        .tracks
        .iter()
        .find_map(|t| t.name.clone())
        .or_else(|| gpx.routes.iter().find_map(|r| r.name.clone()))
        .or_else(|| gpx.metadata.as_ref().and_then(|m| m.name.clone()));

    let waypoints: Vec<&gpx::Waypoint> = if gpx.tracks.is_empty() {
        gpx.routes.iter().flat_map(|r| &r.points).collect()
    } else {
        gpx.tracks
            .iter()
            .flat_map(|t| &t.segments)
            .flat_map(|s| &s.points)
            .collect()
    };

    let points = waypoints
        .into_iter()
        .map(|waypoint| {
            let point = waypoint.point();
            Waypoint::new(point.y(), point.x())
                .map(|p| {
                    p.with_altitude(waypoint.elevation)
                        .with_time(waypoint.time.as_ref().and_then(gpx_time))
                })
                .map_err(|source| Error::Coordinate {
                    path: path.to_path_buf(),
                    source,
                })
        })
        .collect::<Result<_, _>>()?;

    Ok((name, points))
}

fn gpx_time(time: &gpx::Time) -> Option<DateTime<Utc>> {
    let formatted = time.format().ok()?;
    DateTime::parse_from_rfc3339(&formatted)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
