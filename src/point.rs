// Copyright 2024 Viktor Reusch
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

//! Geographic points and their KML coordinate string form.
//!
//! KML writes a coordinate as `lon,lat[,alt]`. [`Waypoint`] is the structured
//! value used everywhere else in the crate; [`Display`](fmt::Display) and
//! [`FromStr`] convert between both forms.
//!
//! [`FromStr`] is the standalone string form of that codec; leg files are
//! read through the `kml` and `gpx` crates, not through it.

use std::fmt;
use std::num::ParseFloatError;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Fractional digits used when rendering coordinates.
pub const COORD_PRECISION: usize = 10;

/// Error returned when a coordinate cannot be parsed or is out of range.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoordinateError {
    /// The string does not have two or three comma-separated fields.
    #[error("expected \"lon,lat[,alt]\" but found {fields} field(s) in {input:?}")]
    FieldCount { input: String, fields: usize },
    /// One of the fields is not a number.
    #[error("parsing {field} {value:?}: {source}")]
    Number {
        field: &'static str,
        value: String,
        source: ParseFloatError,
    },
    /// Latitude outside of [-90, 90].
    #[error("latitude {0} is out of range")]
    Latitude(f64),
    /// Longitude outside of [-180, 180].
    #[error("longitude {0} is out of range")]
    Longitude(f64),
}

/// A single recorded position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    latitude: f64,
    longitude: f64,
    altitude: Option<f64>,
    time: Option<DateTime<Utc>>,
}

impl Waypoint {
    /// Create a waypoint after checking the coordinate ranges.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::Latitude(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::Longitude(longitude));
        }

        Ok(Self {
            latitude,
            longitude,
            altitude: None,
            time: None,
        })
    }

    /// Attach an altitude in meters.
    pub fn with_altitude(mut self, altitude: Option<f64>) -> Self {
        self.altitude = altitude;
        self
    }

    /// Attach the time at which the position was recorded.
    pub fn with_time(mut self, time: Option<DateTime<Utc>>) -> Self {
        self.time = time;
        self
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn altitude(&self) -> Option<f64> {
        self.altitude
    }

    pub fn time(&self) -> Option<DateTime<Utc>> {
        self.time
    }
}

/// Render as `lon,lat[,alt]`.
///
/// A zero altitude is treated like a missing one.
///
/// # Example
/// ```
/// # use route_kml::point::Waypoint;
/// let point = Waypoint::new(42.88, -8.54).unwrap();
/// assert_eq!(point.to_string(), "-8.5400000000,42.8800000000");
/// ```
impl fmt::Display for Waypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.prec$},{:.prec$}",
            self.longitude,
            self.latitude,
            prec = COORD_PRECISION
        )?;
        if let Some(altitude) = self.altitude.filter(|a| *a != 0.0) {
            write!(f, ",{:.prec$}", altitude, prec = COORD_PRECISION)?;
        }
        Ok(())
    }
}

/// Parse `lon,lat` or `lon,lat,alt`.
impl FromStr for Waypoint {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(',').map(str::trim).collect();
        if !(2..=3).contains(&parts.len()) {
            return Err(CoordinateError::FieldCount {
                input: s.to_string(),
                fields: parts.len(),
            });
        }

        let longitude = parse_field("longitude", parts[0])?;
        let latitude = parse_field("latitude", parts[1])?;
        let altitude = parts
            .get(2)
            .map(|a| parse_field("altitude", a))
            .transpose()?;

        Ok(Waypoint::new(latitude, longitude)?.with_altitude(altitude))
    }
}

fn parse_field(field: &'static str, value: &str) -> Result<f64, CoordinateError> {
    value.parse().map_err(|source| CoordinateError::Number {
        field,
        value: value.to_string(),
        source,
    })
}
