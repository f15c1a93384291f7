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

//! Geotagged photographs.
//!
//! Every JPEG in the photo directory must carry a GPS position and a capture
//! time in its EXIF block, and must have a scaled copy with the same file name
//! in a sub-directory (`scaled/` by default). The scaled copy is shown in the
//! placemark balloon and links to the full-size photo.

use std::fmt::Write;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use exif::{Exif, In, Tag, Value};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::document::{Folder, Geometry, IconStyle, Placemark, Style};
use crate::point::Waypoint;
use crate::{list_dir, Error};

/// File extensions accepted as photographs.
pub const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg"];
/// Name of the photographs folder.
pub const PHOTOGRAPHS_FOLDER_NAME: &str = "Photographs";
/// Icon shared by all photo placemarks.
pub const CAMERA_ICON: &str = "http://maps.google.com/mapfiles/kml/shapes/camera.png";
/// Default sub-directory holding the scaled copies.
pub const DEFAULT_SCALED_DIR: &str = "scaled";
/// Format of the capture time shown below a photo.
pub const TIME_FORMAT: &str = "%a, %d %b %Y %H:%M:%S";

/// How photos are located and presented.
#[derive(Debug, Clone)]
pub struct PhotoSettings {
    /// URL prefix under which the photos are published. If empty, links are
    /// relative.
    pub base_url: String,
    /// Sub-directory (of both the photo directory and `base_url`) with the
    /// scaled copies.
    pub scaled_dir: String,
    /// Capture times are shown in this timezone.
    pub timezone: Tz,
    pub icon_href: String,
}

impl Default for PhotoSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            scaled_dir: DEFAULT_SCALED_DIR.to_string(),
            timezone: chrono_tz::Europe::Madrid,
            icon_href: CAMERA_ICON.to_string(),
        }
    }
}

/// What is known about a single photograph.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoRecord {
    pub filename: String,
    pub position: Waypoint,
    pub captured: DateTime<Utc>,
    /// Width and height of the scaled copy in pixels.
    pub dimensions: Option<(u32, u32)>,
}

/// Read all photographs of `dir`, ordered by file name.
///
/// Photos are read in parallel. The first failure aborts the whole batch.
pub fn read_photos(dir: &Path, settings: &PhotoSettings) -> Result<Vec<PhotoRecord>, Error> {
    let files = list_dir(dir, PHOTO_EXTENSIONS)?;

    let records = files
        .par_iter()
        .map(|path| read_photo(path, settings))
        .collect::<Result<Vec<_>, _>>()?;

    info!(count = records.len(), dir = %dir.display(), "read photographs");
    Ok(records)
}

/// Read position and capture time of the photo at `path` and the size of its
/// scaled copy.
pub fn read_photo(path: &Path, settings: &PhotoSettings) -> Result<PhotoRecord, Error> {
    let file = File::open(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let exif = exif::Reader::new()
        .read_from_container(&mut BufReader::new(file))
        .map_err(|source| Error::Exif {
            path: path.to_path_buf(),
            source,
        })?;

    let missing_geotag = || Error::MissingGeotag {
        path: path.to_path_buf(),
    };
    let latitude = gps_degrees(&exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, b'S')
        .ok_or_else(missing_geotag)?;
    let longitude = gps_degrees(&exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, b'W')
        .ok_or_else(missing_geotag)?;
    let position = Waypoint::new(latitude, longitude).map_err(|source| Error::Coordinate {
        path: path.to_path_buf(),
        source,
    })?;

    let captured = gps_time(&exif)
        .or_else(|| original_time(&exif, settings.timezone))
        .ok_or_else(|| Error::MissingTimestamp {
            path: path.to_path_buf(),
        })?;

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let scaled = path
        .with_file_name(&settings.scaled_dir)
        .join(&filename);
    let dimensions = image::image_dimensions(&scaled).map_err(|source| Error::ScaledAsset {
        path: scaled.clone(),
        source,
    })?;

    debug!(%filename, %position, %captured, "read photograph");
    Ok(PhotoRecord {
        filename,
        position: position.with_time(Some(captured)),
        captured,
        dimensions: Some(dimensions),
    })
}

/// Degrees from a degrees/minutes/seconds field, negated if the reference
/// field starts with `negative`.
fn gps_degrees(exif: &Exif, tag: Tag, ref_tag: Tag, negative: u8) -> Option<f64> {
    let Value::Rational(dms) = &exif.get_field(tag, In::PRIMARY)?.value else {
        return None;
    };
    let degrees = dms
        .iter()
        .take(3)
        .zip([1.0, 60.0, 3600.0])
        .map(|(r, div)| r.to_f64() / div)
        .sum::<f64>();
    if dms.is_empty() || !degrees.is_finite() {
        return None;
    }

    let is_negative = ascii(exif, ref_tag)
        .is_some_and(|r| r.as_bytes().first().map(u8::to_ascii_uppercase) == Some(negative));
    Some(if is_negative { -degrees } else { degrees })
}

/// Capture time as recorded by the GPS receiver (always UTC).
fn gps_time(exif: &Exif) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(&ascii(exif, Tag::GPSDateStamp)?, "%Y:%m:%d").ok()?;
    let Value::Rational(hms) = &exif.get_field(Tag::GPSTimeStamp, In::PRIMARY)?.value else {
        return None;
    };
    if hms.len() < 3 {
        return None;
    }

    let seconds = hms[0].to_f64() * 3600.0 + hms[1].to_f64() * 60.0 + hms[2].to_f64();
    if !(0.0..86400.0).contains(&seconds) {
        return None;
    }
    let time = NaiveTime::from_num_seconds_from_midnight_opt(
        seconds.trunc() as u32,
        (seconds.fract() * 1e9) as u32,
    )?;
    Some(date.and_time(time).and_utc())
}

/// Capture time from the camera clock.
///
/// Without an explicit offset, the clock is assumed to run in `timezone`.
fn original_time(exif: &Exif, timezone: Tz) -> Option<DateTime<Utc>> {
    let local = ascii(exif, Tag::DateTimeOriginal)?;
    if let Some(offset) = ascii(exif, Tag::OffsetTimeOriginal) {
        return DateTime::parse_from_str(&format!("{local} {offset}"), "%Y:%m:%d %H:%M:%S %:z")
            .ok()
            .map(|t| t.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(&local, "%Y:%m:%d %H:%M:%S").ok()?;
    timezone
        .from_local_datetime(&naive)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
}

fn ascii(exif: &Exif, tag: Tag) -> Option<String> {
    match &exif.get_field(tag, In::PRIMARY)?.value {
        Value::Ascii(parts) => parts
            .first()
            .map(|p| String::from_utf8_lossy(p).trim().to_string())
            .filter(|s| !s.is_empty()),
        _ => None,
    }
}

/// Create the placemark showing `record`.
///
/// The description holds the scaled photo linking to the full-size one and
/// the capture time.
///
/// # Example
/// ```
/// # use chrono::{TimeZone, Utc};
/// # use route_kml::photo::{photo_placemark, PhotoRecord, PhotoSettings};
/// # use route_kml::point::Waypoint;
/// let record = PhotoRecord {
///     filename: "IMG_0001.jpg".to_string(),
///     position: Waypoint::new(42.88, -8.54).unwrap(),
///     captured: Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap(),
///     dimensions: Some((800, 600)),
/// };
///
/// let placemark = photo_placemark(&record, &PhotoSettings::default());
/// assert_eq!(
///     placemark.description.as_deref(),
///     Some(concat!(
///         r#"<p><a href="IMG_0001.jpg"><img src="scaled/IMG_0001.jpg" "#,
///         r#"width="800" height="600"></a></p><p>Wed, 01 May 2024 12:30:00</p>"#,
///     ))
/// );
/// ```
pub fn photo_placemark(record: &PhotoRecord, settings: &PhotoSettings) -> Placemark {
    let url = asset_url(&settings.base_url, &[&record.filename]);
    let scaled_url = asset_url(
        &settings.base_url,
        &[&settings.scaled_dir, &record.filename],
    );

    let mut description = format!(r#"<p><a href="{url}"><img src="{scaled_url}""#);
    if let Some((width, height)) = record.dimensions {
        write!(description, r#" width="{width}" height="{height}""#).unwrap();
    }
    write!(
        description,
        "></a></p><p>{}</p>",
        record
            .captured
            .with_timezone(&settings.timezone)
            .format(TIME_FORMAT)
    )
    .unwrap();

    Placemark {
        name: None,
        description: Some(description),
        style: Some(Style::Icon(IconStyle {
            href: settings.icon_href.clone(),
        })),
        geometry: Geometry::Point(record.position),
    }
}

/// Collect one placemark per photo, keeping the order of `records`.
pub fn photographs_folder(records: &[PhotoRecord], settings: &PhotoSettings) -> Folder {
    Folder {
        name: PHOTOGRAPHS_FOLDER_NAME.to_string(),
        placemarks: records
            .iter()
            .map(|r| photo_placemark(r, settings))
            .collect(),
        folders: vec![],
    }
}

/// Join `parts` below `base`. An empty `base` gives a relative URL.
fn asset_url(base: &str, parts: &[&str]) -> String {
    let mut url = base.trim_end_matches('/').to_string();
    for part in parts {
        if !url.is_empty() {
            url.push('/');
        }
        url.push_str(part);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(filename: &str, hour: u32) -> PhotoRecord {
        PhotoRecord {
            filename: filename.to_string(),
            position: Waypoint::new(42.8805, -8.5448).unwrap(),
            captured: Utc.with_ymd_and_hms(2024, 1, 15, hour, 5, 9).unwrap(),
            dimensions: Some((640, 480)),
        }
    }

    #[test]
    fn urls_use_base_and_scaled_dir() {
        let settings = PhotoSettings {
            base_url: "https://example.com/camino/".to_string(),
            ..Default::default()
        };

        let placemark = photo_placemark(&record("a.jpg", 8), &settings);
        let description = placemark.description.unwrap();
        assert!(description.starts_with(
            r#"<p><a href="https://example.com/camino/a.jpg"><img src="https://example.com/camino/scaled/a.jpg" width="640" height="480"></a></p>"#
        ));
    }

    #[test]
    fn time_is_shown_in_display_timezone() {
        let settings = PhotoSettings {
            timezone: chrono_tz::America::New_York,
            ..Default::default()
        };

        let placemark = photo_placemark(&record("a.jpg", 3), &settings);
        assert!(placemark
            .description
            .unwrap()
            .ends_with("<p>Sun, 14 Jan 2024 22:05:09</p>"));
    }

    #[test]
    fn unknown_dimensions_are_left_out() {
        let mut record = record("a.jpg", 8);
        record.dimensions = None;

        let description = photo_placemark(&record, &PhotoSettings::default())
            .description
            .unwrap();
        assert!(description.contains(r#"<img src="scaled/a.jpg">"#));
    }

    #[test]
    fn folder_keeps_order_and_shares_icon() {
        let records = [record("1.jpg", 8), record("2.jpg", 9), record("3.jpg", 10)];
        let folder = photographs_folder(&records, &PhotoSettings::default());

        assert_eq!(folder.name, "Photographs");
        assert_eq!(folder.placemarks.len(), 3);
        for (placemark, record) in folder.placemarks.iter().zip(&records) {
            assert_eq!(placemark.name, None);
            assert_eq!(
                placemark.style,
                Some(Style::Icon(IconStyle {
                    href: CAMERA_ICON.to_string()
                }))
            );
            assert_eq!(placemark.geometry, Geometry::Point(record.position));
            assert!(placemark
                .description
                .as_ref()
                .unwrap()
                .contains(&record.filename));
        }
    }

    #[test]
    fn asset_url_joins_parts() {
        assert_eq!(asset_url("", &["a.jpg"]), "a.jpg");
        assert_eq!(asset_url("", &["scaled", "a.jpg"]), "scaled/a.jpg");
        assert_eq!(asset_url("http://x/", &["a.jpg"]), "http://x/a.jpg");
    }
}
