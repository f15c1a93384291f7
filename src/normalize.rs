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

//! Merging the legs of a journey into one track folder.
//!
//! Every leg turns into one line placemark named after the leg. Neighbouring
//! legs get different colors so that the day boundaries stay visible. A
//! `Start/Ends` sub-folder marks where each leg begins and where the last one
//! ends.

use tracing::info;

use crate::decimate::decimate;
use crate::document::{Folder, Geometry, LineStyle, Placemark, Style};
use crate::track::Leg;
use crate::Error;

/// Name of the merged track folder.
pub const TRACK_FOLDER_NAME: &str = "Track";
/// Name of the sub-folder holding the start and end markers.
pub const START_ENDS_FOLDER_NAME: &str = "Start/Ends";
/// Name of the marker at the very end of the route.
pub const END_MARKER_NAME: &str = "End";
/// Line colors (`aabbggrr`), assigned round-robin by leg index.
pub const LEG_COLORS: [&str; 2] = ["FF0000FF", "FF00FF00"];
/// Line width shared by all legs.
pub const LINE_WIDTH: f64 = 3.0;

/// Merge `legs` into one folder, in the given order.
///
/// Fails with [`Error::EmptyLeg`] if any leg has no points.
pub fn normalize(legs: &[Leg]) -> Result<Folder, Error> {
    let mut tracks = Folder::new(TRACK_FOLDER_NAME);
    let mut markers = Folder::new(START_ENDS_FOLDER_NAME);

    for (position, leg) in legs.iter().enumerate() {
        let (Some(first), Some(last)) = (leg.points.first(), leg.points.last()) else {
            return Err(Error::EmptyLeg {
                index: leg.index,
                path: leg.source.clone(),
            });
        };

        tracks.placemarks.push(leg_placemark(position, leg));
        markers
            .placemarks
            .push(Placemark::point(Some(format!("{} Start", leg.name)), *first));
        if position == legs.len() - 1 {
            markers
                .placemarks
                .push(Placemark::point(Some(END_MARKER_NAME.to_string()), *last));
        }
    }

    info!(legs = legs.len(), markers = markers.placemarks.len(), "merged legs");
    tracks.folders.push(markers);
    Ok(tracks)
}

/// The line placemark for the leg at `position` of the route.
fn leg_placemark(position: usize, leg: &Leg) -> Placemark {
    Placemark {
        name: Some(leg.name.clone()),
        description: None,
        style: Some(Style::Line(LineStyle {
            color: LEG_COLORS[position % LEG_COLORS.len()].to_string(),
            width: LINE_WIDTH,
        })),
        geometry: Geometry::LineString(decimate(&leg.points)),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::point::Waypoint;

    fn leg(index: usize, len: usize) -> Leg {
        Leg {
            index,
            source: PathBuf::from(format!("legs/{index:02}.kml")),
            name: format!("Day {}", index + 1),
            points: (0..len)
                .map(|i| Waypoint::new(42.0 + index as f64, i as f64 / 100.0).unwrap())
                .collect(),
        }
    }

    fn color(placemark: &Placemark) -> &str {
        match &placemark.style {
            Some(Style::Line(line)) => &line.color,
            other => panic!("expected line style, got {other:?}"),
        }
    }

    #[test]
    fn two_legs_of_twelve_points() {
        let legs = [leg(0, 12), leg(1, 12)];
        let folder = normalize(&legs).unwrap();

        assert_eq!(folder.name, "Track");
        assert_eq!(folder.placemarks.len(), 2);
        assert_eq!(folder.placemarks[0].name.as_deref(), Some("Day 1"));
        assert_eq!(folder.placemarks[1].name.as_deref(), Some("Day 2"));
        assert_eq!(color(&folder.placemarks[0]), LEG_COLORS[0]);
        assert_eq!(color(&folder.placemarks[1]), LEG_COLORS[1]);

        assert_eq!(folder.folders.len(), 1);
        let markers = &folder.folders[0];
        assert_eq!(markers.name, "Start/Ends");
        let names: Vec<_> = markers
            .placemarks
            .iter()
            .map(|p| p.name.as_deref().unwrap())
            .collect();
        assert_eq!(names, ["Day 1 Start", "Day 2 Start", "End"]);
    }

    #[test]
    fn markers_sit_on_line_ends() {
        let legs = [leg(0, 7), leg(1, 12)];
        let folder = normalize(&legs).unwrap();
        let markers = &folder.folders[0].placemarks;

        for (placemark, marker) in folder.placemarks.iter().zip(markers) {
            let Geometry::LineString(line) = &placemark.geometry else {
                panic!("expected a line");
            };
            assert_eq!(marker.geometry, Geometry::Point(line[0]));
        }

        let Geometry::LineString(last_line) = &folder.placemarks[1].geometry else {
            panic!("expected a line");
        };
        assert_eq!(
            markers[2].geometry,
            Geometry::Point(*last_line.last().unwrap())
        );
        assert_eq!(markers[2].geometry, Geometry::Point(legs[1].points[11]));
    }

    #[test]
    fn colors_alternate_and_width_is_constant() {
        let legs: Vec<Leg> = (0..5).map(|i| leg(i, 3)).collect();
        let folder = normalize(&legs).unwrap();

        for (i, placemark) in folder.placemarks.iter().enumerate() {
            let Some(Style::Line(line)) = &placemark.style else {
                panic!("expected line style");
            };
            assert_eq!(line.color, LEG_COLORS[i % 2]);
            assert_eq!(line.width, LINE_WIDTH);
        }
        assert_eq!(folder.folders[0].placemarks.len(), 6);
    }

    #[test]
    fn lines_are_decimated() {
        let folder = normalize(&[leg(0, 12)]).unwrap();
        let Geometry::LineString(line) = &folder.placemarks[0].geometry else {
            panic!("expected a line");
        };
        assert_eq!(line.len(), 4);
    }

    #[test]
    fn single_point_leg_gets_start_and_end_on_that_point() {
        let legs = [leg(0, 1)];
        let folder = normalize(&legs).unwrap();
        let markers = &folder.folders[0].placemarks;

        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].geometry, markers[1].geometry);
    }

    #[test]
    fn empty_leg_is_fatal() {
        let legs = [leg(0, 5), leg(1, 0), leg(2, 5)];
        let err = normalize(&legs).unwrap_err();

        assert!(matches!(err, Error::EmptyLeg { index: 1, ref path } if path.ends_with("01.kml")));
    }

    #[test]
    fn no_legs_gives_empty_folders() {
        let folder = normalize(&[]).unwrap();

        assert!(folder.placemarks.is_empty());
        assert_eq!(folder.folders.len(), 1);
        assert!(folder.folders[0].placemarks.is_empty());
    }
}
