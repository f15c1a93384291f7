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

//! The tree of folders and placemarks that makes up the output document.

use crate::point::Waypoint;

/// A named group of placemarks and nested folders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Folder {
    pub name: String,
    pub placemarks: Vec<Placemark>,
    pub folders: Vec<Folder>,
}

impl Folder {
    /// Create an empty folder called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Find a direct sub-folder by name.
    pub fn folder(&self, name: &str) -> Option<&Folder> {
        self.folders.iter().find(|f| f.name == name)
    }
}

/// A single displayed geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Placemark {
    pub name: Option<String>,
    /// Free text, possibly containing HTML markup.
    pub description: Option<String>,
    pub style: Option<Style>,
    pub geometry: Geometry,
}

impl Placemark {
    /// Create an unstyled point placemark.
    pub fn point(name: Option<String>, point: Waypoint) -> Self {
        Self {
            name,
            description: None,
            style: None,
            geometry: Geometry::Point(point),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Waypoint),
    /// A path through the given points, drawn clamped to the ground.
    LineString(Vec<Waypoint>),
}

/// Inline style of a placemark.
#[derive(Debug, Clone, PartialEq)]
pub enum Style {
    Line(LineStyle),
    Icon(IconStyle),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
    /// KML color in `aabbggrr` notation.
    pub color: String,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IconStyle {
    pub href: String,
}
