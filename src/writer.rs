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

//! Writing the document tree as KML.

use std::io::{self, Write};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::document::{Folder, Geometry, Placemark, Style};
use crate::point::Waypoint;
use crate::Error;

/// Namespace of the `<kml>` tag.
const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";
/// Indentation width in spaces.
const INDENT: usize = 4;
/// Default value for tessellating lines in KML.
const DEFAULT_TESSELLATE: bool = true;
const ALTITUDE_MODE: &str = "clampToGround";

/// Write `root` as a complete KML file to `sink`.
///
/// # Example
/// ```
/// # use route_kml::{document::Folder, writer::write_kml};
/// let mut sink = vec![];
/// write_kml(&Folder::new("route"), &mut sink).expect("writing failed");
///
/// let kml = String::from_utf8(sink).expect("KML data is not valid UTF-8");
/// assert!(kml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
/// assert!(kml.contains("        <name>route</name>"));
/// ```
pub fn write_kml(root: &Folder, mut sink: impl Write) -> Result<(), Error> {
    let mut writer = Writer::new_with_indent(&mut sink, b' ', INDENT);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(
        BytesStart::new("kml").with_attributes([("xmlns", KML_NAMESPACE)]),
    ))?;
    write_folder(&mut writer, root)?;
    writer.write_event(Event::End(BytesEnd::new("kml")))?;

    writeln!(sink)?;
    Ok(())
}

/// Render `root` into a string.
pub fn to_kml_string(root: &Folder) -> Result<String, Error> {
    let mut sink = vec![];
    write_kml(root, &mut sink)?;
    String::from_utf8(sink).map_err(|e| Error::Write(io::Error::new(io::ErrorKind::InvalidData, e)))
}

fn write_folder<W: Write>(writer: &mut Writer<W>, folder: &Folder) -> io::Result<()> {
    start(writer, "Folder")?;
    text_element(writer, "name", &folder.name)?;
    for placemark in &folder.placemarks {
        write_placemark(writer, placemark)?;
    }
    for child in &folder.folders {
        write_folder(writer, child)?;
    }
    end(writer, "Folder")
}

fn write_placemark<W: Write>(writer: &mut Writer<W>, placemark: &Placemark) -> io::Result<()> {
    start(writer, "Placemark")?;
    if let Some(name) = &placemark.name {
        text_element(writer, "name", name)?;
    }
    if let Some(description) = &placemark.description {
        text_element(writer, "description", description)?;
    }
    if let Some(style) = &placemark.style {
        write_style(writer, style)?;
    }

    match &placemark.geometry {
        Geometry::Point(point) => {
            start(writer, "Point")?;
            text_element(writer, "coordinates", &point.to_string())?;
            end(writer, "Point")?;
        }
        Geometry::LineString(points) => {
            start(writer, "LineString")?;
            text_element(writer, "tessellate", if DEFAULT_TESSELLATE { "1" } else { "0" })?;
            text_element(writer, "altitudeMode", ALTITUDE_MODE)?;
            text_element(writer, "coordinates", &coordinates(points))?;
            end(writer, "LineString")?;
        }
    }

    end(writer, "Placemark")
}

fn write_style<W: Write>(writer: &mut Writer<W>, style: &Style) -> io::Result<()> {
    start(writer, "Style")?;
    match style {
        Style::Line(line) => {
            start(writer, "LineStyle")?;
            text_element(writer, "color", &line.color)?;
            text_element(writer, "width", &line.width.to_string())?;
            end(writer, "LineStyle")?;
        }
        Style::Icon(icon) => {
            start(writer, "IconStyle")?;
            start(writer, "Icon")?;
            text_element(writer, "href", &icon.href)?;
            end(writer, "Icon")?;
            end(writer, "IconStyle")?;
        }
    }
    end(writer, "Style")
}

/// Space-separated coordinate list of a line.
fn coordinates(points: &[Waypoint]) -> String {
    points
        .iter()
        .map(Waypoint::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

fn start<W: Write>(writer: &mut Writer<W>, name: &str) -> io::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))
}

fn end<W: Write>(writer: &mut Writer<W>, name: &str) -> io::Result<()> {
    writer.write_event(Event::End(BytesEnd::new(name)))
}

/// Write `<name>content</name>` on a single line.
fn text_element<W: Write>(writer: &mut Writer<W>, name: &str, content: &str) -> io::Result<()> {
    start(writer, name)?;
    writer.write_event(Event::Text(BytesText::new(content)))?;
    end(writer, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{IconStyle, LineStyle};

    fn waypoint(lat: f64, lon: f64) -> Waypoint {
        Waypoint::new(lat, lon).unwrap()
    }

    fn sample() -> Folder {
        let track = Folder {
            name: "Track".to_string(),
            placemarks: vec![Placemark {
                name: Some("Day 1".to_string()),
                description: None,
                style: Some(Style::Line(LineStyle {
                    color: "FF0000FF".to_string(),
                    width: 3.0,
                })),
                geometry: Geometry::LineString(vec![
                    waypoint(42.5, -8.25),
                    waypoint(42.75, -8.5).with_altitude(Some(250.0)),
                ]),
            }],
            folders: vec![Folder {
                name: "Start/Ends".to_string(),
                placemarks: vec![Placemark::point(
                    Some("Day 1 Start".to_string()),
                    waypoint(42.5, -8.25),
                )],
                folders: vec![],
            }],
        };
        let photographs = Folder {
            name: "Photographs".to_string(),
            placemarks: vec![Placemark {
                name: None,
                description: Some(r#"<p><a href="a.jpg">x</a></p>"#.to_string()),
                style: Some(Style::Icon(IconStyle {
                    href: "camera.png".to_string(),
                })),
                geometry: Geometry::Point(waypoint(42.6, -8.3)),
            }],
            folders: vec![],
        };
        crate::assemble(track, photographs)
    }

    #[test]
    fn writes_declaration_namespace_and_trailing_newline() {
        let kml = to_kml_string(&sample()).unwrap();

        let mut lines = kml.lines();
        assert_eq!(
            lines.next(),
            Some(r#"<?xml version="1.0" encoding="UTF-8"?>"#)
        );
        assert_eq!(
            lines.next(),
            Some(r#"<kml xmlns="http://www.opengis.net/kml/2.2">"#)
        );
        assert!(kml.ends_with("</kml>\n"));
    }

    #[test]
    fn indents_with_four_spaces() {
        let kml = to_kml_string(&sample()).unwrap();

        assert!(kml.contains("\n    <Folder>\n        <name>route</name>\n"));
        assert!(kml.contains("\n        <Folder>\n            <name>Track</name>\n"));
        assert!(kml.contains("\n                <name>Day 1</name>\n"));
    }

    #[test]
    fn writes_line_string() {
        let kml = to_kml_string(&sample()).unwrap();

        assert!(kml.contains("<color>FF0000FF</color>"));
        assert!(kml.contains("<width>3</width>"));
        assert!(kml.contains("<tessellate>1</tessellate>"));
        assert!(kml.contains("<altitudeMode>clampToGround</altitudeMode>"));
        assert!(kml.contains(
            "<coordinates>-8.2500000000,42.5000000000 -8.5000000000,42.7500000000,250.0000000000</coordinates>"
        ));
    }

    #[test]
    fn escapes_description_markup() {
        let kml = to_kml_string(&sample()).unwrap();

        assert!(kml.contains("<description>&lt;p&gt;&lt;a href="));
        assert!(!kml.contains("<description><p>"));
        assert!(kml.contains("<href>camera.png</href>"));
    }

    #[test]
    fn folders_follow_placemarks() {
        let kml = to_kml_string(&sample()).unwrap();

        let line = kml.find("<LineString>").unwrap();
        let markers = kml.find("<name>Start/Ends</name>").unwrap();
        let photos = kml.find("<name>Photographs</name>").unwrap();
        assert!(line < markers && markers < photos);
    }
}
