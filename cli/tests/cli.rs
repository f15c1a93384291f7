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

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const LEG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Folder>
    <name>Day 1</name>
    <Folder>
      <name>Track Points</name>
      <Placemark><Point><coordinates>-8.1,42.8</coordinates></Point></Placemark>
      <Placemark><Point><coordinates>-8.2,42.9</coordinates></Point></Placemark>
    </Folder>
  </Folder>
</kml>
"#;

const EMPTY_LEG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Folder>
    <name>Day 2</name>
    <Placemark><name>Track</name></Placemark>
  </Folder>
</kml>
"#;

fn run(tracks: &Path, photos: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_route_kml"))
        .arg("--tracks")
        .arg(tracks)
        .arg("--photos")
        .arg(photos)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run route_kml")
}

#[test]
fn prints_document_on_success() {
    let tracks = TempDir::new().unwrap();
    let photos = TempDir::new().unwrap();
    fs::write(tracks.path().join("01.kml"), LEG).unwrap();

    let output = run(tracks.path(), photos.path());
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
    assert!(stdout.contains("<name>Day 1 Start</name>"));
    assert!(stdout.contains("<name>End</name>"));
    assert!(stdout.contains("<name>Photographs</name>"));
}

#[test]
fn empty_leg_fails_without_output() {
    let tracks = TempDir::new().unwrap();
    let photos = TempDir::new().unwrap();
    fs::write(tracks.path().join("01.kml"), LEG).unwrap();
    fs::write(tracks.path().join("02.kml"), EMPTY_LEG).unwrap();

    let output = run(tracks.path(), photos.path());
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("02.kml"));
    assert!(stderr.contains("has no points"));
}

#[test]
fn missing_photo_directory_fails() {
    let tracks = TempDir::new().unwrap();
    let missing = tracks.path().join("photos");

    let output = run(tracks.path(), &missing);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}
