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

//! Run configuration.

use std::path::{Path, PathBuf};

use crate::photo::PhotoSettings;
use crate::Error;

/// Everything a run needs to know.
#[derive(Debug, Clone)]
pub struct RouteConfig {
    /// Directory holding one track file per leg.
    pub track_dir: PathBuf,
    /// Directory holding the geotagged photographs.
    pub photo_dir: PathBuf,
    pub photos: PhotoSettings,
}

impl RouteConfig {
    /// Create a configuration with default photo settings.
    pub fn new(track_dir: impl Into<PathBuf>, photo_dir: impl Into<PathBuf>) -> Self {
        Self {
            track_dir: track_dir.into(),
            photo_dir: photo_dir.into(),
            photos: PhotoSettings::default(),
        }
    }

    /// Check that the configured paths are usable before any work starts.
    pub fn validate(&self) -> Result<(), Error> {
        require_dir("track", &self.track_dir)?;
        require_dir("photo", &self.photo_dir)?;

        let scaled = Path::new(&self.photos.scaled_dir);
        if self.photos.scaled_dir.is_empty() || scaled.components().count() != 1 {
            return Err(Error::Config(format!(
                "scaled directory {:?} must be a single path component",
                self.photos.scaled_dir
            )));
        }

        Ok(())
    }
}

fn require_dir(what: &str, path: &Path) -> Result<(), Error> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "{what} directory {} does not exist",
            path.display()
        )))
    }
}
