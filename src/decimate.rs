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

//! Thinning out dense tracks for display.

use crate::point::Waypoint;

/// Every n-th point of a track is kept.
pub const DECIMATION_STEP: usize = 5;

/// Keep every [`DECIMATION_STEP`]-th point and always the last one.
///
/// The order of `points` is preserved and no point is repeated.
///
/// # Example
/// ```
/// # use route_kml::{decimate::decimate, point::Waypoint};
/// let track: Vec<Waypoint> = (0..12)
///     .map(|i| Waypoint::new(0.0, i as f64).unwrap())
///     .collect();
///
/// let kept: Vec<f64> = decimate(&track).iter().map(|p| p.longitude()).collect();
/// assert_eq!(kept, [0.0, 5.0, 10.0, 11.0]);
/// ```
pub fn decimate(points: &[Waypoint]) -> Vec<Waypoint> {
    let last = points.len().saturating_sub(1);
    points
        .iter()
        .enumerate()
        .filter(|(i, _)| i % DECIMATION_STEP == 0 || *i == last)
        .map(|(_, p)| *p)
        .collect()
}
