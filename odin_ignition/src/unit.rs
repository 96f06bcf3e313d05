/*
 * Copyright © 2025, United States Government, as represented by the Administrator of
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “ODIN” software is licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License. You may obtain a copy
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */

//! The burn unit: the polygon to be ignited, its firing direction, and the
//! four wind-centric boundary arcs (fore/aft/port/starboard) firing
//! techniques anchor their paths to.

use geo::Centroid;
use geo_types::{coord, Coord, LineString, Polygon};
use odin_common::angle::Angle360;

use crate::errors::{PatternError, Result};
use crate::grid::Bounds;

/// The four boundary arcs of a burn unit once rotated so the firing direction
/// is congruent with the positive x-axis: `fore` runs from the port anchor to
/// the starboard anchor, `aft` the reverse, `port` from the aft anchor to the
/// fore anchor, and `starboard` from the fore anchor to the aft anchor.
#[derive(Debug, Clone)]
pub struct BoundarySegments {
    pub fore: LineString<f64>,
    pub aft: LineString<f64>,
    pub port: LineString<f64>,
    pub starboard: LineString<f64>,
}

impl BoundarySegments {
    fn split(polygon: &Polygon<f64>) -> Self {
        let coords: Vec<Coord<f64>> = polygon.exterior().coords().copied().collect();
        // exterior() repeats the first coordinate at the end; drop it.
        let coords = &coords[..coords.len().saturating_sub(1)];

        let fore_idx = anchor(coords, 0, false);
        let aft_idx = anchor(coords, 0, true);
        let port_idx = anchor(coords, 1, false);
        let starboard_idx = anchor(coords, 1, true);

        BoundarySegments {
            fore: segment(coords, port_idx, starboard_idx),
            aft: segment(coords, starboard_idx, port_idx),
            port: segment(coords, aft_idx, fore_idx),
            starboard: segment(coords, fore_idx, aft_idx),
        }
    }

    fn rotated(&self, angle_deg: f64, origin: Coord<f64>) -> Self {
        BoundarySegments {
            fore: rotate_line(&self.fore, angle_deg, origin),
            aft: rotate_line(&self.aft, angle_deg, origin),
            port: rotate_line(&self.port, angle_deg, origin),
            starboard: rotate_line(&self.starboard, angle_deg, origin),
        }
    }
}

/// Index of the coordinate with the min (or, if `upper`, max) value along
/// dimension `dim` (0 = x, 1 = y); ties are broken by the largest x value.
fn anchor(coords: &[Coord<f64>], dim: usize, upper: bool) -> usize {
    let value = |c: &Coord<f64>| if dim == 0 { c.x } else { c.y };
    let target = if upper {
        coords.iter().map(value).fold(f64::NEG_INFINITY, f64::max)
    } else {
        coords.iter().map(value).fold(f64::INFINITY, f64::min)
    };

    let mut candidates: Vec<usize> = (0..coords.len())
        .filter(|&i| (value(&coords[i]) - target).abs() < 1e-9)
        .collect();
    candidates.sort_by(|&a, &b| coords[b].x.partial_cmp(&coords[a].x).unwrap());
    candidates[0]
}

fn segment(coords: &[Coord<f64>], start_idx: usize, end_idx: usize) -> LineString<f64> {
    let n = coords.len();
    let pts: Vec<Coord<f64>> = if start_idx > end_idx {
        coords[start_idx..].iter().chain(coords[..=end_idx].iter()).copied().collect()
    } else {
        coords[start_idx..=end_idx].iter().copied().collect()
    };
    debug_assert!(pts.len() <= n);
    LineString::new(pts)
}

pub fn rotate_point(p: Coord<f64>, angle_deg: f64, origin: Coord<f64>) -> Coord<f64> {
    let theta = angle_deg.to_radians();
    let (s, c) = theta.sin_cos();
    let dx = p.x - origin.x;
    let dy = p.y - origin.y;
    coord! { x: origin.x + dx * c - dy * s, y: origin.y + dx * s + dy * c }
}

pub fn rotate_line(line: &LineString<f64>, angle_deg: f64, origin: Coord<f64>) -> LineString<f64> {
    LineString::new(line.coords().map(|c| rotate_point(*c, angle_deg, origin)).collect())
}

pub fn rotate_polygon(polygon: &Polygon<f64>, angle_deg: f64, origin: Coord<f64>) -> Polygon<f64> {
    let exterior = rotate_line(polygon.exterior(), angle_deg, origin);
    let interiors: Vec<LineString<f64>> = polygon.interiors()
        .iter()
        .map(|r| rotate_line(r, angle_deg, origin))
        .collect();
    Polygon::new(exterior, interiors)
}

/// A burn unit: the polygon to be ignited, its firing direction in compass
/// degrees, and the wind-centric boundary decomposition used to anchor
/// technique-specific ignition paths.
#[derive(Debug, Clone)]
pub struct BurnUnit {
    pub polygon: Polygon<f64>,
    pub firing_direction: Angle360,
    pub epsg: u32,
    pub centroid: Coord<f64>,
    /// angle (degrees) that rotates the firing direction onto the positive x-axis
    pub alignment_angle: f64,
    pub segments: BoundarySegments,
}

impl BurnUnit {
    pub fn new(polygon: Polygon<f64>, firing_direction: Angle360, epsg: u32) -> Result<Self> {
        let exterior_len = polygon.exterior().coords().count();
        if exterior_len < 4 || polygon.signed_area().abs() < f64::EPSILON {
            return Err(PatternError::DegenerateBurnUnit.into());
        }

        let centroid_point = polygon.centroid().ok_or(PatternError::DegenerateBurnUnit)?;
        let centroid = coord! { x: centroid_point.x(), y: centroid_point.y() };
        let alignment_angle = Angle360::from_degrees(firing_direction.degrees() - 90.0).degrees();

        let aligned = rotate_polygon(&polygon, alignment_angle, centroid);
        let aligned_segments = BoundarySegments::split(&aligned);
        let segments = aligned_segments.rotated(-alignment_angle, centroid);

        Ok(BurnUnit { polygon, firing_direction, epsg, centroid, alignment_angle, segments })
    }

    /// Rotate the unit's polygon into the wind-aligned frame (firing direction
    /// congruent with +x).
    pub fn align(&self) -> Polygon<f64> {
        rotate_polygon(&self.polygon, self.alignment_angle, self.centroid)
    }

    /// Rotate a wind-aligned line back to the unit's original orientation.
    pub fn unalign_line(&self, line: &LineString<f64>) -> LineString<f64> {
        rotate_line(line, -self.alignment_angle, self.centroid)
    }

    pub fn align_line(&self, line: &LineString<f64>) -> LineString<f64> {
        rotate_line(line, self.alignment_angle, self.centroid)
    }

    pub fn bounds(&self) -> Result<Bounds> {
        let coords: Vec<Coord<f64>> = self.polygon.exterior().coords().copied().collect();
        let (mut west, mut east) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut south, mut north) = (f64::INFINITY, f64::NEG_INFINITY);
        for c in &coords {
            west = west.min(c.x); east = east.max(c.x);
            south = south.min(c.y); north = north.max(c.y);
        }
        Bounds::new(west, south, east, north)
    }
}

trait SignedArea {
    fn signed_area(&self) -> f64;
}

impl SignedArea for Polygon<f64> {
    fn signed_area(&self) -> f64 {
        let coords: Vec<Coord<f64>> = self.exterior().coords().copied().collect();
        let n = coords.len();
        if n < 3 { return 0.0; }
        let mut sum = 0.0;
        for i in 0..n {
            let a = coords[i];
            let b = coords[(i + 1) % n];
            sum += a.x * b.y - b.x * a.y;
        }
        sum / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::polygon;

    fn square() -> Polygon<f64> {
        polygon![
            (x: 0.0, y: 0.0),
            (x: 100.0, y: 0.0),
            (x: 100.0, y: 100.0),
            (x: 0.0, y: 100.0),
        ]
    }

    #[test]
    fn align_unalign_round_trips() {
        let unit = BurnUnit::new(square(), Angle360::from_degrees(45.0), 32610).unwrap();
        let aligned = unit.align();
        let back = unit.unalign_line(aligned.exterior());
        for (a, b) in back.coords().zip(unit.polygon.exterior().coords()) {
            assert!((a.x - b.x).abs() < 1e-6);
            assert!((a.y - b.y).abs() < 1e-6);
        }
    }

    #[test]
    fn degenerate_polygon_is_rejected() {
        let degenerate = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)];
        assert!(BurnUnit::new(degenerate, Angle360::from_degrees(0.0), 32610).is_err());
    }

    #[test]
    fn boundary_segments_cover_the_perimeter() {
        let unit = BurnUnit::new(square(), Angle360::from_degrees(0.0), 32610).unwrap();
        let total: usize = [
            &unit.segments.fore, &unit.segments.aft, &unit.segments.port, &unit.segments.starboard,
        ].iter().map(|l| l.coords().count()).sum();
        assert!(total >= 4);
    }
}
