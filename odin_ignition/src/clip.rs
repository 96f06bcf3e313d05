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

//! Clipping open polylines against a (possibly non-convex) polygon, and
//! against a rectangular DEM extent.
//!
//! `geo`'s `BooleanOps` only covers area-vs-area intersection, so there is no
//! polygon ∩ line primitive in the crate. This mirrors what shapely's
//! `LineString.intersection(Polygon)` does for every firing technique that
//! lays a straight or contoured path across a burn unit: find every point
//! where the line crosses the polygon's boundary, then keep the sub-segments
//! whose midpoint falls inside.

use geo::line_intersection::{line_intersection, LineIntersection};
use geo::Contains;
use geo_types::{Coord, Line, LineString, Point, Polygon};

use crate::grid::Bounds;

/// Clip `line` to the portions that lie inside `polygon`'s interior, one
/// `LineString` per contiguous inside run (a "leg" in firing-technique
/// terms). A line wholly outside the polygon yields an empty vector -
/// callers skip empty results rather than treating them as an error, per
/// the "geometric degeneracies are recovered locally" policy.
pub fn clip_to_polygon(line: &LineString<f64>, polygon: &Polygon<f64>) -> Vec<LineString<f64>> {
    let coords: Vec<Coord<f64>> = line.coords().copied().collect();
    if coords.len() < 2 {
        return Vec::new();
    }

    let boundary: Vec<Line<f64>> = std::iter::once(polygon.exterior())
        .chain(polygon.interiors().iter())
        .flat_map(|ring| ring.lines())
        .collect();

    let refined = refine_with_crossings(&coords, &boundary);

    let mut legs: Vec<Vec<Coord<f64>>> = Vec::new();
    let mut current: Vec<Coord<f64>> = Vec::new();
    for pair in refined.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let mid = Coord { x: (a.x + b.x) / 2.0, y: (a.y + b.y) / 2.0 };
        if polygon.contains(&Point::from(mid)) {
            if current.is_empty() {
                current.push(a);
            }
            current.push(b);
        } else if !current.is_empty() {
            legs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        legs.push(current);
    }

    legs.into_iter().filter(|c| c.len() >= 2).map(LineString::new).collect()
}

/// Insert every boundary-crossing point into `coords`, in the order they
/// occur along the polyline, so the result can be walked segment-by-segment
/// with each midpoint unambiguously inside or outside the polygon.
fn refine_with_crossings(coords: &[Coord<f64>], boundary: &[Line<f64>]) -> Vec<Coord<f64>> {
    const EPS: f64 = 1e-9;
    let mut refined = Vec::with_capacity(coords.len());
    refined.push(coords[0]);

    for seg in coords.windows(2) {
        let (a, b) = (seg[0], seg[1]);
        let seg_line = Line::new(a, b);

        let mut crossings: Vec<f64> = Vec::new();
        for bl in boundary {
            match line_intersection(seg_line, *bl) {
                Some(LineIntersection::SinglePoint { intersection, .. }) => {
                    let t = segment_fraction(a, b, intersection);
                    if t > EPS && t < 1.0 - EPS {
                        crossings.push(t);
                    }
                }
                Some(LineIntersection::Collinear { intersection }) => {
                    for p in [intersection.start, intersection.end] {
                        let t = segment_fraction(a, b, p);
                        if t > EPS && t < 1.0 - EPS {
                            crossings.push(t);
                        }
                    }
                }
                None => {}
            }
        }
        crossings.sort_by(|x, y| x.partial_cmp(y).unwrap());
        crossings.dedup_by(|x, y| (*x - *y).abs() < EPS);

        for t in crossings {
            refined.push(Coord { x: a.x + (b.x - a.x) * t, y: a.y + (b.y - a.y) * t });
        }
        refined.push(b);
    }

    refined
}

/// Fractional position of `p` along the segment `a -> b`, projected onto
/// whichever axis varies more (avoids dividing by a near-zero span).
fn segment_fraction(a: Coord<f64>, b: Coord<f64>, p: Coord<f64>) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    if dx.abs() > dy.abs() { (p.x - a.x) / dx } else { (p.y - a.y) / dy }
}

/// Clip a two-point line to a rectangular extent (Liang-Barsky), used to
/// keep a GDT source line within DEM bounds before rasterizing it.
pub fn clip_line_to_bounds(a: Coord<f64>, b: Coord<f64>, bounds: &Bounds) -> Option<(Coord<f64>, Coord<f64>)> {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;

    let clip = |p: f64, q: f64, t0: &mut f64, t1: &mut f64| -> bool {
        if p == 0.0 {
            return q >= 0.0;
        }
        let r = q / p;
        if p < 0.0 {
            if r > *t1 { return false; }
            if r > *t0 { *t0 = r; }
        } else {
            if r < *t0 { return false; }
            if r < *t1 { *t1 = r; }
        }
        true
    };

    if !clip(-dx, a.x - bounds.west, &mut t0, &mut t1) { return None; }
    if !clip(dx, bounds.east - a.x, &mut t0, &mut t1) { return None; }
    if !clip(-dy, a.y - bounds.south, &mut t0, &mut t1) { return None; }
    if !clip(dy, bounds.north - a.y, &mut t0, &mut t1) { return None; }

    if t0 > t1 {
        return None;
    }
    let p0 = Coord { x: a.x + t0 * dx, y: a.y + t0 * dy };
    let p1 = Coord { x: a.x + t1 * dx, y: a.y + t1 * dy };
    Some((p0, p1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{coord, line_string, polygon};

    fn unit_square() -> Polygon<f64> {
        polygon![
            (x: 0.0, y: 0.0),
            (x: 10.0, y: 0.0),
            (x: 10.0, y: 10.0),
            (x: 0.0, y: 10.0),
        ]
    }

    #[test]
    fn line_through_square_keeps_interior_only() {
        let line = line_string![(x: -5.0, y: 5.0), (x: 15.0, y: 5.0)];
        let legs = clip_to_polygon(&line, &unit_square());
        assert_eq!(legs.len(), 1);
        let coords: Vec<_> = legs[0].coords().collect();
        assert!((coords[0].x - 0.0).abs() < 1e-6);
        assert!((coords[1].x - 10.0).abs() < 1e-6);
    }

    #[test]
    fn line_outside_square_is_dropped() {
        let line = line_string![(x: -5.0, y: -5.0), (x: -1.0, y: -1.0)];
        assert!(clip_to_polygon(&line, &unit_square()).is_empty());
    }

    #[test]
    fn l_shaped_polygon_splits_line_into_two_legs() {
        // an L-shape missing the top-right quadrant
        let l_shape = polygon![
            (x: 0.0, y: 0.0), (x: 20.0, y: 0.0), (x: 20.0, y: 10.0),
            (x: 10.0, y: 10.0), (x: 10.0, y: 20.0), (x: 0.0, y: 20.0),
        ];
        let line = line_string![(x: -5.0, y: 15.0), (x: 25.0, y: 15.0)];
        let legs = clip_to_polygon(&line, &l_shape);
        assert_eq!(legs.len(), 1); // only the left arm of the L crosses y=15
    }

    #[test]
    fn bounds_clip_keeps_inside_segment() {
        let bounds = Bounds::new(0.0, 0.0, 10.0, 10.0).unwrap();
        let (p0, p1) = clip_line_to_bounds(coord! {x: -5.0, y: 5.0}, coord! {x: 15.0, y: 5.0}, &bounds).unwrap();
        assert!((p0.x - 0.0).abs() < 1e-9);
        assert!((p1.x - 10.0).abs() < 1e-9);
    }

    #[test]
    fn bounds_clip_rejects_disjoint_segment() {
        let bounds = Bounds::new(0.0, 0.0, 10.0, 10.0).unwrap();
        assert!(clip_line_to_bounds(coord! {x: -5.0, y: -5.0}, coord! {x: -1.0, y: -1.0}, &bounds).is_none());
    }
}
