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

//! Marching-squares contour extraction over a [`Grid`], producing isolines as
//! world-coordinate polylines.
//!
//! Contour points are computed in fractional (row, col) index space, where a
//! horizontal and a vertical edge of the raster's dual grid are each given a
//! canonical key so that two cells sharing an edge resolve the same crossing
//! point; the index-space chain is only mapped to world coordinates at the end
//! via [`crate::grid::Transform::index_to_world`].

use std::collections::HashMap;

use geo_types::{coord, LineString};

use crate::grid::Grid;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
enum EdgeKey {
    /// crosses the horizontal segment from corner (row, col) to (row, col + 1)
    H(usize, usize),
    /// crosses the vertical segment from corner (row, col) to (row + 1, col)
    V(usize, usize),
}

pub fn extract_contours(grid: &Grid, levels: &[f64]) -> Vec<(f64, Vec<LineString<f64>>)> {
    levels.iter().map(|&level| (level, contours_at_level(grid, level))).collect()
}

fn contours_at_level(grid: &Grid, level: f64) -> Vec<LineString<f64>> {
    let data = &grid.data;
    let (rows, cols) = (grid.rows(), grid.cols());
    if rows < 2 || cols < 2 {
        return Vec::new();
    }

    let mut points: HashMap<EdgeKey, (f64, f64)> = HashMap::new(); // (col,row) fractional index coords
    let mut adjacency: HashMap<EdgeKey, Vec<EdgeKey>> = HashMap::new();

    let mut link = |a: EdgeKey, b: EdgeKey, adjacency: &mut HashMap<EdgeKey, Vec<EdgeKey>>| {
        adjacency.entry(a).or_default().push(b);
        adjacency.entry(b).or_default().push(a);
    };

    for i in 0..rows - 1 {
        for j in 0..cols - 1 {
            let tl = data[[i, j]];
            let tr = data[[i, j + 1]];
            let br = data[[i + 1, j + 1]];
            let bl = data[[i + 1, j]];

            let case = (tl >= level) as u8
                | ((tr >= level) as u8) << 1
                | ((br >= level) as u8) << 2
                | ((bl >= level) as u8) << 3;

            if case == 0 || case == 15 { continue; }

            let top = EdgeKey::H(i, j);
            let bottom = EdgeKey::H(i + 1, j);
            let left = EdgeKey::V(i, j);
            let right = EdgeKey::V(i, j + 1);

            points.entry(top).or_insert_with(|| interp_h(i, j, tl, tr, level));
            points.entry(bottom).or_insert_with(|| interp_h(i + 1, j, bl, br, level));
            points.entry(left).or_insert_with(|| interp_v(i, j, tl, bl, level));
            points.entry(right).or_insert_with(|| interp_v(i, j + 1, tr, br, level));

            let avg_above = (tl + tr + br + bl) / 4.0 >= level;

            match case {
                1 | 14 => link(left, top, &mut adjacency),
                2 | 13 => link(top, right, &mut adjacency),
                3 | 12 => link(left, right, &mut adjacency),
                4 | 11 => link(right, bottom, &mut adjacency),
                6 | 9 => link(top, bottom, &mut adjacency),
                7 | 8 => link(bottom, left, &mut adjacency),
                5 => {
                    if avg_above {
                        link(left, top, &mut adjacency);
                        link(right, bottom, &mut adjacency);
                    } else {
                        link(top, right, &mut adjacency);
                        link(bottom, left, &mut adjacency);
                    }
                }
                10 => {
                    if avg_above {
                        link(top, right, &mut adjacency);
                        link(bottom, left, &mut adjacency);
                    } else {
                        link(left, top, &mut adjacency);
                        link(right, bottom, &mut adjacency);
                    }
                }
                _ => unreachable!("marching squares case {case} out of range"),
            }
        }
    }

    trace_chains(&adjacency, &points, grid)
}

fn interp_h(row: usize, col: usize, va: f64, vb: f64, level: f64) -> (f64, f64) {
    let t = crossing_fraction(va, vb, level);
    (col as f64 + t, row as f64)
}

fn interp_v(row: usize, col: usize, va: f64, vb: f64, level: f64) -> (f64, f64) {
    let t = crossing_fraction(va, vb, level);
    (col as f64, row as f64 + t)
}

/// fraction along the edge (0 = first corner, 1 = second corner) where `level`
/// is crossed; non-finite corners (padding/barrier cells) are clamped to the
/// finite end rather than producing NaN.
fn crossing_fraction(va: f64, vb: f64, level: f64) -> f64 {
    match (va.is_finite(), vb.is_finite()) {
        (true, true) => ((level - va) / (vb - va)).clamp(0.0, 1.0),
        (true, false) => 0.0,
        (false, true) => 1.0,
        (false, false) => 0.5,
    }
}

fn trace_chains(
    adjacency: &HashMap<EdgeKey, Vec<EdgeKey>>,
    points: &HashMap<EdgeKey, (f64, f64)>,
    grid: &Grid,
) -> Vec<LineString<f64>> {
    let mut used: std::collections::HashSet<(EdgeKey, EdgeKey)> = std::collections::HashSet::new();
    let seg_key = |a: EdgeKey, b: EdgeKey| if a <= b { (a, b) } else { (b, a) };

    let mut lines = Vec::new();

    for (&start, neighbors) in adjacency.iter() {
        for &next in neighbors {
            let key = seg_key(start, next);
            if used.contains(&key) { continue; }
            used.insert(key);

            let mut chain = vec![start, next];
            let mut tail = next;
            let mut prev = start;
            loop {
                let candidates = &adjacency[&tail];
                let next_hop = candidates.iter().copied().find(|&c| c != prev && !used.contains(&seg_key(tail, c)));
                match next_hop {
                    Some(c) => {
                        used.insert(seg_key(tail, c));
                        chain.push(c);
                        prev = tail;
                        tail = c;
                    }
                    None => break,
                }
            }

            let coords: Vec<_> = chain.iter()
                .map(|k| {
                    let (col, row) = points[k];
                    let (x, y) = grid.transform.index_to_world(col, row);
                    coord! { x: x, y: y }
                })
                .collect();
            if coords.len() >= 2 {
                lines.push(LineString::new(coords));
            }
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Transform;
    use geo::CoordsIter;

    #[test]
    fn single_level_cuts_a_flat_ramp() {
        let mut data = ndarray::Array2::zeros((5, 5));
        for i in 0..5 {
            for j in 0..5 {
                data[[i, j]] = j as f64;
            }
        }
        let transform = Transform::new(0.0, 0.0, 1.0, -1.0);
        let grid = Grid::new(data, transform, 4326);
        let contours = extract_contours(&grid, &[2.0]);
        assert_eq!(contours.len(), 1);
        let (level, lines) = &contours[0];
        assert_eq!(*level, 2.0);
        assert!(!lines.is_empty());
        for line in lines {
            assert!(line.coords_count() >= 2);
        }
    }
}
