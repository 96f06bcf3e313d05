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

//! Geodesic distance transform: Dijkstra's algorithm over a padded DEM grid,
//! with a 2.5D edge cost that blends elevation change into the planar
//! neighborhood distance.

use geo_types::LineString;

use crate::errors::{GdtError, Result};
use crate::grid::Grid;
use crate::heap::{IndexedMinHeap, PriorityQueue};

/// Default cells added around the DEM for safe neighborhood access, when the
/// caller does not supply `padding` (`spec.md` §6: `padding P`).
pub const DEFAULT_PAD_CELLS: i64 = 10;

/// Geodesic distance transform from `source_path` across `dem`.
///
/// `neighborhood_size` controls the adjacency degree: 1 evaluates the
/// immediate 8 neighbors, larger values widen the stencil. `z_multiplier`
/// scales elevation before it enters the cost so flatter or steeper terrain
/// can be emphasized relative to planar distance. `padding` is the number of
/// cells added around the DEM so the neighborhood stencil never runs off the
/// grid edge; it must be at least `neighborhood_size`.
pub fn gdt(
    dem: &Grid,
    source_path: &LineString<f64>,
    neighborhood_size: usize,
    z_multiplier: f64,
    padding: i64,
) -> Result<Grid> {
    if neighborhood_size == 0 {
        return Err(GdtError::InvalidNeighborhoodSize(neighborhood_size).into());
    }
    if source_path.coords_count() < 2 {
        return Err(GdtError::DegenerateSource.into());
    }
    if dem.transform.res_x <= 0.0 {
        return Err(GdtError::NonPositiveResolution(dem.transform.res_x).into());
    }
    if padding < neighborhood_size as i64 {
        return Err(GdtError::InsufficientPadding { padding, neighborhood_size }.into());
    }

    let mut padded = dem.pad(padding, f64::INFINITY)?;
    if z_multiplier != 1.0 {
        padded.data.mapv_inplace(|z| if z.is_finite() { z * z_multiplier } else { z });
    }

    let mut source = Grid::like(&padded, 0.0);
    source.draw_line(source_path, 1.0);

    if !source.data.iter().any(|&v| v == 1.0) {
        return Err(GdtError::SourceOutOfBounds.into());
    }

    let mut cost = Grid::like(&padded, f64::INFINITY);
    let (rows, cols) = (padded.rows(), padded.cols());
    let kernel = local_distance_kernel(neighborhood_size, padded.transform.res_x);

    let mut heap = IndexedMinHeap::with_capacity(rows * cols);
    let idx = |i: usize, j: usize| i * cols + j;

    for i in 0..rows {
        for j in 0..cols {
            if source.data[[i, j]] == 1.0 {
                cost.data[[i, j]] = 0.0;
                heap.push_or_decrease(idx(i, j), 0.0);
            }
        }
    }

    let k = neighborhood_size as i64;
    while let Some((id, distance)) = heap.pop_min() {
        let (i, j) = (id / cols, id % cols);
        if distance > cost.data[[i, j]] {
            continue; // stale entry, a shorter path was already relaxed in
        }
        for ii in -k..=k {
            for jj in -k..=k {
                if ii == 0 && jj == 0 { continue; }
                let ni = i as i64 + ii;
                let nj = j as i64 + jj;
                if ni < 0 || nj < 0 || ni >= rows as i64 || nj >= cols as i64 { continue; }
                let (ni, nj) = (ni as usize, nj as usize);

                let dz = padded.data[[i, j]] - padded.data[[ni, nj]];
                if !dz.is_finite() { continue; }
                let step = (dz * dz + kernel[[(ii + k) as usize, (jj + k) as usize]]).sqrt();
                let neighbor_distance = distance + step;

                if neighbor_distance < cost.data[[ni, nj]] {
                    cost.data[[ni, nj]] = neighbor_distance;
                    heap.push_or_decrease(idx(ni, nj), neighbor_distance);
                }
            }
        }
    }

    // unreachable cells (shadowed by +inf padding/barriers) are left at +inf
    cost.pad(-padding, 0.0)
}

/// Squared Euclidean distance from the kernel center, scaled by `scale` so the
/// edge cost avoids a square root on every neighborhood evaluation.
fn local_distance_kernel(neighborhood_size: usize, scale: f64) -> ndarray::Array2<f64> {
    let k = neighborhood_size as i64;
    let n = (2 * neighborhood_size + 1) as usize;
    let mut kernel = ndarray::Array2::zeros((n, n));
    for i in -k..=k {
        for j in -k..=k {
            let d = ((i * i + j * j) as f64).sqrt() * scale;
            kernel[[(i + k) as usize, (j + k) as usize]] = d * d;
        }
    }
    kernel
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Transform;
    use geo_types::{coord, line_string};

    fn flat_dem(rows: usize, cols: usize, res: f64) -> Grid {
        let data = ndarray::Array2::zeros((rows, cols));
        let transform = Transform::new(0.0, 0.0, res, -res);
        Grid::new(data, transform, 4326)
    }

    #[test]
    fn flat_dem_distance_grows_with_planar_offset() {
        let dem = flat_dem(40, 40, 10.0);
        let source = line_string![coord! {x: 0.0, y: -5.0}, coord! {x: 390.0, y: -5.0}];
        let result = gdt(&dem, &source, 1, 1.0, DEFAULT_PAD_CELLS).unwrap();
        let d_near = result.data[[0, 20]];
        let d_far = result.data[[39, 20]];
        assert!(d_near < d_far);
        assert!(d_near.is_finite() && d_far.is_finite());
    }

    #[test]
    fn degenerate_source_is_rejected() {
        let dem = flat_dem(10, 10, 10.0);
        let source = line_string![coord! {x: 0.0, y: 0.0}];
        assert!(gdt(&dem, &source, 1, 1.0, DEFAULT_PAD_CELLS).is_err());
    }

    #[test]
    fn padding_smaller_than_neighborhood_is_rejected() {
        let dem = flat_dem(10, 10, 10.0);
        let source = line_string![coord! {x: 0.0, y: -5.0}, coord! {x: 90.0, y: -5.0}];
        assert!(gdt(&dem, &source, 3, 1.0, 2).is_err());
    }

    #[test]
    fn source_cells_cost_zero() {
        let dem = flat_dem(20, 20, 1.0);
        let source = line_string![coord! {x: 0.0, y: -5.0}, coord! {x: 19.0, y: -5.0}];
        let result = gdt(&dem, &source, 1, 1.0, DEFAULT_PAD_CELLS).unwrap();
        assert_eq!(result.data[[5, 10]], 0.0);
    }

    #[test]
    fn flat_dem_row_distance_matches_row_index() {
        // S1: flat DEM, source along row 0, 1 m cells -> C[r,c] ~= r.
        let dem = flat_dem(30, 30, 1.0);
        let source = line_string![coord! {x: 0.0, y: -0.0}, coord! {x: 29.0, y: -0.0}];
        let result = gdt(&dem, &source, 1, 1.0, DEFAULT_PAD_CELLS).unwrap();
        for r in 0..30 {
            assert!((result.data[[r, 15]] - r as f64).abs() < 1e-6, "row {r}: {}", result.data[[r, 15]]);
        }
    }

    #[test]
    fn inclined_plane_distance_matches_slope_length() {
        // S2: z = 2*row, so each vertical step costs sqrt(1 + 4) = sqrt(5).
        let data = {
            let mut d = ndarray::Array2::zeros((30, 30));
            for i in 0..30 {
                for j in 0..30 {
                    d[[i, j]] = 2.0 * i as f64;
                }
            }
            d
        };
        let transform = Transform::new(0.0, 0.0, 1.0, -1.0);
        let dem = Grid::new(data, transform, 4326);
        let source = line_string![coord! {x: 0.0, y: -0.0}, coord! {x: 29.0, y: -0.0}];
        let result = gdt(&dem, &source, 1, 1.0, DEFAULT_PAD_CELLS).unwrap();
        let expected = 10.0 * 5f64.sqrt();
        assert!((result.data[[10, 15]] - expected).abs() < 1e-6);
    }

    #[test]
    fn barrier_row_blocks_reachability() {
        // S3: an impassable no-data band leaves everything past it at +inf.
        let data = {
            let mut d = ndarray::Array2::zeros((20, 20));
            for j in 0..20 {
                d[[10, j]] = f64::INFINITY;
                d[[11, j]] = f64::INFINITY;
            }
            d
        };
        let transform = Transform::new(0.0, 0.0, 1.0, -1.0);
        let dem = Grid::new(data, transform, 4326);
        let source = line_string![coord! {x: 0.0, y: -0.0}, coord! {x: 19.0, y: -0.0}];
        let result = gdt(&dem, &source, 1, 1.0, DEFAULT_PAD_CELLS).unwrap();
        assert!(result.data[[15, 10]].is_infinite());
    }
}
