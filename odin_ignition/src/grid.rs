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

//! Raster grid with an affine world transform, the substrate `gdt` and
//! `contour` operate on.
//!
//! Convention (fixed per the north-up / negative-`res_y` design decision):
//! row 0 is the northernmost row, `res_y` is negative, `res_x` is positive.

use geo_types::{Coord, LineString};
use nalgebra::Matrix3;
use ndarray::Array2;

use crate::errors::{GridError, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Bounds {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Result<Self> {
        let b = Bounds { west, south, east, north };
        if west > east || south > north {
            return Err(GridError::InvalidBounds(b).into());
        }
        Ok(b)
    }
}

/// Affine mapping between (col, row) raster space and (x, y) world space.
#[derive(Debug, Clone, Copy)]
pub struct Transform {
    pub upper_left_x: f64,
    pub upper_left_y: f64,
    pub res_x: f64,
    pub res_y: f64,
    forward: Matrix3<f64>,
    inverse: Matrix3<f64>,
}

impl Transform {
    pub fn new(upper_left_x: f64, upper_left_y: f64, res_x: f64, res_y: f64) -> Self {
        let forward = Matrix3::new(
            res_x, 0.0, upper_left_x,
            0.0, res_y, upper_left_y,
            0.0, 0.0, 1.0,
        );
        let inverse = forward.try_inverse().expect("degenerate transform: resolution must be non-zero");
        Transform { upper_left_x, upper_left_y, res_x, res_y, forward, inverse }
    }

    /// world (x,y) -> fractional (col,row)
    pub fn world_to_index(&self, x: f64, y: f64) -> (f64, f64) {
        let v = self.inverse * nalgebra::Vector3::new(x, y, 1.0);
        (v.x, v.y)
    }

    /// fractional (col,row) -> world (x,y)
    pub fn index_to_world(&self, col: f64, row: f64) -> (f64, f64) {
        let v = self.forward * nalgebra::Vector3::new(col, row, 1.0);
        (v.x, v.y)
    }

    /// world (x,y) -> nearest integer (row,col), snapping to cell center.
    pub fn world_to_cell(&self, x: f64, y: f64) -> (i64, i64) {
        let (col, row) = self.world_to_index(x, y);
        ((row + 0.5).floor() as i64, (col + 0.5).floor() as i64)
    }

    pub fn shifted(&self, d_col: f64, d_row: f64) -> Self {
        let (x, y) = self.index_to_world(d_col, d_row);
        Transform::new(x, y, self.res_x, self.res_y)
    }
}

#[derive(Debug, Clone)]
pub struct Grid {
    pub data: Array2<f64>,
    pub transform: Transform,
    pub crs: u32,
}

impl Grid {
    pub fn new(data: Array2<f64>, transform: Transform, crs: u32) -> Self {
        Grid { data, transform, crs }
    }

    pub fn like(grid: &Grid, fill_value: f64) -> Self {
        Grid {
            data: Array2::from_elem(grid.data.dim(), fill_value),
            transform: grid.transform,
            crs: grid.crs,
        }
    }

    pub fn rows(&self) -> usize { self.data.nrows() }
    pub fn cols(&self) -> usize { self.data.ncols() }

    pub fn bounds(&self) -> Bounds {
        let t = &self.transform;
        let west = t.upper_left_x;
        let north = t.upper_left_y;
        let east = west + self.cols() as f64 * t.res_x;
        let south = north + self.rows() as f64 * t.res_y;
        // res_x > 0, res_y < 0 by convention, so `south` and `north`/`east` fall out ordered;
        // normalize defensively in case a caller built a Grid with the opposite sign.
        Bounds {
            west: west.min(east), east: west.max(east),
            south: south.min(north), north: south.max(north),
        }
    }

    /// Extract the sub-grid covering `bounds`, snapped to whole cells and grown
    /// by `padding_cells` on every side.
    pub fn extract_by_bounds(&self, bounds: &Bounds, padding_cells: i64) -> Result<Grid> {
        let t = &self.transform;

        let qx1 = (((bounds.west - t.upper_left_x) / t.res_x - 0.5).floor() as i64) - padding_cells;
        let qx2 = (((bounds.east - t.upper_left_x) / t.res_x + 0.5).ceil() as i64) + padding_cells;
        let qy1 = (((bounds.north - t.upper_left_y) / t.res_y - 0.5).floor() as i64) - padding_cells;
        let qy2 = (((bounds.south - t.upper_left_y) / t.res_y + 0.5).ceil() as i64) + padding_cells;

        let row0 = qy1.clamp(0, self.rows() as i64) as usize;
        let row1 = qy2.clamp(row0 as i64, self.rows() as i64) as usize;
        let col0 = qx1.clamp(0, self.cols() as i64) as usize;
        let col1 = qx2.clamp(col0 as i64, self.cols() as i64) as usize;

        if row1 <= row0 || col1 <= col0 {
            return Err(GridError::ShapeMismatch { expected: (1, 1), got: (row1 - row0, col1 - col0) }.into());
        }

        let sub = self.data.slice(ndarray::s![row0..row1, col0..col1]).to_owned();
        let new_transform = t.shifted(col0 as f64, row0 as f64);
        Ok(Grid::new(sub, new_transform, self.crs))
    }

    /// Pad (n > 0) or crop (n < 0) the grid by `n` cells on every side.
    pub fn pad(&self, n: i64, fill: f64) -> Result<Grid> {
        let (rows, cols) = (self.rows() as i64, self.cols() as i64);
        let new_rows = rows + 2 * n;
        let new_cols = cols + 2 * n;
        if new_rows <= 0 || new_cols <= 0 {
            return Err(GridError::InvalidPad(n).into());
        }

        let mut data = Array2::from_elem((new_rows as usize, new_cols as usize), fill);
        if n >= 0 {
            let n = n as usize;
            data.slice_mut(ndarray::s![n..n + self.rows(), n..n + self.cols()])
                .assign(&self.data);
        } else {
            let c = (-n) as usize;
            let cropped = self.data.slice(ndarray::s![c..c + new_rows as usize, c..c + new_cols as usize]);
            data.assign(&cropped);
        }

        let t = &self.transform;
        let new_transform = Transform::new(
            t.upper_left_x - n as f64 * t.res_x,
            t.upper_left_y - n as f64 * t.res_y,
            t.res_x,
            t.res_y,
        );
        Ok(Grid::new(data, new_transform, self.crs))
    }

    /// Rasterize `line`'s segments into the grid using Bresenham's algorithm.
    /// Cells outside the grid extent are silently clipped.
    pub fn draw_line(&mut self, line: &LineString<f64>, fill: f64) {
        let cells: Vec<(i64, i64)> = line.coords()
            .map(|c| self.transform.world_to_cell(c.x, c.y))
            .collect();

        for pair in cells.windows(2) {
            let (r0, c0) = pair[0];
            let (r1, c1) = pair[1];
            for (r, c) in bresenham(r0, c0, r1, c1) {
                if r >= 0 && c >= 0 && (r as usize) < self.rows() && (c as usize) < self.cols() {
                    self.data[[r as usize, c as usize]] = fill;
                }
            }
        }
    }

    /// Apply an isotropic Gaussian blur of standard deviation `sigma` cells,
    /// separable along rows then columns, clamped at the edges.
    pub fn smooth(&mut self, sigma: f64) -> Result<()> {
        if sigma <= 0.0 {
            return Err(GridError::InvalidSigma(sigma).into());
        }
        let kernel = gaussian_kernel(sigma);
        let radius = (kernel.len() / 2) as i64;

        let (rows, cols) = self.data.dim();
        let mut tmp = Array2::zeros((rows, cols));
        // horizontal pass
        for r in 0..rows {
            for c in 0..cols {
                let mut acc = 0.0;
                for (k, w) in kernel.iter().enumerate() {
                    let cc = (c as i64 + k as i64 - radius).clamp(0, cols as i64 - 1) as usize;
                    acc += w * self.data[[r, cc]];
                }
                tmp[[r, c]] = acc;
            }
        }
        // vertical pass
        let mut out = Array2::zeros((rows, cols));
        for r in 0..rows {
            for c in 0..cols {
                let mut acc = 0.0;
                for (k, w) in kernel.iter().enumerate() {
                    let rr = (r as i64 + k as i64 - radius).clamp(0, rows as i64 - 1) as usize;
                    acc += w * tmp[[rr, c]];
                }
                out[[r, c]] = acc;
            }
        }
        self.data = out;
        Ok(())
    }

    /// Extract isolines at each level in `levels`. See [`crate::contour`].
    pub fn get_contours(&self, levels: &[f64]) -> Vec<(f64, Vec<LineString<f64>>)> {
        crate::contour::extract_contours(self, levels)
    }
}

fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (3.0 * sigma).ceil().max(1.0) as i64;
    let mut kernel: Vec<f64> = (-radius..=radius)
        .map(|i| {
            let x = i as f64;
            (-0.5 * (x * x) / (sigma * sigma)).exp()
        })
        .collect();
    let sum: f64 = kernel.iter().sum();
    for w in kernel.iter_mut() { *w /= sum; }
    kernel
}

/// Bresenham's line algorithm over integer (row, col) grid indices.
fn bresenham(r0: i64, c0: i64, r1: i64, c1: i64) -> Vec<(i64, i64)> {
    let mut points = Vec::new();
    let (mut r, mut c) = (r0, c0);
    let dr = (r1 - r0).abs();
    let dc = (c1 - c0).abs();
    let sr = if r0 < r1 { 1 } else { -1 };
    let sc = if c0 < c1 { 1 } else { -1 };
    let mut err = dc - dr;

    loop {
        points.push((r, c));
        if r == r1 && c == c1 { break; }
        let e2 = 2 * err;
        if e2 > -dr {
            err -= dr;
            c += sc;
        }
        if e2 < dc {
            err += dc;
            r += sr;
        }
    }
    points
}

pub fn coord(x: f64, y: f64) -> Coord<f64> { Coord { x, y } }

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::line_string;

    #[test]
    fn transform_round_trips_within_one_cell() {
        let t = Transform::new(500_000.0, 4_000_000.0, 10.0, -10.0);
        for &(x, y) in &[(500_005.0, 3_999_995.0), (500_123.4, 3_998_765.0)] {
            let (col, row) = t.world_to_index(x, y);
            let (x2, y2) = t.index_to_world(col, row);
            assert!((x2 - x).abs() < 1e-6);
            assert!((y2 - y).abs() < 1e-6);
        }
    }

    #[test]
    fn bounds_are_derived_from_shape_and_resolution() {
        let data = Array2::zeros((10, 20));
        let transform = Transform::new(0.0, 100.0, 5.0, -5.0);
        let grid = Grid::new(data, transform, 4326);
        let bounds = grid.bounds();
        assert_eq!(bounds.west, 0.0);
        assert_eq!(bounds.north, 100.0);
        assert_eq!(bounds.east, 100.0); // 20 cols * 5m
        assert_eq!(bounds.south, 50.0); // 100 - 10 rows * 5m
    }

    #[test]
    fn pad_grows_shape_and_shifts_upper_left() {
        let data = Array2::from_elem((5, 5), 1.0);
        let transform = Transform::new(0.0, 0.0, 1.0, -1.0);
        let grid = Grid::new(data, transform, 4326);
        let padded = grid.pad(2, 0.0).unwrap();
        assert_eq!(padded.data.dim(), (9, 9));
        assert_eq!(padded.data[[0, 0]], 0.0);
        assert_eq!(padded.data[[2, 2]], 1.0);
        assert_eq!(padded.transform.upper_left_x, -2.0);
    }

    #[test]
    fn crop_with_negative_pad_recovers_original() {
        let data = Array2::from_elem((5, 5), 1.0);
        let transform = Transform::new(0.0, 0.0, 1.0, -1.0);
        let grid = Grid::new(data, transform, 4326);
        let padded = grid.pad(2, 0.0).unwrap();
        let cropped = padded.pad(-2, 0.0).unwrap();
        assert_eq!(cropped.data.dim(), (5, 5));
        assert!(cropped.data.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn draw_line_rasterizes_a_horizontal_source() {
        let data = Array2::zeros((10, 10));
        let transform = Transform::new(0.0, 0.0, 1.0, -1.0);
        let mut grid = Grid::new(data, transform, 4326);
        // y=0.0 snaps to row 0; x in [0.0, 9.0] spans every column.
        let line = line_string![(x: 0.0, y: 0.0), (x: 9.0, y: 0.0)];
        grid.draw_line(&line, 1.0);
        assert!(grid.data.row(0).iter().all(|&v| v == 1.0));
        assert!(grid.data.row(1).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn extract_by_bounds_clamps_to_grid_extent() {
        let data = Array2::zeros((10, 10));
        let transform = Transform::new(0.0, 0.0, 1.0, -1.0);
        let grid = Grid::new(data, transform, 4326);
        let bounds = Bounds::new(-100.0, -100.0, 100.0, 100.0).unwrap();
        let sub = grid.extract_by_bounds(&bounds, 0).unwrap();
        assert_eq!(sub.data.dim(), (10, 10));
    }

    #[test]
    fn smooth_rejects_non_positive_sigma() {
        let data = Array2::zeros((5, 5));
        let transform = Transform::new(0.0, 0.0, 1.0, -1.0);
        let mut grid = Grid::new(data, transform, 4326);
        assert!(grid.smooth(0.0).is_err());
    }
}
