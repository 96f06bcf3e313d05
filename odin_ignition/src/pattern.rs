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

//! Spatiotemporal ignition patterns and the propagator that pushes arrival
//! times through a technique's spatial paths.

use std::collections::HashMap;

use geo::{EuclideanDistance, EuclideanLength, LineInterpolatePoint};
use geo_types::{Coord, LineString, MultiLineString, MultiPoint, Point};
use serde::Serialize;
use tracing::warn;

use crate::errors::{op_failed, PatternError, Result};
use crate::personnel::{Igniter, IgnitionCrew};

/// A path's geometry once the igniter's dispatch style has been applied.
#[derive(Debug, Clone)]
pub enum PathGeometry {
    Line(LineString<f64>),
    Dashes(MultiLineString<f64>),
    Dots(MultiPoint<f64>),
}

/// Arrival times paired with `PathGeometry`: one time per coordinate for a
/// continuous line or dotted path, one `(start, end)` pair per dash.
#[derive(Debug, Clone)]
pub enum PathTimes {
    PerVertex(Vec<f64>),
    PerDash(Vec<(f64, f64)>),
}

impl PathTimes {
    fn flat(&self) -> Vec<f64> {
        match self {
            PathTimes::PerVertex(v) => v.clone(),
            PathTimes::PerDash(v) => v.iter().flat_map(|&(a, b)| [a, b]).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Path {
    pub heat: usize,
    pub igniter: usize,
    pub leg: usize,
    pub geometry: PathGeometry,
    pub times: PathTimes,
}

/// The purely spatial path a firing technique lays out, before the
/// propagator assigns it arrival times.
#[derive(Debug, Clone)]
pub struct InitPath {
    pub heat: usize,
    pub igniter: usize,
    pub leg: usize,
    pub geometry: LineString<f64>,
}

#[derive(Debug, Clone)]
pub struct Pattern {
    pub paths: Vec<Path>,
    pub epsg: u32,
    pub elapsed_time: f64,
}

impl Pattern {
    pub fn new(paths: Vec<Path>, epsg: u32) -> Self {
        let elapsed_time = elapsed_time_of(&paths);
        Pattern { paths, epsg, elapsed_time }
    }

    pub fn translate(&self, x_off: f64, y_off: f64) -> Pattern {
        let paths = self.paths.iter().map(|p| Path {
            heat: p.heat, igniter: p.igniter, leg: p.leg,
            geometry: translate_geometry(&p.geometry, x_off, y_off),
            times: p.times.clone(),
        }).collect();
        Pattern { paths, epsg: self.epsg, elapsed_time: self.elapsed_time }
    }

    /// Merge `other` into `self`, delaying every one of `other`'s arrival
    /// times by this pattern's maximum time plus `time_offset`.
    pub fn merge(&self, other: &Pattern, time_offset: f64) -> Result<Pattern> {
        if self.epsg != other.epsg {
            return Err(PatternError::IncompatibleCrs(self.epsg, other.epsg).into());
        }
        let self_max = self.paths.iter().flat_map(|p| p.times.flat()).fold(f64::NEG_INFINITY, f64::max);
        let delay = self_max + time_offset;

        let mut paths = self.paths.clone();
        for p in &other.paths {
            paths.push(Path {
                heat: p.heat, igniter: p.igniter, leg: p.leg,
                geometry: p.geometry.clone(),
                times: delay_times(&p.times, delay),
            });
        }
        let elapsed_time = self.elapsed_time + time_offset + other.elapsed_time;
        Ok(Pattern { paths, epsg: self.epsg, elapsed_time })
    }

    /// The "Pattern consumer" contract from `spec.md` §6: parallel arrays
    /// of `heat`/`igniter`/`leg`/`times`/`geometry`, plus the CRS and
    /// elapsed time. This is the only serializable view of a `Pattern` -
    /// downstream GeoJSON/fire-model export is an adapter's job, not the
    /// core's.
    pub fn to_record(&self) -> PatternRecord {
        let paths = self.paths.iter().map(PathRecord::from).collect();
        PatternRecord { paths, epsg: self.epsg, elapsed_time: self.elapsed_time }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PatternRecord {
    pub paths: Vec<PathRecord>,
    pub epsg: u32,
    pub elapsed_time: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PathRecord {
    pub heat: usize,
    pub igniter: usize,
    pub leg: usize,
    /// one `(x, y)` pair per vertex (lines/dots) or per dash endpoint
    pub geometry: Vec<(f64, f64)>,
    /// one scalar per vertex for lines/dots, one `(start, end)` pair
    /// flattened to two scalars per dash
    pub times: Vec<f64>,
}

impl From<&Path> for PathRecord {
    fn from(p: &Path) -> Self {
        let geometry = match &p.geometry {
            PathGeometry::Line(l) => l.coords().map(|c| (c.x, c.y)).collect(),
            PathGeometry::Dashes(ml) => ml.iter().flat_map(|l| l.coords().map(|c| (c.x, c.y))).collect(),
            PathGeometry::Dots(mp) => mp.iter().map(|p| (p.x(), p.y())).collect(),
        };
        PathRecord { heat: p.heat, igniter: p.igniter, leg: p.leg, geometry, times: p.times.flat() }
    }
}

fn elapsed_time_of(paths: &[Path]) -> f64 {
    let all: Vec<f64> = paths.iter().flat_map(|p| p.times.flat()).collect();
    if all.is_empty() { return 0.0; }
    let min = all.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = all.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    max - min
}

fn delay_times(times: &PathTimes, delay: f64) -> PathTimes {
    match times {
        PathTimes::PerVertex(v) => PathTimes::PerVertex(v.iter().map(|t| t + delay).collect()),
        PathTimes::PerDash(v) => PathTimes::PerDash(v.iter().map(|&(a, b)| (a + delay, b + delay)).collect()),
    }
}

fn translate_geometry(geom: &PathGeometry, dx: f64, dy: f64) -> PathGeometry {
    let shift = |c: &Coord<f64>| Coord { x: c.x + dx, y: c.y + dy };
    match geom {
        PathGeometry::Line(l) => PathGeometry::Line(LineString::new(l.coords().map(shift).collect())),
        PathGeometry::Dashes(ml) => PathGeometry::Dashes(MultiLineString::new(
            ml.iter().map(|l| LineString::new(l.coords().map(shift).collect())).collect(),
        )),
        PathGeometry::Dots(mp) => PathGeometry::Dots(MultiPoint::new(
            mp.iter().map(|p| Point::new(p.x() + dx, p.y() + dy)).collect(),
        )),
    }
}

/// Stagger spacing, end-time synchronization and return-trip accounting for
/// a spatial path layout.
pub struct TemporalPropagator {
    pub spacing: f64,
    pub sync_end_time: bool,
    pub return_trip: bool,
}

impl TemporalPropagator {
    pub fn new(spacing: f64, sync_end_time: bool, return_trip: bool) -> Self {
        TemporalPropagator { spacing, sync_end_time, return_trip }
    }

    pub fn forward(&self, mut paths: Vec<InitPath>, crew: &IgnitionCrew, heat_delay: f64) -> Result<Vec<Path>> {
        paths.retain(|p| {
            let keep = p.geometry.coords_count() >= 2;
            if !keep {
                warn!(heat = p.heat, igniter = p.igniter, leg = p.leg, "skipping path with fewer than two vertices");
            }
            keep
        });
        paths.sort_by_key(|p| (p.heat, p.igniter, p.leg));

        let mut start_end: HashMap<(usize, usize, usize), (f64, f64)> = HashMap::new();

        for p in &paths {
            let (i, j, k) = (p.heat, p.igniter, p.leg);
            if j >= crew.len() {
                return Err(op_failed!("no igniter assigned at index {j}"));
            }
            let velocity = crew[j].velocity;

            let mut start_time = if k != 0 {
                let &(_, prev_end) = start_end.get(&(i, j, k - 1))
                    .ok_or_else(|| op_failed!("leg {k} of igniter {j} has no preceding leg"))?;
                let prev_geom = find_path(&paths, i, j, k - 1)?;
                // minimum distance between the two leg geometries, not just their
                // nearest endpoints (driptorch/pattern.py: shapely's `distance`).
                let distance = prev_geom.geometry.euclidean_distance(&p.geometry);
                prev_end + distance / velocity
            } else if i != 0 && j == 0 {
                let prev_heat_max_end = start_end.iter()
                    .filter(|&(&(hi, _, _), _)| hi == i - 1)
                    .map(|(_, &(_, end))| end)
                    .fold(f64::NEG_INFINITY, f64::max);
                let mut st = prev_heat_max_end;
                if self.return_trip {
                    st += p.geometry.euclidean_length() / velocity;
                }
                st
            } else if j != 0 {
                let &(prev_start, _) = start_end.get(&(i, j - 1, 0))
                    .ok_or_else(|| op_failed!("igniter {j} has no preceding igniter in heat {i}"))?;
                let prev_geom = find_path(&paths, i, j - 1, 0)?;
                prev_start + get_offset(prev_geom, p, self.spacing, velocity)?
            } else {
                0.0
            };

            if i > 0 {
                start_time += heat_delay;
            }

            let end_time = start_time + p.geometry.euclidean_length() / velocity;
            start_end.insert((i, j, k), (start_time, end_time));
        }

        let min_start = start_end.values().map(|&(s, _)| s).fold(f64::INFINITY, f64::min);
        if min_start != 0.0 {
            for v in start_end.values_mut() {
                v.0 -= min_start;
                v.1 -= min_start;
            }
        }

        if self.sync_end_time {
            let heats: std::collections::BTreeSet<usize> = paths.iter().map(|p| p.heat).collect();
            for h in heats {
                let max_end = start_end.iter()
                    .filter(|&(&(hi, _, _), _)| hi == h)
                    .map(|(_, &(_, e))| e)
                    .fold(f64::NEG_INFINITY, f64::max);
                for (&(hi, _, _), v) in start_end.iter_mut() {
                    if hi == h {
                        v.0 += max_end - v.1;
                        v.1 = max_end;
                    }
                }
            }
        }

        paths.iter()
            .map(|p| {
                let &(start, _) = &start_end[&(p.heat, p.igniter, p.leg)];
                let igniter = &crew[p.igniter];
                compute_arrival(p, start, igniter)
            })
            .collect()
    }
}

fn find_path<'a>(paths: &'a [InitPath], heat: usize, igniter: usize, leg: usize) -> Result<&'a InitPath> {
    paths.iter()
        .find(|p| p.heat == heat && p.igniter == igniter && p.leg == leg)
        .ok_or_else(|| op_failed!("missing path heat={heat} igniter={igniter} leg={leg}"))
}

fn endpoint_distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

/// Offset time between consecutive igniters in a heat, from the vector
/// projection of the current igniter's start onto the previous igniter's
/// initial heading, plus the configured stagger spacing.
fn get_offset(prev: &InitPath, cur: &InitPath, spacing: f64, velocity: f64) -> Result<f64> {
    let prev_coords: Vec<Coord<f64>> = prev.geometry.coords().copied().collect();
    if prev_coords.len() < 2 {
        return Err(op_failed!("igniter path needs at least two vertices to compute stagger offset"));
    }
    let cur_first = *cur.geometry.coords().next()
        .ok_or_else(|| op_failed!("igniter path has no coordinates"))?;
    let prev_first = prev_coords[0];
    let prev_second = prev_coords[1];

    let a = Coord { x: cur_first.x - prev_first.x, y: cur_first.y - prev_first.y };
    let b = Coord { x: prev_second.x - prev_first.x, y: prev_second.y - prev_first.y };
    let b_norm = (b.x * b.x + b.y * b.y).sqrt();
    let offset_distance = (a.x * b.x + a.y * b.y) / b_norm;

    Ok((spacing + offset_distance) / velocity)
}

fn compute_arrival(p: &InitPath, start_time: f64, igniter: &Igniter) -> Result<Path> {
    if igniter.is_continuous() {
        Ok(lines_dispatch(p, start_time, igniter.velocity))
    } else if igniter.is_dashed() {
        dashes_dispatch(p, start_time, igniter.velocity, igniter.gap_length, igniter.dash_length.unwrap())
    } else {
        let gap = igniter.gap_length.ok_or_else(|| op_failed!("point igniter requires a gap_length"))?;
        dots_dispatch(p, start_time, igniter.velocity, gap)
    }
}

fn lines_dispatch(p: &InitPath, start_time: f64, velocity: f64) -> Path {
    let coords: Vec<Coord<f64>> = p.geometry.coords().copied().collect();
    let mut times = Vec::with_capacity(coords.len());
    let mut arrival = start_time;
    times.push(arrival);
    for pair in coords.windows(2) {
        let meters = endpoint_distance(pair[0], pair[1]);
        arrival += meters / velocity;
        times.push(arrival);
    }
    Path {
        heat: p.heat, igniter: p.igniter, leg: p.leg,
        geometry: PathGeometry::Line(p.geometry.clone()),
        times: PathTimes::PerVertex(times),
    }
}

fn dashes_dispatch(p: &InitPath, start_time: f64, velocity: f64, gap_length: Option<f64>, dash_length: f64) -> Result<Path> {
    let length = p.geometry.euclidean_length();
    let mut distances = Vec::new();
    match gap_length {
        None => {
            let mut d = 0.0;
            while d < length {
                distances.push(d);
                d += dash_length;
            }
        }
        Some(gap) => {
            let mut sum_length = 0.0;
            let mut toggle = true;
            while sum_length < length {
                distances.push(sum_length);
                sum_length += if toggle { dash_length } else { gap };
                toggle = !toggle;
            }
        }
    }

    let points: Vec<Point<f64>> = distances.iter()
        .map(|&d| {
            let fraction = (d / length).clamp(0.0, 1.0);
            p.geometry.line_interpolate_point(fraction)
                .ok_or_else(|| op_failed!("failed to interpolate point at distance {d}"))
        })
        .collect::<Result<_>>()?;

    let mut dash_times = Vec::new();
    let mut dash_lines = Vec::new();
    let mut fire = true;
    let mut start = start_time;

    for pair in points.windows(2) {
        let xy = pair[0];
        let next_xy = pair[1];
        let meters = endpoint_distance(xy.into(), next_xy.into());
        let end = start + meters / velocity;

        if fire {
            dash_times.push((start, end));
            dash_lines.push(LineString::new(vec![xy.into(), next_xy.into()]));
        }
        fire = !fire;
        start = end;
    }

    Ok(Path {
        heat: p.heat, igniter: p.igniter, leg: p.leg,
        geometry: PathGeometry::Dashes(MultiLineString::new(dash_lines)),
        times: PathTimes::PerDash(dash_times),
    })
}

fn dots_dispatch(p: &InitPath, start_time: f64, velocity: f64, gap_length: f64) -> Result<Path> {
    let length = p.geometry.euclidean_length();
    let mut distances = Vec::new();
    let mut d = 0.0;
    while d < length {
        distances.push(d);
        d += gap_length;
    }

    let points: Vec<Point<f64>> = distances.iter()
        .map(|&d| {
            let fraction = (d / length).clamp(0.0, 1.0);
            p.geometry.line_interpolate_point(fraction)
                .ok_or_else(|| op_failed!("failed to interpolate point at distance {d}"))
        })
        .collect::<Result<_>>()?;

    let mut times = vec![start_time];
    let mut arrival = start_time;
    for pair in points.windows(2) {
        let meters = endpoint_distance(pair[0].into(), pair[1].into());
        arrival += meters / velocity;
        times.push(arrival);
    }

    Ok(Path {
        heat: p.heat, igniter: p.igniter, leg: p.leg,
        geometry: PathGeometry::Dots(MultiPoint::new(points)),
        times: PathTimes::PerVertex(times),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::line_string;

    fn straight_path(heat: usize, igniter: usize, x0: f64) -> InitPath {
        InitPath {
            heat, igniter, leg: 0,
            geometry: line_string![(x: x0, y: 0.0), (x: x0, y: 100.0)],
        }
    }

    #[test]
    fn continuous_line_times_are_monotonic() {
        let crew = IgnitionCrew::from_list(vec![Igniter::new(1.0, None, None)], true).unwrap();
        let propagator = TemporalPropagator::new(0.0, false, false);
        let paths = propagator.forward(vec![straight_path(0, 0, 0.0)], &crew, 0.0).unwrap();
        let times = match &paths[0].times { PathTimes::PerVertex(v) => v.clone(), _ => panic!() };
        assert!(times.windows(2).all(|w| w[1] >= w[0]));
        assert!((times.last().unwrap() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn second_heat_is_delayed_by_heat_delay() {
        let crew = IgnitionCrew::from_list(vec![Igniter::new(1.0, None, None)], true).unwrap();
        let propagator = TemporalPropagator::new(0.0, false, false);
        let paths = propagator.forward(
            vec![straight_path(0, 0, 0.0), straight_path(1, 0, 10.0)],
            &crew, 25.0,
        ).unwrap();
        let heat1_start = match &paths[1].times { PathTimes::PerVertex(v) => v[0], _ => panic!() };
        assert!(heat1_start >= 25.0);
    }

    #[test]
    fn sync_end_time_equalizes_unequal_heats_and_delays_the_shorter_path() {
        // S6: two igniters in one heat, unequal path lengths, sync_end_time=true.
        let crew = IgnitionCrew::from_list(
            vec![Igniter::new(1.0, None, None), Igniter::new(1.0, None, None)],
            true,
        ).unwrap();
        let propagator = TemporalPropagator::new(10.0, true, false);
        let long_path = InitPath { heat: 0, igniter: 0, leg: 0, geometry: line_string![(x: 0.0, y: 0.0), (x: 0.0, y: 100.0)] };
        let short_path = InitPath { heat: 0, igniter: 1, leg: 0, geometry: line_string![(x: 0.0, y: 0.0), (x: 0.0, y: 50.0)] };
        let paths = propagator.forward(vec![long_path, short_path], &crew, 0.0).unwrap();

        let end_of = |p: &Path| match &p.times { PathTimes::PerVertex(v) => *v.last().unwrap(), _ => panic!() };
        let start_of = |p: &Path| match &p.times { PathTimes::PerVertex(v) => v[0], _ => panic!() };
        assert!((end_of(&paths[0]) - end_of(&paths[1])).abs() < 1e-9);
        assert!(start_of(&paths[1]) > start_of(&paths[0]));
    }

    #[test]
    fn path_with_fewer_than_two_vertices_is_skipped() {
        let crew = IgnitionCrew::from_list(vec![Igniter::new(1.0, None, None)], true).unwrap();
        let propagator = TemporalPropagator::new(0.0, false, false);
        let degenerate = InitPath { heat: 0, igniter: 0, leg: 1, geometry: line_string![(x: 0.0, y: 0.0)] };
        let paths = propagator.forward(vec![straight_path(0, 0, 0.0), degenerate], &crew, 0.0).unwrap();
        assert_eq!(paths.len(), 1);
    }

    #[test]
    fn dashed_igniter_alternates_fire_and_gap() {
        let crew = IgnitionCrew::from_list(vec![Igniter::new(1.0, None, Some(10.0))], true).unwrap();
        let propagator = TemporalPropagator::new(0.0, false, false);
        let paths = propagator.forward(vec![straight_path(0, 0, 0.0)], &crew, 0.0).unwrap();
        match &paths[0].geometry {
            PathGeometry::Dashes(ml) => assert!(ml.0.len() >= 2),
            _ => panic!("expected dashed geometry"),
        }
    }
}
