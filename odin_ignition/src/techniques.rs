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

//! Firing techniques: the spatial half of the `align -> init_paths ->
//! unalign -> TemporalPropagator::forward` skeleton shared by every
//! technique but `Inferno`. Each `generate_*` function here is a
//! technique-specific `init_paths`; the shared plumbing lives in
//! [`generate_pattern`].
//!
//! Ring, Head and Back each need a control line offset from the burn unit's
//! boundary; buffering that boundary (shapely-style polygon buffer) is an
//! explicit Non-goal of this crate, so those three take the already-offset
//! boundary line(s) as arguments rather than computing the offset themselves.

use geo_types::{Coord, LineString, Polygon};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::clip::clip_to_polygon;
use crate::errors::{op_failed, PatternError, Result};
use crate::gdt::gdt;
use crate::grid::Grid;
use crate::pattern::{InitPath, Pattern, TemporalPropagator};
use crate::personnel::IgnitionCrew;
use crate::unit::BurnUnit;

/// Which side of the firing vector a technique starts laying ignition on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

/// Common knobs shared by every technique's temporal propagation step (the
/// option table from `spec.md` §6, minus the technique-specific spatial
/// parameters each variant below carries on its own).
#[derive(Debug, Clone, Copy)]
pub struct PropagationParams {
    pub spacing: f64,
    pub heat_delay: f64,
    pub sync_end_time: bool,
    pub return_trip: bool,
}

impl Default for PropagationParams {
    fn default() -> Self {
        PropagationParams { spacing: 0.0, heat_delay: 0.0, sync_end_time: false, return_trip: false }
    }
}

/// Run the shared `init_paths -> TemporalPropagator::forward -> Pattern`
/// skeleton. `init_paths` are assumed to already be in world (unaligned)
/// coordinates - alignment, where a technique needs it, happens inside the
/// technique's own `generate_*` function, not here.
fn generate_pattern(init_paths: Vec<InitPath>, crew: &IgnitionCrew, params: PropagationParams, epsg: u32) -> Result<Pattern> {
    let propagator = TemporalPropagator::new(params.spacing, params.sync_end_time, params.return_trip);
    let timed = propagator.forward(init_paths, crew, params.heat_delay)?;
    Ok(Pattern::new(timed, epsg))
}

/* #region Ring / Head / Back - boundary-walking techniques **************************************/

/// Ring firing: two igniters walk the boundary from the downwind to the
/// upwind side, closing the ring on both flanks at once (`sync_end_time`).
pub fn generate_ring(
    unit: &BurnUnit,
    crew: &IgnitionCrew,
    port_line: LineString<f64>,
    starboard_line: LineString<f64>,
    spacing: f64,
    heat_delay: f64,
) -> Result<Pattern> {
    let crew = crew.resized(2)?;

    // reverse the port line so both igniters start at the fore anchor
    let reversed_port = LineString::new(port_line.coords().rev().copied().collect());

    let init_paths = vec![
        InitPath { heat: 0, igniter: 0, leg: 0, geometry: reversed_port },
        InitPath { heat: 0, igniter: 1, leg: 0, geometry: starboard_line },
    ];

    let params = PropagationParams { spacing, heat_delay, sync_end_time: true, return_trip: false };
    generate_pattern(init_paths, &crew, params, unit.epsg)
}

/// Head firing: a single line set along the upwind edge, burning into the unit.
pub fn generate_head(unit: &BurnUnit, crew: &IgnitionCrew, aft_line: LineString<f64>, spacing: f64, heat_delay: f64) -> Result<Pattern> {
    let crew = crew.resized(1)?;
    let init_paths = vec![InitPath { heat: 0, igniter: 0, leg: 0, geometry: aft_line }];
    let params = PropagationParams { spacing, heat_delay, ..Default::default() };
    generate_pattern(init_paths, &crew, params, unit.epsg)
}

/// Backing firing: a single line set along the downwind edge, backing into the unit.
pub fn generate_back(
    unit: &BurnUnit,
    crew: &IgnitionCrew,
    fore_line: LineString<f64>,
    clockwise: bool,
    spacing: f64,
    heat_delay: f64,
) -> Result<Pattern> {
    let crew = crew.resized(1)?;
    let line = if clockwise {
        fore_line
    } else {
        LineString::new(fore_line.coords().rev().copied().collect())
    };
    let init_paths = vec![InitPath { heat: 0, igniter: 0, leg: 0, geometry: line }];
    let params = PropagationParams { spacing, heat_delay, ..Default::default() };
    generate_pattern(init_paths, &crew, params, unit.epsg)
}

/* #endregion Ring / Head / Back */

/* #region Flank ***********************************************************************************/

/// Flank firing: paths parallel to the firing direction, spaced along the
/// perpendicular axis. Igniters walk downwind-to-upwind so `return_trip` is
/// always charged between heats.
pub fn generate_flank(
    unit: &BurnUnit,
    crew: &IgnitionCrew,
    depth: Option<f64>,
    heat_depth: Option<f64>,
    side: Side,
    spacing: f64,
    heat_delay: f64,
) -> Result<Pattern> {
    let aligned = unit.align();
    let bounds = ring_bounds(&aligned)?;
    let crew_len = crew.len();
    if crew_len == 0 {
        return Err(PatternError::DegenerateBurnUnit.into());
    }

    let depth = depth.unwrap_or_else(|| (bounds.north - bounds.south) / (crew_len as f64 + 1.0));
    let mut offsets = stepped_positions(bounds.south, bounds.north, crew_len, depth, heat_depth.unwrap_or(0.0));
    if side == Side::Left {
        offsets.reverse();
    }

    let mut init_paths = Vec::new();
    let mut heat = 0usize;
    let mut igniter = 0usize;
    for y in offsets {
        let line = LineString::new(vec![Coord { x: bounds.west, y }, Coord { x: bounds.east, y }]);
        for (leg, part) in clip_to_polygon(&line, &aligned).into_iter().enumerate() {
            init_paths.push(InitPath { heat, igniter, leg, geometry: unit.unalign_line(&part) });
        }
        igniter += 1;
        if igniter == crew_len {
            igniter = 0;
            heat += 1;
        }
    }

    let params = PropagationParams { spacing, heat_delay, return_trip: true, ..Default::default() };
    generate_pattern(init_paths, crew, params, unit.epsg)
}

/* #endregion Flank */

/* #region Strip ***********************************************************************************/

/// Strip firing: paths perpendicular to the firing direction, staggered
/// within a heat, alternating direction heat to heat.
pub fn generate_strip(
    unit: &BurnUnit,
    crew: &IgnitionCrew,
    spacing: f64,
    depth: f64,
    heat_depth: f64,
    side: Side,
    heat_delay: f64,
) -> Result<Pattern> {
    let aligned = unit.align();
    let bounds = ring_bounds(&aligned)?;
    let crew_len = crew.len();
    if crew_len == 0 {
        return Err(PatternError::DegenerateBurnUnit.into());
    }

    let offsets = stepped_positions(bounds.west, bounds.east, crew_len, depth, heat_depth);

    let mut init_paths = Vec::new();
    let mut heat = 0usize;
    let mut igniter = 0usize;
    let mut forward = side == Side::Right;
    for x in offsets {
        let line = if forward {
            LineString::new(vec![Coord { x, y: bounds.south }, Coord { x, y: bounds.north }])
        } else {
            LineString::new(vec![Coord { x, y: bounds.north }, Coord { x, y: bounds.south }])
        };
        for (leg, part) in clip_to_polygon(&line, &aligned).into_iter().enumerate() {
            init_paths.push(InitPath { heat, igniter, leg, geometry: unit.unalign_line(&part) });
        }
        igniter += 1;
        if igniter == crew_len {
            igniter = 0;
            heat += 1;
            forward = !forward;
        }
    }

    let params = PropagationParams { spacing, heat_delay, ..Default::default() };
    generate_pattern(init_paths, crew, params, unit.epsg)
}

/// Build the stepped offsets used by Strip (along x) and Flank (along y):
/// constant `depth` spacing within a heat, with `heat_depth` (if nonzero)
/// substituted for the step that crosses into the next heat.
fn stepped_positions(start: f64, end: f64, crew_len: usize, depth: f64, heat_depth: f64) -> Vec<f64> {
    let mut positions = Vec::new();
    if heat_depth == 0.0 {
        let mut x = start + depth;
        while x < end {
            positions.push(x);
            x += depth;
        }
    } else {
        let mut cur = start + depth;
        let mut i = 0usize;
        while cur < end {
            positions.push(cur);
            cur = if (i + 1) % crew_len == 0 { positions[i] + heat_depth } else { positions[i] + depth };
            i += 1;
        }
    }
    positions
}

/* #endregion Strip */

/* #region Strip-Contour - the terrain-aware core *************************************************/

pub struct StripContourParams {
    pub num_igniters: usize,
    pub igniter_depth: f64,
    pub heat_depth: f64,
    pub side: Side,
    pub z_multiplier: f64,
    pub neighborhood_size: usize,
    pub padding: i64,
    pub sigma: Option<f64>,
}

/// Strip-contour firing: a geodesic distance transform from a source line on
/// the firing-direction-aligned edge, contoured at a (igniter_depth,
/// heat_depth) level schedule, clipped to the burn unit. See `spec.md` §4.5.
pub fn generate_strip_contour(
    unit: &BurnUnit,
    dem: &Grid,
    crew: &IgnitionCrew,
    params: StripContourParams,
    propagation: PropagationParams,
) -> Result<Pattern> {
    if params.num_igniters == 0 {
        return Err(op_failed!("strip-contour requires at least one igniter"));
    }
    let crew = crew.resized(params.num_igniters)?;

    let aligned = unit.align();
    let bounds = ring_bounds(&aligned)?;

    // source line on the left (aligned x=x_min) edge, spanning the full
    // perpendicular extent; un-rotated back to world orientation for the GDT,
    // which operates on the (unrotated) DEM.
    let aligned_source = LineString::new(vec![
        Coord { x: bounds.west, y: bounds.south },
        Coord { x: bounds.west, y: bounds.north },
    ]);
    let world_source = unit.unalign_line(&aligned_source);

    let dem_bounds = dem.bounds();
    let coords: Vec<Coord<f64>> = world_source.coords().copied().collect();
    let (p0, p1) = crate::clip::clip_line_to_bounds(coords[0], coords[1], &dem_bounds)
        .ok_or_else(|| op_failed!("source line for strip-contour does not intersect the DEM"))?;
    let source_line = LineString::new(vec![p0, p1]);

    let mut cost = gdt(dem, &source_line, params.neighborhood_size, params.z_multiplier, params.padding)?;
    if let Some(sigma) = params.sigma {
        cost.smooth(sigma)?;
    }

    let max_cost = cost.data.iter().copied().filter(|v| v.is_finite()).fold(0.0_f64, f64::max);
    let levels = build_levels(params.igniter_depth, params.heat_depth, params.num_igniters, max_cost);
    let contours = cost.get_contours(&levels);

    let mut init_paths = Vec::new();
    for (level_idx, (_level, lines)) in contours.into_iter().enumerate() {
        let heat = level_idx / params.num_igniters;
        let igniter = level_idx % params.num_igniters;
        let reverse = (params.side == Side::Left && heat % 2 == 0) || (params.side == Side::Right && heat % 2 == 1);

        let mut leg = 0usize;
        for raw_line in lines {
            for part in clip_to_polygon(&raw_line, &unit.polygon) {
                let geometry = if reverse {
                    LineString::new(part.coords().rev().copied().collect())
                } else {
                    part
                };
                init_paths.push(InitPath { heat, igniter, leg, geometry });
                leg += 1;
            }
        }
    }

    if init_paths.is_empty() {
        warn!("strip-contour produced no ignition paths inside the burn unit");
    }

    generate_pattern(init_paths, &crew, propagation, unit.epsg)
}

/// `levels = [d]`; repeat `{N-1 steps of d, 1 step of h}` until the last
/// level reaches `max_cost`.
fn build_levels(igniter_depth: f64, heat_depth: f64, num_igniters: usize, max_cost: f64) -> Vec<f64> {
    let mut levels = vec![igniter_depth];
    while *levels.last().unwrap() < max_cost {
        for _ in 0..num_igniters.saturating_sub(1) {
            let next = levels.last().unwrap() + igniter_depth;
            levels.push(next);
        }
        let next = levels.last().unwrap() + heat_depth;
        levels.push(next);
    }
    levels
}

/* #endregion Strip-Contour */

/* #region Inferno *********************************************************************************/

/// Inferno firing: every igniter's entire path ignites at once. Bypasses the
/// temporal propagator entirely; wind direction is irrelevant so the unit is
/// never aligned.
pub fn generate_inferno(unit: &BurnUnit) -> Result<Pattern> {
    let bounds = unit.bounds()?;
    let mut y = bounds.south;
    let mut leg_paths = Vec::new();

    while y < bounds.north {
        let line = LineString::new(vec![Coord { x: bounds.west, y }, Coord { x: bounds.east, y }]);
        for part in clip_to_polygon(&line, &unit.polygon) {
            leg_paths.push(part);
        }
        y += 1.0;
    }

    let paths = leg_paths
        .into_iter()
        .enumerate()
        .map(|(leg, geometry)| crate::pattern::Path {
            heat: 0,
            igniter: 0,
            leg,
            geometry: crate::pattern::PathGeometry::Line(geometry),
            times: crate::pattern::PathTimes::PerVertex(vec![0.0, 0.0]),
        })
        .collect();

    Ok(Pattern::new(paths, unit.epsg))
}

/* #endregion Inferno */

fn ring_bounds(polygon: &Polygon<f64>) -> Result<crate::grid::Bounds> {
    let coords: Vec<Coord<f64>> = polygon.exterior().coords().copied().collect();
    if coords.is_empty() {
        return Err(PatternError::DegenerateBurnUnit.into());
    }
    let (mut west, mut east) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut south, mut north) = (f64::INFINITY, f64::NEG_INFINITY);
    for c in &coords {
        west = west.min(c.x);
        east = east.max(c.x);
        south = south.min(c.y);
        north = north.max(c.y);
    }
    crate::grid::Bounds::new(west, south, east, north)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::personnel::Igniter;
    use geo_types::polygon;

    fn square_unit(firing_direction: f64) -> BurnUnit {
        let polygon = polygon![
            (x: 0.0, y: 0.0),
            (x: 100.0, y: 0.0),
            (x: 100.0, y: 100.0),
            (x: 0.0, y: 100.0),
        ];
        BurnUnit::new(polygon, odin_common::angle::Angle360::from_degrees(firing_direction), 32610).unwrap()
    }

    #[test]
    fn flank_default_depth_matches_even_spacing() {
        // default depth = unit height / (crew_len + 1); a 100-unit-tall square
        // with 3 igniters spaces them at rows 25, 50, 75 -> one path each.
        let unit = square_unit(0.0);
        let crew = IgnitionCrew::from_list(vec![Igniter::new(1.0, None, None); 3], true).unwrap();
        let pattern = generate_flank(&unit, &crew, None, None, Side::Right, 0.0, 0.0).unwrap();
        assert_eq!(pattern.paths.len(), 3);
    }

    #[test]
    fn strip_alternates_direction_between_heats() {
        let unit = square_unit(0.0);
        let crew = IgnitionCrew::from_list(vec![Igniter::new(1.0, None, None); 2], true).unwrap();
        let pattern = generate_strip(&unit, &crew, 0.0, 25.0, 25.0, Side::Right, 0.0).unwrap();
        assert!(pattern.paths.iter().any(|p| p.heat == 1));
    }

    #[test]
    fn inferno_ignites_at_time_zero() {
        let unit = square_unit(45.0);
        let pattern = generate_inferno(&unit).unwrap();
        assert!(!pattern.paths.is_empty());
        for p in &pattern.paths {
            match &p.times {
                crate::pattern::PathTimes::PerVertex(v) => assert!(v.iter().all(|&t| t == 0.0)),
                _ => panic!("inferno paths are always continuous lines"),
            }
        }
    }

    #[test]
    fn ring_crew_is_clamped_to_two() {
        let unit = square_unit(0.0);
        let crew = IgnitionCrew::from_list(vec![Igniter::new(1.0, None, None); 4], true).unwrap();
        let port = LineString::new(vec![Coord { x: 0.0, y: 100.0 }, Coord { x: 0.0, y: 0.0 }]);
        let starboard = LineString::new(vec![Coord { x: 100.0, y: 100.0 }, Coord { x: 100.0, y: 0.0 }]);
        let pattern = generate_ring(&unit, &crew, port, starboard, 0.0, 0.0).unwrap();
        let igniters: std::collections::HashSet<usize> = pattern.paths.iter().map(|p| p.igniter).collect();
        assert_eq!(igniters.len(), 2);
    }
}
