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
#![allow(unused)]

//! Thin CLI entry point: read a burn plan (RON), build the library's
//! geometry/personnel types from it, dispatch to the selected firing
//! technique, and print the resulting pattern's external record (`spec.md`
//! §6's "Pattern consumer" contract) as RON.
//!
//! The RON schema this binary reads is this crate's own - not GeoJSON. Full
//! GeoJSON I/O is an adapter concern `spec.md` §1 explicitly places outside
//! the core.

use std::path::PathBuf;

use clap::Parser;
use geo_types::{Coord, LineString, Polygon};
use ndarray::Array2;
use serde::Deserialize;

use odin_ignition::config::{PatternConfig, TechniqueKind};
use odin_ignition::errors::{op_failed, Result};
use odin_ignition::grid::{Grid, Transform};
use odin_ignition::personnel::{Igniter, IgnitionCrew};
use odin_ignition::techniques::{self, StripContourParams};
use odin_ignition::unit::BurnUnit;

#[derive(Parser, Debug)]
#[command(name = "ignite", about = "generate a prescribed-burn ignition pattern from a burn plan file")]
struct Args {
    /// path to a RON burn plan file
    #[arg(long, short)]
    plan: PathBuf,

    /// where to write the resulting pattern record (RON); defaults to stdout
    #[arg(long, short)]
    output: Option<PathBuf>,
}

/// A raster block in row-major order, the CLI's plain-text stand-in for a
/// GeoTIFF DEM.
#[derive(Deserialize)]
struct DemPlan {
    upper_left_x: f64,
    upper_left_y: f64,
    res_x: f64,
    res_y: f64,
    crs: u32,
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl DemPlan {
    fn into_grid(self) -> Result<Grid> {
        let array = Array2::from_shape_vec((self.rows, self.cols), self.data)
            .map_err(|e| op_failed!("DEM data does not match declared rows/cols: {e}"))?;
        let transform = Transform::new(self.upper_left_x, self.upper_left_y, self.res_x, self.res_y);
        Ok(Grid::new(array, transform, self.crs))
    }
}

#[derive(Deserialize)]
struct BurnPlan {
    polygon: Vec<(f64, f64)>,
    firing_direction: f64,
    epsg: u32,
    crew: Vec<Igniter>,
    #[serde(default)]
    same_velocity: bool,
    #[serde(default)]
    config: PatternConfig,
    technique: TechniqueKind,

    // geometry inputs needed by Ring/Head/Back, which take caller-supplied
    // already-offset boundary lines rather than deriving them (`spec.md`
    // explicitly keeps boundary buffering out of the core).
    #[serde(default)]
    port_line: Option<Vec<(f64, f64)>>,
    #[serde(default)]
    starboard_line: Option<Vec<(f64, f64)>>,
    #[serde(default)]
    aft_line: Option<Vec<(f64, f64)>>,
    #[serde(default)]
    fore_line: Option<Vec<(f64, f64)>>,

    #[serde(default)]
    dem: Option<DemPlan>,
}

fn to_polygon(coords: &[(f64, f64)]) -> Polygon<f64> {
    Polygon::new(LineString::from(coords.iter().map(|&(x, y)| Coord { x, y }).collect::<Vec<_>>()), vec![])
}

fn to_line(coords: &[(f64, f64)]) -> LineString<f64> {
    LineString::from(coords.iter().map(|&(x, y)| Coord { x, y }).collect::<Vec<_>>())
}

fn require_line(field: &'static str, value: &Option<Vec<(f64, f64)>>) -> Result<LineString<f64>> {
    value.as_ref().map(|c| to_line(c)).ok_or_else(|| op_failed!("plan is missing required field `{field}`"))
}

fn run(plan: BurnPlan) -> Result<odin_ignition::pattern::Pattern> {
    let unit = BurnUnit::new(
        to_polygon(&plan.polygon),
        odin_common::angle::Angle360::from_degrees(plan.firing_direction),
        plan.epsg,
    )?;
    let crew = IgnitionCrew::from_list(plan.crew, plan.same_velocity)?;
    let cfg = plan.config;

    match plan.technique {
        TechniqueKind::Ring => {
            let port = require_line("port_line", &plan.port_line)?;
            let starboard = require_line("starboard_line", &plan.starboard_line)?;
            techniques::generate_ring(&unit, &crew, port, starboard, cfg.spacing, cfg.heat_delay)
        }
        TechniqueKind::Head => {
            let aft = require_line("aft_line", &plan.aft_line)?;
            techniques::generate_head(&unit, &crew, aft, cfg.spacing, cfg.heat_delay)
        }
        TechniqueKind::Back { clockwise } => {
            let fore = require_line("fore_line", &plan.fore_line)?;
            techniques::generate_back(&unit, &crew, fore, clockwise, cfg.spacing, cfg.heat_delay)
        }
        TechniqueKind::Flank { depth, heat_depth, side } => {
            techniques::generate_flank(&unit, &crew, depth, heat_depth, side, cfg.spacing, cfg.heat_delay)
        }
        TechniqueKind::Strip { depth, heat_depth, side } => {
            techniques::generate_strip(&unit, &crew, cfg.spacing, depth, heat_depth, side, cfg.heat_delay)
        }
        TechniqueKind::StripContour { side } => {
            let dem = plan.dem.ok_or_else(|| op_failed!("strip-contour requires a `dem` block in the plan"))?.into_grid()?;
            let params = StripContourParams {
                num_igniters: cfg.num_igniters,
                igniter_depth: cfg.igniter_depth,
                heat_depth: cfg.heat_depth,
                side,
                z_multiplier: cfg.z_multiplier,
                neighborhood_size: cfg.neighborhood_size,
                padding: cfg.padding,
                sigma: cfg.sigma,
            };
            let propagation = techniques::PropagationParams {
                spacing: cfg.spacing,
                heat_delay: cfg.heat_delay,
                sync_end_time: cfg.sync_end_time,
                return_trip: cfg.return_trip,
            };
            techniques::generate_strip_contour(&unit, &dem, &crew, params, propagation)
        }
        TechniqueKind::Inferno => techniques::generate_inferno(&unit),
    }
}

fn main() {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let text = match std::fs::read_to_string(&args.plan) {
        Ok(t) => t,
        Err(e) => { eprintln!("failed to read plan file {:?}: {e}", args.plan); std::process::exit(1); }
    };
    let plan: BurnPlan = match ron::from_str(&text) {
        Ok(p) => p,
        Err(e) => { eprintln!("failed to parse plan file {:?}: {e}", args.plan); std::process::exit(1); }
    };

    match run(plan) {
        Ok(pattern) => {
            let record = pattern.to_record();
            let out = ron::ser::to_string_pretty(&record, ron::ser::PrettyConfig::default())
                .expect("pattern record is always serializable");
            match args.output {
                Some(path) => std::fs::write(&path, out).unwrap_or_else(|e| panic!("failed to write {path:?}: {e}")),
                None => println!("{out}"),
            }
        }
        Err(e) => { eprintln!("failed to generate pattern: {e}"); std::process::exit(1); }
    }
}
