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

//! Prescribed-burn ignition pattern generation: given a burn unit polygon, a
//! firing technique and an ignition crew, produce a spatiotemporal
//! [`pattern::Pattern`] of ignition paths - where each igniter walks, and
//! when fire reaches every point along the way.
//!
//! [`techniques::generate_strip_contour`] is the terrain-aware core of the
//! crate: a geodesic distance transform ([`gdt`]) from a control line across
//! a DEM, contoured ([`contour`]) at a fixed depth schedule to trace paths
//! that hug the terrain rather than running straight across it.

pub mod errors;
pub mod grid;
pub mod heap;
pub mod gdt;
pub mod contour;
pub mod clip;
pub mod personnel;
pub mod unit;
pub mod pattern;
pub mod techniques;
pub mod config;

pub use errors::{OdinIgnitionError, Result};
