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

//! Ignition personnel: an [`Igniter`] is anything that moves along a path at a
//! velocity and lays fire continuously, as dashes, or as points; an
//! [`IgnitionCrew`] is the ordered set of igniters a firing technique assigns
//! to its heats.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::{PersonnelError, Result};

/// Igniters faster than this (m/s) are still valid but are logged as unusual -
/// most hand crews walk well under running speed.
const VELOCITY_WARNING_THRESHOLD: f64 = 2.5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Igniter {
    pub velocity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gap_length: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dash_length: Option<f64>,
}

impl Igniter {
    /// `gap_length` is the spacing between ignition points or dashes;
    /// `dash_length` is the length of each fire dash. Leave both `None` for a
    /// continuous line, set only `gap_length` for a point igniter, and set
    /// `dash_length` (with or without `gap_length`) for a dash igniter.
    pub fn new(velocity: f64, gap_length: Option<f64>, dash_length: Option<f64>) -> Self {
        if velocity >= VELOCITY_WARNING_THRESHOLD {
            warn!(velocity, "igniter velocity is unusually high for a ground crew");
        }
        Igniter { velocity, gap_length, dash_length }
    }

    pub fn is_continuous(&self) -> bool {
        self.gap_length.is_none() && self.dash_length.is_none()
    }

    pub fn is_dashed(&self) -> bool {
        self.dash_length.is_some()
    }

    pub fn is_point(&self) -> bool {
        self.dash_length.is_none() && self.gap_length.is_some()
    }
}

/// An ordered collection of igniters assigned to a firing technique.
///
/// When `same_velocity` is set (the default), every igniter added to the crew
/// must share the velocity of the first one added.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IgnitionCrew {
    same_velocity: bool,
    #[serde(skip)]
    velocity_req: Option<f64>,
    igniters: Vec<Igniter>,
}

impl IgnitionCrew {
    pub fn new(same_velocity: bool) -> Self {
        IgnitionCrew { same_velocity, velocity_req: None, igniters: Vec::new() }
    }

    pub fn from_list(igniters: Vec<Igniter>, same_velocity: bool) -> Result<Self> {
        let mut crew = IgnitionCrew::new(same_velocity);
        for igniter in igniters {
            crew.add_igniter(igniter)?;
        }
        Ok(crew)
    }

    /// Build a crew of `clones` copies of a single igniter.
    pub fn clone_igniter(igniter: Igniter, clones: usize, same_velocity: bool) -> Result<Self> {
        IgnitionCrew::from_list(vec![igniter; clones], same_velocity)
    }

    pub fn add_igniter(&mut self, igniter: Igniter) -> Result<()> {
        self.validate_velocity(igniter.velocity)?;
        self.igniters.push(igniter);
        Ok(())
    }

    fn validate_velocity(&mut self, velocity: f64) -> Result<()> {
        if velocity <= 0.0 {
            return Err(PersonnelError::NonPositiveVelocity(velocity).into());
        }
        if self.same_velocity {
            match self.velocity_req {
                Some(required) if (required - velocity).abs() > f64::EPSILON => {
                    return Err(PersonnelError::UnequalVelocities { required, actual: velocity }.into());
                }
                Some(_) => {}
                None => self.velocity_req = Some(velocity),
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize { self.igniters.len() }
    pub fn is_empty(&self) -> bool { self.igniters.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = &Igniter> { self.igniters.iter() }

    /// Clamp or pad the crew to exactly `n` igniters, cloning the last igniter
    /// forward when growing. Used by firing techniques that accept a crew
    /// sized differently than the number of heats they actually assign.
    pub fn resized(&self, n: usize) -> Result<Self> {
        if n == 0 || self.is_empty() {
            return Err(PersonnelError::EmptyCrew.into());
        }
        let mut igniters = self.igniters.clone();
        if igniters.len() > n {
            warn!(requested = n, available = igniters.len(), "truncating ignition crew to fit the technique");
            igniters.truncate(n);
        } else if igniters.len() < n {
            warn!(requested = n, available = igniters.len(), "cloning last igniter to fill out the ignition crew");
            let last = *igniters.last().unwrap();
            igniters.resize(n, last);
        }
        IgnitionCrew::from_list(igniters, self.same_velocity)
    }
}

impl std::ops::Index<usize> for IgnitionCrew {
    type Output = Igniter;
    fn index(&self, index: usize) -> &Igniter { &self.igniters[index] }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_crew_rejects_mismatched_velocity() {
        let mut crew = IgnitionCrew::new(true);
        crew.add_igniter(Igniter::new(1.0, None, None)).unwrap();
        let err = crew.add_igniter(Igniter::new(1.5, None, None));
        assert!(err.is_err());
    }

    #[test]
    fn resized_crew_clones_to_fill() {
        let crew = IgnitionCrew::from_list(vec![Igniter::new(1.0, None, None)], true).unwrap();
        let grown = crew.resized(3).unwrap();
        assert_eq!(grown.len(), 3);
    }

    #[test]
    fn resized_crew_truncates() {
        let crew = IgnitionCrew::from_list(
            vec![Igniter::new(1.0, None, None); 4],
            true,
        ).unwrap();
        let shrunk = crew.resized(2).unwrap();
        assert_eq!(shrunk.len(), 2);
    }
}
