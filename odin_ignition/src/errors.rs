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

use thiserror::Error;

pub type Result<T> = std::result::Result<T, OdinIgnitionError>;

#[derive(Error, Debug)]
pub enum OdinIgnitionError {
    #[error("grid error: {0}")]
    GridError(#[from] GridError),

    #[error("distance transform error: {0}")]
    GdtError(#[from] GdtError),

    #[error("personnel error: {0}")]
    PersonnelError(#[from] PersonnelError),

    #[error("pattern error: {0}")]
    PatternError(#[from] PatternError),

    #[error("config error {0}")]
    RonError(#[from] ron::error::Error),

    #[error("config error {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error {0}")]
    IOError(#[from] std::io::Error),

    #[error("operation failed: {0}")]
    OpFailedError(String),
}

pub fn op_failed(msg: impl ToString) -> OdinIgnitionError {
    OdinIgnitionError::OpFailedError(msg.to_string())
}

#[macro_export]
macro_rules! op_failed {
    ($fmt:literal $(, $arg:expr )* ) => {
        $crate::errors::op_failed( format!( $fmt $(, $arg)* ))
    };
}

#[derive(Error, Debug)]
pub enum GridError {
    #[error("grid shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch { expected: (usize, usize), got: (usize, usize) },

    #[error("bounds are degenerate or inverted: {0:?}")]
    InvalidBounds(crate::grid::Bounds),

    #[error("pad amount {0} would crop grid to an empty shape")]
    InvalidPad(i64),

    #[error("invalid smoothing sigma: {0}")]
    InvalidSigma(f64),
}

#[derive(Error, Debug)]
pub enum GdtError {
    #[error("source polyline has fewer than two vertices")]
    DegenerateSource,

    #[error("source polyline does not intersect the DEM bounds")]
    SourceOutOfBounds,

    #[error("resolution must be positive, got {0}")]
    NonPositiveResolution(f64),

    #[error("neighborhood size must be >= 1, got {0}")]
    InvalidNeighborhoodSize(usize),

    #[error("padding ({padding}) must be >= neighborhood_size ({neighborhood_size})")]
    InsufficientPadding { padding: i64, neighborhood_size: usize },
}

#[derive(Error, Debug)]
pub enum PersonnelError {
    #[error("igniter velocity must be positive, got {0}")]
    NonPositiveVelocity(f64),

    #[error("ignition crew must contain at least one igniter")]
    EmptyCrew,

    #[error("ignition crew requires uniform velocity {required}, got {actual}")]
    UnequalVelocities { required: f64, actual: f64 },
}

#[derive(Error, Debug)]
pub enum PatternError {
    #[error("burn unit polygon has fewer than 3 vertices or zero area")]
    DegenerateBurnUnit,

    #[error("strip-contour technique requires a DEM grid")]
    MissingDem,

    #[error("EPSG codes of merged patterns do not match: {0} vs {1}")]
    IncompatibleCrs(u32, u32),
}
