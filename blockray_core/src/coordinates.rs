// Copyright 2023 drey7925
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt::{Debug, Display};
use std::str::FromStr;

use anyhow::{bail, ensure, Result};
use cgmath::{vec3, Angle, Deg, Vector3};

/// A 3D coordinate in the world. The block at `(x, y, z)` covers the half-open
/// region `[x, x + 1) × [y, y + 1) × [z, z + 1)`.
///
/// Note that the impls of PartialOrd and Ord are meant for tiebreaking (e.g. for sorted data structures) and don't
/// have a lot of semantic meaning on their own.
#[derive(PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
pub struct BlockCoordinate {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Debug for BlockCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("[{}, {}, {}]", self.x, self.y, self.z))
    }
}
impl BlockCoordinate {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn try_delta(&self, x: i32, y: i32, z: i32) -> Option<BlockCoordinate> {
        let x = self.x.checked_add(x)?;
        let y = self.y.checked_add(y)?;
        let z = self.z.checked_add(z)?;

        Some(BlockCoordinate { x, y, z })
    }

    /// Squared euclidean distance between the two blocks, saturating at `u64::MAX`. Only
    /// blocks at opposite corners of the coordinate space come close to saturating.
    pub fn distance_squared(&self, other: BlockCoordinate) -> u64 {
        let dx = self.x.abs_diff(other.x) as u64;
        let dy = self.y.abs_diff(other.y) as u64;
        let dz = self.z.abs_diff(other.z) as u64;
        (dx * dx).saturating_add(dy * dy).saturating_add(dz * dz)
    }

    /// Returns the block containing `position`, for a ray travelling along `direction`.
    ///
    /// Each axis is floored, except that a coordinate lying exactly on a block boundary
    /// while travelling in the negative direction along that axis belongs to the block
    /// *below* the boundary: that is the block the ray is entering (or about to enter).
    pub fn containing(position: Vector3<f64>, direction: Vector3<f64>) -> Result<BlockCoordinate> {
        Ok(BlockCoordinate {
            x: containing_component(position.x, direction.x)?,
            y: containing_component(position.y, direction.y)?,
            z: containing_component(position.z, direction.z)?,
        })
    }

    #[inline]
    pub(crate) fn component(&self, axis: usize) -> i32 {
        match axis {
            0 => self.x,
            1 => self.y,
            2 => self.z,
            _ => unreachable!("axis out of range"),
        }
    }

    #[inline]
    pub(crate) fn component_mut(&mut self, axis: usize) -> &mut i32 {
        match axis {
            0 => &mut self.x,
            1 => &mut self.y,
            2 => &mut self.z,
            _ => unreachable!("axis out of range"),
        }
    }
}
impl Display for BlockCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}
impl FromStr for BlockCoordinate {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let pieces: Vec<_> = s.split(',').map(str::trim).collect();
        if pieces.len() != 3 {
            bail!("Wrong number of components");
        };
        Ok(BlockCoordinate::new(
            pieces[0].parse()?,
            pieces[1].parse()?,
            pieces[2].parse()?,
        ))
    }
}

impl From<BlockCoordinate> for cgmath::Vector3<f64> {
    fn from(val: BlockCoordinate) -> Self {
        cgmath::Vector3::new(val.x as f64, val.y as f64, val.z as f64)
    }
}

#[inline]
fn containing_component(value: f64, direction: f64) -> Result<i32> {
    ensure!(value.is_finite(), "val was not finite");
    let floor = value.floor();
    let cell = if floor == value && direction < 0.0 {
        floor - 1.0
    } else {
        floor
    };
    ensure!(
        cell <= (i32::MAX as f64) && cell >= (i32::MIN as f64),
        "Value is out of bounds as i32"
    );
    Ok(cell as i32)
}

/// One of the six faces of a block. When reported for a ray crossing, this is the face
/// of the *newly entered* block that the ray passed through, so its normal points back
/// against the direction of travel.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum BlockFace {
    NegX,
    PosX,
    NegY,
    PosY,
    NegZ,
    PosZ,
}
impl BlockFace {
    pub const ALL: [BlockFace; 6] = [
        BlockFace::NegX,
        BlockFace::PosX,
        BlockFace::NegY,
        BlockFace::PosY,
        BlockFace::NegZ,
        BlockFace::PosZ,
    ];

    /// The face entered through when stepping by `step` (which must be nonzero) along `axis`
    /// (0 = x, 1 = y, 2 = z).
    pub fn entered_through(axis: usize, step: i32) -> BlockFace {
        debug_assert!(step != 0);
        match (axis, step > 0) {
            (0, true) => BlockFace::NegX,
            (0, false) => BlockFace::PosX,
            (1, true) => BlockFace::NegY,
            (1, false) => BlockFace::PosY,
            (2, true) => BlockFace::NegZ,
            (2, false) => BlockFace::PosZ,
            _ => unreachable!("axis out of range"),
        }
    }

    pub fn axis(&self) -> usize {
        match self {
            BlockFace::NegX | BlockFace::PosX => 0,
            BlockFace::NegY | BlockFace::PosY => 1,
            BlockFace::NegZ | BlockFace::PosZ => 2,
        }
    }

    /// The outward unit normal of this face.
    pub fn normal(&self) -> Vector3<f64> {
        match self {
            BlockFace::NegX => vec3(-1.0, 0.0, 0.0),
            BlockFace::PosX => vec3(1.0, 0.0, 0.0),
            BlockFace::NegY => vec3(0.0, -1.0, 0.0),
            BlockFace::PosY => vec3(0.0, 1.0, 0.0),
            BlockFace::NegZ => vec3(0.0, 0.0, -1.0),
            BlockFace::PosZ => vec3(0.0, 0.0, 1.0),
        }
    }

    /// The block sharing this face with `block`.
    pub fn neighbor(&self, block: BlockCoordinate) -> Option<BlockCoordinate> {
        match self {
            BlockFace::NegX => block.try_delta(-1, 0, 0),
            BlockFace::PosX => block.try_delta(1, 0, 0),
            BlockFace::NegY => block.try_delta(0, -1, 0),
            BlockFace::PosY => block.try_delta(0, 1, 0),
            BlockFace::NegZ => block.try_delta(0, 0, -1),
            BlockFace::PosZ => block.try_delta(0, 0, 1),
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct PlayerPosition {
    // The position, blocks
    pub position: cgmath::Vector3<f64>,
    // The facing direction, in degrees. (azimuth, elevation)
    pub face_direction: (f64, f64),
}
impl PlayerPosition {
    /// The direction the player is facing, Y-up
    pub fn face_unit_vector(&self) -> cgmath::Vector3<f64> {
        let (sin_az, cos_az) = Deg(self.face_direction.0).sin_cos();
        let (sin_el, cos_el) = Deg(self.face_direction.1).sin_cos();
        cgmath::vec3(cos_el * sin_az, sin_el, cos_el * cos_az)
    }
}
