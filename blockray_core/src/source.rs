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

use anyhow::Result;
use cgmath::{vec3, Vector3};

use crate::coordinates::PlayerPosition;
use crate::extent::Extent;
use crate::predicate::{only_air, BlockTypeEquals, Discrete, StopPredicate};
use crate::ray::BlockRay;

/// Something positioned in an extent that rays can be cast from, e.g. a player's eye.
pub trait RaySource {
    fn ray_origin(&self) -> Vector3<f64>;
    fn ray_direction(&self) -> Vector3<f64>;
    fn extent(&self) -> &dyn Extent;
}

/// A player (or other entity) looking around an extent.
#[derive(Clone, Copy)]
pub struct Viewer<'e> {
    pub position: PlayerPosition,
    /// Height of the eyes above `position`, in blocks
    pub eye_height: f64,
    pub extent: &'e dyn Extent,
}
impl<'e> Viewer<'e> {
    pub fn new(position: PlayerPosition, eye_height: f64, extent: &'e dyn Extent) -> Self {
        Viewer {
            position,
            eye_height,
            extent,
        }
    }
}
impl RaySource for Viewer<'_> {
    fn ray_origin(&self) -> Vector3<f64> {
        self.position.position + vec3(0.0, self.eye_height, 0.0)
    }
    fn ray_direction(&self) -> Vector3<f64> {
        self.position.face_unit_vector()
    }
    fn extent(&self) -> &dyn Extent {
        self.extent
    }
}

impl<'e, P: StopPredicate<'e>> BlockRay<'e, P> {
    /// Casts a ray from `source` along the direction it is facing.
    pub fn from_source<S: RaySource + ?Sized>(source: &'e S, predicate: P) -> Result<Self> {
        BlockRay::new(
            source.ray_origin(),
            source.ray_direction(),
            source.extent(),
            predicate,
        )
    }
}

impl<'e> BlockRay<'e, Discrete<BlockTypeEquals<'e>>> {
    /// Casts a ray from `source` that passes through air and stops at the first other
    /// block, i.e. the block the source is looking at.
    pub fn from_source_through_air<S: RaySource + ?Sized>(source: &'e S) -> Result<Self> {
        BlockRay::from_source(source, only_air())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block_id::{special_block_defs::AIR_ID, BlockId};
    use crate::coordinates::BlockCoordinate;
    use crate::extent::SparseExtent;
    use crate::predicate::max_distance;

    const STONE: BlockId = BlockId(1 << 12);

    #[test]
    fn viewer_looks_at_target() {
        let extent = SparseExtent::unbounded(AIR_ID)
            .with_block(BlockCoordinate::new(0, 1, 4), STONE)
            .unwrap();
        // Facing +z (azimuth 0), eyes at y = 1.5
        let viewer = Viewer::new(
            PlayerPosition {
                position: vec3(0.5, 0.0, 0.5),
                face_direction: (0.0, 0.0),
            },
            1.5,
            &extent,
        );
        let mut ray = BlockRay::from_source_through_air(&viewer).unwrap();
        assert_eq!(ray.end().unwrap(), Some(BlockCoordinate::new(0, 1, 4)));
        assert_eq!(ray.start_block(), BlockCoordinate::new(0, 1, 0));
    }

    #[test]
    fn source_with_custom_predicate() {
        let extent = SparseExtent::unbounded(AIR_ID);
        let viewer = Viewer::new(
            PlayerPosition {
                position: vec3(0.5, 0.0, 0.5),
                face_direction: (0.0, 90.0),
            },
            0.0,
            &extent,
        );
        let mut ray = BlockRay::from_source(&viewer, max_distance(2)).unwrap();
        let blocks = ray.discrete().collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(
            blocks,
            vec![
                BlockCoordinate::new(0, 0, 0),
                BlockCoordinate::new(0, 1, 0),
                BlockCoordinate::new(0, 2, 0),
            ]
        );
    }
}
