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

use anyhow::{ensure, Result};
use rustc_hash::FxHashMap;

use crate::block_id::BlockId;
use crate::coordinates::BlockCoordinate;

/// A read-only region of the world that a ray can be traced through.
///
/// Implementations must return *some* block for every coordinate a traversal can
/// reach. Coordinates outside [Extent::contains] end a traversal; whatever
/// [Extent::block_type_at] returns for them (e.g. a void sentinel) is treated like
/// any other block id.
pub trait Extent {
    fn block_type_at(&self, coord: BlockCoordinate) -> BlockId;

    /// Whether `coord` is part of this extent. Unbounded extents keep the default.
    fn contains(&self, _coord: BlockCoordinate) -> bool {
        true
    }
}

impl<T: Extent + ?Sized> Extent for &T {
    fn block_type_at(&self, coord: BlockCoordinate) -> BlockId {
        (**self).block_type_at(coord)
    }
    fn contains(&self, coord: BlockCoordinate) -> bool {
        (**self).contains(coord)
    }
}

/// Inclusive bounds of a box of blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bounds {
    pub min: BlockCoordinate,
    pub max: BlockCoordinate,
}
impl Bounds {
    pub fn new(min: BlockCoordinate, max: BlockCoordinate) -> Result<Bounds> {
        ensure!(
            min.x <= max.x && min.y <= max.y && min.z <= max.z,
            "Bounds are inverted: min {:?}, max {:?}",
            min,
            max
        );
        Ok(Bounds { min, max })
    }

    #[inline]
    pub fn contains(&self, coord: BlockCoordinate) -> bool {
        (self.min.x..=self.max.x).contains(&coord.x)
            && (self.min.y..=self.max.y).contains(&coord.y)
            && (self.min.z..=self.max.z).contains(&coord.z)
    }
}

/// An in-memory extent where most blocks share a fill type. Only explicitly placed
/// blocks are stored.
#[derive(Clone, Debug)]
pub struct SparseExtent {
    bounds: Option<Bounds>,
    fill: BlockId,
    void: BlockId,
    blocks: FxHashMap<BlockCoordinate, BlockId>,
}
impl SparseExtent {
    /// An extent filled with `fill` that never ends.
    pub fn unbounded(fill: BlockId) -> SparseExtent {
        SparseExtent {
            bounds: None,
            fill,
            void: fill,
            blocks: FxHashMap::default(),
        }
    }

    /// An extent filled with `fill` inside `bounds`, reporting `void` outside of them.
    pub fn bounded(bounds: Bounds, fill: BlockId, void: BlockId) -> SparseExtent {
        SparseExtent {
            bounds: Some(bounds),
            fill,
            void,
            blocks: FxHashMap::default(),
        }
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    /// Places a block. Placing the fill type removes the explicit entry.
    pub fn set_block(&mut self, coord: BlockCoordinate, block: BlockId) -> Result<()> {
        ensure!(
            self.contains(coord),
            "{:?} is outside of the extent bounds {:?}",
            coord,
            self.bounds
        );
        if block == self.fill {
            self.blocks.remove(&coord);
        } else {
            self.blocks.insert(coord, block);
        }
        Ok(())
    }

    pub fn with_block(mut self, coord: BlockCoordinate, block: BlockId) -> Result<Self> {
        self.set_block(coord, block)?;
        Ok(self)
    }

    /// Number of explicitly placed blocks.
    pub fn placed_len(&self) -> usize {
        self.blocks.len()
    }
}
impl Extent for SparseExtent {
    fn block_type_at(&self, coord: BlockCoordinate) -> BlockId {
        if !self.contains(coord) {
            return self.void;
        }
        self.blocks.get(&coord).copied().unwrap_or(self.fill)
    }

    fn contains(&self, coord: BlockCoordinate) -> bool {
        self.bounds.map_or(true, |b| b.contains(coord))
    }
}
