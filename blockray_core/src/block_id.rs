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
use std::fmt::Debug;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlockIdError {
    #[error("Block ID 0x{0:x} lowest 12 bits (variant) not zero")]
    VariantBitsNonzero(u32),
    #[error("Variant {0:x} is out of range (max is 0xfff)")]
    VariantOutOfRange(u16),
}
pub const BLOCK_VARIANT_MASK: u32 = 0xfff;

/// Identifies the type of block occupying a cell, as returned by an
/// [crate::extent::Extent].
///
/// The upper 20 bits select the base block type and the lowest 12 bits carry a
/// per-type variant (e.g. orientation). Two ids compare equal only if both parts
/// match; use [BlockId::equals_ignore_variant] to compare base types.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct BlockId(pub u32);
impl BlockId {
    pub fn base_id(&self) -> u32 {
        self.0 & !BLOCK_VARIANT_MASK
    }
    pub fn index(&self) -> usize {
        (self.0 & !BLOCK_VARIANT_MASK) as usize >> 12
    }
    pub fn variant(&self) -> u16 {
        (self.0 & BLOCK_VARIANT_MASK) as u16
    }
    pub fn with_variant(self, variant: u16) -> Result<BlockId> {
        ensure!(
            variant & (BLOCK_VARIANT_MASK as u16) == variant,
            BlockIdError::VariantOutOfRange(variant)
        );
        Ok(BlockId(self.base_id() | (variant as u32)))
    }
    pub fn new(base: u32, variant: u16) -> Result<BlockId> {
        ensure!(
            base & BLOCK_VARIANT_MASK == 0,
            BlockIdError::VariantBitsNonzero(base)
        );
        ensure!(
            variant & (BLOCK_VARIANT_MASK as u16) == variant,
            BlockIdError::VariantOutOfRange(variant)
        );
        Ok(BlockId(base | (variant as u32)))
    }
    /// Builds the id of the `index`-th registered block type, variant zero.
    pub fn from_index(index: usize) -> Result<BlockId> {
        let base = u32::try_from(index)
            .ok()
            .and_then(|x| x.checked_mul(BLOCK_VARIANT_MASK + 1))
            .ok_or_else(|| anyhow::anyhow!("Block index {index} is out of range"))?;
        BlockId::new(base, 0)
    }
    #[inline]
    pub fn equals_ignore_variant(&self, other: BlockId) -> bool {
        self.base_id() == other.base_id()
    }
    #[inline]
    pub fn is_air(&self) -> bool {
        self.equals_ignore_variant(special_block_defs::AIR_ID)
    }
}

impl From<u32> for BlockId {
    fn from(value: u32) -> Self {
        BlockId(value)
    }
}
impl From<BlockId> for u32 {
    fn from(value: BlockId) -> Self {
        value.0
    }
}
impl Debug for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format!("block:0x{:x}", self.0))
    }
}

pub mod special_block_defs {
    use super::BlockId;

    /// Air always occupies index 0.
    pub const AIR_ID: BlockId = BlockId(0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_bits() {
        let id = BlockId::new(3 << 12, 5).unwrap();
        assert_eq!(id.index(), 3);
        assert_eq!(id.variant(), 5);
        assert!(id.equals_ignore_variant(BlockId(3 << 12)));
        assert_ne!(id, BlockId(3 << 12));
        assert!(BlockId::new(3, 0).is_err());
        assert!(id.with_variant(0x1000).is_err());
    }

    #[test]
    fn from_index_matches_base() {
        assert_eq!(BlockId::from_index(0).unwrap(), special_block_defs::AIR_ID);
        assert_eq!(BlockId::from_index(7).unwrap().index(), 7);
        assert!(BlockId::from_index(1 << 20).is_err());
        assert!(BlockId(0x2).is_air());
    }
}
