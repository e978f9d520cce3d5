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

/// Names for well-known block types.
pub mod blocks {
    /// Always registered with [crate::block_id::special_block_defs::AIR_ID]
    pub const AIR: &str = "builtin:air";
    /// Conventional name for the block an extent reports outside of its bounds
    pub const VOID: &str = "builtin:void";
}

pub mod rays {
    /// How far a player can reach to point at a block, in blocks.
    pub const POINTEE_DISTANCE: u32 = 6;
    /// Height of a player's eyes above their position, in blocks.
    pub const DEFAULT_EYE_HEIGHT: f64 = 1.5;
}
