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

//! Voxel ray traversal.
//!
//! [ray::BlockRay] enumerates, in order of distance, every block a ray passes through and
//! every point where it crosses from one block into the next, stopping where a composable
//! [predicate::StopPredicate] says so. The world is only seen through the
//! [extent::Extent] trait.

pub mod block_id;
pub mod constants;
pub mod coordinates;
pub mod extent;
pub mod predicate;
pub mod ray;
pub mod source;

pub use block_id::BlockId;
pub use coordinates::{BlockCoordinate, BlockFace, PlayerPosition};
pub use extent::{Bounds, Extent, SparseExtent};
pub use predicate::StopPredicate;
pub use ray::BlockRay;
pub use source::{RaySource, Viewer};
