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

//! Traces rays through the block grid.
//!
//! A [BlockRay] walks from block to block in order of distance from its origin. Every
//! time it crosses a block boundary it asks its [StopPredicate] whether to keep going,
//! and records both the block it entered and the exact point where it entered it.
//! Stepping is lazy: it only happens while one of the paths is being read.

use std::iter::FusedIterator;

use anyhow::{bail, ensure, Context, Result};
use cgmath::{InnerSpace, Vector3, Zero};
use thiserror::Error;

use crate::coordinates::{BlockCoordinate, BlockFace};
use crate::extent::Extent;
use crate::predicate::StopPredicate;

/// Boundaries whose distances along the ray differ by less than this (in blocks) are
/// crossed together, i.e. the ray passes through an edge or corner.
pub const TIE_EPSILON: f64 = 1e-9;

#[derive(Error, Debug, PartialEq)]
pub enum BlockRayError {
    #[error("Ray direction must not be the zero vector")]
    ZeroDirection,
    #[error("Ray {0} contained NaN or inf")]
    NonFiniteVector(&'static str),
    #[error("Ray origin block {0:?} is outside of the extent")]
    OriginOutsideExtent(BlockCoordinate),
}

/// Why a ray stopped stepping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// The stop predicate rejected the last block entered.
    Predicate,
    /// The next block would have been outside the extent.
    WorldEdge,
    /// The stop predicate failed; the error was returned from the path being read.
    Error,
}

pub struct BlockRay<'e, P> {
    origin: Vector3<f64>,
    // Normalized, so distances along the ray are in blocks.
    direction: Vector3<f64>,
    extent: &'e dyn Extent,
    predicate: P,
    step: [i32; 3],
    start: BlockCoordinate,
    block: BlockCoordinate,
    distance: f64,
    last_face: Option<BlockFace>,
    termination: Option<Termination>,
    end_location: Option<BlockCoordinate>,
    computed_discrete: Vec<BlockCoordinate>,
    computed_intersecting: Vec<Vector3<f64>>,
}

impl<'e, P: StopPredicate<'e>> BlockRay<'e, P> {
    /// Builds a ray and starts `predicate` on it. No stepping happens until one of the
    /// paths is read.
    pub fn new(
        origin: Vector3<f64>,
        direction: Vector3<f64>,
        extent: &'e dyn Extent,
        mut predicate: P,
    ) -> Result<Self> {
        ensure!(
            is_finite(origin),
            BlockRayError::NonFiniteVector("origin")
        );
        ensure!(
            is_finite(direction),
            BlockRayError::NonFiniteVector("direction")
        );
        ensure!(!direction.is_zero(), BlockRayError::ZeroDirection);
        let direction = direction.normalize();
        // Subnormal directions can't be normalized
        ensure!(is_finite(direction), BlockRayError::ZeroDirection);

        let start = BlockCoordinate::containing(origin, direction)
            .context("Ray origin is out of range")?;
        ensure!(
            extent.contains(start),
            BlockRayError::OriginOutsideExtent(start)
        );
        predicate
            .start(origin, direction, extent)
            .context("Stop predicate failed to start")?;

        let step = [
            step_sign(direction.x),
            step_sign(direction.y),
            step_sign(direction.z),
        ];
        log::debug!(
            "Starting ray at {:?} (block {:?}) towards {:?}",
            origin,
            start,
            direction
        );
        Ok(BlockRay {
            origin,
            direction,
            extent,
            predicate,
            step,
            start,
            block: start,
            distance: 0.0,
            last_face: None,
            termination: None,
            end_location: None,
            computed_discrete: vec![start],
            computed_intersecting: vec![],
        })
    }

    /// The blocks the ray passes through, starting with the block containing the origin.
    /// If the stop predicate ends the ray, the block it rejected is the last one yielded.
    ///
    /// Reading the path again replays the blocks already found before stepping further.
    pub fn discrete(&mut self) -> DiscretePath<'_, 'e, P> {
        Path {
            ray: self,
            index: 0,
            done: false,
            cache: Self::discrete_cache,
        }
    }

    /// The points where the ray crosses into each new block, in order. The origin itself
    /// is not included; the crossing the stop predicate rejected is.
    pub fn intersecting(&mut self) -> IntersectingPath<'_, 'e, P> {
        Path {
            ray: self,
            index: 0,
            done: false,
            cache: Self::intersecting_cache,
        }
    }

    /// Steps until the ray stops, and returns where it stopped.
    ///
    /// With a predicate that never rejects and an unbounded extent, this never returns.
    pub fn end(&mut self) -> Result<Option<BlockCoordinate>> {
        while self.advance()? {}
        Ok(self.end_location)
    }

    /// Crosses one boundary. Returns false once the ray has stopped.
    fn advance(&mut self) -> Result<bool> {
        if self.termination.is_some() {
            return Ok(false);
        }

        let mut boundary_distance = [f64::INFINITY; 3];
        let mut winner = None;
        for axis in 0..3 {
            if self.step[axis] == 0 {
                continue;
            }
            let t = (self.boundary(axis) - self.origin[axis]) / self.direction[axis];
            boundary_distance[axis] = t;
            if winner.map_or(true, |w: usize| t < boundary_distance[w]) {
                winner = Some(axis);
            }
        }
        let Some(winner) = winner else {
            bail!("Ray has no moving axis");
        };
        let t = boundary_distance[winner];

        // Recompute from the origin rather than accumulating, so long rays don't drift.
        let mut position = self.origin + self.direction * t;
        let mut next = self.block;
        for axis in 0..3 {
            let step = self.step[axis];
            if step == 0 {
                continue;
            }
            let lower = self.block.component(axis) as f64;
            let upper = lower + 1.0;
            let reached = if step > 0 {
                position[axis] >= upper
            } else {
                position[axis] <= lower
            };
            if boundary_distance[axis] <= t + TIE_EPSILON || reached {
                let Some(moved) = self.block.component(axis).checked_add(step) else {
                    log::debug!("Ray hit the edge of the coordinate space at {:?}", self.block);
                    return Ok(self.finish(Termination::WorldEdge, Some(self.block)));
                };
                *next.component_mut(axis) = moved;
                position[axis] = self.boundary(axis);
            } else if step > 0 {
                position[axis] = position[axis].max(lower);
            } else {
                position[axis] = position[axis].min(upper);
            }
        }

        if !self.extent.contains(next) {
            log::debug!(
                "Ray left the extent after {:?} at distance {}",
                self.block,
                self.distance
            );
            return Ok(self.finish(Termination::WorldEdge, Some(self.block)));
        }

        let face = BlockFace::entered_through(winner, self.step[winner]);
        log::trace!("{:?} -> {:?} through {:?} at {:?}", self.block, next, face, position);
        self.block = next;
        self.distance = t;
        self.last_face = Some(face);

        let keep_going = match self.predicate.should_continue(position, face) {
            Ok(x) => x,
            Err(e) => {
                self.finish(Termination::Error, None);
                return Err(e.context(format!("Stop predicate failed at {:?}", next)));
            }
        };
        self.computed_discrete.push(next);
        self.computed_intersecting.push(position);
        if !keep_going {
            log::debug!("Ray stopped by predicate at {:?}, distance {}", next, t);
            self.finish(Termination::Predicate, Some(next));
        }
        Ok(true)
    }

    fn finish(&mut self, reason: Termination, end: Option<BlockCoordinate>) -> bool {
        self.termination = Some(reason);
        self.end_location = end;
        false
    }

    /// The coordinate of the next boundary along `axis`, which must be moving.
    #[inline]
    fn boundary(&self, axis: usize) -> f64 {
        let current = self.block.component(axis) as f64;
        if self.step[axis] > 0 {
            current + 1.0
        } else {
            current
        }
    }
}

impl<'e, P> BlockRay<'e, P> {
    pub fn origin(&self) -> Vector3<f64> {
        self.origin
    }
    /// The normalized direction of the ray.
    pub fn direction(&self) -> Vector3<f64> {
        self.direction
    }
    pub fn start_block(&self) -> BlockCoordinate {
        self.start
    }
    fn discrete_cache(&self) -> &[BlockCoordinate] {
        &self.computed_discrete
    }
    fn intersecting_cache(&self) -> &[Vector3<f64>] {
        &self.computed_intersecting
    }
    pub fn extent(&self) -> &'e dyn Extent {
        self.extent
    }
    /// The block the ray stopped in, once it has stopped (either rejected by the stop
    /// predicate or at the edge of the extent).
    pub fn end_location(&self) -> Option<BlockCoordinate> {
        self.end_location
    }
    pub fn termination(&self) -> Option<Termination> {
        self.termination
    }
    pub fn is_finished(&self) -> bool {
        self.termination.is_some()
    }
    /// The face crossed most recently, or None if the ray hasn't left its first block.
    pub fn last_face(&self) -> Option<BlockFace> {
        self.last_face
    }
    /// Distance from the origin to the most recent crossing, in blocks.
    pub fn distance(&self) -> f64 {
        self.distance
    }
}

/// Iterates one of the two paths of a [BlockRay]. Both share the ray's stepping, so
/// advancing one also extends the other's cache.
pub struct Path<'a, 'e, P, T> {
    ray: &'a mut BlockRay<'e, P>,
    index: usize,
    done: bool,
    cache: for<'r> fn(&'r BlockRay<'e, P>) -> &'r [T],
}
pub type DiscretePath<'a, 'e, P> = Path<'a, 'e, P, BlockCoordinate>;
pub type IntersectingPath<'a, 'e, P> = Path<'a, 'e, P, Vector3<f64>>;

impl<'a, 'e, P: StopPredicate<'e>, T: Copy> Iterator for Path<'a, 'e, P, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            if let Some(item) = (self.cache)(self.ray).get(self.index) {
                self.index += 1;
                return Some(Ok(*item));
            }
            match self.ray.advance() {
                Ok(true) => continue,
                Ok(false) => {
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
impl<'a, 'e, P: StopPredicate<'e>, T: Copy> FusedIterator for Path<'a, 'e, P, T> {}

#[inline]
fn step_sign(component: f64) -> i32 {
    if component > 0.0 {
        1
    } else if component < 0.0 {
        -1
    } else {
        0
    }
}

#[inline]
fn is_finite(v: Vector3<f64>) -> bool {
    v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
}
