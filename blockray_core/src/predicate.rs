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

//! Stop predicates decide where a [crate::ray::BlockRay] ends.
//!
//! A predicate is bound to exactly one traversal: [StopPredicate::start] is called once
//! when the ray is built, and [StopPredicate::should_continue] once for every block
//! boundary the ray crosses afterwards. Predicates are free to keep state along that one
//! path. Calling either method out of order is reported as a [PredicateError].

use anyhow::{bail, ensure, Result};
use cgmath::Vector3;
use thiserror::Error;

use crate::block_id::{special_block_defs::AIR_ID, BlockId};
use crate::coordinates::{BlockCoordinate, BlockFace};
use crate::extent::Extent;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PredicateError {
    #[error("Stop predicate was already started; predicates cannot be reused across rays")]
    AlreadyStarted,
    #[error("Stop predicate was asked to decide before it was started")]
    NotStarted,
}

pub trait StopPredicate<'e> {
    /// Binds this predicate to a ray starting at `origin`.
    fn start(
        &mut self,
        origin: Vector3<f64>,
        direction: Vector3<f64>,
        extent: &'e dyn Extent,
    ) -> Result<()>;

    /// Called each time the ray crosses into a new block.
    ///
    /// At least one of the coordinates of `position` is an exact integer: the one on the
    /// axis of `face`, which is the face of the new block that the ray entered through.
    /// The other coordinates give the point on that face where the ray entered.
    ///
    /// Returning false stops the ray in the new block.
    fn should_continue(&mut self, position: Vector3<f64>, face: BlockFace) -> Result<bool>;

    /// Composes this predicate with `other`. The result continues only while both do,
    /// checking `self` first.
    fn and<P: StopPredicate<'e>>(self, other: P) -> And<Self, P>
    where
        Self: Sized,
    {
        And::new(self, other)
    }
}

impl<'e, P: StopPredicate<'e> + ?Sized> StopPredicate<'e> for Box<P> {
    fn start(
        &mut self,
        origin: Vector3<f64>,
        direction: Vector3<f64>,
        extent: &'e dyn Extent,
    ) -> Result<()> {
        (**self).start(origin, direction, extent)
    }

    fn should_continue(&mut self, position: Vector3<f64>, face: BlockFace) -> Result<bool> {
        (**self).should_continue(position, face)
    }
}

/// A predicate that only looks at whole blocks, not where inside a block the ray is.
///
/// Wrap in [Discrete] to use with a ray.
pub trait DiscretePredicate<'e> {
    fn start_at(&mut self, start: BlockCoordinate, extent: &'e dyn Extent) -> Result<()>;

    fn continue_at(&mut self, block: BlockCoordinate, face: BlockFace) -> Result<bool>;
}

#[derive(Clone, Copy, Debug)]
enum StartState<T> {
    Fresh,
    Started(T),
}
impl<T: Copy> StartState<T> {
    fn begin(&mut self, value: T) -> Result<()> {
        ensure!(
            matches!(self, StartState::Fresh),
            PredicateError::AlreadyStarted
        );
        *self = StartState::Started(value);
        Ok(())
    }

    fn get(&self) -> Result<T> {
        match self {
            StartState::Started(value) => Ok(*value),
            StartState::Fresh => bail!(PredicateError::NotStarted),
        }
    }
}

/// Adapts a [DiscretePredicate] into a [StopPredicate], resolving each crossing point to
/// the block the ray is entering.
pub struct Discrete<P> {
    inner: P,
    direction: StartState<Vector3<f64>>,
}
impl<P> Discrete<P> {
    pub fn new(inner: P) -> Self {
        Discrete {
            inner,
            direction: StartState::Fresh,
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}
impl<'e, P: DiscretePredicate<'e>> StopPredicate<'e> for Discrete<P> {
    fn start(
        &mut self,
        origin: Vector3<f64>,
        direction: Vector3<f64>,
        extent: &'e dyn Extent,
    ) -> Result<()> {
        self.direction.begin(direction)?;
        let start = BlockCoordinate::containing(origin, direction)?;
        self.inner.start_at(start, extent)
    }

    fn should_continue(&mut self, position: Vector3<f64>, face: BlockFace) -> Result<bool> {
        let direction = self.direction.get()?;
        let block = BlockCoordinate::containing(position, direction)?;
        self.inner.continue_at(block, face)
    }
}

pub struct And<A, B> {
    first: A,
    second: B,
    started: StartState<()>,
}
impl<A, B> And<A, B> {
    pub fn new(first: A, second: B) -> Self {
        And {
            first,
            second,
            started: StartState::Fresh,
        }
    }
}
impl<'e, A: StopPredicate<'e>, B: StopPredicate<'e>> StopPredicate<'e> for And<A, B> {
    fn start(
        &mut self,
        origin: Vector3<f64>,
        direction: Vector3<f64>,
        extent: &'e dyn Extent,
    ) -> Result<()> {
        self.started.begin(())?;
        // Both sides get started even if the first one fails.
        let first = self.first.start(origin, direction, extent);
        let second = self.second.start(origin, direction, extent);
        first.and(second)
    }

    fn should_continue(&mut self, position: Vector3<f64>, face: BlockFace) -> Result<bool> {
        self.started.get()?;
        Ok(self.first.should_continue(position, face)?
            && self.second.should_continue(position, face)?)
    }
}

/// Continues through every block. A ray using only this predicate ends only at the edge
/// of its extent, and never ends in an unbounded one.
#[derive(Debug)]
pub struct AcceptAll;
impl<'e> DiscretePredicate<'e> for AcceptAll {
    fn start_at(&mut self, _start: BlockCoordinate, _extent: &'e dyn Extent) -> Result<()> {
        Ok(())
    }
    fn continue_at(&mut self, _block: BlockCoordinate, _face: BlockFace) -> Result<bool> {
        Ok(true)
    }
}

/// Stops at the first block boundary.
#[derive(Debug)]
pub struct AcceptNone;
impl<'e> DiscretePredicate<'e> for AcceptNone {
    fn start_at(&mut self, _start: BlockCoordinate, _extent: &'e dyn Extent) -> Result<()> {
        Ok(())
    }
    fn continue_at(&mut self, _block: BlockCoordinate, _face: BlockFace) -> Result<bool> {
        Ok(false)
    }
}

/// Continues while the entered block has a given type.
pub struct BlockTypeEquals<'e> {
    block: BlockId,
    ignore_variant: bool,
    extent: Option<&'e dyn Extent>,
}
impl<'e> DiscretePredicate<'e> for BlockTypeEquals<'e> {
    fn start_at(&mut self, _start: BlockCoordinate, extent: &'e dyn Extent) -> Result<()> {
        self.extent = Some(extent);
        Ok(())
    }
    fn continue_at(&mut self, block: BlockCoordinate, _face: BlockFace) -> Result<bool> {
        let extent = self.extent.ok_or(PredicateError::NotStarted)?;
        let found = extent.block_type_at(block);
        Ok(if self.ignore_variant {
            found.equals_ignore_variant(self.block)
        } else {
            found == self.block
        })
    }
}

/// Continues while the entered block is strictly closer than `distance` to the block
/// the ray started in.
///
/// The block where this stops the ray is itself further away than `distance`, so a ray
/// can end beyond the limit; every block before it is within the limit.
pub struct MaxDistance {
    distance_squared: u64,
    start: Option<BlockCoordinate>,
}
impl<'e> DiscretePredicate<'e> for MaxDistance {
    fn start_at(&mut self, start: BlockCoordinate, _extent: &'e dyn Extent) -> Result<()> {
        self.start = Some(start);
        Ok(())
    }
    fn continue_at(&mut self, block: BlockCoordinate, _face: BlockFace) -> Result<bool> {
        let start = self.start.ok_or(PredicateError::NotStarted)?;
        Ok(block.distance_squared(start) < self.distance_squared)
    }
}

pub fn all() -> Discrete<AcceptAll> {
    Discrete::new(AcceptAll)
}

pub fn none() -> Discrete<AcceptNone> {
    Discrete::new(AcceptNone)
}

/// Passes only through blocks of exactly `block` (including its variant).
pub fn block_type<'e>(block: BlockId) -> Discrete<BlockTypeEquals<'e>> {
    Discrete::new(BlockTypeEquals {
        block,
        ignore_variant: false,
        extent: None,
    })
}

/// Passes only through blocks of the same base type as `block`, with any variant.
pub fn base_block_type<'e>(block: BlockId) -> Discrete<BlockTypeEquals<'e>> {
    Discrete::new(BlockTypeEquals {
        block,
        ignore_variant: true,
        extent: None,
    })
}

/// Passes only through air, i.e. finds the first non-air block the ray hits.
pub fn only_air<'e>() -> Discrete<BlockTypeEquals<'e>> {
    block_type(AIR_ID)
}

pub fn max_distance(distance: u32) -> Discrete<MaxDistance> {
    let distance = distance as u64;
    Discrete::new(MaxDistance {
        // (2^32 - 1)^2 < 2^64
        distance_squared: distance * distance,
        start: None,
    })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use cgmath::vec3;

    use super::*;
    use crate::extent::SparseExtent;

    const STONE: BlockId = BlockId(1 << 12);

    fn err_kind(err: anyhow::Error) -> PredicateError {
        match err.downcast::<PredicateError>() {
            Ok(kind) => kind,
            Err(err) => panic!("unexpected error {err:?}"),
        }
    }

    /// Records calls into a shared log and answers with a fixed value.
    struct Recording {
        name: &'static str,
        answer: bool,
        log: Rc<RefCell<Vec<String>>>,
    }
    impl<'e> StopPredicate<'e> for Recording {
        fn start(
            &mut self,
            _origin: Vector3<f64>,
            _direction: Vector3<f64>,
            _extent: &'e dyn Extent,
        ) -> Result<()> {
            self.log.borrow_mut().push(format!("{}:start", self.name));
            Ok(())
        }
        fn should_continue(&mut self, _position: Vector3<f64>, _face: BlockFace) -> Result<bool> {
            self.log.borrow_mut().push(format!("{}:decide", self.name));
            Ok(self.answer)
        }
    }

    #[test]
    fn and_starts_both_and_short_circuits() {
        let extent = SparseExtent::unbounded(AIR_ID);
        let log = Rc::new(RefCell::new(vec![]));
        let mut pred = Recording {
            name: "a",
            answer: false,
            log: log.clone(),
        }
        .and(Recording {
            name: "b",
            answer: true,
            log: log.clone(),
        });
        pred.start(vec3(0.0, 0.0, 0.0), vec3(1.0, 0.0, 0.0), &extent)
            .unwrap();
        assert_eq!(*log.borrow(), vec!["a:start", "b:start"]);
        assert!(!pred
            .should_continue(vec3(1.0, 0.5, 0.5), BlockFace::NegX)
            .unwrap());
        assert_eq!(*log.borrow(), vec!["a:start", "b:start", "a:decide"]);
    }

    #[test]
    fn and_is_logical_and() {
        let extent = SparseExtent::unbounded(AIR_ID)
            .with_block(BlockCoordinate::new(2, 0, 0), STONE)
            .unwrap();
        let mut pred = only_air().and(max_distance(100));
        pred.start(vec3(0.5, 0.5, 0.5), vec3(1.0, 0.0, 0.0), &extent)
            .unwrap();
        for x in 1..200 {
            let pos = vec3(x as f64, 0.5, 0.5);
            let expected = x != 2 && x < 100;
            assert_eq!(
                pred.should_continue(pos, BlockFace::NegX).unwrap(),
                expected,
                "at x = {x}"
            );
        }
    }

    #[test]
    fn decide_before_start_is_misuse() {
        let mut pred = max_distance(3);
        let err = pred
            .should_continue(vec3(1.0, 0.0, 0.0), BlockFace::NegX)
            .unwrap_err();
        assert_eq!(err_kind(err), PredicateError::NotStarted);

        let mut pred = all().and(none());
        let err = pred
            .should_continue(vec3(1.0, 0.0, 0.0), BlockFace::NegX)
            .unwrap_err();
        assert_eq!(err_kind(err), PredicateError::NotStarted);
    }

    #[test]
    fn restart_is_misuse() {
        let extent = SparseExtent::unbounded(AIR_ID);
        let mut pred = only_air();
        pred.start(vec3(0.0, 0.0, 0.0), vec3(1.0, 0.0, 0.0), &extent)
            .unwrap();
        let err = pred
            .start(vec3(0.0, 0.0, 0.0), vec3(1.0, 0.0, 0.0), &extent)
            .unwrap_err();
        assert_eq!(err_kind(err), PredicateError::AlreadyStarted);
    }

    #[test]
    fn max_distance_boundary() {
        let extent = SparseExtent::unbounded(AIR_ID);
        let mut pred = max_distance(3);
        pred.start(vec3(0.0, 0.0, 0.0), vec3(1.0, 1.0, 0.0), &extent)
            .unwrap();
        // 2² + 2² = 8 < 9
        assert!(pred
            .should_continue(vec3(2.0, 2.5, 0.5), BlockFace::NegX)
            .unwrap());
        // 3² = 9, not < 9
        assert!(!pred
            .should_continue(vec3(3.0, 0.5, 0.5), BlockFace::NegX)
            .unwrap());
    }

    #[test]
    fn max_distance_accepts_full_u32_range() {
        let extent = SparseExtent::unbounded(AIR_ID);
        let mut pred = max_distance(u32::MAX);
        pred.start(vec3(0.5, 0.5, 0.5), vec3(1.0, 0.0, 0.0), &extent)
            .unwrap();
        assert!(pred
            .should_continue(vec3(1.0, 0.5, 0.5), BlockFace::NegX)
            .unwrap());
        // Across the whole x range: (2^32 - 1)^2 is not < (2^32 - 1)^2
        let mut pred = max_distance(u32::MAX);
        pred.start(
            vec3(i32::MIN as f64 + 0.5, 0.5, 0.5),
            vec3(1.0, 0.0, 0.0),
            &extent,
        )
        .unwrap();
        assert!(!pred
            .should_continue(vec3(i32::MAX as f64, 0.5, 0.5), BlockFace::NegX)
            .unwrap());
    }

    #[test]
    fn block_type_uses_entered_block() {
        let extent = SparseExtent::unbounded(AIR_ID)
            .with_block(BlockCoordinate::new(1, 0, 0), STONE)
            .unwrap();
        // Travelling -x, the boundary at x = 2 leads into block 1.
        let mut pred = only_air();
        pred.start(vec3(3.5, 0.5, 0.5), vec3(-1.0, 0.0, 0.0), &extent)
            .unwrap();
        assert!(!pred
            .should_continue(vec3(2.0, 0.5, 0.5), BlockFace::PosX)
            .unwrap());

        let mut pred = base_block_type(STONE.with_variant(3).unwrap());
        pred.start(vec3(0.5, 0.5, 0.5), vec3(1.0, 0.0, 0.0), &extent)
            .unwrap();
        assert!(pred
            .should_continue(vec3(1.0, 0.5, 0.5), BlockFace::NegX)
            .unwrap());
    }

    #[test]
    fn boxed_predicates_compose() {
        let extent = SparseExtent::unbounded(AIR_ID);
        let mut pred: Box<dyn StopPredicate<'_> + '_> = Box::new(all());
        pred = Box::new(pred.and(none()));
        pred.start(vec3(0.0, 0.0, 0.0), vec3(0.0, 1.0, 0.0), &extent)
            .unwrap();
        assert!(!pred
            .should_continue(vec3(0.5, 1.0, 0.5), BlockFace::NegY)
            .unwrap());
    }
}
