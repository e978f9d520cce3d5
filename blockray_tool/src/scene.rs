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

use std::path::Path;

use anyhow::{ensure, Context, Result};
use blockray_core::{
    block_id::special_block_defs::AIR_ID,
    constants::{blocks, rays},
    BlockCoordinate, BlockId, Bounds, SparseExtent,
};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SceneError {
    #[error("Block type `{0}` is not registered in the scene")]
    UnknownBlockType(String),
    #[error("Block type `{0}` is registered more than once")]
    DuplicateBlockType(String),
    #[error("Ray {0} requested, but the scene only has {1}")]
    NoSuchRay(usize, usize),
    #[error("Placement of `{0}` covers {1} blocks, more than the limit of {}", MAX_PLACEMENT_VOLUME)]
    PlacementTooLarge(String, u128),
    #[error("Placement of `{0}` reaches outside of the scene bounds")]
    PlacementOutOfBounds(String),
}

/// Largest number of blocks a single placement may fill.
pub const MAX_PLACEMENT_VOLUME: u128 = 1 << 24;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct BoundsSettings {
    pub min: (i32, i32, i32),
    pub max: (i32, i32, i32),
}

/// Places `block` at `at`, or fills the box from `at` to `to` (inclusive) with it.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct BlockPlacement {
    pub at: (i32, i32, i32),
    #[serde(default)]
    pub to: Option<(i32, i32, i32)>,
    pub block: String,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub enum Aim {
    /// Cast along a fixed vector; need not be normalized.
    Direction(f64, f64, f64),
    /// Cast from the eyes of a viewer standing at the origin, facing (azimuth, elevation)
    /// in degrees.
    Facing {
        azimuth: f64,
        elevation: f64,
        eye_height: f64,
    },
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub enum StopSettings {
    Always,
    Never,
    OnlyAir,
    BlockType(String),
    /// Like BlockType, but any variant of the block matches
    BaseBlockType(String),
    MaxDistance(u32),
    And(Box<StopSettings>, Box<StopSettings>),
}

#[derive(Clone, Serialize, Deserialize, Debug)]
#[serde(default)]
pub struct RaySettings {
    pub name: String,
    pub origin: (f64, f64, f64),
    pub aim: Aim,
    pub stop: StopSettings,
}

impl Default for RaySettings {
    fn default() -> Self {
        Self {
            name: String::from("pointer"),
            origin: (0.5, 0.0, 0.5),
            aim: Aim::Facing {
                azimuth: 0.0,
                elevation: 0.0,
                eye_height: rays::DEFAULT_EYE_HEIGHT,
            },
            stop: StopSettings::And(
                Box::new(StopSettings::OnlyAir),
                Box::new(StopSettings::MaxDistance(rays::POINTEE_DISTANCE)),
            ),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
#[serde(default)]
pub struct SceneSettings {
    /// Registered in order after builtin:air
    pub block_types: Vec<String>,
    /// None for an extent without edges
    pub bounds: Option<BoundsSettings>,
    pub fill: String,
    /// Reported outside of the bounds
    pub void: String,
    pub blocks: Vec<BlockPlacement>,
    pub rays: Vec<RaySettings>,
    /// Guards against rays that never stop
    pub max_steps: usize,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            block_types: vec![],
            bounds: None,
            fill: String::from(blocks::AIR),
            void: String::from(blocks::VOID),
            blocks: vec![],
            rays: vec![RaySettings::default()],
            max_steps: 4096,
        }
    }
}

impl SceneSettings {
    pub fn from_ron(text: &str) -> Result<Self> {
        ron::from_str(text).context("Failed to parse scene")
    }
}

/// Maps block type names to ids. Air is always index 0 and void, if not registered
/// explicitly, takes the next free index.
#[derive(Clone, Debug)]
pub struct BlockTypeNames {
    names: Vec<String>,
    ids: FxHashMap<String, BlockId>,
}
impl BlockTypeNames {
    pub fn new(block_types: &[String]) -> Result<Self> {
        let mut result = BlockTypeNames {
            names: vec![],
            ids: FxHashMap::default(),
        };
        result.register(blocks::AIR)?;
        for name in block_types {
            result.register(name)?;
        }
        if !result.ids.contains_key(blocks::VOID) {
            result.register(blocks::VOID)?;
        }
        Ok(result)
    }

    fn register(&mut self, name: &str) -> Result<BlockId> {
        ensure!(
            !self.ids.contains_key(name),
            SceneError::DuplicateBlockType(name.to_string())
        );
        let id = BlockId::from_index(self.names.len())?;
        self.names.push(name.to_string());
        self.ids.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn get(&self, name: &str) -> Result<BlockId> {
        self.ids
            .get(name)
            .copied()
            .ok_or_else(|| SceneError::UnknownBlockType(name.to_string()).into())
    }

    pub fn name_of(&self, id: BlockId) -> &str {
        self.names
            .get(id.index())
            .map(String::as_str)
            .unwrap_or("unknown")
    }
}

pub struct Scene {
    names: BlockTypeNames,
    extent: SparseExtent,
    rays: Vec<RaySettings>,
    max_steps: usize,
}
impl Scene {
    pub fn from_settings(settings: SceneSettings) -> Result<Scene> {
        let names = BlockTypeNames::new(&settings.block_types)?;
        let fill = names.get(&settings.fill)?;
        let void = names.get(&settings.void)?;
        let mut extent = match settings.bounds {
            Some(b) => SparseExtent::bounded(
                Bounds::new(tuple_coord(b.min), tuple_coord(b.max))?,
                fill,
                void,
            ),
            None => SparseExtent::unbounded(fill),
        };
        for placement in &settings.blocks {
            let block = names.get(&placement.block)?;
            let from = tuple_coord(placement.at);
            let to = placement.to.map(tuple_coord).unwrap_or(from);
            let region = Bounds::new(from, to)
                .with_context(|| format!("Bad placement of {}", placement.block))?;
            if let Some(bounds) = extent.bounds() {
                ensure!(
                    bounds.contains(region.min) && bounds.contains(region.max),
                    SceneError::PlacementOutOfBounds(placement.block.clone())
                );
            }
            let volume = [
                region.min.x.abs_diff(region.max.x),
                region.min.y.abs_diff(region.max.y),
                region.min.z.abs_diff(region.max.z),
            ]
            .iter()
            .map(|d| *d as u128 + 1)
            .product::<u128>();
            ensure!(
                volume <= MAX_PLACEMENT_VOLUME,
                SceneError::PlacementTooLarge(placement.block.clone(), volume)
            );
            for x in region.min.x..=region.max.x {
                for y in region.min.y..=region.max.y {
                    for z in region.min.z..=region.max.z {
                        extent.set_block(BlockCoordinate::new(x, y, z), block)?;
                    }
                }
            }
        }
        log::info!(
            "Scene has {} block types, {} placed blocks, {} rays",
            names.names.len(),
            extent.placed_len(),
            settings.rays.len()
        );
        if fill != AIR_ID {
            log::debug!("Scene is filled with {}", settings.fill);
        }
        Ok(Scene {
            names,
            extent,
            rays: settings.rays,
            max_steps: settings.max_steps,
        })
    }

    pub fn load(path: &Path) -> Result<Scene> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene file {}", path.display()))?;
        let settings = SceneSettings::from_ron(&text)
            .with_context(|| format!("In scene file {}", path.display()))?;
        log::info!("Loaded scene from {}", path.display());
        Scene::from_settings(settings)
    }

    pub fn names(&self) -> &BlockTypeNames {
        &self.names
    }
    pub fn extent(&self) -> &SparseExtent {
        &self.extent
    }
    pub fn rays(&self) -> &[RaySettings] {
        &self.rays
    }
    pub fn ray(&self, index: usize) -> Result<&RaySettings> {
        self.rays
            .get(index)
            .ok_or_else(|| SceneError::NoSuchRay(index, self.rays.len()).into())
    }
    pub fn max_steps(&self) -> usize {
        self.max_steps
    }
}

fn tuple_coord((x, y, z): (i32, i32, i32)) -> BlockCoordinate {
    BlockCoordinate::new(x, y, z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockray_core::Extent;

    const POINTER_SCENE: &str = include_str!("../scenes/pointer.ron");

    #[test]
    fn parses_bundled_scene() {
        let settings = SceneSettings::from_ron(POINTER_SCENE).unwrap();
        assert_eq!(settings.rays.len(), 3);
        let scene = Scene::from_settings(settings).unwrap();
        let stone = scene.names().get("default:stone").unwrap();
        assert_eq!(
            scene.extent().block_type_at(BlockCoordinate::new(0, 1, 5)),
            stone
        );
        assert_eq!(scene.names().name_of(stone), "default:stone");
        assert!(scene.ray(7).is_err());
    }

    #[test]
    fn defaults_fill_in_missing_fields() {
        let settings = SceneSettings::from_ron("(block_types: [\"default:dirt\"])").unwrap();
        assert_eq!(settings.max_steps, 4096);
        assert_eq!(settings.fill, blocks::AIR);
        assert_eq!(settings.rays.len(), 1);
        assert_eq!(
            settings.rays[0].stop,
            StopSettings::And(
                Box::new(StopSettings::OnlyAir),
                Box::new(StopSettings::MaxDistance(6))
            )
        );
    }

    #[test]
    fn unknown_and_duplicate_names_rejected() {
        let settings = SceneSettings {
            blocks: vec![BlockPlacement {
                at: (0, 0, 0),
                to: None,
                block: String::from("default:glass"),
            }],
            ..Default::default()
        };
        let err = Scene::from_settings(settings).err().unwrap();
        assert_eq!(
            err.downcast_ref::<SceneError>(),
            Some(&SceneError::UnknownBlockType(String::from("default:glass")))
        );

        let names = vec![String::from("a"), String::from("a")];
        let err = BlockTypeNames::new(&names).err().unwrap();
        assert_eq!(
            err.downcast_ref::<SceneError>(),
            Some(&SceneError::DuplicateBlockType(String::from("a")))
        );
    }

    #[test]
    fn box_placement_fills_region() {
        let settings = SceneSettings {
            block_types: vec![String::from("default:dirt")],
            blocks: vec![BlockPlacement {
                at: (0, 0, 0),
                to: Some((1, 2, 3)),
                block: String::from("default:dirt"),
            }],
            ..Default::default()
        };
        let scene = Scene::from_settings(settings).unwrap();
        assert_eq!(scene.extent().placed_len(), 2 * 3 * 4);
    }

    #[test]
    fn oversized_placements_rejected() {
        let huge = SceneSettings {
            block_types: vec![String::from("default:dirt")],
            blocks: vec![BlockPlacement {
                at: (i32::MIN, 0, i32::MIN),
                to: Some((i32::MAX, 0, i32::MAX)),
                block: String::from("default:dirt"),
            }],
            ..Default::default()
        };
        let err = Scene::from_settings(huge).err().unwrap();
        let span = u32::MAX as u128 + 1;
        assert_eq!(
            err.downcast_ref::<SceneError>(),
            Some(&SceneError::PlacementTooLarge(
                String::from("default:dirt"),
                span * span
            ))
        );

        let outside = SceneSettings {
            block_types: vec![String::from("default:dirt")],
            bounds: Some(BoundsSettings {
                min: (0, 0, 0),
                max: (4, 4, 4),
            }),
            blocks: vec![BlockPlacement {
                at: (0, 0, 0),
                to: Some((5, 0, 0)),
                block: String::from("default:dirt"),
            }],
            ..Default::default()
        };
        let err = Scene::from_settings(outside).err().unwrap();
        assert_eq!(
            err.downcast_ref::<SceneError>(),
            Some(&SceneError::PlacementOutOfBounds(String::from("default:dirt")))
        );
    }
}
