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

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use blockray_core::{
    predicate::{self, StopPredicate},
    ray::Termination,
    BlockCoordinate, BlockId, BlockRay, Extent, PlayerPosition, Viewer,
};
use cgmath::{vec3, Vector3};
use clap::Parser;

use crate::scene::{Aim, BlockTypeNames, Scene, StopSettings};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct ToolArgs {
    /// RON file describing the extent and the rays to cast
    #[arg(short, long, value_name = "SCENE_FILE")]
    pub scene: PathBuf,

    /// Only cast the ray with this index
    #[arg(short, long)]
    pub ray: Option<usize>,

    /// Overrides the scene's limit on blocks visited per ray
    #[arg(long)]
    pub max_steps: Option<usize>,

    /// Also print the exact point where the ray entered each block
    #[arg(short, long)]
    pub intersections: bool,
}

/// What one traced ray went through.
#[derive(Debug)]
pub struct CastReport {
    pub name: String,
    pub blocks: Vec<(BlockCoordinate, BlockId)>,
    pub intersections: Vec<Vector3<f64>>,
    pub end: Option<BlockCoordinate>,
    pub termination: Option<Termination>,
    /// The ray was still going when the step limit was reached
    pub truncated: bool,
}

pub fn build_predicate<'e>(
    stop: &StopSettings,
    names: &BlockTypeNames,
) -> Result<Box<dyn StopPredicate<'e> + 'e>> {
    let result: Box<dyn StopPredicate<'e> + 'e> = match stop {
        StopSettings::Always => Box::new(predicate::all()),
        StopSettings::Never => Box::new(predicate::none()),
        StopSettings::OnlyAir => Box::new(predicate::only_air()),
        StopSettings::BlockType(name) => Box::new(predicate::block_type(names.get(name)?)),
        StopSettings::BaseBlockType(name) => {
            Box::new(predicate::base_block_type(names.get(name)?))
        }
        StopSettings::MaxDistance(distance) => Box::new(predicate::max_distance(*distance)),
        StopSettings::And(first, second) => {
            Box::new(build_predicate(first, names)?.and(build_predicate(second, names)?))
        }
    };
    Ok(result)
}

/// Traces the `index`-th ray of `scene`, visiting at most `max_steps` blocks after the
/// first.
pub fn cast(scene: &Scene, index: usize, max_steps: usize) -> Result<CastReport> {
    let settings = scene.ray(index)?;
    let (x, y, z) = settings.origin;
    let origin = vec3(x, y, z);
    let name = settings.name.clone();
    match settings.aim {
        Aim::Direction(dx, dy, dz) => {
            let predicate = build_predicate(&settings.stop, scene.names())?;
            let ray = BlockRay::new(origin, vec3(dx, dy, dz), scene.extent(), predicate)
                .with_context(|| format!("Couldn't build ray {name}"))?;
            trace(name, ray, max_steps)
        }
        Aim::Facing {
            azimuth,
            elevation,
            eye_height,
        } => {
            let viewer = Viewer::new(
                PlayerPosition {
                    position: origin,
                    face_direction: (azimuth, elevation),
                },
                eye_height,
                scene.extent(),
            );
            let predicate = build_predicate(&settings.stop, scene.names())?;
            let ray = BlockRay::from_source(&viewer, predicate)
                .with_context(|| format!("Couldn't build ray {name}"))?;
            trace(name, ray, max_steps)
        }
    }
}

fn trace<'e, P: StopPredicate<'e>>(
    name: String,
    mut ray: BlockRay<'e, P>,
    max_steps: usize,
) -> Result<CastReport> {
    let limit = max_steps.saturating_add(1);
    let blocks = ray.discrete().take(limit).collect::<Result<Vec<_>>>()?;
    // Only a block past the limit means the ray was cut short; it may just as well stop
    // on the very next step.
    let truncated = blocks.len() == limit && ray.discrete().nth(limit).transpose()?.is_some();
    if truncated {
        log::warn!("Ray {name} was still going after {max_steps} steps");
    }
    // One crossing per block after the first
    let intersections = ray
        .intersecting()
        .take(blocks.len() - 1)
        .collect::<Result<Vec<_>>>()?;
    let extent = ray.extent();
    let (end, termination) = if truncated {
        (None, None)
    } else {
        (ray.end_location(), ray.termination())
    };
    Ok(CastReport {
        name,
        blocks: blocks
            .into_iter()
            .map(|b| (b, extent.block_type_at(b)))
            .collect(),
        intersections,
        end,
        termination,
        truncated,
    })
}

pub fn write_report(
    report: &CastReport,
    names: &BlockTypeNames,
    show_intersections: bool,
    out: &mut impl Write,
) -> Result<()> {
    let outcome = match (report.end, report.termination) {
        (Some(end), Some(Termination::Predicate)) => format!("stopped at {end}"),
        (Some(end), Some(Termination::WorldEdge)) => format!("left the extent after {end}"),
        _ if report.truncated => String::from("hit the step limit"),
        _ => String::from("failed"),
    };
    writeln!(
        out,
        "ray {}: {} blocks, {}",
        report.name,
        report.blocks.len(),
        outcome
    )?;
    for (i, (coord, id)) in report.blocks.iter().enumerate() {
        // The first block is where the ray started, not entered
        let entry = match i.checked_sub(1) {
            Some(prev) if show_intersections => report.intersections.get(prev),
            _ => None,
        };
        match entry {
            Some(p) => writeln!(
                out,
                "  {} {} entered at {:.6}, {:.6}, {:.6}",
                coord,
                names.name_of(*id),
                p.x,
                p.y,
                p.z
            )?,
            None => writeln!(out, "  {} {}", coord, names.name_of(*id))?,
        }
    }
    Ok(())
}

pub fn run(args: &ToolArgs, out: &mut impl Write) -> Result<()> {
    let scene = Scene::load(&args.scene)?;
    let max_steps = args.max_steps.unwrap_or(scene.max_steps());
    let indices: Vec<usize> = match args.ray {
        Some(index) => vec![index],
        None => (0..scene.rays().len()).collect(),
    };
    for index in indices {
        let report = cast(&scene, index, max_steps)?;
        write_report(&report, scene.names(), args.intersections, out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneSettings;

    fn bundled_scene() -> Scene {
        Scene::from_settings(
            SceneSettings::from_ron(include_str!("../scenes/pointer.ron")).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn pointer_finds_stone() {
        let scene = bundled_scene();
        let report = cast(&scene, 0, scene.max_steps()).unwrap();
        assert_eq!(report.end, Some(BlockCoordinate::new(0, 1, 5)));
        assert_eq!(report.termination, Some(Termination::Predicate));
        assert_eq!(report.blocks.len(), 6);
        assert_eq!(
            scene.names().name_of(report.blocks.last().unwrap().1),
            "default:stone"
        );
        assert_eq!(report.intersections.len(), 5);
        assert_eq!(report.intersections[0], vec3(0.5, 1.5, 1.0));
    }

    #[test]
    fn diagonal_leaves_extent() {
        let scene = bundled_scene();
        let report = cast(&scene, 1, scene.max_steps()).unwrap();
        assert_eq!(report.termination, Some(Termination::WorldEdge));
        assert_eq!(report.end, Some(BlockCoordinate::new(8, 8, 0)));
        assert_eq!(report.blocks.len(), 9);
        assert!(!report.truncated);
    }

    #[test]
    fn glass_stops_downward_ray() {
        let scene = bundled_scene();
        let report = cast(&scene, 2, scene.max_steps()).unwrap();
        assert_eq!(report.end, Some(BlockCoordinate::new(3, 2, 3)));

        let mut out = vec![];
        write_report(&report, scene.names(), true, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("ray down through glass: 5 blocks, stopped at 3,2,3"));
        assert!(text.contains("\n  3,6,3 builtin:air\n"));
        assert!(text.contains("  3,5,3 builtin:air entered at 3.500000, 6.000000, 3.500000"));
        assert!(text.contains("  3,2,3 default:glass entered at 3.500000, 3.000000, 3.500000"));
    }

    #[test]
    fn step_limit_truncates() {
        let scene = bundled_scene();
        let report = cast(&scene, 1, 3).unwrap();
        assert!(report.truncated);
        assert_eq!(report.blocks.len(), 4);
        assert_eq!(report.intersections.len(), 3);
        assert_eq!(report.end, None);
    }

    #[test]
    fn limit_reached_on_last_block_is_not_truncation() {
        let scene = bundled_scene();
        // The diagonal ray visits 9 blocks, then leaves the extent
        let report = cast(&scene, 1, 8).unwrap();
        assert!(!report.truncated);
        assert_eq!(report.blocks.len(), 9);
        assert_eq!(report.termination, Some(Termination::WorldEdge));
        assert_eq!(report.end, Some(BlockCoordinate::new(8, 8, 0)));

        let report = cast(&scene, 1, 7).unwrap();
        assert!(report.truncated);
        assert_eq!(report.blocks.len(), 8);
        assert_eq!(report.termination, None);
    }
}
