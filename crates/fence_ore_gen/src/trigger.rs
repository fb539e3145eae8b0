//! Fence/water trigger geometry.
//!
//! Only the four horizontal faces take part in adjacency; the water-flow path also
//! looks at the block directly below the wet cell.
use glam::IVec3;

use crate::material::MaterialRegistry;
use crate::world::{BlockAccess, Direction};

const AXES: [(Direction, Direction); 2] = [
    (Direction::North, Direction::South),
    (Direction::East, Direction::West),
];

/// Whether fence and water face each other across `center` on either horizontal axis.
pub fn is_fence_water_adjacent<W: BlockAccess + ?Sized>(
    world: &W,
    registry: &MaterialRegistry,
    center: IVec3,
) -> bool {
    AXES.iter().any(|&(a, b)| {
        let side_a = world.material_at(a.step(center));
        let side_b = world.material_at(b.step(center));
        (registry.is_fence_like(side_a) && registry.is_water(side_b))
            || (registry.is_water(side_a) && registry.is_fence_like(side_b))
    })
}

/// Candidate target for a fence just placed at `placed`.
///
/// Neighbors are scanned north, south, east, west; the first water face wins and the
/// block on the opposite face becomes the target. `None` if `placed` is not a fence.
pub fn fence_placement_target<W: BlockAccess + ?Sized>(
    world: &W,
    registry: &MaterialRegistry,
    placed: IVec3,
) -> Option<IVec3> {
    if !registry.is_fence_like(world.material_at(placed)) {
        return None;
    }
    let water_face = Direction::HORIZONTAL
        .into_iter()
        .find(|face| registry.is_water(world.material_at(face.step(placed))))?;
    let target = water_face.opposite()?.step(placed);
    tracing::debug!(
        "Fence at {} touches water on {:?}, target {}.",
        placed,
        water_face,
        target
    );
    Some(target)
}

/// Candidate target for water about to flow from `from` into `to`.
///
/// Returns `Some(to)` when `to` is air, `from` is water, and a fence sits beside or
/// below `to`. The host should cancel the flow whenever this returns `Some`.
pub fn water_flow_target<W: BlockAccess + ?Sized>(
    world: &W,
    registry: &MaterialRegistry,
    from: IVec3,
    to: IVec3,
) -> Option<IVec3> {
    if !registry.is_water(world.material_at(from)) || !registry.is_air(world.material_at(to)) {
        return None;
    }
    let fenced = Direction::HORIZONTAL
        .into_iter()
        .chain(std::iter::once(Direction::Down))
        .any(|face| registry.is_fence_like(world.material_at(face.step(to))));
    fenced.then_some(to)
}
