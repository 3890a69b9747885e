use glam::Vec3;
use rand::Rng;
use stagecraft_common::{GeometryId, MaterialId, NodeId, Transform};

use crate::node::{NodeKind, SceneNode};
use crate::scene::{Scene, SceneError};

/// Add `count` mesh nodes sharing one geometry/material pair, each placed
/// uniformly at random inside the cube `[-radius, radius]³`.
///
/// Positions are drawn independently per axis; overlapping nodes are
/// allowed. Nothing is inserted when validation fails, including a radius
/// so large that the span `2 * radius` overflows `f32`.
pub fn scatter<R: Rng + ?Sized>(
    scene: &mut Scene,
    count: usize,
    radius: f32,
    geometry: GeometryId,
    material: MaterialId,
    rng: &mut R,
) -> Result<Vec<NodeId>, SceneError> {
    if !(radius * 2.0).is_finite() || radius < 0.0 {
        return Err(SceneError::InvalidSpread(radius));
    }
    scene.check_pair(geometry, material)?;

    let ids: Vec<NodeId> = (0..count)
        .map(|_| {
            let position = Vec3::new(
                rng.gen_range(-radius..=radius),
                rng.gen_range(-radius..=radius),
                rng.gen_range(-radius..=radius),
            );
            scene.insert(SceneNode {
                transform: Transform::from_position(position),
                kind: NodeKind::Mesh { geometry, material },
            })
        })
        .collect();

    tracing::debug!("scattered {count} nodes within radius {radius}");
    Ok(ids)
}
