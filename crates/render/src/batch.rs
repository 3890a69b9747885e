use glam::{Mat4, Vec3};
use stagecraft_common::{Color, GeometryId, MaterialId};
use stagecraft_scene::{Light, NodeKind, Scene};
use std::collections::BTreeMap;

pub use stagecraft_scene::MAX_POINT_LIGHTS;

/// All instances of one geometry/material pair for a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawBatch {
    pub geometry: GeometryId,
    pub material: MaterialId,
    pub instances: Vec<Mat4>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub radiance: Color,
}

/// Lights gathered from the scene for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct LightRig {
    /// Sum of all ambient lights.
    pub ambient: Color,
    pub points: Vec<PointLight>,
}

/// Group mesh and helper nodes by geometry/material pair.
///
/// Batches come out in handle order, and instances in node order, so the
/// result is stable from frame to frame. Helpers that follow another node
/// take that node's position.
pub fn collect_batches(scene: &Scene) -> Vec<DrawBatch> {
    let mut batches: BTreeMap<(GeometryId, MaterialId), Vec<Mat4>> = BTreeMap::new();
    for node in scene.nodes().values() {
        let (geometry, material, transform) = match node.kind {
            NodeKind::Mesh { geometry, material } => (geometry, material, node.transform),
            NodeKind::Helper {
                geometry,
                material,
                follow,
            } => {
                let mut transform = node.transform;
                if let Some(followed) = follow.and_then(|id| scene.get(id)) {
                    transform.position = followed.transform.position;
                }
                (geometry, material, transform)
            }
            NodeKind::Light(_) => continue,
        };
        batches
            .entry((geometry, material))
            .or_default()
            .push(transform.matrix());
    }
    tracing::trace!(batches = batches.len(), frame = scene.frame(), "collected draw batches");

    batches
        .into_iter()
        .map(|((geometry, material), instances)| DrawBatch {
            geometry,
            material,
            instances,
        })
        .collect()
}

pub fn collect_lights(scene: &Scene) -> LightRig {
    let mut ambient = Color::BLACK;
    let mut points = Vec::new();
    for node in scene.nodes().values() {
        match node.kind {
            NodeKind::Light(light @ Light::Ambient { .. }) => {
                let r = light.radiance();
                ambient.r += r.r;
                ambient.g += r.g;
                ambient.b += r.b;
            }
            NodeKind::Light(light @ Light::Point { .. }) => {
                // Scene::add_light already warned about the overflow.
                if points.len() == MAX_POINT_LIGHTS {
                    continue;
                }
                points.push(PointLight {
                    position: node.transform.position,
                    radiance: light.radiance(),
                });
            }
            _ => {}
        }
    }
    LightRig { ambient, points }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagecraft_assets::{Geometry, Material};
    use stagecraft_common::Transform;

    fn sphere() -> Geometry {
        Geometry::Sphere {
            radius: 1.0,
            width_segments: 8,
            height_segments: 8,
        }
    }

    #[test]
    fn shared_pair_is_one_batch() {
        let mut scene = Scene::new();
        let g = scene.geometry(sphere()).unwrap();
        let m = scene.material(Material::default()).unwrap();
        let other = scene
            .material(Material::basic("red", Color::from_hex(0xff0000)))
            .unwrap();
        for i in 0..10 {
            scene
                .add_mesh(g, m, Transform::from_position(Vec3::splat(i as f32)))
                .unwrap();
        }
        scene.add_mesh(g, other, Transform::default()).unwrap();

        let batches = collect_batches(&scene);
        assert_eq!(batches.len(), 2);
        let total: usize = batches.iter().map(|b| b.instances.len()).sum();
        assert_eq!(total, 11);
        let main = batches.iter().find(|b| b.material == m).unwrap();
        assert_eq!(main.instances.len(), 10);
    }

    #[test]
    fn lights_are_not_batched_but_collected() {
        let mut scene = Scene::new();
        scene.add_light(
            Light::Ambient {
                color: Color::WHITE,
                intensity: 0.5,
            },
            Transform::default(),
        );
        scene.add_light(
            Light::Point {
                color: Color::WHITE,
                intensity: 1.0,
            },
            Transform::from_position(Vec3::new(-2.0, 15.0, 5.0)),
        );
        assert!(collect_batches(&scene).is_empty());

        let rig = collect_lights(&scene);
        assert_eq!(rig.ambient, Color::rgb(0.5, 0.5, 0.5));
        assert_eq!(rig.points.len(), 1);
        assert_eq!(rig.points[0].position, Vec3::new(-2.0, 15.0, 5.0));
    }

    #[test]
    fn point_lights_are_capped() {
        let mut scene = Scene::new();
        for _ in 0..(MAX_POINT_LIGHTS + 2) {
            scene.add_light(
                Light::Point {
                    color: Color::WHITE,
                    intensity: 1.0,
                },
                Transform::default(),
            );
        }
        assert_eq!(scene.point_light_count(), MAX_POINT_LIGHTS + 2);
        // Collected every frame; the cap holds each time.
        for _ in 0..3 {
            assert_eq!(collect_lights(&scene).points.len(), MAX_POINT_LIGHTS);
        }
    }

    #[test]
    fn light_helper_follows_light() {
        let mut scene = Scene::new();
        let light = scene.add_light(
            Light::Point {
                color: Color::WHITE,
                intensity: 1.0,
            },
            Transform::from_position(Vec3::new(1.0, 2.0, 3.0)),
        );
        scene.add_point_light_helper(light, 1.0).unwrap();
        scene.get_mut(light).unwrap().transform.position = Vec3::new(4.0, 5.0, 6.0);

        let batches = collect_batches(&scene);
        assert_eq!(batches.len(), 1);
        let origin = batches[0].instances[0].transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(4.0, 5.0, 6.0)).length() < 1e-6);
    }
}
