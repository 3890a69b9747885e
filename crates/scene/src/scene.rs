use std::collections::BTreeMap;

use stagecraft_assets::{AssetError, AssetStore, Geometry, Material};
use stagecraft_common::{Color, GeometryId, MaterialId, NodeId, TextureId, Transform};

use crate::node::{Light, NodeKind, SceneNode};

/// Errors from scene graph operations.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("geometry {0:?} is not registered")]
    UnknownGeometry(GeometryId),
    #[error("material {0:?} is not registered")]
    UnknownMaterial(MaterialId),
    #[error("node {0:?} not found")]
    UnknownNode(NodeId),
    #[error("node {0:?} is not a light")]
    NotALight(NodeId),
    #[error("spread radius must be finite and non-negative, got {0}")]
    InvalidSpread(f32),
    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// Point lights a renderer shades with. Later ones are ignored.
pub const MAX_POINT_LIGHTS: usize = 4;

/// What is drawn behind everything else.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Background {
    Color(Color),
    Texture(TextureId),
}

impl Default for Background {
    fn default() -> Self {
        Self::Color(Color::BLACK)
    }
}

/// The scene graph container.
///
/// Holds every renderable, light and helper node together with the assets
/// they reference. Uses BTreeMap for deterministic iteration order.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    nodes: BTreeMap<NodeId, SceneNode>,
    assets: AssetStore,
    background: Background,
    frame: u64,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames the driver has advanced this scene.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn advance_frame(&mut self) {
        self.frame += 1;
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> &BTreeMap<NodeId, SceneNode> {
        &self.nodes
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(&id)
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    pub fn assets_mut(&mut self) -> &mut AssetStore {
        &mut self.assets
    }

    pub fn background(&self) -> Background {
        self.background
    }

    pub fn set_background(&mut self, background: Background) {
        self.background = background;
    }

    /// Register a geometry with the scene's asset store.
    pub fn geometry(&mut self, geometry: Geometry) -> Result<GeometryId, SceneError> {
        Ok(self.assets.register_geometry(geometry)?)
    }

    /// Register a material with the scene's asset store.
    pub fn material(&mut self, material: Material) -> Result<MaterialId, SceneError> {
        Ok(self.assets.register_material(material)?)
    }

    /// Insert a mesh built from a registered geometry/material pair.
    pub fn add_mesh(
        &mut self,
        geometry: GeometryId,
        material: MaterialId,
        transform: Transform,
    ) -> Result<NodeId, SceneError> {
        self.check_pair(geometry, material)?;
        Ok(self.insert(SceneNode {
            transform,
            kind: NodeKind::Mesh { geometry, material },
        }))
    }

    /// Insert a light. Warns once, when the first point light past
    /// [`MAX_POINT_LIGHTS`] is added.
    pub fn add_light(&mut self, light: Light, transform: Transform) -> NodeId {
        let id = self.insert(SceneNode {
            transform,
            kind: NodeKind::Light(light),
        });
        let is_point = matches!(light, Light::Point { .. });
        if is_point && self.point_light_count() == MAX_POINT_LIGHTS + 1 {
            tracing::warn!(
                max = MAX_POINT_LIGHTS,
                "too many point lights, extra lights are not shaded"
            );
        }
        id
    }

    pub fn point_light_count(&self) -> usize {
        self.nodes
            .values()
            .filter(|n| matches!(n.kind, NodeKind::Light(Light::Point { .. })))
            .count()
    }

    /// Line grid on the XZ plane.
    pub fn add_grid_helper(&mut self, size: f32, divisions: u32) -> Result<NodeId, SceneError> {
        let geometry = self.geometry(Geometry::Grid { size, divisions })?;
        let material = self.material(Material::basic("grid-helper", Color::from_hex(0x888888)))?;
        Ok(self.insert(SceneNode {
            transform: Transform::default(),
            kind: NodeKind::Helper {
                geometry,
                material,
                follow: None,
            },
        }))
    }

    /// Coarse wireframe sphere, in the light's color, that tracks a light node.
    pub fn add_point_light_helper(
        &mut self,
        light: NodeId,
        size: f32,
    ) -> Result<NodeId, SceneError> {
        let node = self.nodes.get(&light).ok_or(SceneError::UnknownNode(light))?;
        let NodeKind::Light(l) = node.kind else {
            return Err(SceneError::NotALight(light));
        };
        let geometry = self.geometry(Geometry::Sphere {
            radius: size,
            width_segments: 4,
            height_segments: 2,
        })?;
        let material = self.material(Material::basic("light-helper", l.color()).with_wireframe())?;
        Ok(self.insert(SceneNode {
            transform: Transform::default(),
            kind: NodeKind::Helper {
                geometry,
                material,
                follow: Some(light),
            },
        }))
    }

    pub(crate) fn check_pair(
        &self,
        geometry: GeometryId,
        material: MaterialId,
    ) -> Result<(), SceneError> {
        if self.assets.geometry(geometry).is_none() {
            return Err(SceneError::UnknownGeometry(geometry));
        }
        if self.assets.material(material).is_none() {
            return Err(SceneError::UnknownMaterial(material));
        }
        Ok(())
    }

    pub(crate) fn insert(&mut self, node: SceneNode) -> NodeId {
        let id = NodeId::new();
        tracing::trace!("added {} node {}", node.kind.label(), id.short());
        self.nodes.insert(id, node);
        id
    }

    /// Deterministic hash of node transforms in canonical (BTreeMap) order,
    /// ignoring node ids. Two scenes built from the same seed hash equal.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325; // FNV offset basis
        let mix = |h: &mut u64, bytes: &[u8]| {
            for &b in bytes {
                *h ^= b as u64;
                *h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        mix(&mut h, &self.frame.to_le_bytes());
        let mut transforms: Vec<[f32; 9]> = self
            .nodes
            .values()
            .map(|n| {
                let t = n.transform;
                [
                    t.position.x,
                    t.position.y,
                    t.position.z,
                    t.rotation.x,
                    t.rotation.y,
                    t.rotation.z,
                    t.scale.x,
                    t.scale.y,
                    t.scale.z,
                ]
            })
            .collect();
        // Node ids are random, so order by value rather than by key.
        transforms.sort_by(|a, b| {
            a.iter()
                .zip(b)
                .map(|(x, y)| x.total_cmp(y))
                .find(|o| o.is_ne())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        for t in &transforms {
            for v in t {
                mix(&mut h, &v.to_le_bytes());
            }
        }
        h
    }
}
