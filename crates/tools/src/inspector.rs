use stagecraft_common::NodeId;
use stagecraft_scene::{Camera, Light, NodeKind, Scene};

/// Scene inspector for developer tooling.
///
/// Provides read-only queries against the scene graph for the desktop HUD
/// and the headless CLI.
pub struct SceneInspector;

impl SceneInspector {
    /// Produce a summary of the scene and the camera viewing it.
    pub fn summary(scene: &Scene, camera: &Camera) -> SceneSummary {
        let mut summary = SceneSummary {
            frame: scene.frame(),
            node_count: scene.node_count(),
            meshes: 0,
            lights: 0,
            helpers: 0,
            geometries: scene.assets().geometry_count(),
            materials: scene.assets().material_count(),
            textures: scene.assets().texture_count(),
            camera_position: camera.position.to_array(),
            camera_rotation: camera.rotation.to_array(),
            fov_degrees: camera.projection().fov_degrees(),
        };
        for node in scene.nodes().values() {
            match node.kind {
                NodeKind::Mesh { .. } => summary.meshes += 1,
                NodeKind::Light(_) => summary.lights += 1,
                NodeKind::Helper { .. } => summary.helpers += 1,
            }
        }
        summary
    }

    pub fn inspect_node(scene: &Scene, id: NodeId) -> Option<NodeInfo> {
        scene.get(id).map(|node| {
            let t = node.transform;
            let detail = match node.kind {
                NodeKind::Mesh { material, .. } | NodeKind::Helper { material, .. } => scene
                    .assets()
                    .material(material)
                    .map(|m| m.name.clone())
                    .unwrap_or_default(),
                NodeKind::Light(Light::Point { intensity, .. })
                | NodeKind::Light(Light::Ambient { intensity, .. }) => {
                    format!("intensity {intensity:.2}")
                }
            };
            NodeInfo {
                id,
                kind: node.kind.label(),
                detail,
                position: t.position.to_array(),
                rotation: t.rotation.to_array(),
                scale: t.scale.to_array(),
            }
        })
    }

    /// List all node IDs in the scene.
    pub fn list_nodes(scene: &Scene) -> Vec<NodeId> {
        scene.nodes().keys().copied().collect()
    }
}

/// Summary of scene state for the inspector.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSummary {
    pub frame: u64,
    pub node_count: usize,
    pub meshes: usize,
    pub lights: usize,
    pub helpers: usize,
    pub geometries: usize,
    pub materials: usize,
    pub textures: usize,
    pub camera_position: [f32; 3],
    pub camera_rotation: [f32; 3],
    pub fov_degrees: f32,
}

impl std::fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Scene: frame={} nodes={} (meshes={} lights={} helpers={}) assets={}/{}/{} camera=({:.2}, {:.2}, {:.2})",
            self.frame,
            self.node_count,
            self.meshes,
            self.lights,
            self.helpers,
            self.geometries,
            self.materials,
            self.textures,
            self.camera_position[0],
            self.camera_position[1],
            self.camera_position[2],
        )
    }
}

/// Detailed info about a single node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeInfo {
    pub id: NodeId,
    pub kind: &'static str,
    /// Material name for drawables, intensity for lights.
    pub detail: String,
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
}

impl std::fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {} pos=({:.2}, {:.2}, {:.2}) rot=({:.3}, {:.3}, {:.3})",
            self.kind,
            self.id.short(),
            self.detail,
            self.position[0],
            self.position[1],
            self.position[2],
            self.rotation[0],
            self.rotation[1],
            self.rotation[2],
        )
    }
}
