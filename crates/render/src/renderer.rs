use glam::{Mat4, Vec3};
use stagecraft_scene::{Background, Camera, NodeKind, Scene};
use std::fmt::Write;

/// Per-frame view configuration derived from the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderView {
    /// Camera position in world space.
    pub eye: Vec3,
    /// Camera rotation (XYZ Euler radians).
    pub rotation: Vec3,
    pub view_proj: Mat4,
    /// Field of view in degrees.
    pub fov_degrees: f32,
}

impl RenderView {
    pub fn from_camera(camera: &Camera) -> Self {
        Self {
            eye: camera.position,
            rotation: camera.rotation,
            view_proj: camera.view_projection(),
            fov_degrees: camera.projection().fov_degrees(),
        }
    }
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads the scene graph and the camera, then produces one frame.
/// `&mut self` lets backends keep per-frame caches; the scene and camera are
/// never mutated.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame of `scene` as seen from `camera`.
    fn render(&mut self, scene: &Scene, camera: &Camera) -> Self::Output;
}

/// Debug text renderer.
///
/// Produces a human-readable dump of the frame: camera pose and every node's
/// transform. Used by the headless CLI and in tests.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    frames: u64,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&mut self, scene: &Scene, camera: &Camera) -> String {
        self.frames += 1;
        let view = RenderView::from_camera(camera);
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = writeln!(out, "=== Frame {} ===", scene.frame());
        let _ = writeln!(out, "Nodes: {}", scene.node_count());
        let _ = writeln!(
            out,
            "Camera: pos=({:.3}, {:.3}, {:.3}) rot=({:.4}, {:.4}, {:.4}) fov={:.0}",
            view.eye.x,
            view.eye.y,
            view.eye.z,
            view.rotation.x,
            view.rotation.y,
            view.rotation.z,
            view.fov_degrees
        );
        match scene.background() {
            Background::Color(c) => {
                let _ = writeln!(out, "Background: color=({:.2}, {:.2}, {:.2})", c.r, c.g, c.b);
            }
            Background::Texture(t) => {
                let _ = writeln!(out, "Background: texture={:#x}", t.0);
            }
        }

        for (id, node) in scene.nodes() {
            let t = node.transform;
            let _ = write!(
                out,
                "  [{}] {:<13} pos=({:.2}, {:.2}, {:.2}) rot=({:.3}, {:.3}, {:.3})",
                id.short(),
                node.kind.label(),
                t.position.x,
                t.position.y,
                t.position.z,
                t.rotation.x,
                t.rotation.y,
                t.rotation.z,
            );
            if let NodeKind::Mesh { material, .. } = node.kind {
                if let Some(m) = scene.assets().material(material) {
                    let _ = write!(out, " material={}", m.name);
                }
            }
            out.push('\n');
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagecraft_assets::{Geometry, Material};
    use stagecraft_common::{Color, Transform};

    #[test]
    fn debug_renderer_empty_scene() {
        let scene = Scene::new();
        let mut renderer = DebugTextRenderer::new();
        let output = renderer.render(&scene, &Camera::default());

        assert!(output.contains("Frame 0"));
        assert!(output.contains("Nodes: 0"));
        assert!(output.contains("fov=75"));
        assert_eq!(renderer.frames(), 1);
    }

    #[test]
    fn debug_renderer_with_nodes() {
        let mut scene = Scene::new();
        let g = scene
            .geometry(Geometry::Box {
                width: 3.0,
                height: 3.0,
                depth: 3.0,
            })
            .unwrap();
        let m = scene
            .material(Material::standard("avatar", Color::WHITE))
            .unwrap();
        scene
            .add_mesh(g, m, Transform::from_position(Vec3::new(2.0, 0.0, -5.0)))
            .unwrap();

        let mut camera = Camera::default();
        camera.position.z = 30.0;
        let output = DebugTextRenderer::new().render(&scene, &camera);

        assert!(output.contains("Nodes: 1"));
        assert!(output.contains("pos=(2.00, 0.00, -5.00)"));
        assert!(output.contains("material=avatar"));
        assert!(output.contains("pos=(0.000, 0.000, 30.000)"));
    }

    #[test]
    fn render_view_from_camera() {
        let mut camera = Camera::default();
        camera.position = Vec3::new(1.0, 2.0, 3.0);
        let view = RenderView::from_camera(&camera);
        assert_eq!(view.eye, camera.position);
        assert_eq!(view.fov_degrees, 75.0);
        assert_eq!(view.view_proj, camera.view_projection());
    }
}
