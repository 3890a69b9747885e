//! The three demo stages: an empty scene, the orbiting torus and the
//! scroll-driven page with stars and textured objects.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use glam::Vec3;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use stagecraft_assets::{Geometry, Material};
use stagecraft_common::{Color, Transform};
use stagecraft_input::{CameraCommand, CameraRig, OrbitController, ScrollRig};
use stagecraft_scene::{Background, Camera, Light, Projection, Scene, scatter};

use crate::stage::{DriverError, Spin, Stage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Basic,
    Orbit,
    Scroll,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::Basic, Variant::Orbit, Variant::Scroll];

    pub fn name(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Orbit => "orbit",
            Self::Scroll => "scroll",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown variant '{s}' (expected basic, orbit or scroll)"))
    }
}

/// Viewport size in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Everything a demo build needs besides the viewport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub variant: Variant,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Starting camera distance along +Z.
    pub camera_z: f32,
    pub star_count: usize,
    pub star_radius: f32,
    pub seed: u64,
    /// Directory holding `space.jpg`, `avatar.png` and `moon.jpg`.
    pub asset_dir: PathBuf,
    pub scroll: ScrollRig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            variant: Variant::Basic,
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            camera_z: 30.0,
            star_count: 200,
            star_radius: 50.0,
            seed: 42,
            asset_dir: PathBuf::from("assets"),
            scroll: ScrollRig::default(),
        }
    }
}

impl DemoConfig {
    fn camera(&self, viewport: Viewport) -> Camera {
        let projection = Projection::new(self.fov_degrees, viewport.aspect(), self.near, self.far);
        let mut camera = Camera::new(projection);
        camera.position.z = self.camera_z;
        camera
    }
}

/// Build the stage for `config.variant` at the given viewport size.
///
/// Called again on every resize: the projection never changes after build.
pub fn build(config: &DemoConfig, viewport: Viewport) -> Result<Stage, DriverError> {
    let stage = match config.variant {
        Variant::Basic => Stage::new(Scene::new(), config.camera(viewport), CameraRig::Fixed),
        Variant::Orbit => build_orbit(config, viewport)?,
        Variant::Scroll => build_scroll(config, viewport)?,
    };
    tracing::info!(
        variant = %config.variant,
        nodes = stage.scene().node_count(),
        width = viewport.width,
        height = viewport.height,
        "stage built"
    );
    Ok(stage)
}

fn torus() -> Geometry {
    Geometry::Torus {
        radius: 10.0,
        tube: 3.0,
        radial_segments: 16,
        tubular_segments: 100,
    }
}

fn build_orbit(config: &DemoConfig, viewport: Viewport) -> Result<Stage, DriverError> {
    let mut scene = Scene::new();

    let geometry = scene.geometry(torus())?;
    let material = scene.material(Material::standard("torus", Color::from_hex(0xf4f352)))?;
    let torus = scene.add_mesh(geometry, material, Transform::default())?;

    let light = scene.add_light(
        Light::Point {
            color: Color::WHITE,
            intensity: 1.0,
        },
        Transform::from_position(Vec3::new(-2.0, 15.0, 5.0)),
    );
    scene.add_light(
        Light::Ambient {
            color: Color::from_hex(0x0fffff),
            intensity: 0.5,
        },
        Transform::default(),
    );
    scene.add_point_light_helper(light, 1.0)?;
    scene.add_grid_helper(200.0, 50)?;

    let mut camera = config.camera(viewport);
    camera.look_at(Vec3::ZERO);
    let controls = OrbitController::new(Vec3::ZERO, viewport.height as f32);

    let mut stage = Stage::new(scene, camera, CameraRig::Orbit(controls));
    stage.animate(torus, Spin::rotation(0.001, 0.005, 0.001))?;
    Ok(stage)
}

fn build_scroll(config: &DemoConfig, viewport: Viewport) -> Result<Stage, DriverError> {
    let mut scene = Scene::new();
    let dir = &config.asset_dir;

    let geometry = scene.geometry(torus())?;
    let material = scene.material(Material::standard("torus", Color::from_hex(0xff6347)))?;
    let torus = scene.add_mesh(geometry, material, Transform::default())?;

    scene.add_light(
        Light::Point {
            color: Color::WHITE,
            intensity: 1.0,
        },
        Transform::from_position(Vec3::new(5.0, 5.0, 5.0)),
    );
    scene.add_light(
        Light::Ambient {
            color: Color::WHITE,
            intensity: 1.0,
        },
        Transform::default(),
    );

    let star = scene.geometry(Geometry::Sphere {
        radius: 0.25,
        width_segments: 24,
        height_segments: 24,
    })?;
    let star_material = scene.material(Material::standard("star", Color::WHITE))?;
    let mut rng = StdRng::seed_from_u64(config.seed);
    scatter(
        &mut scene,
        config.star_count,
        config.star_radius,
        star,
        star_material,
        &mut rng,
    )?;

    match scene.assets_mut().load_texture(dir.join("space.jpg")) {
        Some(texture) => scene.set_background(Background::Texture(texture)),
        None => scene.set_background(Background::Color(Color::BLACK)),
    }

    let avatar_map = scene.assets_mut().load_texture(dir.join("avatar.png"));
    let cube = scene.geometry(Geometry::Box {
        width: 3.0,
        height: 3.0,
        depth: 3.0,
    })?;
    let avatar_material =
        scene.material(Material::basic("avatar", Color::WHITE).with_map(avatar_map))?;
    let avatar = scene.add_mesh(
        cube,
        avatar_material,
        Transform::from_position(Vec3::new(2.0, 0.0, -5.0)),
    )?;

    let moon_map = scene.assets_mut().load_texture(dir.join("moon.jpg"));
    let sphere = scene.geometry(Geometry::Sphere {
        radius: 3.0,
        width_segments: 32,
        height_segments: 32,
    })?;
    let moon_material =
        scene.material(Material::standard("moon", Color::WHITE).with_map(moon_map))?;
    let moon = scene.add_mesh(
        sphere,
        moon_material,
        Transform::from_position(Vec3::new(-10.0, 0.0, 30.0)),
    )?;

    let camera = config.camera(viewport);
    let mut stage = Stage::new(scene, camera, CameraRig::Scroll(config.scroll));
    stage.animate(torus, Spin::rotation(0.01, 0.005, 0.01))?;
    stage.animate(moon, Spin::rotation(0.005, 0.0, 0.0))?;
    stage.couple_to_scroll(moon, Spin::rotation(0.05, 0.075, 0.05))?;
    stage.couple_to_scroll(avatar, Spin::rotation(0.0, 0.01, 0.01))?;

    // The page starts at the top; the first tick establishes the initial pose.
    stage.push(CameraCommand::Scroll { offset: 0.0 });
    Ok(stage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Unpaced, run, tick};
    use stagecraft_render::{DebugTextRenderer, collect_batches};
    use stagecraft_scene::NodeKind;

    fn config(variant: Variant) -> DemoConfig {
        DemoConfig {
            variant,
            asset_dir: PathBuf::from("/nonexistent/stagecraft-assets"),
            ..DemoConfig::default()
        }
    }

    fn viewport() -> Viewport {
        Viewport::new(1280, 720)
    }

    #[test]
    fn basic_is_empty_with_camera_back() {
        let stage = build(&config(Variant::Basic), viewport()).unwrap();
        assert_eq!(stage.scene().node_count(), 0);
        assert_eq!(stage.camera().position, Vec3::new(0.0, 0.0, 30.0));
        assert_eq!(stage.camera().projection().fov_degrees(), 75.0);
        assert!((stage.camera().projection().aspect() - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn orbit_scene_contents() {
        let stage = build(&config(Variant::Orbit), viewport()).unwrap();
        let scene = stage.scene();
        // torus, two lights, light helper, grid
        assert_eq!(scene.node_count(), 5);
        let helpers = scene
            .nodes()
            .values()
            .filter(|n| matches!(n.kind, NodeKind::Helper { .. }))
            .count();
        assert_eq!(helpers, 2);
        assert_eq!(stage.rig().name(), "orbit");
    }

    #[test]
    fn scroll_scene_degrades_without_assets() {
        let stage = build(&config(Variant::Scroll), viewport()).unwrap();
        let scene = stage.scene();
        // torus, 2 lights, 200 stars, avatar, moon
        assert_eq!(scene.node_count(), 205);
        assert_eq!(scene.background(), Background::Color(Color::BLACK));
        assert_eq!(scene.assets().texture_count(), 0);

        let stars = collect_batches(scene)
            .into_iter()
            .map(|b| b.instances.len())
            .max()
            .unwrap();
        assert_eq!(stars, 200);
    }

    #[test]
    fn scroll_scene_uses_textures_when_present() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["space.jpg", "avatar.png", "moon.jpg"] {
            image::RgbaImage::from_pixel(2, 2, image::Rgba([200, 200, 255, 255]))
                .save_with_format(dir.path().join(name), image::ImageFormat::Png)
                .unwrap();
        }
        let config = DemoConfig {
            variant: Variant::Scroll,
            asset_dir: dir.path().to_path_buf(),
            ..DemoConfig::default()
        };
        let stage = build(&config, viewport()).unwrap();
        let scene = stage.scene();

        // Identical pixels dedupe to one texture.
        assert_eq!(scene.assets().texture_count(), 1);
        assert!(matches!(scene.background(), Background::Texture(_)));
        let textured = scene
            .nodes()
            .values()
            .filter_map(|n| match n.kind {
                NodeKind::Mesh { material, .. } => scene.assets().material(material),
                _ => None,
            })
            .filter(|m| m.map.is_some())
            .count();
        assert_eq!(textured, 2);
    }

    #[test]
    fn scroll_end_to_end() {
        let mut stage = build(&config(Variant::Scroll), viewport()).unwrap();
        let mut renderer = DebugTextRenderer::new();

        // Startup pose comes from offset zero.
        tick(&mut stage, &mut renderer);
        assert_eq!(stage.camera().position.z, 0.0);

        stage.push(CameraCommand::Scroll { offset: -1000.0 });
        let frame = tick(&mut stage, &mut renderer);
        assert!((stage.camera().position.z - 10.0).abs() < 1e-5);
        assert!((stage.camera().position.x - 0.2).abs() < 1e-5);
        assert!((stage.camera().rotation.y - 0.2).abs() < 1e-5);
        assert!(frame.contains("=== Frame 2 ==="));
    }

    #[test]
    fn star_field_is_seeded() {
        let a = build(&config(Variant::Scroll), viewport()).unwrap();
        let b = build(&config(Variant::Scroll), viewport()).unwrap();
        let positions = |s: &Stage| {
            let mut p: Vec<[u32; 3]> = s
                .scene()
                .nodes()
                .values()
                .map(|n| n.transform.position.to_array().map(f32::to_bits))
                .collect();
            p.sort();
            p
        };
        assert_eq!(positions(&a), positions(&b));

        // Every fixed object also sits inside the star cube.
        let bound = DemoConfig::default().star_radius;
        let in_bounds = a
            .scene()
            .nodes()
            .values()
            .filter(|n| n.transform.position.abs().max_element() <= bound)
            .count();
        assert_eq!(in_bounds, 205);
    }

    #[test]
    fn orbit_runs_headless() {
        let mut stage = build(&config(Variant::Orbit), viewport()).unwrap();
        stage.push(CameraCommand::Orbit { dx: 40.0, dy: 10.0 });
        let frames = run(&mut stage, &mut DebugTextRenderer::new(), &mut Unpaced, |s| {
            s.scene().frame() < 3
        });
        assert_eq!(frames, 3);
        assert!((stage.camera().position.length() - 30.0).abs() < 1e-3);
        assert_ne!(stage.camera().position, Vec3::new(0.0, 0.0, 30.0));
    }

    #[test]
    fn variant_parsing() {
        assert_eq!("Scroll".parse::<Variant>().unwrap(), Variant::Scroll);
        assert!("cube".parse::<Variant>().is_err());
        assert_eq!(Variant::Orbit.to_string(), "orbit");
    }

    #[test]
    fn config_json_defaults_fill_missing_fields() {
        let parsed: DemoConfig = serde_json::from_str(r#"{"variant":"orbit","seed":7}"#).unwrap();
        assert_eq!(parsed.variant, Variant::Orbit);
        assert_eq!(parsed.seed, 7);
        assert_eq!(parsed.star_count, 200);
        assert_eq!(parsed.scroll, ScrollRig::default());
    }
}
