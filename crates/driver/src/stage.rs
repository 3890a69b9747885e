use glam::Vec3;
use stagecraft_common::{NodeId, Transform};
use stagecraft_input::{CameraCommand, CameraRig, CommandQueue, RigEffect};
use stagecraft_scene::{Camera, Scene, SceneError};

/// Errors from stage setup.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("node {0:?} not found")]
    UnknownNode(NodeId),
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Fixed per-tick transform increment.
///
/// Increments are purely additive and never clamped, so rotation grows
/// without bound; it is wrapped only when converted to a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Spin {
    pub rotation: Vec3,
    pub translation: Vec3,
}

impl Spin {
    pub fn rotation(x: f32, y: f32, z: f32) -> Self {
        Self {
            rotation: Vec3::new(x, y, z),
            translation: Vec3::ZERO,
        }
    }

    /// The increment of `ticks` consecutive applications.
    pub fn scaled(self, ticks: f32) -> Self {
        Self {
            rotation: self.rotation * ticks,
            translation: self.translation * ticks,
        }
    }

    pub fn apply(&self, transform: &mut Transform) {
        transform.rotation += self.rotation;
        transform.position += self.translation;
    }
}

/// What one call to [`Stage::update`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    pub commands: usize,
    pub scrolled: bool,
    pub camera_moved: bool,
}

/// Application context: one scene, one camera and everything that mutates
/// them each tick.
#[derive(Debug)]
pub struct Stage {
    scene: Scene,
    camera: Camera,
    rig: CameraRig,
    spins: Vec<(NodeId, Spin)>,
    scroll_spins: Vec<(NodeId, Spin)>,
    commands: CommandQueue,
}

impl Stage {
    pub fn new(scene: Scene, camera: Camera, rig: CameraRig) -> Self {
        Self {
            scene,
            camera,
            rig,
            spins: Vec::new(),
            scroll_spins: Vec::new(),
            commands: CommandQueue::new(),
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    /// Spin `node` by `spin` every tick.
    pub fn animate(&mut self, node: NodeId, spin: Spin) -> Result<(), DriverError> {
        self.require(node)?;
        self.spins.push((node, spin));
        Ok(())
    }

    /// Spin `node` by `spin` on every tick in which the scroll position changed.
    pub fn couple_to_scroll(&mut self, node: NodeId, spin: Spin) -> Result<(), DriverError> {
        self.require(node)?;
        self.scroll_spins.push((node, spin));
        Ok(())
    }

    pub fn commands(&mut self) -> &mut CommandQueue {
        &mut self.commands
    }

    pub fn push(&mut self, command: CameraCommand) {
        self.commands.push(command);
    }

    /// Apply one tick of mutation: queued commands, then per-tick spins,
    /// then the rig's update hook.
    pub fn update(&mut self) -> TickReport {
        let mut report = TickReport::default();

        for command in self.commands.drain() {
            report.commands += 1;
            if self.rig.apply(command, &mut self.camera) == RigEffect::Scrolled {
                report.scrolled = true;
            }
        }

        if report.scrolled {
            Self::spin_all(&mut self.scene, &self.scroll_spins);
        }
        Self::spin_all(&mut self.scene, &self.spins);

        report.camera_moved = self.rig.update(&mut self.camera) || report.scrolled;
        self.scene.advance_frame();
        report
    }

    fn spin_all(scene: &mut Scene, spins: &[(NodeId, Spin)]) {
        for (id, spin) in spins {
            if let Some(node) = scene.get_mut(*id) {
                spin.apply(&mut node.transform);
            }
        }
    }

    fn require(&self, node: NodeId) -> Result<(), DriverError> {
        match self.scene.get(node) {
            Some(_) => Ok(()),
            None => Err(DriverError::UnknownNode(node)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagecraft_assets::{Geometry, Material};
    use stagecraft_common::Color;
    use stagecraft_input::{OrbitController, ScrollRig};

    fn stage_with_box(rig: CameraRig) -> (Stage, NodeId) {
        let mut scene = Scene::new();
        let g = scene
            .geometry(Geometry::Box {
                width: 1.0,
                height: 1.0,
                depth: 1.0,
            })
            .unwrap();
        let m = scene.material(Material::standard("box", Color::WHITE)).unwrap();
        let id = scene.add_mesh(g, m, Transform::default()).unwrap();
        (Stage::new(scene, Camera::default(), rig), id)
    }

    fn rotation_of(stage: &Stage, id: NodeId) -> Vec3 {
        stage.scene().get(id).unwrap().transform.rotation
    }

    #[test]
    fn spin_composes_additively() {
        let spin = Spin {
            rotation: Vec3::new(0.01, 0.005, 0.01),
            translation: Vec3::new(0.0, 0.1, 0.0),
        };
        let mut stepped = Transform::default();
        for _ in 0..1000 {
            spin.apply(&mut stepped);
        }
        let mut once = Transform::default();
        spin.scaled(1000.0).apply(&mut once);

        assert!((stepped.rotation - once.rotation).length() < 1e-3);
        assert!((stepped.position - once.position).length() < 1e-2);
    }

    #[test]
    fn rotation_grows_without_wrapping() {
        let (mut stage, id) = stage_with_box(CameraRig::Fixed);
        stage.animate(id, Spin::rotation(1.0, 0.0, 0.0)).unwrap();
        for _ in 0..10 {
            stage.update();
        }
        assert!((rotation_of(&stage, id).x - 10.0).abs() < 1e-5);
        assert_eq!(stage.scene().frame(), 10);
    }

    #[test]
    fn animate_unknown_node_fails() {
        let (mut stage, _) = stage_with_box(CameraRig::Fixed);
        assert!(matches!(
            stage.animate(NodeId::new(), Spin::default()),
            Err(DriverError::UnknownNode(_))
        ));
        assert!(matches!(
            stage.couple_to_scroll(NodeId::new(), Spin::default()),
            Err(DriverError::UnknownNode(_))
        ));
    }

    #[test]
    fn scroll_spin_runs_once_per_tick_with_scroll() {
        let (mut stage, id) = stage_with_box(CameraRig::Scroll(ScrollRig::default()));
        stage
            .couple_to_scroll(id, Spin::rotation(0.05, 0.075, 0.05))
            .unwrap();

        // No scroll: no spin.
        let report = stage.update();
        assert!(!report.scrolled);
        assert_eq!(rotation_of(&stage, id), Vec3::ZERO);

        // Three scroll events in one tick still spin once.
        stage.push(CameraCommand::Scroll { offset: -100.0 });
        stage.push(CameraCommand::Scroll { offset: -200.0 });
        stage.push(CameraCommand::Scroll { offset: -300.0 });
        let report = stage.update();
        assert!(report.scrolled);
        assert_eq!(report.commands, 1);
        assert!((rotation_of(&stage, id) - Vec3::new(0.05, 0.075, 0.05)).length() < 1e-6);
        assert!((stage.camera().position.z - 3.0).abs() < 1e-5);
    }

    #[test]
    fn orbit_commands_take_effect_in_same_tick() {
        let mut controls = OrbitController::new(Vec3::ZERO, 720.0);
        controls.damping_factor = None;
        let (mut stage, _) = stage_with_box(CameraRig::Orbit(controls));
        stage.camera_mut().position = Vec3::new(0.0, 0.0, 30.0);

        stage.push(CameraCommand::Zoom { delta: -1.0 });
        let report = stage.update();
        assert!(report.camera_moved);
        assert!((stage.camera().position.length() - 28.5).abs() < 1e-3);
        assert!(stage.commands().is_empty());
    }
}
