use stagecraft_scene::Camera;

use crate::command::CameraCommand;
use crate::orbit::OrbitController;
use crate::scroll::ScrollRig;

/// How camera commands drive the camera.
#[derive(Debug, Clone, PartialEq)]
pub enum CameraRig {
    /// Camera never moves in response to input.
    Fixed,
    Scroll(ScrollRig),
    Orbit(OrbitController),
}

/// What applying a command did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RigEffect {
    /// The rig does not handle this command.
    Ignored,
    /// The camera pose was set from a scroll offset.
    Scrolled,
    /// Input was recorded and takes effect on the next [`CameraRig::update`].
    Recorded,
}

impl CameraRig {
    pub fn apply(&mut self, command: CameraCommand, camera: &mut Camera) -> RigEffect {
        match (self, command) {
            (Self::Scroll(rig), CameraCommand::Scroll { offset }) => {
                rig.apply(offset, camera);
                RigEffect::Scrolled
            }
            (Self::Orbit(controls), CameraCommand::Orbit { dx, dy }) => {
                controls.handle_drag(dx, dy);
                RigEffect::Recorded
            }
            (Self::Orbit(controls), CameraCommand::Zoom { delta }) => {
                controls.handle_wheel(delta);
                RigEffect::Recorded
            }
            (Self::Orbit(controls), CameraCommand::Pan { dx, dy }) => {
                controls.handle_pan(dx, dy);
                RigEffect::Recorded
            }
            _ => RigEffect::Ignored,
        }
    }

    /// Per-tick hook, run after commands are applied and before render.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        match self {
            Self::Orbit(controls) => controls.update(camera),
            Self::Fixed | Self::Scroll(_) => false,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Scroll(_) => "scroll",
            Self::Orbit(_) => "orbit",
        }
    }
}
