use glam::Vec3;
use serde::{Deserialize, Serialize};
use stagecraft_scene::Camera;

/// Linear map from document scroll offset to camera pose.
///
/// `z = offset * k_z`, `x = offset * k_x`, `rotation.y = offset * k_r`.
/// Every other pose component is left alone. There is no clamping: extreme
/// offsets give proportionally extreme displacement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollRig {
    pub k_z: f32,
    pub k_x: f32,
    pub k_r: f32,
}

impl Default for ScrollRig {
    fn default() -> Self {
        Self {
            k_z: -0.01,
            k_x: -0.0002,
            k_r: -0.0002,
        }
    }
}

/// The pose components a scroll offset determines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollPose {
    pub x: f32,
    pub z: f32,
    pub yaw: f32,
}

impl ScrollRig {
    pub fn pose(&self, offset: f32) -> ScrollPose {
        ScrollPose {
            x: offset * self.k_x,
            z: offset * self.k_z,
            yaw: offset * self.k_r,
        }
    }

    pub fn apply(&self, offset: f32, camera: &mut Camera) {
        let pose = self.pose(offset);
        camera.position = Vec3::new(pose.x, camera.position.y, pose.z);
        camera.rotation.y = pose.yaw;
    }
}

/// Turns wheel input into an absolute document scroll offset.
///
/// Offsets follow the "distance of the document top from the viewport top"
/// convention: scrolling down makes the offset more negative. The offset is
/// clamped to `[-max_scroll, 0]` like a document of fixed height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollTracker {
    offset: f32,
    max_scroll: f32,
}

impl ScrollTracker {
    /// Pixels scrolled per wheel line.
    pub const LINE_HEIGHT: f32 = 100.0;

    pub fn new(max_scroll: f32) -> Self {
        Self {
            offset: 0.0,
            max_scroll: max_scroll.max(0.0),
        }
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// Apply a wheel delta in lines (positive = wheel up) and return the new offset.
    pub fn scroll_lines(&mut self, lines: f32) -> f32 {
        self.scroll_pixels(lines * Self::LINE_HEIGHT)
    }

    /// Apply a wheel delta in pixels (positive = wheel up) and return the new offset.
    pub fn scroll_pixels(&mut self, pixels: f32) -> f32 {
        self.offset = (self.offset + pixels).clamp(-self.max_scroll, 0.0);
        self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scroll_offset_maps_to_camera_z() {
        let rig = ScrollRig {
            k_z: -0.01,
            ..ScrollRig::default()
        };
        let mut cam = Camera::default();
        rig.apply(-1000.0, &mut cam);
        assert!((cam.position.z - 10.0).abs() < 1e-5);
        assert!((cam.position.x - 0.2).abs() < 1e-6);
        assert!((cam.rotation.y - 0.2).abs() < 1e-6);
    }

    #[test]
    fn mapping_is_pure() {
        let rig = ScrollRig::default();
        let mut a = Camera::default();
        a.position.y = 4.0;
        rig.apply(-750.0, &mut a);
        let first = a.clone();
        rig.apply(-750.0, &mut a);
        assert_eq!(a, first);
        assert_eq!(rig.pose(-750.0), rig.pose(-750.0));
        assert_eq!(a.position.y, 4.0);
    }

    #[test]
    fn unbounded_offsets_are_accepted() {
        let rig = ScrollRig::default();
        let pose = rig.pose(-1.0e7);
        assert!((pose.z - 1.0e5).abs() < 1.0);
    }

    #[test]
    fn tracker_accumulates_and_clamps() {
        let mut t = ScrollTracker::new(1000.0);
        assert_eq!(t.scroll_lines(-3.0), -300.0);
        assert_eq!(t.scroll_pixels(-50.0), -350.0);
        assert_eq!(t.scroll_lines(10.0), 0.0);
        assert_eq!(t.scroll_lines(-50.0), -1000.0);
        assert_eq!(t.offset(), -1000.0);
    }
}
