use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::f32::consts::{PI, TAU};

use crate::AssetError;

/// Shape definition for a mesh. Parameters mirror the usual primitive
/// constructors; [`Geometry::validate`] rejects malformed ones.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Torus {
        radius: f32,
        tube: f32,
        radial_segments: u32,
        tubular_segments: u32,
    },
    Sphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
    },
    Box {
        width: f32,
        height: f32,
        depth: f32,
    },
    /// Line grid on the XZ plane, centred on the origin.
    Grid { size: f32, divisions: u32 },
}

/// Tessellated vertex data ready for upload.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    /// Triangle list. Empty for line-only geometry.
    pub indices: Vec<u32>,
    /// Line list: explicit for grids, derived from triangle edges otherwise.
    pub lines: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    fn push(&mut self, position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) {
        self.positions.push(position);
        self.normals.push(normal);
        self.uvs.push(uv);
    }

    fn derive_edges(&mut self) {
        let mut edges = BTreeSet::new();
        for tri in self.indices.chunks_exact(3) {
            for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
                edges.insert((a.min(b), a.max(b)));
            }
        }
        self.lines = edges.into_iter().flat_map(|(a, b)| [a, b]).collect();
    }
}

fn positive(name: &str, value: f32) -> Result<(), AssetError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(AssetError::InvalidGeometry(format!(
            "{name} must be positive and finite, got {value}"
        )))
    }
}

fn at_least(name: &str, value: u32, min: u32) -> Result<(), AssetError> {
    if value >= min {
        Ok(())
    } else {
        Err(AssetError::InvalidGeometry(format!(
            "{name} must be at least {min}, got {value}"
        )))
    }
}

impl Geometry {
    pub fn validate(&self) -> Result<(), AssetError> {
        match *self {
            Self::Torus {
                radius,
                tube,
                radial_segments,
                tubular_segments,
            } => {
                positive("torus radius", radius)?;
                positive("torus tube", tube)?;
                at_least("torus radial_segments", radial_segments, 3)?;
                at_least("torus tubular_segments", tubular_segments, 3)
            }
            Self::Sphere {
                radius,
                width_segments,
                height_segments,
            } => {
                positive("sphere radius", radius)?;
                at_least("sphere width_segments", width_segments, 3)?;
                at_least("sphere height_segments", height_segments, 2)
            }
            Self::Box {
                width,
                height,
                depth,
            } => {
                positive("box width", width)?;
                positive("box height", height)?;
                positive("box depth", depth)
            }
            Self::Grid { size, divisions } => {
                positive("grid size", size)?;
                at_least("grid divisions", divisions, 1)
            }
        }
    }

    /// Stable byte encoding of the parameters, for content hashing.
    pub(crate) fn hash_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let f = |out: &mut Vec<u8>, v: f32| out.extend_from_slice(&v.to_le_bytes());
        match *self {
            Self::Torus {
                radius,
                tube,
                radial_segments,
                tubular_segments,
            } => {
                f(&mut out, radius);
                f(&mut out, tube);
                out.push(b'T');
                out.extend_from_slice(&radial_segments.to_le_bytes());
                out.extend_from_slice(&tubular_segments.to_le_bytes());
            }
            Self::Sphere {
                radius,
                width_segments,
                height_segments,
            } => {
                f(&mut out, radius);
                out.push(b'S');
                out.extend_from_slice(&width_segments.to_le_bytes());
                out.extend_from_slice(&height_segments.to_le_bytes());
            }
            Self::Box {
                width,
                height,
                depth,
            } => {
                f(&mut out, width);
                f(&mut out, height);
                f(&mut out, depth);
                out.push(b'B');
            }
            Self::Grid { size, divisions } => {
                f(&mut out, size);
                out.push(b'G');
                out.extend_from_slice(&divisions.to_le_bytes());
            }
        }
        out
    }

    /// Generate vertex data. Assumes the geometry has been validated.
    pub fn tessellate(&self) -> MeshData {
        let mut mesh = match *self {
            Self::Torus {
                radius,
                tube,
                radial_segments,
                tubular_segments,
            } => torus(radius, tube, radial_segments, tubular_segments),
            Self::Sphere {
                radius,
                width_segments,
                height_segments,
            } => sphere(radius, width_segments, height_segments),
            Self::Box {
                width,
                height,
                depth,
            } => cuboid(width, height, depth),
            Self::Grid { size, divisions } => return grid(size, divisions),
        };
        mesh.derive_edges();
        mesh
    }
}

fn torus(radius: f32, tube: f32, radial: u32, tubular: u32) -> MeshData {
    let mut mesh = MeshData::default();
    for j in 0..=radial {
        let v = j as f32 / radial as f32 * TAU;
        for i in 0..=tubular {
            let u = i as f32 / tubular as f32 * TAU;
            let ring = radius + tube * v.cos();
            let p = [ring * u.cos(), ring * u.sin(), tube * v.sin()];
            let centre = [radius * u.cos(), radius * u.sin(), 0.0];
            let n = glam::Vec3::new(p[0] - centre[0], p[1] - centre[1], p[2]).normalize_or_zero();
            mesh.push(
                p,
                n.to_array(),
                [i as f32 / tubular as f32, j as f32 / radial as f32],
            );
        }
    }

    let stride = tubular + 1;
    for j in 1..=radial {
        for i in 1..=tubular {
            let a = stride * j + i - 1;
            let b = stride * (j - 1) + i - 1;
            let c = stride * (j - 1) + i;
            let d = stride * j + i;
            mesh.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }
    mesh
}

fn sphere(radius: f32, width: u32, height: u32) -> MeshData {
    let mut mesh = MeshData::default();
    for iy in 0..=height {
        let v = iy as f32 / height as f32;
        for ix in 0..=width {
            let u = ix as f32 / width as f32;
            let n = glam::Vec3::new(
                -(u * TAU).cos() * (v * PI).sin(),
                (v * PI).cos(),
                (u * TAU).sin() * (v * PI).sin(),
            );
            mesh.push((n * radius).to_array(), n.to_array(), [u, 1.0 - v]);
        }
    }

    let stride = width + 1;
    for iy in 0..height {
        for ix in 0..width {
            let a = iy * stride + ix + 1;
            let b = iy * stride + ix;
            let c = (iy + 1) * stride + ix;
            let d = (iy + 1) * stride + ix + 1;
            // Pole rows collapse to a single point; skip their degenerate half.
            if iy != 0 {
                mesh.indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height - 1 {
                mesh.indices.extend_from_slice(&[b, c, d]);
            }
        }
    }
    mesh
}

fn cuboid(width: f32, height: f32, depth: f32) -> MeshData {
    let (x, y, z) = (width / 2.0, height / 2.0, depth / 2.0);
    // Each face lists bottom-left, bottom-right, top-right, top-left as seen
    // from outside, so every face shares the same winding and UV layout.
    #[rustfmt::skip]
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        ([0.0, 0.0, 1.0],  [[-x, -y,  z], [ x, -y,  z], [ x,  y,  z], [-x,  y,  z]]),
        ([0.0, 0.0, -1.0], [[ x, -y, -z], [-x, -y, -z], [-x,  y, -z], [ x,  y, -z]]),
        ([1.0, 0.0, 0.0],  [[ x, -y,  z], [ x, -y, -z], [ x,  y, -z], [ x,  y,  z]]),
        ([-1.0, 0.0, 0.0], [[-x, -y, -z], [-x, -y,  z], [-x,  y,  z], [-x,  y, -z]]),
        ([0.0, 1.0, 0.0],  [[-x,  y,  z], [ x,  y,  z], [ x,  y, -z], [-x,  y, -z]]),
        ([0.0, -1.0, 0.0], [[-x, -y, -z], [ x, -y, -z], [ x, -y,  z], [-x, -y,  z]]),
    ];
    const UVS: [[f32; 2]; 4] = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

    let mut mesh = MeshData::default();
    for (normal, corners) in faces {
        let base = mesh.positions.len() as u32;
        for (corner, uv) in corners.iter().zip(UVS) {
            mesh.push(*corner, normal, uv);
        }
        mesh.indices
            .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    mesh
}

fn grid(size: f32, divisions: u32) -> MeshData {
    let mut mesh = MeshData::default();
    let half = size / 2.0;
    let step = size / divisions as f32;

    for i in 0..=divisions {
        let k = -half + i as f32 * step;
        for p in [[-half, 0.0, k], [half, 0.0, k], [k, 0.0, -half], [k, 0.0, half]] {
            mesh.push(p, [0.0, 1.0, 0.0], [0.0, 0.0]);
        }
    }
    mesh.lines = (0..mesh.positions.len() as u32).collect();
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn torus_10_3() -> Geometry {
        Geometry::Torus {
            radius: 10.0,
            tube: 3.0,
            radial_segments: 16,
            tubular_segments: 100,
        }
    }

    #[test]
    fn torus_counts() {
        let mesh = torus_10_3().tessellate();
        assert_eq!(mesh.vertex_count(), 17 * 101);
        assert_eq!(mesh.triangle_count(), 16 * 100 * 2);
        assert!(!mesh.lines.is_empty());
    }

    #[test]
    fn torus_vertices_lie_on_tube() {
        let mesh = torus_10_3().tessellate();
        for p in &mesh.positions {
            let ring = (p[0] * p[0] + p[1] * p[1]).sqrt() - 10.0;
            let dist = (ring * ring + p[2] * p[2]).sqrt();
            assert!((dist - 3.0).abs() < 1e-3);
        }
    }

    #[test]
    fn sphere_counts_skip_pole_triangles() {
        let mesh = Geometry::Sphere {
            radius: 0.25,
            width_segments: 24,
            height_segments: 24,
        }
        .tessellate();
        assert_eq!(mesh.vertex_count(), 25 * 25);
        // Two triangles per quad, minus one per quad on each pole row.
        assert_eq!(mesh.triangle_count(), 24 * 24 * 2 - 2 * 24);
        for p in &mesh.positions {
            let r = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
            assert!((r - 0.25).abs() < 1e-5);
        }
    }

    #[test]
    fn box_has_six_faces() {
        let mesh = Geometry::Box {
            width: 3.0,
            height: 3.0,
            depth: 3.0,
        }
        .tessellate();
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.triangle_count(), 12);
        // Each face contributes its 4 outline edges plus one diagonal.
        assert_eq!(mesh.lines.len() / 2, 6 * 5);
    }

    #[test]
    fn box_faces_wind_outward() {
        let mesh = Geometry::Box {
            width: 2.0,
            height: 2.0,
            depth: 2.0,
        }
        .tessellate();
        for tri in mesh.indices.chunks_exact(3) {
            let [a, b, c] =
                [tri[0], tri[1], tri[2]].map(|i| glam::Vec3::from(mesh.positions[i as usize]));
            let face_normal = (b - a).cross(c - a);
            let stored = glam::Vec3::from(mesh.normals[tri[0] as usize]);
            assert!(face_normal.dot(stored) > 0.0);
        }
    }

    #[test]
    fn grid_is_line_only() {
        let mesh = Geometry::Grid {
            size: 200.0,
            divisions: 50,
        }
        .tessellate();
        assert!(mesh.indices.is_empty());
        assert_eq!(mesh.lines.len(), 51 * 4);
        assert_eq!(mesh.positions[0], [-100.0, 0.0, -100.0]);
    }

    #[test]
    fn validate_rejects_malformed() {
        assert!(torus_10_3().validate().is_ok());
        let bad = Geometry::Torus {
            radius: -1.0,
            tube: 3.0,
            radial_segments: 16,
            tubular_segments: 100,
        };
        assert!(matches!(bad.validate(), Err(AssetError::InvalidGeometry(_))));
        let flat = Geometry::Sphere {
            radius: 1.0,
            width_segments: 2,
            height_segments: 8,
        };
        assert!(flat.validate().is_err());
        let nan_box = Geometry::Box {
            width: f32::NAN,
            height: 1.0,
            depth: 1.0,
        };
        assert!(nan_box.validate().is_err());
        let empty_grid = Geometry::Grid {
            size: 10.0,
            divisions: 0,
        };
        assert!(empty_grid.validate().is_err());
    }
}
