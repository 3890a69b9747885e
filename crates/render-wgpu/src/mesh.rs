use std::ops::Range;

use bytemuck::{Pod, Zeroable};
use stagecraft_assets::MeshData;
use stagecraft_render::DrawBatch;
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![
            0 => Float32x3,
            1 => Float32x3,
            2 => Float32x2,
        ],
    };
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct InstanceData {
    pub model: [[f32; 4]; 4],
}

impl InstanceData {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<InstanceData>() as u64,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &wgpu::vertex_attr_array![
            3 => Float32x4,
            4 => Float32x4,
            5 => Float32x4,
            6 => Float32x4,
        ],
    };
}

/// Interleave tessellated attributes into upload order.
pub(crate) fn interleave(mesh: &MeshData) -> Vec<Vertex> {
    mesh.positions
        .iter()
        .zip(&mesh.normals)
        .zip(&mesh.uvs)
        .map(|((&position, &normal), &uv)| Vertex {
            position,
            normal,
            uv,
        })
        .collect()
}

/// Flatten every batch's instances into one buffer-ready list, returning the
/// instance range each batch occupies.
pub(crate) fn pack_instances(batches: &[DrawBatch]) -> (Vec<InstanceData>, Vec<Range<u32>>) {
    let mut instances = Vec::new();
    let mut ranges = Vec::with_capacity(batches.len());
    for batch in batches {
        let start = instances.len() as u32;
        instances.extend(batch.instances.iter().map(|m| InstanceData {
            model: m.to_cols_array_2d(),
        }));
        ranges.push(start..instances.len() as u32);
    }
    (instances, ranges)
}

/// One geometry resident on the GPU.
pub(crate) struct GpuMesh {
    pub vertices: wgpu::Buffer,
    pub triangles: Option<(wgpu::Buffer, u32)>,
    pub lines: Option<(wgpu::Buffer, u32)>,
}

impl GpuMesh {
    pub fn upload(device: &wgpu::Device, label: &str, mesh: &MeshData) -> Self {
        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&interleave(mesh)),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = |indices: &[u32], what: &str| {
            (!indices.is_empty()).then(|| {
                let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{label}_{what}")),
                    contents: bytemuck::cast_slice(indices),
                    usage: wgpu::BufferUsages::INDEX,
                });
                (buffer, indices.len() as u32)
            })
        };
        Self {
            triangles: index_buffer(&mesh.indices, "triangles"),
            lines: index_buffer(&mesh.lines, "lines"),
            vertices,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Vec3};
    use stagecraft_assets::Geometry;
    use stagecraft_common::{GeometryId, MaterialId};

    #[test]
    fn interleave_keeps_every_vertex() {
        let mesh = Geometry::Box {
            width: 3.0,
            height: 3.0,
            depth: 3.0,
        }
        .tessellate();
        let vertices = interleave(&mesh);
        assert_eq!(vertices.len(), mesh.vertex_count());
        assert_eq!(vertices[0].position, mesh.positions[0]);
        assert_eq!(vertices[5].uv, mesh.uvs[5]);
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
    }

    #[test]
    fn packed_ranges_cover_batches() {
        let batch = |n: usize, g: u64| DrawBatch {
            geometry: GeometryId(g),
            material: MaterialId(0),
            instances: vec![Mat4::from_translation(Vec3::X); n],
        };
        let (instances, ranges) = pack_instances(&[batch(3, 1), batch(200, 2), batch(1, 3)]);
        assert_eq!(instances.len(), 204);
        assert_eq!(ranges, vec![0..3, 3..203, 203..204]);
        assert_eq!(instances[0].model[3], [1.0, 0.0, 0.0, 1.0]);
    }
}
