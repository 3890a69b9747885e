/// Shared by the mesh and line pipelines.
const FRAME_AND_MATERIAL: &str = r#"
struct PointLight {
    position: vec4<f32>,
    radiance: vec4<f32>,
};

struct Frame {
    view_proj: mat4x4<f32>,
    eye: vec4<f32>,
    ambient: vec4<f32>,
    // x = number of point lights in use
    counts: vec4<u32>,
    lights: array<PointLight, 4>,
};

struct Material {
    color: vec4<f32>,
    // x = lit, y = has texture map
    flags: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> frame: Frame;

@group(1) @binding(0)
var<uniform> material: Material;
@group(1) @binding(1)
var material_map: texture_2d<f32>;
@group(1) @binding(2)
var material_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct InstanceInput {
    @location(3) model_0: vec4<f32>,
    @location(4) model_1: vec4<f32>,
    @location(5) model_2: vec4<f32>,
    @location(6) model_3: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let world_pos = model * vec4<f32>(vertex.position, 1.0);

    var out: VertexOutput;
    out.clip_position = frame.view_proj * world_pos;
    out.world_position = world_pos.xyz;
    out.world_normal = normalize((model * vec4<f32>(vertex.normal, 0.0)).xyz);
    out.uv = vertex.uv;
    return out;
}
"#;

const MESH_FRAGMENT: &str = r#"
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    var albedo = material.color;
    if material.flags.y > 0.5 {
        albedo = albedo * textureSample(material_map, material_sampler, in.uv);
    }
    if material.flags.x < 0.5 {
        return albedo;
    }

    let n = normalize(in.world_normal);
    var light = frame.ambient.rgb;
    for (var i = 0u; i < frame.counts.x; i = i + 1u) {
        let l = normalize(frame.lights[i].position.xyz - in.world_position);
        light = light + frame.lights[i].radiance.rgb * max(dot(n, l), 0.0);
    }
    return vec4<f32>(albedo.rgb * light, albedo.a);
}
"#;

const LINE_FRAGMENT: &str = r#"
@fragment
fn fs_line(in: VertexOutput) -> @location(0) vec4<f32> {
    return material.color;
}
"#;

/// Full-screen textured background. Draws one oversized triangle.
pub const BACKGROUND_SHADER: &str = r#"
@group(0) @binding(1)
var background_map: texture_2d<f32>;
@group(0) @binding(2)
var background_sampler: sampler;

struct BackgroundOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_background(@builtin(vertex_index) index: u32) -> BackgroundOutput {
    let x = f32((index << 1u) & 2u);
    let y = f32(index & 2u);
    var out: BackgroundOutput;
    out.clip_position = vec4<f32>(x * 2.0 - 1.0, 1.0 - y * 2.0, 1.0, 1.0);
    out.uv = vec2<f32>(x, y);
    return out;
}

@fragment
fn fs_background(in: BackgroundOutput) -> @location(0) vec4<f32> {
    return textureSample(background_map, background_sampler, in.uv);
}
"#;

pub fn mesh_shader() -> String {
    format!("{FRAME_AND_MATERIAL}{MESH_FRAGMENT}")
}

pub fn line_shader() -> String {
    format!("{FRAME_AND_MATERIAL}{LINE_FRAGMENT}")
}
