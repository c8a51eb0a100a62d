/// World units covered by one repeat of a facade texture.
pub const TEXTURE_WORLD_SIZE: f32 = 32.0;

/// WGSL shader for the instanced, textured buildings.
pub const CITY_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    eye: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

@group(1) @binding(0)
var facades: texture_2d_array<f32>;
@group(1) @binding(1)
var facade_sampler: sampler;

const TEXTURE_WORLD_SIZE: f32 = 32.0;
const SKY: vec3<f32> = vec3<f32>(0.02, 0.025, 0.05);

struct VertexInput {
    @location(0) position: vec4<f32>,
    @location(1) normal: vec4<f32>,
    @location(2) color: vec4<f32>,
    @location(3) tex_coords: vec2<f32>,
};

struct InstanceInput {
    @location(4) model_0: vec4<f32>,
    @location(5) model_1: vec4<f32>,
    @location(6) model_2: vec4<f32>,
    @location(7) model_3: vec4<f32>,
    @location(8) normal_0: vec3<f32>,
    @location(9) normal_1: vec3<f32>,
    @location(10) normal_2: vec3<f32>,
    @location(11) tint: vec4<f32>,
    @location(12) texture_index: u32,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_normal: vec3<f32>,
    @location(1) uv: vec2<f32>,
    @location(2) color: vec4<f32>,
    @location(3) tint: vec4<f32>,
    @location(4) @interpolate(flat) layer: u32,
    @location(5) world_pos: vec3<f32>,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let normal_matrix = mat3x3<f32>(instance.normal_0, instance.normal_1, instance.normal_2);
    let world_pos = model * vec4<f32>(vertex.position.xyz, 1.0);

    // Faces facing +-X run along the block depth, the others along its width.
    let width = length(instance.model_0.xyz);
    let height = length(instance.model_1.xyz);
    let depth = length(instance.model_2.xyz);
    let across = select(width, depth, abs(vertex.normal.x) > 0.5);
    let u = vertex.tex_coords.x * across / TEXTURE_WORLD_SIZE;
    let v = 1.0 - (1.0 - vertex.tex_coords.y) * height / TEXTURE_WORLD_SIZE;

    var out: VertexOutput;
    out.clip_position = uniforms.view_proj * world_pos;
    out.world_normal = normalize(normal_matrix * vertex.normal.xyz);
    out.uv = vec2<f32>(u, v);
    out.color = vertex.color;
    out.tint = instance.tint;
    out.layer = instance.texture_index;
    out.world_pos = world_pos.xyz;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let facade = textureSample(facades, facade_sampler, in.uv, in.layer);
    let light_dir = normalize(vec3<f32>(0.3, 1.0, 0.5));
    let diffuse = max(dot(in.world_normal, light_dir), 0.0);
    let roof = in.color.rgb * (0.35 + 0.65 * diffuse);
    let wall = facade.rgb * in.tint.rgb;
    let surface = mix(roof, wall, vec3<f32>(in.color.a));

    let dist = distance(in.world_pos, uniforms.eye.xyz);
    let fog = clamp((dist - 150.0) / 900.0, 0.0, 1.0);
    return vec4<f32>(mix(surface, SKY, vec3<f32>(fog)), 1.0);
}
"#;

/// WGSL shader for the street grid floor.
pub const STREET_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    eye: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct StreetVertex {
    @location(0) position: vec3<f32>,
    @location(1) color: vec4<f32>,
};

struct StreetOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_street(vertex: StreetVertex) -> StreetOutput {
    var out: StreetOutput;
    out.clip_position = uniforms.view_proj * vec4<f32>(vertex.position, 1.0);
    out.color = vertex.color;
    return out;
}

@fragment
fn fs_street(in: StreetOutput) -> @location(0) vec4<f32> {
    return in.color;
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_size_matches_the_shader_constant() {
        let decl = format!("const TEXTURE_WORLD_SIZE: f32 = {TEXTURE_WORLD_SIZE:.1};");
        assert!(CITY_SHADER.contains(&decl));
    }

    #[test]
    fn instance_locations_follow_the_vertex_attributes() {
        for loc in 0..=12 {
            assert!(CITY_SHADER.contains(&format!("@location({loc})")));
        }
        assert!(STREET_SHADER.contains("fn vs_street"));
    }
}
