//! WGSL sources for the three pipelines.

/// Textured Phong lighting with one directional and one attenuated point light.
pub const LIT_SHADER: &str = r#"
struct Transforms {
    model: mat4x4<f32>,
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    normal: mat3x4<f32>,
}

struct DirectionalLight {
    direction: vec4<f32>,
    ambient: vec4<f32>,
    diffuse: vec4<f32>,
    specular: vec4<f32>,
}

// constant, linear and quadratic attenuation live in ambient.w, diffuse.w, specular.w
struct PointLight {
    position: vec4<f32>,
    ambient: vec4<f32>,
    diffuse: vec4<f32>,
    specular: vec4<f32>,
}

struct Lighting {
    directional: DirectionalLight,
    point: PointLight,
    view_position: vec4<f32>,
}

// x: specular exponent
struct Material {
    params: vec4<f32>,
}

@group(0) @binding(0)
var<uniform> transforms: Transforms;

@group(0) @binding(1)
var<uniform> lighting: Lighting;

@group(1) @binding(0)
var diffuse_map: texture_2d<f32>;

@group(1) @binding(1)
var specular_map: texture_2d<f32>;

@group(1) @binding(2)
var material_sampler: sampler;

@group(1) @binding(3)
var<uniform> material: Material;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world_position = transforms.model * vec4<f32>(input.position, 1.0);
    out.position = transforms.projection * transforms.view * world_position;
    out.world_pos = world_position.xyz;
    out.normal = mat3x3<f32>(
        transforms.normal[0].xyz,
        transforms.normal[1].xyz,
        transforms.normal[2].xyz
    ) * input.normal;
    out.uv = input.uv;
    return out;
}

fn directional_contribution(
    light: DirectionalLight,
    normal: vec3<f32>,
    view_dir: vec3<f32>,
    albedo: vec3<f32>,
    gloss: vec3<f32>,
) -> vec3<f32> {
    let light_dir = normalize(-light.direction.xyz);
    let diff = max(dot(normal, light_dir), 0.0);
    let reflected = reflect(-light_dir, normal);
    let spec = pow(max(dot(view_dir, reflected), 0.0), material.params.x);
    return light.ambient.xyz * albedo
        + light.diffuse.xyz * diff * albedo
        + light.specular.xyz * spec * gloss;
}

fn point_contribution(
    light: PointLight,
    normal: vec3<f32>,
    world_pos: vec3<f32>,
    view_dir: vec3<f32>,
    albedo: vec3<f32>,
    gloss: vec3<f32>,
) -> vec3<f32> {
    let to_light = light.position.xyz - world_pos;
    let light_dir = normalize(to_light);
    let diff = max(dot(normal, light_dir), 0.0);
    let reflected = reflect(-light_dir, normal);
    let spec = pow(max(dot(view_dir, reflected), 0.0), material.params.x);
    let distance = length(to_light);
    let attenuation = 1.0 / (light.ambient.w + light.diffuse.w * distance
        + light.specular.w * distance * distance);
    return (light.ambient.xyz * albedo
        + light.diffuse.xyz * diff * albedo
        + light.specular.xyz * spec * gloss) * attenuation;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let base = textureSample(diffuse_map, material_sampler, input.uv);
    let albedo = base.rgb;
    let gloss = textureSample(specular_map, material_sampler, input.uv).rgb;
    let normal = normalize(input.normal);
    let view_dir = normalize(lighting.view_position.xyz - input.world_pos);

    var color = directional_contribution(lighting.directional, normal, view_dir, albedo, gloss);
    color += point_contribution(lighting.point, normal, input.world_pos, view_dir, albedo, gloss);
    return vec4<f32>(color, base.a);
}
"#;

/// Cubemap sky drawn at the far plane behind everything already in the target.
pub const SKYBOX_SHADER: &str = r#"
struct SkyboxUniform {
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
}

@group(0) @binding(0)
var<uniform> sky: SkyboxUniform;

@group(0) @binding(1)
var sky_texture: texture_cube<f32>;

@group(0) @binding(2)
var sky_sampler: sampler;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) direction: vec3<f32>,
}

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> VertexOutput {
    var out: VertexOutput;
    let clip = sky.projection * sky.view * vec4<f32>(position, 1.0);
    // z = w puts every fragment at depth 1.0
    out.position = clip.xyww;
    out.direction = position;
    return out;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(sky_texture, sky_sampler, input.direction);
}
"#;

/// Passthrough copy of the offscreen color attachment onto the window surface.
pub const BLIT_SHADER: &str = r#"
@group(0) @binding(0)
var screen_texture: texture_2d<f32>;

@group(0) @binding(1)
var screen_sampler: sampler;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(@location(0) position: vec2<f32>, @location(1) uv: vec2<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.position = vec4<f32>(position, 0.0, 1.0);
    // quad uvs have v up; texture rows start at the top
    out.uv = vec2<f32>(uv.x, 1.0 - uv.y);
    return out;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(screen_texture, screen_sampler, input.uv);
}
"#;
