use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4};

use crate::assets::Shading;
use crate::frame::DrawCommand;

/// Per-draw uniform block, bound at a dynamic offset.
///
/// `params` packs the shading switch (x), the light enabled flag (y) and
/// the material transparency (z). The specular exponent rides in
/// `material_specular.w`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub(crate) struct DrawUniform {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 3],
    pub tint: [f32; 4],
    pub view_position: [f32; 4],
    pub light_position: [f32; 4],
    pub light_ambient: [f32; 4],
    pub light_diffuse: [f32; 4],
    pub light_specular: [f32; 4],
    pub material_ambient: [f32; 4],
    pub material_diffuse: [f32; 4],
    pub material_specular: [f32; 4],
    pub params: [f32; 4],
}

impl DrawUniform {
    pub fn new(view_proj: Mat4, command: &DrawCommand) -> Self {
        let slots = &command.uniforms;
        let light = &slots.light;
        let material = &slots.material;
        let normal = Mat3::from_mat4(command.transform).inverse().transpose();
        let lit = match command.shading {
            Shading::Lit => 1.0,
            Shading::Unlit => 0.0,
        };
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            model: command.transform.to_cols_array_2d(),
            normal: mat3_to_3x4(normal),
            tint: command.tint.to_linear().into(),
            view_position: slots.view_position.extend(1.0).into(),
            light_position: light.position.extend(1.0).into(),
            light_ambient: light.ambient.extend(0.0).into(),
            light_diffuse: light.diffuse.extend(0.0).into(),
            light_specular: light.specular.extend(0.0).into(),
            material_ambient: material.ambient.extend(0.0).into(),
            material_diffuse: material.diffuse.extend(0.0).into(),
            material_specular: material.specular.extend(material.shininess).into(),
            params: [lit, if light.enabled { 1.0 } else { 0.0 }, material.transparency, 0.0],
        }
    }
}

fn mat3_to_3x4(matrix: Mat3) -> [[f32; 4]; 3] {
    let cols = matrix.to_cols_array();
    [
        [cols[0], cols[1], cols[2], 0.0],
        [cols[3], cols[4], cols[5], 0.0],
        [cols[6], cols[7], cols[8], 0.0],
    ]
}

pub(crate) const SHADER: &str = r#"
struct DrawUniform {
    view_proj: mat4x4<f32>,
    model: mat4x4<f32>,
    normal: mat3x4<f32>,
    tint: vec4<f32>,
    view_position: vec4<f32>,
    light_position: vec4<f32>,
    light_ambient: vec4<f32>,
    light_diffuse: vec4<f32>,
    light_specular: vec4<f32>,
    material_ambient: vec4<f32>,
    material_diffuse: vec4<f32>,
    material_specular: vec4<f32>,
    params: vec4<f32>,
}

@group(0) @binding(0)
var<uniform> draw: DrawUniform;

@group(1) @binding(0)
var diffuse_texture: texture_2d<f32>;
@group(1) @binding(1)
var diffuse_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
    @location(3) color: vec4<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
    @location(3) color: vec4<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world_position = draw.model * vec4<f32>(input.position, 1.0);
    out.position = draw.view_proj * world_position;
    out.world_pos = world_position.xyz;
    out.normal = mat3x3<f32>(
        draw.normal[0].xyz,
        draw.normal[1].xyz,
        draw.normal[2].xyz
    ) * input.normal;
    out.uv = input.uv;
    out.color = input.color;
    return out;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let texel = textureSample(diffuse_texture, diffuse_sampler, input.uv);
    let base = texel * draw.tint * input.color;
    if draw.params.x < 0.5 {
        return base;
    }

    var lighting = draw.light_ambient.rgb * draw.material_ambient.rgb;
    if draw.params.y > 0.5 {
        let normal = normalize(input.normal);
        let light_dir = normalize(draw.light_position.xyz - input.world_pos);
        let view_dir = normalize(draw.view_position.xyz - input.world_pos);
        let diffuse = max(dot(normal, light_dir), 0.0);
        let reflect_dir = reflect(-light_dir, normal);
        let shininess = max(draw.material_specular.w, 1.0);
        let specular = pow(max(dot(view_dir, reflect_dir), 0.0), shininess);
        lighting += draw.light_diffuse.rgb * diffuse * draw.material_diffuse.rgb;
        lighting += draw.light_specular.rgb * specular * draw.material_specular.rgb;
    }
    return vec4<f32>(base.rgb * lighting, base.a * draw.params.z);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetRegistry, Model};
    use crate::camera::Camera;
    use crate::color::Color;
    use crate::frame::Frame;
    use crate::scene::{Light, Material};
    use glam::Vec3;

    fn record(lit: bool) -> DrawCommand {
        let assets = AssetRegistry::new();
        let camera = Camera::perspective(Vec3::new(0.0, 5.0, 5.0), Vec3::ZERO, 45.0);
        let mut frame = Frame::begin(&assets, &camera, Color::WHITE);
        frame.set_light(&Light::point(Vec3::splat(10.0), true));
        frame.set_material(&Material::RUBY);
        let sphere = assets.primitives().sphere;
        let model = if lit { Model::lit(sphere) } else { Model::unlit(sphere) };
        frame.draw_model(model, Vec3::new(1.0, 2.0, 3.0), 2.0, Color::WHITE);
        frame.finish().commands[0]
    }

    #[test]
    fn uniform_size_is_a_multiple_of_sixteen() {
        assert_eq!(std::mem::size_of::<DrawUniform>() % 16, 0);
    }

    #[test]
    fn packs_shading_light_and_material() {
        let uniform = DrawUniform::new(Mat4::IDENTITY, &record(true));
        assert_eq!(uniform.params, [1.0, 1.0, 0.3, 0.0]);
        assert_eq!(uniform.material_specular[3], Material::RUBY.shininess);
        assert_eq!(uniform.light_position, [10.0, 10.0, 10.0, 1.0]);
        assert_eq!(uniform.model[3], [1.0, 2.0, 3.0, 1.0]);

        let unlit = DrawUniform::new(Mat4::IDENTITY, &record(false));
        assert_eq!(unlit.params[0], 0.0);
    }

    #[test]
    fn normal_matrix_undoes_uniform_scale() {
        let uniform = DrawUniform::new(Mat4::IDENTITY, &record(true));
        assert!((uniform.normal[0][0] - 0.5).abs() < 1e-6);
        assert_eq!(uniform.normal[0][3], 0.0);
    }
}
