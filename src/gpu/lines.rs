//! Connection-line rendering.
//!
//! The dense segment buffer lives in a storage buffer; the vertex shader
//! expands each candidate pair into a thin camera-independent quad by
//! instance index. Degenerate (inactive) segments collapse to a clipped
//! point, so the draw call never changes size.

use super::{additive_blend, DEPTH_FORMAT};
use crate::connections::LineVertex;

pub(super) struct LinesPipeline {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    segment_buffer: wgpu::Buffer,
    segment_count: u32,
}

impl LinesPipeline {
    pub(super) fn new(
        device: &wgpu::Device,
        uniform_buffer: &wgpu::Buffer,
        segment_count: u32,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let vertex_stride = std::mem::size_of::<LineVertex>() as u64;
        let segment_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Connection Segment Buffer"),
            size: vertex_stride * 2 * segment_count.max(1) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Lines Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Lines Bind Group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: segment_buffer.as_entire_binding(),
                },
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Lines Shader"),
            source: wgpu::ShaderSource::Wgsl(LINES_SHADER.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Lines Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Lines Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(additive_blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            bind_group,
            segment_buffer,
            segment_count,
        }
    }

    pub(super) fn upload(&self, queue: &wgpu::Queue, vertices: &[LineVertex]) {
        if !vertices.is_empty() {
            queue.write_buffer(&self.segment_buffer, 0, bytemuck::cast_slice(vertices));
        }
    }

    pub(super) fn draw<'pass>(&'pass self, render_pass: &mut wgpu::RenderPass<'pass>) {
        if self.segment_count == 0 {
            return;
        }
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        render_pass.draw(0..6, 0..self.segment_count);
    }
}

const LINES_SHADER: &str = r#"
struct Uniforms {
    view: mat4x4<f32>,
    proj: mat4x4<f32>,
    model: mat4x4<f32>,
    fog_color: vec3<f32>,
    fog_density: f32,
    base_color: vec3<f32>,
    time: f32,
    highlight_color: vec3<f32>,
    particle_size: f32,
};

@group(0) @binding(0) var<uniform> uniforms: Uniforms;
@group(0) @binding(1) var<storage, read> segments: array<vec4<f32>>;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) strength: f32,
    @location(1) fade: f32,
};

const LINE_HALF_WIDTH: f32 = 0.02;

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @builtin(instance_index) instance_index: u32,
) -> VertexOutput {
    var out: VertexOutput;

    let seg_a = segments[instance_index * 2u];
    let seg_b = segments[instance_index * 2u + 1u];
    let strength = seg_a.w;

    let span = seg_b.xyz - seg_a.xyz;
    if strength < 0.001 || length(span) < 0.0001 {
        out.clip_position = vec4<f32>(0.0, 0.0, -1000.0, 1.0);
        out.strength = 0.0;
        out.fade = 0.0;
        return out;
    }

    let pos_a = (uniforms.model * vec4<f32>(seg_a.xyz, 1.0)).xyz;
    let pos_b = (uniforms.model * vec4<f32>(seg_b.xyz, 1.0)).xyz;

    let line_dir = normalize(pos_b - pos_a);
    var perp = cross(line_dir, vec3<f32>(0.0, 1.0, 0.0));
    if length(perp) < 0.001 {
        perp = cross(line_dir, vec3<f32>(1.0, 0.0, 0.0));
    }
    perp = normalize(perp) * LINE_HALF_WIDTH;

    var pos: vec3<f32>;
    switch vertex_index {
        case 0u: { pos = pos_a - perp; }
        case 1u: { pos = pos_a + perp; }
        case 2u: { pos = pos_b - perp; }
        case 3u: { pos = pos_a + perp; }
        case 4u: { pos = pos_b - perp; }
        default: { pos = pos_b + perp; }
    }

    let view_pos = uniforms.view * vec4<f32>(pos, 1.0);
    let depth = -view_pos.z;

    out.clip_position = uniforms.proj * view_pos;
    out.strength = strength;
    out.fade = exp(-uniforms.fog_density * uniforms.fog_density * depth * depth);
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let pulse = 0.3 + 0.2 * sin(uniforms.time * 3.0 + in.strength * 10.0);
    let color = mix(uniforms.base_color, uniforms.highlight_color, in.strength);
    return vec4<f32>(color, pulse * in.strength * in.fade);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_shader_valid() {
        super::super::validate_wgsl(LINES_SHADER).expect("lines WGSL should be valid");
    }
}
