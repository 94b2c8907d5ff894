//! Thin wgpu adapter.
//!
//! Simulation state lives in plain CPU-side buffers (`PointCloud`,
//! `ConnectionSet`); this module owns the device, surface, and the two
//! render pipelines, and streams those buffers to the GPU each frame.
//! Acquiring the device is the one fallible step in the whole backdrop.

mod lines;
mod points;

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::camera::Camera;
use crate::cloud::ParticleGpu;
use crate::connections::LineVertex;
use crate::error::GpuError;
use crate::sprite::Sprite;

use lines::LinesPipeline;
use points::PointsPipeline;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Device pixel ratio cap; bounds fragment cost on high-density displays.
pub const MAX_PIXEL_RATIO: f64 = 2.0;

/// Background and fog color (#0a0a16).
pub const FOG_COLOR: [f32; 3] = [10.0 / 255.0, 10.0 / 255.0, 22.0 / 255.0];

/// Exponential fog density.
pub const FOG_DENSITY: f32 = 0.035;

/// Shared shader uniforms. Layout mirrors the WGSL `Uniforms` struct in
/// both pipelines; vec3 fields pair with a trailing f32 to fill each
/// 16-byte row.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub(crate) struct Uniforms {
    view: [[f32; 4]; 4],
    proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    fog_color: [f32; 3],
    fog_density: f32,
    base_color: [f32; 3],
    time: f32,
    highlight_color: [f32; 3],
    particle_size: f32,
}

/// Cap the surface size so the effective device pixel ratio never exceeds
/// [`MAX_PIXEL_RATIO`].
pub(crate) fn surface_extent(width: u32, height: u32, scale_factor: f64) -> (u32, u32) {
    let factor = (MAX_PIXEL_RATIO / scale_factor).min(1.0);
    (
        ((width as f64 * factor) as u32).max(1),
        ((height as f64 * factor) as u32).max(1),
    )
}

fn additive_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

/// GPU resources for one backdrop window.
pub struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub(crate) config: wgpu::SurfaceConfiguration,
    depth_texture: wgpu::TextureView,
    uniform_buffer: wgpu::Buffer,
    pub(crate) camera: Camera,
    base_color: Vec3,
    highlight_color: Vec3,
    particle_size: f32,
    points: PointsPipeline,
    lines: LinesPipeline,
}

impl GpuState {
    /// Acquire the GPU and build both pipelines.
    ///
    /// Fails with [`GpuError`] when no usable adapter or device exists; the
    /// caller is expected to fail closed rather than propagate.
    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn new(
        window: Arc<Window>,
        sprite: &Sprite,
        particle_count: u32,
        segment_count: u32,
        base_color: Vec3,
        highlight_color: Vec3,
        particle_size: f32,
    ) -> Result<Self, GpuError> {
        let size = window.inner_size();
        let scale_factor = window.scale_factor();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| GpuError::NoAdapter)?;

        log::info!("GPU adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let (width, height) = surface_extent(size.width, size.height, scale_factor);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture = create_depth_texture(&device, &config);
        let camera = Camera::new(width as f32 / height as f32);

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniform Buffer"),
            contents: bytemuck::bytes_of(&Uniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let points = PointsPipeline::new(
            &device,
            &queue,
            &uniform_buffer,
            sprite,
            particle_count,
            surface_format,
        );
        let lines = LinesPipeline::new(&device, &uniform_buffer, segment_count, surface_format);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_texture,
            uniform_buffer,
            camera,
            base_color,
            highlight_color,
            particle_size,
            points,
            lines,
        })
    }

    /// Reconfigure the surface for a new window size.
    ///
    /// Updates the camera aspect ratio; particle state is untouched.
    pub(crate) fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>, scale_factor: f64) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        let (width, height) = surface_extent(new_size.width, new_size.height, scale_factor);
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture = create_depth_texture(&self.device, &self.config);
        self.camera.set_aspect(width, height);
        log::debug!("surface resized to {}x{}", width, height);
    }

    /// Re-apply the current surface configuration after a lost surface.
    pub(crate) fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Upload this frame's buffers and draw.
    pub(crate) fn render(
        &mut self,
        time: f32,
        model: Mat4,
        instances: &[ParticleGpu],
        line_vertices: &[LineVertex],
    ) -> Result<(), wgpu::SurfaceError> {
        let uniforms = Uniforms {
            view: self.camera.view_matrix().to_cols_array_2d(),
            proj: self.camera.projection_matrix().to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            fog_color: FOG_COLOR,
            fog_density: FOG_DENSITY,
            base_color: self.base_color.to_array(),
            time,
            highlight_color: self.highlight_color.to_array(),
            particle_size: self.particle_size,
        };
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        self.points.upload(&self.queue, instances);
        self.lines.upload(&self.queue, line_vertices);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: FOG_COLOR[0] as f64,
                            g: FOG_COLOR[1] as f64,
                            b: FOG_COLOR[2] as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            // Lines first so particles glow on top of their links.
            self.lines.draw(&mut render_pass);
            self.points.draw(&mut render_pass);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn create_depth_texture(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// Validates WGSL code using naga.
#[cfg(test)]
pub(crate) fn validate_wgsl(code: &str) -> Result<(), String> {
    let module = naga::front::wgsl::parse_str(code)
        .map_err(|e| format!("WGSL parse error: {:?}", e))?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(&module)
        .map_err(|e| format!("WGSL validation error: {:?}", e))?;

    Ok(())
}
