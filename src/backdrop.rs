//! Backdrop builder and frame loop.
//!
//! `Backdrop` configures the particle system with method chaining, then
//! `run()` opens a window and drives the continuous loop: rotate, attract,
//! rebuild connections, render, repeat until the window closes. Every frame
//! does the same fixed amount of work, so under load the frame rate degrades
//! instead of queueing.

use std::path::PathBuf;
use std::sync::Arc;

use glam::Vec3;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::cloud::{ParticleGpu, PointCloud};
use crate::connections::ConnectionSet;
use crate::error::RunError;
use crate::gpu::GpuState;
use crate::pointer::Pointer;
use crate::sprite::Sprite;
use crate::time::FrameClock;

/// Default base color #6e57e0.
const DEFAULT_BASE_COLOR: Vec3 = Vec3::new(0.431, 0.341, 0.878);

/// Default highlight color #00eeff.
const DEFAULT_HIGHLIGHT_COLOR: Vec3 = Vec3::new(0.0, 0.933, 1.0);

/// An animated particle-web backdrop.
///
/// Use method chaining to configure, then call `.run()` to start.
///
/// ```ignore
/// use gossamer::Backdrop;
///
/// Backdrop::new()
///     .with_particle_count(800)
///     .with_connection_distance(2.0)
///     .run()?;
/// ```
pub struct Backdrop {
    particle_count: u32,
    particle_size: f32,
    connection_distance: f32,
    base_color: Vec3,
    highlight_color: Vec3,
    seed: Option<u64>,
    title: String,
    sprite_path: Option<PathBuf>,
}

impl Backdrop {
    /// Create a backdrop with default settings.
    pub fn new() -> Self {
        Self {
            particle_count: 1500,
            particle_size: 0.05,
            connection_distance: 1.5,
            base_color: DEFAULT_BASE_COLOR,
            highlight_color: DEFAULT_HIGHLIGHT_COLOR,
            seed: None,
            title: "gossamer".to_string(),
            sprite_path: None,
        }
    }

    /// Set the number of particles.
    ///
    /// The O(N²) connection pass makes large counts expensive; keep this at
    /// or below ~2000, and lower on weak devices.
    pub fn with_particle_count(mut self, count: u32) -> Self {
        self.particle_count = count;
        self
    }

    /// Set the particle render size.
    pub fn with_particle_size(mut self, size: f32) -> Self {
        self.particle_size = size;
        self
    }

    /// Set the distance below which two particles are linked.
    pub fn with_connection_distance(mut self, distance: f32) -> Self {
        self.connection_distance = distance;
        self
    }

    /// Set the base color for particles and weak links.
    pub fn with_base_color(mut self, color: Vec3) -> Self {
        self.base_color = color;
        self
    }

    /// Set the highlight color strong links shift toward.
    pub fn with_highlight_color(mut self, color: Vec3) -> Self {
        self.highlight_color = color;
        self
    }

    /// Fix the placement seed, making the generated cloud reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the window title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Replace the built-in glow sprite with a PNG from disk.
    pub fn with_sprite(mut self, path: impl Into<PathBuf>) -> Self {
        self.sprite_path = Some(path.into());
        self
    }

    /// Run the backdrop. Blocks until the window is closed.
    pub fn run(self) -> Result<(), RunError> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App::new(self);
        event_loop.run_app(&mut app)?;
        Ok(())
    }
}

impl Default for Backdrop {
    fn default() -> Self {
        Self::new()
    }
}

/// Seed source when the caller doesn't fix one.
fn entropy_seed() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(42)
}

struct App {
    settings: Backdrop,
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    cloud: PointCloud,
    connections: ConnectionSet,
    pointer: Pointer,
    clock: FrameClock,
    instances: Vec<ParticleGpu>,
    last_stats: f32,
}

impl App {
    fn new(settings: Backdrop) -> Self {
        let seed = settings.seed.unwrap_or_else(entropy_seed);
        let cloud = PointCloud::generate(settings.particle_count, seed);
        let connections = ConnectionSet::new(cloud.len(), settings.connection_distance);
        log::info!(
            "generated {} particles, {} candidate links",
            cloud.len(),
            connections.segment_count()
        );

        let capacity = cloud.len();
        Self {
            settings,
            window: None,
            gpu: None,
            cloud,
            connections,
            pointer: Pointer::new(),
            clock: FrameClock::new(),
            instances: Vec::with_capacity(capacity),
            last_stats: 0.0,
        }
    }

    /// One frame: rotate, attract, rebuild links, render.
    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(gpu) = &mut self.gpu else {
            return;
        };

        let (elapsed, _delta) = self.clock.update();
        self.cloud.advance();
        self.cloud.attract(&self.pointer);
        let active = self.connections.rebuild(&self.cloud);

        if elapsed - self.last_stats >= 1.0 {
            self.last_stats = elapsed;
            log::debug!("{} active links, {:.0} fps", active, self.clock.fps());
        }

        self.cloud.write_instances(&mut self.instances);
        match gpu.render(
            elapsed,
            self.cloud.model_matrix(),
            &self.instances,
            self.connections.vertices(),
        ) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost) => gpu.reconfigure(),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("out of GPU memory, exiting");
                event_loop.exit();
            }
            Err(e) => log::warn!("dropped frame: {:?}", e),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(self.settings.title.clone())
            .with_inner_size(LogicalSize::new(1280, 720));

        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        let sprite = match &self.settings.sprite_path {
            Some(path) => Sprite::load(path).unwrap_or_else(|e| {
                log::warn!(
                    "failed to load sprite {}: {}; using built-in glow",
                    path.display(),
                    e
                );
                Sprite::radial()
            }),
            None => Sprite::radial(),
        };

        match pollster::block_on(GpuState::new(
            window,
            &sprite,
            self.cloud.len() as u32,
            self.connections.segment_count() as u32,
            self.settings.base_color,
            self.settings.highlight_color,
            self.settings.particle_size,
        )) {
            Ok(gpu) => self.gpu = Some(gpu),
            // Fail closed: no animation, static background, never a panic.
            Err(e) => log::warn!("GPU unavailable, backdrop stays static: {}", e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let (Some(gpu), Some(window)) = (&mut self.gpu, &self.window) {
                    gpu.resize(physical_size, window.scale_factor());
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some(window) = &self.window {
                    let size = window.inner_size();
                    self.pointer
                        .set_position(position.x, position.y, size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if self.gpu.is_some() {
                    if let Some(window) = &self.window {
                        window.request_redraw();
                    }
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let backdrop = Backdrop::new();
        assert_eq!(backdrop.particle_count, 1500);
        assert_eq!(backdrop.particle_size, 0.05);
        assert_eq!(backdrop.connection_distance, 1.5);
        assert!(backdrop.seed.is_none());
    }

    #[test]
    fn test_builder_chaining() {
        let backdrop = Backdrop::new()
            .with_particle_count(600)
            .with_particle_size(0.08)
            .with_connection_distance(2.0)
            .with_seed(7)
            .with_title("test");
        assert_eq!(backdrop.particle_count, 600);
        assert_eq!(backdrop.particle_size, 0.08);
        assert_eq!(backdrop.connection_distance, 2.0);
        assert_eq!(backdrop.seed, Some(7));
        assert_eq!(backdrop.title, "test");
    }

    #[test]
    fn test_app_preallocates_connection_buffer() {
        let app = App::new(Backdrop::new().with_particle_count(20).with_seed(1));
        assert_eq!(app.cloud.len(), 20);
        assert_eq!(
            app.connections.segment_count(),
            crate::connections::pair_count(20)
        );
    }
}
