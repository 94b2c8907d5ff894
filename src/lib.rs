//! # Gossamer
//!
//! Ambient particle-web backdrops: a procedurally placed 3D point cloud,
//! linked by proximity lines that strengthen as particles drift together,
//! rendered with wgpu inside a winit frame loop.
//!
//! ## Quick Start
//!
//! ```ignore
//! use gossamer::Backdrop;
//!
//! fn main() -> Result<(), gossamer::error::RunError> {
//!     Backdrop::new()
//!         .with_particle_count(1500)
//!         .with_connection_distance(1.5)
//!         .run()
//! }
//! ```
//!
//! ## How it works
//!
//! - **Placement** ([`spawn`]): each particle index picks one of three
//!   patterns: layer bands, radial streams, or a spherical shell uniform
//!   over solid angle, giving the cloud its circuit-diagram-over-nebula
//!   look. A fixed seed reproduces the exact cloud.
//! - **Connections** ([`ConnectionSet`]): every frame, every unordered pair
//!   is tested against the connection distance; strength falls off linearly
//!   from 1 at zero distance to 0 at the threshold. The pass is O(N²) by
//!   design; cap the particle count rather than reach for a spatial index.
//! - **Update** ([`PointCloud`]): a constant slow rotation plus a pointer
//!   attraction field perturb positions; shimmer and pulse effects run in
//!   the shaders off a shared clock.
//! - **Rendering** ([`Backdrop`]): plain CPU buffers stream to an instanced
//!   point pipeline and a storage-buffer line pipeline; additive blending
//!   and exponential depth fog supply the glow.
//!
//! If no usable GPU exists the backdrop fails closed: it logs the cause and
//! leaves a static background instead of crashing the host.

mod backdrop;
mod camera;
mod cloud;
mod connections;
pub mod error;
mod gpu;
mod pointer;
pub mod spawn;
pub mod sprite;
pub mod time;

pub use backdrop::Backdrop;
pub use camera::Camera;
pub use cloud::{Particle, ParticleGpu, PointCloud};
pub use connections::{pair_count, strength, ConnectionSet, LineVertex};
pub use glam::{Vec2, Vec3};
pub use pointer::Pointer;

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use gossamer::prelude::*;
/// ```
pub mod prelude {
    pub use crate::backdrop::Backdrop;
    pub use crate::cloud::{Particle, PointCloud};
    pub use crate::connections::{strength, ConnectionSet};
    pub use crate::pointer::Pointer;
    pub use crate::time::FrameClock;
    pub use crate::{Vec2, Vec3};
}
