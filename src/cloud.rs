//! The point cloud: fixed-size particle storage and the per-frame update.
//!
//! Positions live in plain arrays of structs, decoupled from any rendering
//! object model; the GPU adapter translates them into an instance buffer.
//! The sequence length never changes after generation; only positions (and
//! the cloud-level rotation) mutate, once per frame, from a single caller.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};

use crate::pointer::{Pointer, CAPTURE_RADIUS, INFLUENCE};
use crate::spawn::SpawnContext;

/// Per-frame rotation increments for the whole cloud, in radians.
const ROTATION_RATE: Vec2 = Vec2::new(0.0005, 0.001);

/// One particle. Color, size, and speed are assigned at creation and
/// immutable thereafter; only the position changes.
#[derive(Debug, Clone)]
pub struct Particle {
    pub position: Vec3,
    pub color: Vec3,
    pub size: f32,
    pub speed: f32,
}

impl Particle {
    /// GPU instance representation of this particle.
    #[inline]
    pub fn to_gpu(&self) -> ParticleGpu {
        ParticleGpu {
            position: self.position.to_array(),
            size: self.size,
            color: self.color.to_array(),
            speed: self.speed,
        }
    }
}

/// GPU-side particle instance, matching the vertex attribute layout of the
/// points pipeline.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct ParticleGpu {
    pub position: [f32; 3],
    pub size: f32,
    pub color: [f32; 3],
    pub speed: f32,
}

/// Fixed-length particle cloud plus its accumulated rotation.
#[derive(Debug)]
pub struct PointCloud {
    particles: Vec<Particle>,
    rotation: Vec2,
}

impl PointCloud {
    /// Generate `count` particles from the given seed.
    ///
    /// The same `(count, seed)` pair always yields the same cloud.
    pub fn generate(count: u32, seed: u64) -> Self {
        let particles = (0..count)
            .map(|i| {
                let mut ctx = SpawnContext::new(i, count, seed);
                let (position, color) = ctx.place();
                Particle {
                    position,
                    color,
                    size: ctx.size(),
                    speed: ctx.speed(),
                }
            })
            .collect();

        Self {
            particles,
            rotation: Vec2::ZERO,
        }
    }

    /// Build a cloud from explicit particles, for callers that lay out
    /// their own cloud instead of using the procedural patterns.
    pub fn from_particles(particles: Vec<Particle>) -> Self {
        Self {
            particles,
            rotation: Vec2::ZERO,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    #[inline]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Accumulated cloud rotation angles (x, y), in radians.
    #[inline]
    pub fn rotation(&self) -> Vec2 {
        self.rotation
    }

    /// Advance the constant slow rotation by one frame.
    pub fn advance(&mut self) {
        self.rotation += ROTATION_RATE;
    }

    /// Pull particles near the pointer anchor toward it.
    ///
    /// No-op inside the deadzone. Inside the capture radius the nudge is
    /// inversely proportional to planar distance (closer particles move
    /// more), blended with exponential smoothing rather than velocity.
    pub fn attract(&mut self, pointer: &Pointer) {
        if !pointer.active() {
            return;
        }
        let anchor = pointer.anchor();

        for p in &mut self.particles {
            let dx = anchor.x - p.position.x;
            let dy = anchor.y - p.position.y;
            let dist = (dx * dx + dy * dy).sqrt();

            if dist < CAPTURE_RADIUS && dist > 1e-4 {
                let blend = INFLUENCE * (CAPTURE_RADIUS / dist);
                p.position.x += dx * blend;
                p.position.y += dy * blend;
            }
        }
    }

    /// Model matrix carrying the cloud rotation.
    ///
    /// Pair distances are computed in local space; both render pipelines
    /// apply this same transform so connections rotate with their endpoints.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_rotation_y(self.rotation.y) * Mat4::from_rotation_x(self.rotation.x)
    }

    /// Fill `out` with GPU instances for the current frame, reusing its
    /// allocation.
    pub fn write_instances(&self, out: &mut Vec<ParticleGpu>) {
        out.clear();
        out.extend(self.particles.iter().map(Particle::to_gpu));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_exact_count() {
        for count in [0u32, 1, 5, 600, 1500] {
            let cloud = PointCloud::generate(count, 42);
            assert_eq!(cloud.len(), count as usize);
            for p in cloud.particles() {
                assert!(p.position.is_finite(), "non-finite position: {:?}", p);
                assert!(p.color.is_finite());
                assert!(p.size.is_finite());
                assert!(p.speed.is_finite());
            }
        }
    }

    #[test]
    fn test_generate_deterministic() {
        let a = PointCloud::generate(64, 9);
        let b = PointCloud::generate(64, 9);
        for (pa, pb) in a.particles().iter().zip(b.particles()) {
            assert_eq!(pa.position, pb.position);
            assert_eq!(pa.color, pb.color);
        }
    }

    #[test]
    fn test_advance_accumulates_rotation() {
        let mut cloud = PointCloud::generate(4, 1);
        for _ in 0..10 {
            cloud.advance();
        }
        assert!((cloud.rotation().x - 0.005).abs() < 1e-6);
        assert!((cloud.rotation().y - 0.01).abs() < 1e-6);
    }

    #[test]
    fn test_attract_noop_in_deadzone() {
        let mut cloud = PointCloud::generate(32, 3);
        let before: Vec<Vec3> = cloud.particles().iter().map(|p| p.position).collect();

        let mut pointer = Pointer::new();
        pointer.set_position(420.0, 300.0, 800, 600); // inside deadzone
        cloud.attract(&pointer);

        for (p, b) in cloud.particles().iter().zip(&before) {
            assert_eq!(p.position, *b);
        }
    }

    #[test]
    fn test_attract_pulls_toward_anchor() {
        let mut cloud = PointCloud::generate(1, 3);
        let mut pointer = Pointer::new();
        pointer.set_position(600.0, 300.0, 800, 600); // ndc (0.5, 0), anchor (5, 0)
        let anchor = pointer.anchor();

        // Plant the particle just inside the capture radius.
        let start = Vec3::new(anchor.x - 1.0, anchor.y + 0.5, 2.0);
        cloud.particles[0].position = start;
        let before = Vec2::new(start.x - anchor.x, start.y - anchor.y).length();

        cloud.attract(&pointer);
        let pos = cloud.particles()[0].position;
        let after = Vec2::new(pos.x - anchor.x, pos.y - anchor.y).length();

        assert!(after < before, "particle did not move toward anchor");
        assert_eq!(pos.z, start.z, "attraction must not touch z");
    }

    #[test]
    fn test_attract_ignores_far_particles() {
        let mut cloud = PointCloud::generate(1, 3);
        let mut pointer = Pointer::new();
        pointer.set_position(600.0, 300.0, 800, 600);
        let anchor = pointer.anchor();

        let start = Vec3::new(anchor.x + CAPTURE_RADIUS + 1.0, anchor.y, 0.0);
        cloud.particles[0].position = start;

        cloud.attract(&pointer);
        assert_eq!(cloud.particles()[0].position, start);
    }

    #[test]
    fn test_model_matrix_identity_before_advance() {
        let cloud = PointCloud::generate(4, 1);
        assert_eq!(cloud.model_matrix(), Mat4::IDENTITY);
    }
}
