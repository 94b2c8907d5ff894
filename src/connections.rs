//! Proximity connections between particles.
//!
//! Every frame, every unordered pair of particles is tested against the
//! connection-distance threshold and written into a dense, pre-allocated
//! segment buffer: active pairs carry their true endpoints and a strength in
//! (0, 1]; inactive pairs collapse to degenerate origin segments that render
//! invisible. The buffer length never changes, so the GPU side can bind it
//! once and stream updates.
//!
//! This is a full O(N²) pass with no spatial partitioning; the particle
//! count is capped instead, and the pass is the dominant cost of the system.

use bytemuck::{Pod, Zeroable};

use crate::cloud::PointCloud;

/// One endpoint of a connection segment, laid out as a vec4 for the line
/// pipeline's storage buffer: xyz position plus the pair's strength.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub strength: f32,
}

/// Connection strength for a pair at the given distance.
///
/// 1 at distance zero, 0 at or beyond the threshold, linear in between.
/// A non-positive threshold disables every connection.
#[inline]
pub fn strength(distance: f32, threshold: f32) -> f32 {
    if distance < threshold {
        1.0 - distance / threshold
    } else {
        0.0
    }
}

/// Dense per-frame connection buffer over all unordered particle pairs.
#[derive(Debug)]
pub struct ConnectionSet {
    threshold: f32,
    vertices: Vec<LineVertex>,
}

impl ConnectionSet {
    /// Pre-allocate the segment buffer for a cloud of `particle_count`.
    pub fn new(particle_count: usize, threshold: f32) -> Self {
        let vertices = vec![LineVertex::zeroed(); pair_count(particle_count) * 2];
        Self {
            threshold,
            vertices,
        }
    }

    /// Connection-distance threshold.
    #[inline]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Number of candidate segments (constant for the life of the set).
    #[inline]
    pub fn segment_count(&self) -> usize {
        self.vertices.len() / 2
    }

    /// Segment vertices, two per candidate pair, ready for upload.
    #[inline]
    pub fn vertices(&self) -> &[LineVertex] {
        &self.vertices
    }

    /// Recompute every pair against the cloud's current positions.
    ///
    /// Returns the number of active pairs this frame. Positions are read in
    /// the cloud's local space; the shared model matrix rotates segments and
    /// particles together at render time.
    pub fn rebuild(&mut self, cloud: &PointCloud) -> usize {
        debug_assert_eq!(self.segment_count(), pair_count(cloud.len()));

        let particles = cloud.particles();
        let mut idx = 0;
        let mut active = 0;

        for i in 0..particles.len() {
            let a = particles[i].position;
            for j in (i + 1)..particles.len() {
                let b = particles[j].position;
                let s = strength(a.distance(b), self.threshold);

                if s > 0.0 {
                    self.vertices[idx] = LineVertex {
                        position: a.to_array(),
                        strength: s,
                    };
                    self.vertices[idx + 1] = LineVertex {
                        position: b.to_array(),
                        strength: s,
                    };
                    active += 1;
                } else {
                    self.vertices[idx] = LineVertex::zeroed();
                    self.vertices[idx + 1] = LineVertex::zeroed();
                }
                idx += 2;
            }
        }

        active
    }
}

/// Number of unordered pairs over `n` particles: n(n-1)/2.
#[inline]
pub fn pair_count(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strength_endpoints() {
        assert_eq!(strength(0.0, 1.5), 1.0);
        assert_eq!(strength(1.5, 1.5), 0.0);
        assert_eq!(strength(2.0, 1.5), 0.0);
    }

    #[test]
    fn test_strength_linear_and_monotonic() {
        assert!((strength(0.75, 1.5) - 0.5).abs() < 1e-6);
        assert!((strength(0.3, 1.5) - 0.8).abs() < 1e-6);

        let mut prev = strength(0.0, 1.5);
        for step in 1..=15 {
            let s = strength(step as f32 * 0.1, 1.5);
            assert!(s < prev, "strength must strictly decrease below threshold");
            prev = s;
        }
    }

    #[test]
    fn test_zero_threshold_disables_everything() {
        assert_eq!(strength(0.0, 0.0), 0.0);
        assert_eq!(strength(0.5, 0.0), 0.0);

        let cloud = PointCloud::generate(5, 42);
        let mut set = ConnectionSet::new(cloud.len(), 0.0);
        assert_eq!(set.rebuild(&cloud), 0);
        assert!(set.vertices().iter().all(|v| v.strength == 0.0));
    }

    #[test]
    fn test_huge_threshold_connects_all_pairs() {
        // All placements fit inside a radius-10 shell, so 100 exceeds any
        // possible inter-point distance.
        let cloud = PointCloud::generate(5, 42);
        let mut set = ConnectionSet::new(cloud.len(), 100.0);

        assert_eq!(set.rebuild(&cloud), 10);
        assert!(set.vertices().iter().all(|v| v.strength > 0.0));
    }

    #[test]
    fn test_buffer_length_constant_across_rebuilds() {
        let mut cloud = PointCloud::generate(12, 7);
        let mut set = ConnectionSet::new(cloud.len(), 1.5);
        let len = set.vertices().len();
        assert_eq!(len, pair_count(12) * 2);

        for _ in 0..3 {
            cloud.advance();
            set.rebuild(&cloud);
            assert_eq!(set.vertices().len(), len);
        }
    }

    #[test]
    fn test_inactive_pairs_degenerate() {
        // Two close particles and one far away: the far pairs must collapse
        // to the origin, not keep stale endpoints.
        let at = |x: f32| crate::cloud::Particle {
            position: glam::Vec3::new(x, 0.0, 0.0),
            color: glam::Vec3::ONE,
            size: 1.0,
            speed: 0.2,
        };
        let cloud = PointCloud::from_particles(vec![at(0.0), at(1.0), at(50.0)]);

        let mut set = ConnectionSet::new(3, 1.5);
        assert_eq!(set.rebuild(&cloud), 1);

        let verts = set.vertices();
        // Pair (0,1) active with strength 1 - 1/1.5.
        assert!((verts[0].strength - (1.0 - 1.0 / 1.5)).abs() < 1e-6);
        assert_eq!(verts[1].position, [1.0, 0.0, 0.0]);
        // Pairs (0,2) and (1,2) degenerate.
        for v in &verts[2..6] {
            assert_eq!(*v, LineVertex::zeroed());
        }
    }

    #[test]
    fn test_pair_count() {
        assert_eq!(pair_count(0), 0);
        assert_eq!(pair_count(1), 0);
        assert_eq!(pair_count(2), 1);
        assert_eq!(pair_count(5), 10);
        assert_eq!(pair_count(1500), 1_124_250);
    }
}
