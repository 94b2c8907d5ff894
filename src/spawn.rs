//! Particle placement.
//!
//! Each particle is placed by one of three procedural patterns chosen from
//! its index, layering structured "circuit" and "stream" motifs over a
//! diffuse spherical background:
//!
//! - every 5th particle sits in one of five vertical layer bands,
//! - the next in an angular stream radiating from the origin,
//! - the remaining three of five on a spherical shell, uniform over solid
//!   angle so the poles don't cluster.
//!
//! Placement is driven by a per-particle RNG seeded from the backdrop seed,
//! so a fixed seed reproduces the exact cloud.

use crate::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

/// Number of particles in one stream cycle.
const STREAM_LENGTH: u32 = 15;

/// Which placement pattern a particle index maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// Layer-band arrangement, hue biased toward blue.
    Layered,
    /// Radial stream from the origin, hue biased toward purple.
    Stream,
    /// Spherical shell, wide blue-green hue range.
    Shell,
}

impl Pattern {
    /// Pattern dispatch: index mod 5 picks layered (0), stream (1), or shell.
    #[inline]
    pub fn for_index(index: u32) -> Self {
        match index % 5 {
            0 => Pattern::Layered,
            1 => Pattern::Stream,
            _ => Pattern::Shell,
        }
    }
}

/// Context for placing one particle: its index plus a seeded RNG.
pub struct SpawnContext {
    /// Index of the particle being placed (0 to count-1).
    pub index: u32,
    /// Total number of particles being placed.
    pub count: u32,
    rng: SmallRng,
}

impl SpawnContext {
    /// Create a placement context for a particle.
    ///
    /// The RNG stream is derived from the backdrop seed and the particle
    /// index, so the same `(seed, index)` always yields the same particle.
    pub fn new(index: u32, count: u32, seed: u64) -> Self {
        Self {
            index,
            count,
            rng: SmallRng::seed_from_u64(seed ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)),
        }
    }

    /// Place the particle, returning `(position, color)`.
    pub fn place(&mut self) -> (Vec3, Vec3) {
        match Pattern::for_index(self.index) {
            Pattern::Layered => self.place_layered(),
            Pattern::Stream => self.place_stream(),
            Pattern::Shell => self.place_shell(),
        }
    }

    /// Layer-band placement: x snaps to one of five bands with jitter.
    fn place_layered(&mut self) -> (Vec3, Vec3) {
        let layer = self.rng.gen_range(0..5) as f32;
        let node = self.rng.gen_range(-5.0..5.0);
        let offset = self.rng.gen_range(-1.0..1.0);

        let position = Vec3::new(
            layer * 2.0 - 5.0 + offset,
            node,
            self.rng.gen_range(-2.0..2.0),
        );
        let color = hsl_to_rgb(0.6 + self.rng.gen::<f32>() * 0.1, 0.9, 0.6);
        (position, color)
    }

    /// Stream placement: position interpolated outward along a random angle,
    /// with the particle's global index cycling through the stream length.
    fn place_stream(&mut self) -> (Vec3, Vec3) {
        let t = (self.index % STREAM_LENGTH) as f32 / STREAM_LENGTH as f32;
        let angle = self.rng.gen_range(0.0..TAU);

        let position = Vec3::new(
            angle.cos() * 8.0 * t,
            self.rng.gen_range(-5.0..5.0),
            angle.sin() * 8.0 * t,
        );
        let color = hsl_to_rgb(0.75 + self.rng.gen::<f32>() * 0.1, 0.9, 0.6);
        (position, color)
    }

    /// Shell placement: uniform over solid angle between two radii.
    ///
    /// phi comes from `acos(2u - 1)` rather than a uniform angle, which is
    /// what keeps density even instead of clustering at the poles.
    fn place_shell(&mut self) -> (Vec3, Vec3) {
        let theta = self.rng.gen_range(0.0..TAU);
        let phi = self.rng.gen_range(-1.0f32..1.0).acos();
        let radius = 3.0 + self.rng.gen::<f32>() * 7.0;

        let position = Vec3::new(
            radius * phi.sin() * theta.cos(),
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
        );
        let color = hsl_to_rgb(0.5 + self.rng.gen::<f32>() * 0.3, 0.7, 0.5);
        (position, color)
    }

    /// Render size scalar, fixed at creation.
    pub fn size(&mut self) -> f32 {
        self.rng.gen::<f32>() * 4.0 + 0.5
    }

    /// Shimmer animation speed, fixed at creation.
    pub fn speed(&mut self) -> f32 {
        self.rng.gen::<f32>() * 0.5 + 0.1
    }
}

/// Convert HSL to RGB.
///
/// * `h` - 0.0 to 1.0 (wraps: red → yellow → green → cyan → blue → magenta → red)
/// * `s` - 0.0 (gray) to 1.0 (vivid)
/// * `l` - 0.0 (black) to 1.0 (white)
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Vec3 {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let h6 = h.rem_euclid(1.0) * 6.0;
    let x = c * (1.0 - (h6 % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = match h6 as u32 % 6 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    Vec3::new(r + m, g + m, b + m)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_dispatch() {
        assert_eq!(Pattern::for_index(0), Pattern::Layered);
        assert_eq!(Pattern::for_index(1), Pattern::Stream);
        assert_eq!(Pattern::for_index(2), Pattern::Shell);
        assert_eq!(Pattern::for_index(3), Pattern::Shell);
        assert_eq!(Pattern::for_index(4), Pattern::Shell);
        assert_eq!(Pattern::for_index(5), Pattern::Layered);
        assert_eq!(Pattern::for_index(6), Pattern::Stream);
    }

    #[test]
    fn test_placement_deterministic() {
        let (a, _) = SpawnContext::new(7, 100, 42).place();
        let (b, _) = SpawnContext::new(7, 100, 42).place();
        assert_eq!(a, b);

        let (c, _) = SpawnContext::new(7, 100, 43).place();
        assert_ne!(a, c);
    }

    #[test]
    fn test_layered_x_bands() {
        // Band centers sit at -5, -3, -1, 1, 3 with up to +-1 of jitter.
        for i in 0..200u32 {
            let mut ctx = SpawnContext::new(i * 5, 1000, 7);
            let (pos, _) = ctx.place();
            assert!(pos.x >= -6.0 && pos.x <= 4.0, "x out of range: {}", pos.x);

            let nearest = [-5.0f32, -3.0, -1.0, 1.0, 3.0]
                .iter()
                .map(|b| (pos.x - b).abs())
                .fold(f32::INFINITY, f32::min);
            assert!(nearest <= 1.0 + 1e-4, "x {} not within any band", pos.x);
            assert!(pos.y.abs() <= 5.0);
            assert!(pos.z.abs() <= 2.0);
        }
    }

    #[test]
    fn test_stream_radius_follows_cycle() {
        for i in 0..100u32 {
            let index = i * 5 + 1;
            let mut ctx = SpawnContext::new(index, 1000, 7);
            let (pos, _) = ctx.place();

            let expected = 8.0 * (index % STREAM_LENGTH) as f32 / STREAM_LENGTH as f32;
            let planar = (pos.x * pos.x + pos.z * pos.z).sqrt();
            assert!((planar - expected).abs() < 1e-3);
        }
    }

    #[test]
    fn test_shell_radius_range() {
        for i in 0..500u32 {
            let mut ctx = SpawnContext::new(i * 5 + 2, 10_000, 7);
            let (pos, _) = ctx.place();
            let r = pos.length();
            assert!((3.0..10.0).contains(&r), "radius out of range: {}", r);
        }
    }

    #[test]
    fn test_shell_no_polar_clustering() {
        // Uniform over solid angle means cos(phi) = z/r is uniform in
        // [-1, 1]: mean near zero and ~10% of samples in each polar cap.
        let samples = 5000u32;
        let mut mean = 0.0f64;
        let mut cap = 0u32;

        for i in 0..samples {
            let mut ctx = SpawnContext::new(i * 5 + 2, samples * 5, 99);
            let (pos, _) = ctx.place();
            let u = (pos.z / pos.length()) as f64;
            mean += u;
            if u > 0.8 {
                cap += 1;
            }
        }
        mean /= samples as f64;
        let cap_frac = cap as f64 / samples as f64;

        assert!(mean.abs() < 0.05, "polar bias: mean cos(phi) = {}", mean);
        assert!(
            (0.07..0.13).contains(&cap_frac),
            "polar cap fraction {} far from 0.1",
            cap_frac
        );
    }

    #[test]
    fn test_size_and_speed_ranges() {
        let mut ctx = SpawnContext::new(0, 1, 1);
        for _ in 0..100 {
            let s = ctx.size();
            assert!((0.5..4.5).contains(&s));
            let v = ctx.speed();
            assert!((0.1..0.6).contains(&v));
        }
    }

    #[test]
    fn test_hsl_to_rgb() {
        // Pure red
        let red = hsl_to_rgb(0.0, 1.0, 0.5);
        assert!((red.x - 1.0).abs() < 0.001);
        assert!(red.y < 0.001);
        assert!(red.z < 0.001);

        // Full lightness is white regardless of hue
        let white = hsl_to_rgb(0.3, 0.9, 1.0);
        assert!((white.x - 1.0).abs() < 0.001);
        assert!((white.y - 1.0).abs() < 0.001);
        assert!((white.z - 1.0).abs() < 0.001);

        // Zero saturation is gray at the lightness level
        let gray = hsl_to_rgb(0.7, 0.0, 0.4);
        assert!((gray.x - 0.4).abs() < 0.001);
        assert!((gray.x - gray.y).abs() < 0.001);
        assert!((gray.y - gray.z).abs() < 0.001);
    }
}
