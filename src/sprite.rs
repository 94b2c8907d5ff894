//! Particle sprite texture.
//!
//! By default the backdrop builds its soft-glow sprite procedurally: a
//! radial gradient from opaque white through cool blue to transparent.
//! A PNG on disk can replace it via [`Sprite::load`].

use std::path::Path;

use crate::error::SpriteError;

/// Edge length of the procedural sprite, in pixels.
pub const SPRITE_DIM: u32 = 128;

/// Gradient stops as (radial position, rgba). Alpha fades to zero at the
/// rim so additive blending melts the quad edges away.
const STOPS: [(f32, [f32; 4]); 4] = [
    (0.0, [255.0, 255.0, 255.0, 255.0]),
    (0.2, [240.0, 240.0, 255.0, 204.0]),
    (0.4, [200.0, 220.0, 255.0, 127.0]),
    (1.0, [0.0, 0.0, 64.0, 0.0]),
];

/// RGBA8 sprite image for the points pipeline.
#[derive(Debug)]
pub struct Sprite {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl Sprite {
    /// Build the default radial-gradient glow sprite.
    pub fn radial() -> Self {
        let mut rgba = Vec::with_capacity((SPRITE_DIM * SPRITE_DIM * 4) as usize);
        let center = (SPRITE_DIM as f32 - 1.0) / 2.0;
        let radius = SPRITE_DIM as f32 / 2.0;

        for y in 0..SPRITE_DIM {
            for x in 0..SPRITE_DIM {
                let dx = x as f32 - center;
                let dy = y as f32 - center;
                let t = (dx * dx + dy * dy).sqrt() / radius;
                rgba.extend_from_slice(&gradient(t.min(1.0)));
            }
        }

        Self {
            width: SPRITE_DIM,
            height: SPRITE_DIM,
            rgba,
        }
    }

    /// Load a replacement sprite from a PNG file.
    pub fn load(path: &Path) -> Result<Self, SpriteError> {
        let bytes = std::fs::read(path)?;
        let img = image::load_from_memory(&bytes)?.to_rgba8();
        let (width, height) = img.dimensions();

        Ok(Self {
            width,
            height,
            rgba: img.into_raw(),
        })
    }
}

/// Sample the gradient at radial position `t` in [0, 1].
fn gradient(t: f32) -> [u8; 4] {
    let mut lo = STOPS[0];
    for hi in STOPS.iter().skip(1) {
        if t <= hi.0 {
            let span = hi.0 - lo.0;
            let f = if span > 0.0 { (t - lo.0) / span } else { 0.0 };
            let mut out = [0u8; 4];
            for (c, slot) in out.iter_mut().enumerate() {
                *slot = (lo.1[c] + (hi.1[c] - lo.1[c]) * f).round() as u8;
            }
            return out;
        }
        lo = *hi;
    }
    [0, 0, 64, 0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sprite_dimensions() {
        let sprite = Sprite::radial();
        assert_eq!(sprite.width, SPRITE_DIM);
        assert_eq!(sprite.height, SPRITE_DIM);
        assert_eq!(sprite.rgba.len(), (SPRITE_DIM * SPRITE_DIM * 4) as usize);
    }

    #[test]
    fn test_gradient_center_and_rim() {
        assert_eq!(gradient(0.0), [255, 255, 255, 255]);
        assert_eq!(gradient(1.0), [0, 0, 64, 0]);

        // Midway between the 0.4 and 1.0 stops: interpolated, translucent.
        let mid = gradient(0.7);
        assert!(mid[3] > 0 && mid[3] < 127);
    }

    #[test]
    fn test_sprite_center_opaque_corners_clear() {
        let sprite = Sprite::radial();
        let px = |x: u32, y: u32| {
            let i = ((y * SPRITE_DIM + x) * 4) as usize;
            [
                sprite.rgba[i],
                sprite.rgba[i + 1],
                sprite.rgba[i + 2],
                sprite.rgba[i + 3],
            ]
        };

        let center = px(SPRITE_DIM / 2, SPRITE_DIM / 2);
        assert!(center[3] > 250, "center should be opaque");

        let corner = px(0, 0);
        assert_eq!(corner[3], 0, "corners should be fully transparent");
    }

    #[test]
    fn test_load_missing_file() {
        let err = Sprite::load(Path::new("/nonexistent/sprite.png")).unwrap_err();
        assert!(matches!(err, SpriteError::Io(_)));
    }
}
