//! The particle sprite.
//!
//! Every particle is drawn as a textured quad. The default sprite is a soft
//! white disc generated on the fly; an image file can be used instead.
//! Pixel data is RGBA8 with premultiplied alpha, matching the additive blend
//! used by the render pipeline.

use std::path::Path;

use crate::error::TextureError;

/// Edge length of the generated sprite.
pub const DEFAULT_SPRITE_SIZE: u32 = 32;

/// Raw RGBA8 pixels for the particle sprite.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteTexture {
    /// Premultiplied RGBA, `width * height * 4` bytes.
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Default for SpriteTexture {
    fn default() -> Self {
        Self::radial_gradient(DEFAULT_SPRITE_SIZE)
    }
}

impl SpriteTexture {
    /// A white disc: opaque out to 10/32 of the edge, fading to nothing at
    /// half the edge.
    pub fn radial_gradient(size: u32) -> Self {
        let size = size.max(1);
        let scale = size as f32 / DEFAULT_SPRITE_SIZE as f32;
        let solid = 10.0 * scale;
        let edge = 16.0 * scale;
        let center = size as f32 * 0.5;

        let mut data = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                let dx = x as f32 + 0.5 - center;
                let dy = y as f32 + 0.5 - center;
                let r = (dx * dx + dy * dy).sqrt();
                let alpha = if r <= solid {
                    1.0
                } else if r >= edge {
                    0.0
                } else {
                    1.0 - (r - solid) / (edge - solid)
                };
                let v = (alpha * 255.0).round() as u8;
                data.extend_from_slice(&[v, v, v, v]);
            }
        }

        Self {
            data,
            width: size,
            height: size,
        }
    }

    /// Load a sprite from an image file (PNG, JPEG, ...), premultiplying alpha.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TextureError> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_image_bytes(&bytes)
    }

    /// Decode an in-memory image.
    pub fn from_image_bytes(bytes: &[u8]) -> Result<Self, TextureError> {
        let img = image::load_from_memory(bytes)?.into_rgba8();
        let (width, height) = img.dimensions();
        let mut data = img.into_raw();
        premultiply(&mut data);
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Bytes per row, for texture uploads.
    pub fn bytes_per_row(&self) -> u32 {
        self.width * 4
    }

    /// Alpha at a pixel.
    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        self.data[((y * self.width + x) * 4 + 3) as usize]
    }
}

fn premultiply(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        for c in &mut px[..3] {
            *c = ((*c as u16 * a + 127) / 255) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gradient_dimensions() {
        let sprite = SpriteTexture::radial_gradient(32);
        assert_eq!(sprite.width, 32);
        assert_eq!(sprite.height, 32);
        assert_eq!(sprite.data.len(), 32 * 32 * 4);
        assert_eq!(sprite.bytes_per_row(), 128);
    }

    #[test]
    fn test_gradient_center_opaque_corner_clear() {
        let sprite = SpriteTexture::default();
        assert_eq!(sprite.alpha_at(16, 16), 255);
        assert_eq!(sprite.alpha_at(0, 0), 0);
        assert_eq!(sprite.alpha_at(31, 31), 0);
        // between the solid core and the edge
        let mid = sprite.alpha_at(16 + 13, 16);
        assert!(mid > 0 && mid < 255, "alpha {}", mid);
    }

    #[test]
    fn test_gradient_is_premultiplied_white() {
        let sprite = SpriteTexture::default();
        for px in sprite.data.chunks_exact(4) {
            assert!(px[0] == px[3] && px[1] == px[3] && px[2] == px[3]);
        }
    }

    #[test]
    fn test_gradient_falls_off_monotonically() {
        let sprite = SpriteTexture::default();
        let row: Vec<u8> = (16..32).map(|x| sprite.alpha_at(x, 16)).collect();
        assert!(row.windows(2).all(|w| w[0] >= w[1]), "{:?}", row);
    }

    #[test]
    fn test_premultiply() {
        let mut px = [255, 128, 0, 128];
        premultiply(&mut px);
        assert_eq!(px, [128, 64, 0, 128]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = SpriteTexture::from_file("/definitely/not/here.png").unwrap_err();
        assert!(matches!(err, TextureError::Io(_)));
    }

    #[test]
    fn test_garbage_bytes_is_decode_error() {
        let err = SpriteTexture::from_image_bytes(b"not an image").unwrap_err();
        assert!(matches!(err, TextureError::ImageLoad(_)));
    }
}
