//! Pixel sources for new objects

use crate::error::PipelineError;
use sprite3d_backend::{swap_red_blue, BYTES_PER_PIXEL};
use std::path::Path;

/// A 32-bit BGRA image, top row first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    /// Bytes per row, at least `width * 4`
    pub pitch: usize,
    pub pixels: Vec<u8>,
}

impl Bitmap {
    /// Tightly packed BGRA pixels
    pub fn from_bgra(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pitch: width as usize * BYTES_PER_PIXEL,
            pixels,
        }
    }

    /// Row slices in the layout backends take
    pub fn rows(&self) -> Vec<&[u8]> {
        if self.pitch == 0 {
            return Vec::new();
        }
        self.pixels
            .chunks(self.pitch)
            .take(self.height as usize)
            .collect()
    }
}

/// Decode an image file into BGRA
pub fn load_image_file(path: &Path) -> Result<Bitmap, PipelineError> {
    let img = image::open(path)
        .map_err(|source| PipelineError::Image {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgba8();

    let (width, height) = img.dimensions();
    let mut pixels = img.into_raw();
    swap_red_blue(&mut pixels);

    log::debug!("loaded {:?} ({}x{})", path, width, height);
    Ok(Bitmap::from_bgra(width, height, pixels))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_respect_pitch() {
        let bitmap = Bitmap {
            width: 1,
            height: 2,
            pitch: 8,
            pixels: vec![1, 2, 3, 4, 0, 0, 0, 0, 5, 6, 7, 8, 0, 0, 0, 0],
        };
        let rows = bitmap.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[1][..4], &[5, 6, 7, 8]);
    }

    #[test]
    fn test_empty_bitmap_has_no_rows() {
        assert!(Bitmap::from_bgra(0, 0, Vec::new()).rows().is_empty());
    }

    #[test]
    fn test_png_decoded_as_bgra() {
        let path = std::env::temp_dir().join(format!("sprite3d-{}.png", std::process::id()));
        let img = image::RgbaImage::from_raw(1, 1, vec![0x10, 0x20, 0x30, 0xFF]).unwrap();
        img.save(&path).unwrap();

        let bitmap = load_image_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!((bitmap.width, bitmap.height), (1, 1));
        assert_eq!(bitmap.pixels, vec![0x30, 0x20, 0x10, 0xFF]);
    }

    #[test]
    fn test_missing_file() {
        let result = load_image_file(Path::new("/nonexistent/sprite3d.png"));
        assert!(matches!(result, Err(PipelineError::Image { .. })));
    }
}
