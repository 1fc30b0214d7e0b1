//! Clean-up of scanned page images before they are shown or recognized.

use image::{DynamicImage, GenericImageView, GrayImage, Luma};
use tracing::debug;

/// Grayscale conversion, contrast stretch and size cap for page scans.
#[derive(Debug, Clone)]
pub struct PageEnhancer {
    /// Maximum image dimension.
    max_size: u32,
    /// Share of darkest and brightest pixels clipped before stretching.
    clip: f32,
}

impl PageEnhancer {
    pub fn new() -> Self {
        Self {
            max_size: 4096,
            clip: 0.01,
        }
    }

    /// Set maximum image dimension.
    pub fn with_max_size(mut self, size: u32) -> Self {
        self.max_size = size.max(1);
        self
    }

    /// Set the share of pixels clipped at each end of the histogram.
    pub fn with_clip(mut self, clip: f32) -> Self {
        self.clip = clip.clamp(0.0, 0.49);
        self
    }

    /// Grayscale and contrast-stretched copy of `image`.
    pub fn enhance(&self, image: &DynamicImage) -> DynamicImage {
        let (width, height) = image.dimensions();
        let (new_width, new_height) = self.calculate_resize_dimensions(width, height);
        let resized = if (new_width, new_height) != (width, height) {
            debug!("Resizing page image {}x{} to {}x{}", width, height, new_width, new_height);
            image.resize_exact(new_width, new_height, image::imageops::FilterType::Lanczos3)
        } else {
            image.clone()
        };

        DynamicImage::ImageLuma8(self.stretch_contrast(&resized.to_luma8()))
    }

    fn calculate_resize_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        let max_dim = width.max(height);
        if max_dim <= self.max_size {
            return (width, height);
        }

        let scale = self.max_size as f32 / max_dim as f32;
        let new_width = (width as f32 * scale) as u32;
        let new_height = (height as f32 * scale) as u32;
        (new_width.max(1), new_height.max(1))
    }

    fn stretch_contrast(&self, image: &GrayImage) -> GrayImage {
        let (low, high) = self.bounds(image);
        if high <= low {
            return image.clone();
        }
        debug!("Stretching gray levels {}..={}", low, high);

        let range = (high - low) as f32;
        let mut result = GrayImage::new(image.width(), image.height());
        for (x, y, pixel) in image.enumerate_pixels() {
            let value = pixel[0].clamp(low, high);
            let stretched = ((value - low) as f32 / range * 255.0).round() as u8;
            result.put_pixel(x, y, Luma([stretched]));
        }
        result
    }

    /// Gray levels below and above which `clip` of the pixels lie.
    fn bounds(&self, image: &GrayImage) -> (u8, u8) {
        let mut histogram = [0u64; 256];
        for pixel in image.pixels() {
            histogram[pixel[0] as usize] += 1;
        }

        let total: u64 = histogram.iter().sum();
        let cutoff = (total as f32 * self.clip) as u64;

        let mut seen = 0;
        let mut low = 0u8;
        for (level, count) in histogram.iter().enumerate() {
            seen += count;
            if seen > cutoff {
                low = level as u8;
                break;
            }
        }

        seen = 0;
        let mut high = 255u8;
        for (level, count) in histogram.iter().enumerate().rev() {
            seen += count;
            if seen > cutoff {
                high = level as u8;
                break;
            }
        }

        (low, high)
    }
}

impl Default for PageEnhancer {
    fn default() -> Self {
        Self::new()
    }
}
