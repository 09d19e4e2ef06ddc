use image::{imageops, GrayImage, RgbImage};
use ndarray::Array2;

/// Grayscale thumbnail used for difference scoring
///
/// Luminance values are normalized to [0, 1] and laid out row-major in a
/// fixed-size grid, independent of the source resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Thumbnail {
    grid: Array2<f32>,
}

impl Thumbnail {
    /// Mean absolute luminance difference, in [0, 1]
    pub fn difference(&self, other: &Thumbnail) -> f32 {
        if self.grid.dim() != other.grid.dim() {
            // Different thumbnail sizes never come out of one preprocessor
            return 1.0;
        }
        (&self.grid - &other.grid)
            .mapv(f32::abs)
            .mean()
            .unwrap_or(0.0)
    }

    pub fn size(&self) -> (usize, usize) {
        self.grid.dim()
    }
}

/// Converts decoded frames into scoring thumbnails
#[derive(Debug, Clone)]
pub struct Preprocessor {
    size: u32,
}

impl Preprocessor {
    pub fn new(size: u32) -> Self {
        Self { size: size.max(1) }
    }

    /// Downscale to the thumbnail size and convert to normalized luminance
    pub fn thumbnail(&self, image: &RgbImage) -> Thumbnail {
        let _span = tracing::debug_span!("thumbnail").entered();
        let side = self.size as usize;

        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Thumbnail {
                grid: Array2::zeros((side, side)),
            };
        }

        let gray: GrayImage = imageops::grayscale(image);
        let resized = if gray.dimensions() != (self.size, self.size) {
            imageops::resize(&gray, self.size, self.size, imageops::FilterType::Triangle)
        } else {
            gray
        };

        let mut grid = Array2::<f32>::zeros((side, side));
        for (x, y, pixel) in resized.enumerate_pixels() {
            grid[[y as usize, x as usize]] = pixel[0] as f32 / 255.0;
        }

        Thumbnail { grid }
    }
}
