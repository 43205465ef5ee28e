use rayon::prelude::*;

use crate::foundation::core::{Dims, Rgba8};
use crate::foundation::error::{EaselError, EaselResult};
use crate::foundation::math::{luma_u8, mul_div255_u8};
use crate::raster::image::RasterImage;

/// Binary mask: white pixels may be regenerated, black pixels are preserved.
///
/// Every pixel is exactly [`Rgba8::WHITE`] or [`Rgba8::BLACK`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    image: RasterImage,
}

impl Mask {
    /// Mask with every pixel black (nothing regenerable).
    pub fn preserve_all(dims: Dims) -> EaselResult<Self> {
        Ok(Self {
            image: RasterImage::solid(dims.width, dims.height, Rgba8::BLACK)?,
        })
    }

    /// Mask whose white pixels are where `white(x, y)` returns `true`.
    pub fn from_fn(dims: Dims, mut white: impl FnMut(u32, u32) -> bool) -> EaselResult<Self> {
        let image = RasterImage::from_fn(dims.width, dims.height, |x, y| {
            if white(x, y) {
                Rgba8::WHITE
            } else {
                Rgba8::BLACK
            }
        })?;
        Ok(Self { image })
    }

    /// Adopt an image that is already strictly binary.
    pub fn try_from_image(image: RasterImage) -> EaselResult<Self> {
        let white = Rgba8::WHITE.to_array();
        let black = Rgba8::BLACK.to_array();
        let binary = image
            .as_bytes()
            .par_chunks_exact(4)
            .all(|px| px == white || px == black);
        if !binary {
            return Err(EaselError::validation(
                "mask image must contain only opaque black and white pixels",
            ));
        }
        Ok(Self { image })
    }

    /// Collapse an antialiased or grey drawing into a strict binary mask.
    ///
    /// A pixel becomes white when its luma weighted by alpha is at least `cutoff`.
    pub fn threshold(image: &RasterImage, cutoff: u8) -> Self {
        let white = Rgba8::WHITE.to_array();
        let black = Rgba8::BLACK.to_array();
        let data: Vec<u8> = image
            .as_bytes()
            .par_chunks_exact(4)
            .flat_map_iter(|px| {
                let v = mul_div255_u8(luma_u8(px[0], px[1], px[2]), px[3]);
                if v >= cutoff && v > 0 { white } else { black }
            })
            .collect();
        Self {
            image: RasterImage::from_parts(image.dims(), data),
        }
    }

    /// Pixel dimensions.
    pub fn dims(&self) -> Dims {
        self.image.dims()
    }

    /// `true` when `(x, y)` is inside the mask and white.
    pub fn is_white(&self, x: u32, y: u32) -> bool {
        self.image.pixel(x, y) == Some(Rgba8::WHITE)
    }

    /// Number of white (regenerable) pixels.
    pub fn white_area(&self) -> u64 {
        self.image
            .as_bytes()
            .par_chunks_exact(4)
            .filter(|px| px[0] == 255)
            .count() as u64
    }

    /// Borrow the underlying black/white image.
    pub fn as_image(&self) -> &RasterImage {
        &self.image
    }

    /// Take the underlying black/white image.
    pub fn into_image(self) -> RasterImage {
        self.image
    }

    pub(crate) fn from_binary_parts(dims: Dims, data: Vec<u8>) -> Self {
        Self {
            image: RasterImage::from_parts(dims, data),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/mask.rs"]
mod tests;
