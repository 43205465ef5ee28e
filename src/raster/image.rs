use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use xxhash_rust::xxh3::Xxh3;

use crate::foundation::core::{Dims, Rgba8};
use crate::foundation::error::{EaselError, EaselResult};

const FINGERPRINT_SEED: u64 = 0x5eed_ea5e_1c0d_e000;

/// Immutable in-memory RGBA8 pixel buffer (straight alpha, row-major, tightly packed).
///
/// Clones share the pixel storage. Every operation that changes pixels returns a new image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterImage {
    dims: Dims,
    data: Arc<Vec<u8>>,
}

impl RasterImage {
    /// Wrap an RGBA8 buffer, validating its length against `width * height * 4`.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> EaselResult<Self> {
        let dims = Dims::non_empty(width, height)?;
        let expected = dims.rgba_len()?;
        if data.len() != expected {
            return Err(EaselError::validation(format!(
                "rgba8 buffer for {width}x{height} must be {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            dims,
            data: Arc::new(data),
        })
    }

    /// Image filled with a single colour.
    pub fn solid(width: u32, height: u32, color: Rgba8) -> EaselResult<Self> {
        let dims = Dims::non_empty(width, height)?;
        let data = color.to_array().repeat(dims.rgba_len()? / 4);
        Ok(Self {
            dims,
            data: Arc::new(data),
        })
    }

    /// Image whose pixels are produced by `f(x, y)`.
    pub fn from_fn(
        width: u32,
        height: u32,
        mut f: impl FnMut(u32, u32) -> Rgba8,
    ) -> EaselResult<Self> {
        let dims = Dims::non_empty(width, height)?;
        let mut data = Vec::with_capacity(dims.rgba_len()?);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y).to_array());
            }
        }
        Ok(Self {
            dims,
            data: Arc::new(data),
        })
    }

    /// Decode any format supported by the `image` crate (PNG, JPEG, WebP, ...).
    pub fn decode(bytes: &[u8]) -> EaselResult<Self> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| EaselError::validation(format!("decode image: {e}")))?
            .to_rgba8();
        let (w, h) = img.dimensions();
        Self::from_rgba8(w, h, img.into_raw())
    }

    /// Decode an image file from disk.
    pub fn open(path: impl AsRef<Path>) -> EaselResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            EaselError::validation(format!("read image '{}': {e}", path.display()))
        })?;
        Self::decode(&bytes)
    }

    /// Encode as PNG bytes.
    pub fn encode_png(&self) -> EaselResult<Vec<u8>> {
        let img = self.to_rgba_image()?;
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
            .map_err(|e| EaselError::Other(anyhow::Error::new(e).context("encode png")))?;
        Ok(out)
    }

    /// Write a PNG file.
    pub fn save_png(&self, path: impl AsRef<Path>) -> EaselResult<()> {
        let path = path.as_ref();
        let bytes = self.encode_png()?;
        std::fs::write(path, bytes).map_err(|e| {
            EaselError::Other(
                anyhow::Error::new(e).context(format!("write png '{}'", path.display())),
            )
        })
    }

    /// Copy into an `image::RgbaImage`.
    pub fn to_rgba_image(&self) -> EaselResult<image::RgbaImage> {
        image::RgbaImage::from_raw(self.dims.width, self.dims.height, self.data.to_vec())
            .ok_or_else(|| EaselError::validation("rgba8 buffer does not match dimensions"))
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.dims.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.dims.height
    }

    /// Pixel dimensions.
    pub fn dims(&self) -> Dims {
        self.dims
    }

    /// Raw RGBA8 bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Pixel at `(x, y)`, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba8> {
        if x >= self.dims.width || y >= self.dims.height {
            return None;
        }
        let idx = ((y as usize) * (self.dims.width as usize) + (x as usize)) * 4;
        let px = &self.data[idx..idx + 4];
        Some(Rgba8::new(px[0], px[1], px[2], px[3]))
    }

    /// Stable content key (xxh3-128 over dimensions and pixels, lowercase hex).
    pub fn fingerprint(&self) -> String {
        let mut h = Xxh3::with_seed(FINGERPRINT_SEED);
        h.update(&self.dims.width.to_le_bytes());
        h.update(&self.dims.height.to_le_bytes());
        h.update(&self.data);
        format!("{:032x}", h.digest128())
    }

    pub(crate) fn from_parts(dims: Dims, data: Vec<u8>) -> Self {
        debug_assert_eq!(Some(data.len()), dims.rgba_len().ok());
        Self {
            dims,
            data: Arc::new(data),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/image.rs"]
mod tests;
