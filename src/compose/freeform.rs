use kurbo::{Point, Rect};

use crate::foundation::core::{Dims, Rgba8};
use crate::foundation::error::{EaselError, EaselResult};
use crate::raster::image::RasterImage;
use crate::raster::mask::Mask;

/// What a stroke does to the pixels it covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    /// Paint with the canvas paint colour.
    Brush,
    /// Paint with the canvas erase colour.
    Eraser,
}

/// One committed pointer gesture: a polyline swept by a round brush of `radius` pixels.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Stroke {
    /// Brush or eraser.
    pub tool: Tool,
    /// Brush radius in pixels.
    pub radius: f64,
    /// Polyline vertices in canvas pixel space.
    pub points: Vec<Point>,
}

impl Stroke {
    /// Brush stroke through `points`.
    pub fn brush(radius: f64, points: Vec<Point>) -> Self {
        Self {
            tool: Tool::Brush,
            radius,
            points,
        }
    }

    /// Eraser stroke through `points`.
    pub fn eraser(radius: f64, points: Vec<Point>) -> Self {
        Self {
            tool: Tool::Eraser,
            radius,
            points,
        }
    }

    fn validate(&self) -> EaselResult<()> {
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(EaselError::validation("stroke radius must be finite and > 0"));
        }
        if self.points.is_empty() {
            return Err(EaselError::validation("stroke must contain at least one point"));
        }
        if self
            .points
            .iter()
            .any(|p| !p.x.is_finite() || !p.y.is_finite())
        {
            return Err(EaselError::validation("stroke points must be finite"));
        }
        Ok(())
    }
}

/// Drawing surface with whole-buffer undo/redo.
///
/// Each committed stroke pushes a full snapshot of the previous buffer; there is no depth limit.
/// Strokes are hard-edged: a pixel is covered when its centre lies within `radius` of the polyline.
#[derive(Clone, Debug)]
pub struct StrokeCanvas {
    dims: Dims,
    paint: Rgba8,
    erase: Rgba8,
    pixels: Vec<u8>,
    undo: Vec<Vec<u8>>,
    redo: Vec<Vec<u8>>,
}

impl StrokeCanvas {
    /// Mask-drawing canvas: starts black, brush paints white, eraser paints black.
    pub fn mask_canvas(width: u32, height: u32) -> EaselResult<Self> {
        Self::new(width, height, Rgba8::WHITE, Rgba8::BLACK, Rgba8::BLACK)
    }

    /// Overlay canvas: starts transparent, brush paints `color`, eraser clears to transparent.
    pub fn drawing_canvas(width: u32, height: u32, color: Rgba8) -> EaselResult<Self> {
        Self::new(width, height, color, Rgba8::TRANSPARENT, Rgba8::TRANSPARENT)
    }

    fn new(
        width: u32,
        height: u32,
        paint: Rgba8,
        erase: Rgba8,
        background: Rgba8,
    ) -> EaselResult<Self> {
        let dims = Dims::non_empty(width, height)?;
        let pixels = background.to_array().repeat(dims.rgba_len()? / 4);
        Ok(Self {
            dims,
            paint,
            erase,
            pixels,
            undo: Vec::new(),
            redo: Vec::new(),
        })
    }

    /// Pixel dimensions.
    pub fn dims(&self) -> Dims {
        self.dims
    }

    /// Rasterize `stroke` and record an undo snapshot. Clears the redo stack.
    pub fn commit(&mut self, stroke: &Stroke) -> EaselResult<()> {
        stroke.validate()?;
        let snapshot = self.pixels.clone();
        let color = match stroke.tool {
            Tool::Brush => self.paint,
            Tool::Eraser => self.erase,
        };
        rasterize_stroke(&mut self.pixels, self.dims, stroke, color);
        self.undo.push(snapshot);
        self.redo.clear();
        Ok(())
    }

    /// Reset to the erase colour. Undoable like a stroke.
    pub fn clear(&mut self) {
        let blank = self.erase.to_array().repeat(self.pixels.len() / 4);
        let snapshot = std::mem::replace(&mut self.pixels, blank);
        self.undo.push(snapshot);
        self.redo.clear();
    }

    /// Revert the last commit. Returns `false` when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(prev) = self.undo.pop() else {
            return false;
        };
        let cur = std::mem::replace(&mut self.pixels, prev);
        self.redo.push(cur);
        true
    }

    /// Re-apply the last undone commit. Returns `false` when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.redo.pop() else {
            return false;
        };
        let cur = std::mem::replace(&mut self.pixels, next);
        self.undo.push(cur);
        true
    }

    /// `true` when [`StrokeCanvas::undo`] would change the buffer.
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// `true` when [`StrokeCanvas::redo`] would change the buffer.
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Snapshot of the current buffer.
    pub fn to_image(&self) -> RasterImage {
        RasterImage::from_parts(self.dims, self.pixels.clone())
    }

    /// Binary mask of the current buffer (luma-weighted alpha at least 128 is white).
    pub fn to_mask(&self) -> Mask {
        Mask::threshold(&self.to_image(), 128)
    }
}

/// Rasterize `strokes` in order onto a fresh black canvas and return the binary mask.
pub fn build_freeform_mask(dims: Dims, strokes: &[Stroke]) -> EaselResult<Mask> {
    let mut canvas = StrokeCanvas::mask_canvas(dims.width, dims.height)?;
    for s in strokes {
        canvas.commit(s)?;
    }
    Ok(canvas.to_mask())
}

fn rasterize_stroke(pixels: &mut [u8], dims: Dims, stroke: &Stroke, color: Rgba8) {
    let px = color.to_array();
    let r = stroke.radius;
    let r2 = r * r;
    let first = stroke.points[0];
    let segments: Vec<(Point, Point)> = if stroke.points.len() == 1 {
        vec![(first, first)]
    } else {
        stroke.points.windows(2).map(|w| (w[0], w[1])).collect()
    };

    let canvas_rect = Rect::new(0.0, 0.0, f64::from(dims.width), f64::from(dims.height));
    for (a, b) in segments {
        let bounds = Rect::from_points(a, b).inflate(r, r).intersect(canvas_rect);
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            continue;
        }
        let x0 = bounds.x0.floor() as u32;
        let y0 = bounds.y0.floor() as u32;
        let x1 = (bounds.x1.ceil() as u32).min(dims.width);
        let y1 = (bounds.y1.ceil() as u32).min(dims.height);

        for y in y0..y1 {
            for x in x0..x1 {
                let c = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                if dist2_to_segment(c, a, b) <= r2 {
                    let idx = ((y as usize) * (dims.width as usize) + (x as usize)) * 4;
                    pixels[idx..idx + 4].copy_from_slice(&px);
                }
            }
        }
    }
}

fn dist2_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len2 = ab.hypot2();
    if len2 <= f64::EPSILON {
        return (p - a).hypot2();
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    (p - (a + ab * t)).hypot2()
}

#[cfg(test)]
#[path = "../../tests/unit/compose/freeform.rs"]
mod tests;
