use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;

use crate::foundation::core::{Dims, Rgba8};
use crate::foundation::error::{EaselError, EaselResult};
use crate::foundation::math::scaled_band;
use crate::raster::image::RasterImage;
use crate::raster::mask::Mask;

/// Default fraction of the source dimension added by a single-direction expansion.
pub const DEFAULT_SINGLE_RATIO: f64 = 0.5;
/// Default fraction of the source width added by each panoramic phase.
pub const DEFAULT_PANORAMIC_RATIO: f64 = 0.75;

/// Requested outpaint direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Grow above the source.
    Up,
    /// Grow below the source.
    Down,
    /// Grow to the left of the source.
    Left,
    /// Grow to the right of the source.
    Right,
    /// Grow right, then left, in two phases.
    Panoramic,
}

impl Direction {
    /// Lowercase label used in history records and logs.
    pub fn label(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
            Self::Panoramic => "panoramic",
        }
    }

    /// Default expansion ratio for this direction.
    pub fn default_ratio(self) -> f64 {
        match self {
            Self::Panoramic => DEFAULT_PANORAMIC_RATIO,
            _ => DEFAULT_SINGLE_RATIO,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Direction {
    type Err = EaselError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "panoramic" => Ok(Self::Panoramic),
            other => Err(EaselError::validation(format!(
                "unknown direction '{other}' (expected up|down|left|right|panoramic)"
            ))),
        }
    }
}

/// One side of the canvas that a single remote call fills in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    /// Top edge.
    Up,
    /// Bottom edge.
    Down,
    /// Left edge.
    Left,
    /// Right edge.
    Right,
}

impl Edge {
    /// Lowercase label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }
}

/// Direction plus the fraction of the original dimension added per step.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExpansionSpec {
    /// Requested direction.
    pub direction: Direction,
    /// Fraction of the original dimension added by each step.
    pub ratio: f64,
}

impl ExpansionSpec {
    /// Spec using the direction's default ratio.
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            ratio: direction.default_ratio(),
        }
    }

    /// Spec with an explicit ratio.
    pub fn with_ratio(direction: Direction, ratio: f64) -> Self {
        Self { direction, ratio }
    }

    /// Break this expansion into the single-band steps the remote model sees, in execution order.
    ///
    /// Band sizes are computed against `source`, the original image, for every step; a panoramic
    /// plan therefore adds `round(width * ratio)` on each side.
    pub fn plan(&self, source: Dims) -> EaselResult<Vec<ExpansionStep>> {
        let source = Dims::non_empty(source.width, source.height)?;
        if !self.ratio.is_finite() || self.ratio <= 0.0 {
            return Err(EaselError::validation(format!(
                "expansion ratio must be finite and > 0, got {}",
                self.ratio
            )));
        }

        let step = |edge: Edge| {
            let len = if edge.is_horizontal() {
                source.width
            } else {
                source.height
            };
            ExpansionStep {
                edge,
                band_px: scaled_band(len, self.ratio),
            }
        };

        Ok(match self.direction {
            Direction::Up => vec![step(Edge::Up)],
            Direction::Down => vec![step(Edge::Down)],
            Direction::Left => vec![step(Edge::Left)],
            Direction::Right => vec![step(Edge::Right)],
            Direction::Panoramic => vec![step(Edge::Right), step(Edge::Left)],
        })
    }
}

/// A single expansion: add `band_px` new pixels along `edge`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ExpansionStep {
    /// Edge that grows.
    pub edge: Edge,
    /// Thickness of the new band in pixels.
    pub band_px: u32,
}

impl ExpansionStep {
    /// Canvas size after applying this step to an input of size `input`.
    pub fn target_dims(self, input: Dims) -> EaselResult<Dims> {
        let grow = |v: u32| {
            v.checked_add(self.band_px)
                .ok_or_else(|| EaselError::validation("expanded canvas dimension overflows u32"))
        };
        Ok(match self.edge {
            Edge::Left | Edge::Right => Dims::new(grow(input.width)?, input.height),
            Edge::Up | Edge::Down => Dims::new(input.width, grow(input.height)?),
        })
    }

    /// Top-left corner of the input inside the expanded canvas.
    pub fn input_origin(self) -> (u32, u32) {
        match self.edge {
            Edge::Right | Edge::Down => (0, 0),
            Edge::Left => (self.band_px, 0),
            Edge::Up => (0, self.band_px),
        }
    }
}

/// Paired canvas and mask handed to one remote outpaint call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpansionCanvas {
    /// Input pixels placed flush against the far edge, new band filled.
    pub canvas: RasterImage,
    /// White exactly over the new band.
    pub mask: Mask,
    /// Top-left of the input inside `canvas`.
    pub origin: (u32, u32),
}

/// Grow `input` by one step. Pure: returns new buffers.
///
/// The new band is filled with `fill`; the mask is white over the band and black over the input.
pub fn expand_canvas(
    input: &RasterImage,
    step: ExpansionStep,
    fill: Rgba8,
) -> EaselResult<ExpansionCanvas> {
    if step.band_px == 0 {
        return Err(EaselError::validation("expansion band must be at least 1px"));
    }
    let src = input.dims();
    let dst = step.target_dims(src)?;
    let (ox, oy) = step.input_origin();

    let row_bytes = (dst.width as usize) * 4;
    let src_row_bytes = (src.width as usize) * 4;
    let src_px = input.as_bytes();
    let fill_px = fill.to_array();
    let white = Rgba8::WHITE.to_array();
    let black = Rgba8::BLACK.to_array();
    let inside_rows = oy..oy + src.height;
    let inside_cols = ox..ox + src.width;

    let mut canvas = vec![0u8; dst.rgba_len()?];
    canvas
        .par_chunks_exact_mut(row_bytes)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as u32;
            for px in row.chunks_exact_mut(4) {
                px.copy_from_slice(&fill_px);
            }
            if inside_rows.contains(&y) {
                let sy = (y - oy) as usize;
                let from = &src_px[sy * src_row_bytes..(sy + 1) * src_row_bytes];
                let at = (ox as usize) * 4;
                row[at..at + src_row_bytes].copy_from_slice(from);
            }
        });

    let mut mask = vec![0u8; dst.rgba_len()?];
    mask.par_chunks_exact_mut(row_bytes)
        .enumerate()
        .for_each(|(y, row)| {
            let row_inside = inside_rows.contains(&(y as u32));
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                let keep = row_inside && inside_cols.contains(&(x as u32));
                px.copy_from_slice(if keep { &black } else { &white });
            }
        });

    tracing::debug!(
        edge = step.edge.label(),
        band_px = step.band_px,
        from_w = src.width,
        from_h = src.height,
        to_w = dst.width,
        to_h = dst.height,
        "expanded canvas"
    );

    Ok(ExpansionCanvas {
        canvas: RasterImage::from_parts(dst, canvas),
        mask: Mask::from_binary_parts(dst, mask),
        origin: (ox, oy),
    })
}

/// Build the first canvas/mask pair for `spec`.
///
/// Single directions produce the complete result. For [`Direction::Panoramic`] this is the
/// right-hand phase only; the left-hand phase must be built from the remote output of the first
/// call (see [`ExpansionSpec::plan`]).
pub fn build_expansion_canvas(
    source: &RasterImage,
    spec: &ExpansionSpec,
    fill: Rgba8,
) -> EaselResult<ExpansionCanvas> {
    let steps = spec.plan(source.dims())?;
    let first = steps
        .first()
        .copied()
        .ok_or_else(|| EaselError::validation("expansion plan is empty"))?;
    expand_canvas(source, first, fill)
}

#[cfg(test)]
#[path = "../../tests/unit/compose/expand.rs"]
mod tests;
