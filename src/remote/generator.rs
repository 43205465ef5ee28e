use std::collections::VecDeque;

use crate::foundation::core::Rgba8;
use crate::foundation::error::UpstreamError;
use crate::raster::image::RasterImage;
use crate::raster::mask::Mask;

/// Inputs of one remote generation call.
#[derive(Clone, Copy, Debug)]
pub struct GenerationRequest<'a> {
    /// Input canvas.
    pub image: &'a RasterImage,
    /// Regenerable region; `None` lets the model change the whole image.
    pub mask: Option<&'a Mask>,
    /// Natural-language instruction.
    pub instruction: &'a str,
}

/// Narrow seam in front of the remote multimodal model.
///
/// Adapters translate SDK-specific payloads to and from [`RasterImage`] and report failures as raw
/// [`UpstreamError`] text; orchestrators classify that text. A call runs to completion or error;
/// there is no cancellation.
///
/// Contract: when a mask is supplied the returned image has the same dimensions as the input.
pub trait Generator {
    /// Run one generation step.
    fn generate(&mut self, req: &GenerationRequest<'_>) -> Result<RasterImage, UpstreamError>;
}

impl<F> Generator for F
where
    F: FnMut(&GenerationRequest<'_>) -> Result<RasterImage, UpstreamError>,
{
    fn generate(&mut self, req: &GenerationRequest<'_>) -> Result<RasterImage, UpstreamError> {
        self(req)
    }
}

/// Canned behaviour for one [`ScriptedGenerator`] call.
#[derive(Clone, Debug)]
pub enum Reply {
    /// Paint the masked region (or the whole image when unmasked) with a colour.
    Fill(Rgba8),
    /// Return this exact image.
    Image(RasterImage),
    /// Fail with raw upstream text.
    Fail(String),
}

/// Observed arguments of one [`ScriptedGenerator`] call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedCall {
    /// Input canvas.
    pub image: RasterImage,
    /// Mask, when one was sent.
    pub mask: Option<Mask>,
    /// Instruction text.
    pub instruction: String,
}

/// In-memory generator for tests and offline demos.
///
/// Replies are consumed in order; once the script runs out every call gets the fallback reply.
#[derive(Clone, Debug)]
pub struct ScriptedGenerator {
    script: VecDeque<Reply>,
    fallback: Reply,
    calls: Vec<RecordedCall>,
}

impl Default for ScriptedGenerator {
    fn default() -> Self {
        Self::new(Reply::Fill(Rgba8::new(90, 140, 200, 255)))
    }
}

impl ScriptedGenerator {
    /// Empty script answering every call with `fallback`.
    pub fn new(fallback: Reply) -> Self {
        Self {
            script: VecDeque::new(),
            fallback,
            calls: Vec::new(),
        }
    }

    /// Queue a reply.
    pub fn then(mut self, reply: Reply) -> Self {
        self.script.push_back(reply);
        self
    }

    /// Queue `n` copies of a reply.
    pub fn then_n(mut self, n: usize, reply: Reply) -> Self {
        for _ in 0..n {
            self.script.push_back(reply.clone());
        }
        self
    }

    /// Calls observed so far, in order.
    pub fn calls(&self) -> &[RecordedCall] {
        &self.calls
    }
}

impl Generator for ScriptedGenerator {
    fn generate(&mut self, req: &GenerationRequest<'_>) -> Result<RasterImage, UpstreamError> {
        self.calls.push(RecordedCall {
            image: req.image.clone(),
            mask: req.mask.cloned(),
            instruction: req.instruction.to_string(),
        });
        let reply = self
            .script
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        match reply {
            Reply::Fill(color) => Ok(fill_masked(req.image, req.mask, color)),
            Reply::Image(img) => Ok(img),
            Reply::Fail(msg) => Err(UpstreamError::new(msg)),
        }
    }
}

fn fill_masked(image: &RasterImage, mask: Option<&Mask>, color: Rgba8) -> RasterImage {
    let dims = image.dims();
    let mut data = image.as_bytes().to_vec();
    let c = color.to_array();
    for (i, px) in data.chunks_exact_mut(4).enumerate() {
        let x = (i % dims.width as usize) as u32;
        let y = (i / dims.width as usize) as u32;
        if mask.is_none_or(|m| m.is_white(x, y)) {
            px.copy_from_slice(&c);
        }
    }
    RasterImage::from_parts(dims, data)
}

#[cfg(test)]
#[path = "../../tests/unit/remote/generator.rs"]
mod tests;
