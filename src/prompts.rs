//! Instruction text sent alongside pixels to the remote model.

use crate::compose::expand::Edge;
use crate::foundation::error::GenerationError;

/// Reject blank instruction text before anything reaches the network.
pub fn require_prompt(text: &str) -> Result<&str, GenerationError> {
    let t = text.trim();
    if t.is_empty() {
        return Err(GenerationError::user_input(
            "Please describe what you want to generate.",
        ));
    }
    Ok(t)
}

/// Instruction for filling the white band of an outpaint canvas.
///
/// `extra` is optional user guidance appended after the fixed instructions.
pub fn outpaint_instruction(edge: Edge, extra: &str) -> String {
    let side = match edge {
        Edge::Up => "above the top edge",
        Edge::Down => "below the bottom edge",
        Edge::Left => "to the left of the left edge",
        Edge::Right => "to the right of the right edge",
    };
    let mut s = format!(
        "Extend this image {side}. Fill only the white area of the mask with new content that \
         seamlessly continues the existing scene: match perspective, lighting, colour grading, \
         grain and style exactly. Do not alter, crop, or re-render the preserved (black-masked) \
         pixels and do not add borders, frames, or visible seams."
    );
    let extra = extra.trim();
    if !extra.is_empty() {
        s.push_str(" Additional guidance: ");
        s.push_str(extra);
    }
    s
}

/// Instruction for re-rendering the base subject from another viewpoint.
pub fn angle_instruction(direction_prompt: &str) -> String {
    format!(
        "Show the exact same subject from a new camera angle: {direction_prompt}. Keep identity, \
         proportions, materials, colours and lighting identical to the reference image, keep the \
         subject centred at the same scale on the same background, and change nothing except the \
         viewing angle."
    )
}
