use crate::compose::expand::{Direction, ExpansionCanvas, ExpansionSpec, expand_canvas};
use crate::foundation::error::GenerationError;
use crate::history::log::{GenerationKind, HistoryEntry};
use crate::orchestrate::context::StudioContext;
use crate::prompts::outpaint_instruction;
use crate::raster::image::RasterImage;
use crate::remote::generator::{GenerationRequest, Generator};

/// Progress of one outpaint run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutpaintState {
    /// No run started, or the previous result was consumed.
    Idle,
    /// First (or only) remote call in flight.
    Phase1Running,
    /// Panoramic only: right-hand result held, left-hand canvas not yet built.
    Phase1Done,
    /// Panoramic only: second remote call in flight.
    Phase2Running,
    /// Final image produced.
    Done,
    /// A remote call failed and any intermediate result was discarded, or the expansion was
    /// rejected locally before the first call (entered straight from `Idle`).
    Failed(GenerationError),
}

impl OutpaintState {
    /// `true` while a remote call is in flight.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Phase1Running | Self::Phase2Running)
    }
}

/// Drives single-direction and two-phase panoramic outpainting.
///
/// A run borrows the orchestrator mutably, so one orchestrator can never have two runs in flight.
/// Each phase feeds its output image into the next phase's canvas. Failure in any phase is total:
/// the caller gets only the error, never a half-expanded panorama.
#[derive(Debug)]
pub struct OutpaintOrchestrator {
    state: OutpaintState,
    transitions: Vec<OutpaintState>,
}

impl Default for OutpaintOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl OutpaintOrchestrator {
    /// Orchestrator in [`OutpaintState::Idle`].
    pub fn new() -> Self {
        Self {
            state: OutpaintState::Idle,
            transitions: Vec::new(),
        }
    }

    /// Current state.
    pub fn state(&self) -> &OutpaintState {
        &self.state
    }

    /// States entered during the most recent run, in order.
    pub fn transitions(&self) -> &[OutpaintState] {
        &self.transitions
    }

    /// Expand `source` towards `direction` and return the final image.
    ///
    /// `instruction` is optional user guidance; the fixed outpaint wording is always sent. Only
    /// the terminal result is written to history, labelled with the direction.
    #[tracing::instrument(skip_all, fields(direction = %direction, w = source.width(), h = source.height()))]
    pub fn outpaint(
        &mut self,
        ctx: &mut StudioContext<'_>,
        generator: &mut dyn Generator,
        source: &RasterImage,
        instruction: &str,
        direction: Direction,
    ) -> Result<RasterImage, GenerationError> {
        self.transitions.clear();
        match self.run_phases(ctx, generator, source, instruction, direction) {
            Ok(result) => {
                self.enter(OutpaintState::Done);
                ctx.history.add(
                    HistoryEntry::new(GenerationKind::Outpaint, &result, instruction)
                        .with_details(direction.label())
                        .with_inputs(&[source]),
                    ctx.clock,
                );
                tracing::debug!(
                    w = result.width(),
                    h = result.height(),
                    "outpaint complete"
                );
                Ok(result)
            }
            Err(err) => {
                tracing::warn!(kind = ?err.kind(), "outpaint failed");
                self.enter(OutpaintState::Failed(err.clone()));
                Err(err)
            }
        }
    }

    fn run_phases(
        &mut self,
        ctx: &StudioContext<'_>,
        generator: &mut dyn Generator,
        source: &RasterImage,
        instruction: &str,
        direction: Direction,
    ) -> Result<RasterImage, GenerationError> {
        let ratio = match direction {
            Direction::Panoramic => ctx.config.panoramic_ratio,
            _ => ctx.config.single_ratio,
        };
        let steps = ExpansionSpec::with_ratio(direction, ratio)
            .plan(source.dims())
            .map_err(|e| GenerationError::user_input(format!("Cannot expand this image: {e}")))?;

        let mut current = source.clone();
        for (phase, step) in steps.iter().enumerate() {
            self.enter(if phase == 0 {
                OutpaintState::Phase1Running
            } else {
                OutpaintState::Phase2Running
            });

            let ExpansionCanvas { canvas, mask, .. } =
                expand_canvas(&current, *step, ctx.config.expansion_fill).map_err(|e| {
                    GenerationError::user_input(format!("Cannot expand this image: {e}"))
                })?;
            let text = outpaint_instruction(step.edge, instruction);
            tracing::debug!(
                phase = phase + 1,
                edge = step.edge.label(),
                band_px = step.band_px,
                "outpaint phase"
            );

            let out = generator
                .generate(&GenerationRequest {
                    image: &canvas,
                    mask: Some(&mask),
                    instruction: &text,
                })
                .map_err(|e| {
                    tracing::warn!(error = %e, phase = phase + 1, "remote outpaint call failed");
                    GenerationError::from_upstream(&e)
                })?;

            if out.dims() != canvas.dims() {
                tracing::warn!(
                    expected_w = canvas.width(),
                    expected_h = canvas.height(),
                    got_w = out.width(),
                    got_h = out.height(),
                    "remote outpaint returned wrong dimensions"
                );
                return Err(GenerationError::generic(
                    "The generated image came back at an unexpected size. Please try again.",
                ));
            }

            current = out;
            if phase + 1 < steps.len() {
                self.enter(OutpaintState::Phase1Done);
            }
        }
        Ok(current)
    }

    fn enter(&mut self, state: OutpaintState) {
        self.transitions.push(state.clone());
        self.state = state;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/orchestrate/outpaint.rs"]
mod tests;
