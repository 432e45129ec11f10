use std::collections::HashMap;

use crate::command::DrawCommand;
use crate::core::{BufferId, PixelBuffer};
use crate::engine::BlendEngine;
use crate::error::{BrixelError, BrixelResult};

/// The buffers a filter program operates on, addressed by id.
#[derive(Debug, Default)]
pub struct BufferPool {
    buffers: HashMap<BufferId, PixelBuffer>,
}

impl BufferPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a buffer under its own id. Replaces any previous buffer with
    /// the same id.
    pub fn insert(&mut self, buffer: PixelBuffer) {
        self.buffers.insert(buffer.id, buffer);
    }

    pub fn get(&self, id: BufferId) -> Option<&PixelBuffer> {
        self.buffers.get(&id)
    }

    pub fn remove(&mut self, id: BufferId) -> Option<PixelBuffer> {
        self.buffers.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}

/// One program step: blend `input` onto `output` under `draw`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ProgramStep {
    pub input: BufferId,
    pub output: BufferId,
    #[serde(default)]
    pub draw: DrawCommand,
}

/// An ordered list of blend steps over a buffer pool. Execution is
/// sequential and aborts at the first failing step, leaving earlier results
/// in place.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FilterProgram {
    pub steps: Vec<ProgramStep>,
}

impl FilterProgram {
    pub fn new(steps: Vec<ProgramStep>) -> Self {
        Self { steps }
    }

    pub fn run(&self, engine: &BlendEngine, pool: &mut BufferPool) -> BrixelResult<()> {
        for (index, step) in self.steps.iter().enumerate() {
            tracing::debug!(
                step = index,
                input = step.input.0,
                output = step.output.0,
                "run blend step"
            );
            run_step(engine, pool, step).map_err(|e| {
                tracing::error!(step = index, error = %e, "blend step failed");
                e
            })?;
        }
        Ok(())
    }
}

fn run_step(engine: &BlendEngine, pool: &mut BufferPool, step: &ProgramStep) -> BrixelResult<()> {
    let mut output = pool
        .remove(step.output)
        .ok_or_else(|| BrixelError::validation(format!("output buffer {} absent", step.output.0)))?;

    // Blending a buffer onto itself works on a snapshot, keeping the engine
    // API alias-free.
    let result = if step.input == step.output {
        let snapshot = output.clone();
        engine.blend(&step.draw, &snapshot, &mut output)
    } else {
        match pool.get(step.input) {
            Some(input) => engine.blend(&step.draw, input, &mut output),
            None => Err(BrixelError::validation(format!(
                "input buffer {} absent",
                step.input.0
            ))),
        }
    };

    // The pool keeps ownership either way; a failed step must not lose the
    // output buffer.
    pool.insert(output);
    result
}
