// src/progress.rs
// PROGRESS REPORTING (C10)
// The engine never renders progress itself - it only emits events to
// whatever sink the caller supplies. The CLI binary is one such sink,
// printing teacher-style terse status lines.

/// One observable moment during a search run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressEvent {
    ChunkStarted { chunk_index: usize, len: usize },
    PieceStarted { chunk_index: usize, piece_offset: usize, piece_len: usize },
    /// Inert instrumentation mirroring the original package's gated-off
    /// region-pruning ratio. Never used to skip work; observability only.
    AntidiagonalStats {
        tri_type: usize,
        antidiagonal: i32,
        threshold: i32,
        under_threshold_ratio: f64,
    },
    ChunkFinished { chunk_index: usize },
}

pub trait ProgressSink {
    fn on_event(&mut self, event: ProgressEvent);
}

impl<F: FnMut(ProgressEvent)> ProgressSink for F {
    fn on_event(&mut self, event: ProgressEvent) {
        self(event)
    }
}
