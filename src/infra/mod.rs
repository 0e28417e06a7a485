// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that writes to the output directory:
//
//   checkpoint.rs — best-model weights via Burn's CompactRecorder,
//                   plus the JSON configs needed to rebuild it
//
//   metrics.rs    — one CSV row per validation round
//
//   preview.rs    — 4x5 grayscale PNG grid of dataset samples
//
// Reference: Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Validation metrics CSV logger
pub mod metrics;

/// Sample preview grid
pub mod preview;
