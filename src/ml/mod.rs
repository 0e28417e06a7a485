// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All network code lives here:
//
//   model.rs     — the two-block CNN and its Config
//   trainer.rs   — iteration loop: sample a batch, step Adam,
//                  validate every N iterations, checkpoint the
//                  best validation accuracy
//   evaluator.rs — loss / accuracy / per-class tally over a
//                  whole dataset, gradients off
//
// Backends: NdArray on the CPU by default, WGPU when the crate
// is built with `--features wgpu`. Training wraps either one in
// Autodiff; evaluation runs on the bare inner backend.
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)

/// CNN image classifier architecture
pub mod model;

/// Training loop with periodic validation and checkpointing
pub mod trainer;

/// Dataset-wide accuracy and loss
pub mod evaluator;

#[cfg(feature = "wgpu")]
pub type InferBackend = burn::backend::Wgpu;
#[cfg(not(feature = "wgpu"))]
pub type InferBackend = burn::backend::NdArray;

pub type TrainBackend = burn::backend::Autodiff<InferBackend>;
