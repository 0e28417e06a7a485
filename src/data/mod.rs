// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between the .bin file on disk and a tensor batch:
//
//   dataset .bin
//       │
//       ▼
//   BinDatasetLoader  → parses header + pixels, implicit labels
//       │
//       ▼
//   shuffle_samples   → mixes the class blocks
//       │
//       ▼
//   ImageDataset      → implements Burn's Dataset trait
//       │
//       ▼
//   BatchSampler /    → picks training indices per iteration,
//   DataLoader          or walks the validation set in order
//       │
//       ▼
//   ImageBatcher      → stacks samples into [N, 1, H, W] tensors
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Parses the packed little-endian dataset container
pub mod loader;

/// Shuffling and per-iteration batch sampling
pub mod sampler;

/// Implements Burn's Dataset trait for image samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
