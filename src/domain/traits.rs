// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer only talks to these traits, so a new
// dataset format or preview target can be added without
// touching the use cases.

use anyhow::Result;
use crate::domain::sample::ImageSet;

// ─── SampleSource ─────────────────────────────────────────────────────────────
/// Any component that can produce a labelled image set.
///
/// Implementations:
///   - BinDatasetLoader → the packed little-endian .bin container
pub trait SampleSource {
    /// Load every sample with its class label.
    /// Samples come back in storage order; callers shuffle.
    fn load(&self) -> Result<ImageSet>;

    /// Human readable origin, used in log lines.
    fn describe(&self) -> String;
}
