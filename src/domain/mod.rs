// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types describing the dataset the classifier is
// trained on, plus the traits other layers implement.
//
// Rules for this layer:
//   - NO Burn framework types
//   - NO file I/O
//   - Only structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Dataset header, samples, and the in-memory image set
pub mod sample;

// Core abstractions (traits) that other layers implement
pub mod traits;
