// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// One use case per CLI command. Each one wires the data, ml and
// infra layers together for a single goal.
//
// Rules for this layer:
//   - No tensor math or model code here
//   - No clap types here (Layer 1 converts args into configs)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern

/// Load data, train, checkpoint the best model
pub mod train_use_case;

/// Render a preview grid of dataset samples
pub mod show_use_case;

/// Score a saved checkpoint on a dataset
pub mod evaluate_use_case;
