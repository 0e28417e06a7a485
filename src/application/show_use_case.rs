// ============================================================
// Layer 2 — ShowUseCase
// ============================================================
// Loads a dataset, shuffles it, and writes the first 20
// samples as a 4x5 preview grid. Also used by `train --show`.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::data::{
    loader::BinDatasetLoader,
    sampler::{seeded_rng, shuffle_samples},
};
use crate::domain::sample::{label_name, ImageSet};
use crate::domain::traits::SampleSource;
use crate::infra::preview::{save_preview, GridLayout};

#[derive(Debug, Clone)]
pub struct ShowConfig {
    pub file:        String,
    pub output:      String,
    pub scale:       u32,
    pub seed:        Option<u64>,
    pub class_names: Vec<String>,
}

impl Default for ShowConfig {
    fn default() -> Self {
        Self {
            file:        "dataset/normalized-train.bin".to_string(),
            output:      "output/preview.png".to_string(),
            scale:       4,
            seed:        None,
            class_names: Vec::new(),
        }
    }
}

pub struct ShowUseCase {
    config: ShowConfig,
}

impl ShowUseCase {
    pub fn new(config: ShowConfig) -> Self {
        Self { config }
    }

    /// Returns the label names of the drawn cells, in grid order.
    pub fn execute(&self) -> Result<Vec<String>> {
        let cfg = &self.config;
        if cfg.scale == 0 {
            anyhow::bail!("scale must be positive");
        }

        let mut set = BinDatasetLoader::new(&cfg.file).load()?;

        let layout = GridLayout::new(set.width(), set.height(), cfg.scale);
        layout.dimensions()?;

        let mut rng = seeded_rng(cfg.seed);
        shuffle_samples(&mut set.samples, &mut rng);

        write_preview(&set, &PathBuf::from(&cfg.output), &layout, &cfg.class_names)
    }
}

/// Draw the first cells of `set` (already shuffled) to `path`.
pub fn write_preview(
    set:         &ImageSet,
    path:        &Path,
    layout:      &GridLayout,
    class_names: &[String],
) -> Result<Vec<String>> {
    let shown = &set.samples[..set.len().min(layout.capacity())];
    save_preview(path, shown, layout)?;

    let labels: Vec<String> = shown
        .iter()
        .map(|s| label_name(class_names, s.label))
        .collect();

    for (row, names) in labels.chunks(layout.cols).enumerate() {
        tracing::info!("preview row {}: {}", row, names.join(", "));
    }
    tracing::info!("Wrote {} samples to '{}'", shown.len(), path.display());
    Ok(labels)
}
