// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Validate the configuration
//   Step 2: Load train + validation sets   (Layer 4 - data)
//   Step 3: Shuffle both sets              (Layer 4 - data)
//   Step 4: Derive the model config        (Layer 5 - ml)
//   Step 5: Optional preview grid          (Layer 6 - infra)
//   Step 6: Save configs                   (Layer 6 - infra)
//   Step 7: Run training loop              (Layer 5 - ml)
//
// Reference: Burn Book §5 (Training)

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::application::show_use_case::write_preview;
use crate::data::{
    loader::BinDatasetLoader,
    sampler::{seeded_rng, shuffle_samples},
};
use crate::domain::sample::ImageSet;
use crate::domain::traits::SampleSource;
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::MetricsLogger,
    preview::GridLayout,
};
use crate::ml::model::ClassifierConfig;
use crate::ml::trainer::{run_training, TrainingSummary};

// ─── Training Configuration ──────────────────────────────────────────────────
// All settings for a training run.
// Saved next to the checkpoint as train_config.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub train_file:      String,
    pub val_file:        String,
    pub output_dir:      String,
    /// Checkpoint file stem inside output_dir
    pub checkpoint_name: String,
    pub iterations:      usize,
    pub batch_size:      usize,
    /// Validate when `iteration % eval_every == 0`
    pub eval_every:      usize,
    pub lr:              f64,
    /// None → seeded from entropy
    pub seed:            Option<u64>,
    pub restore:         bool,
    pub show:            bool,
    /// None → {output_dir}/preview.png
    pub preview_path:    Option<String>,
    pub class_names:     Vec<String>,
    pub conv1_channels:  usize,
    pub conv2_channels:  usize,
    pub kernel_size:     usize,
    pub hidden_size:     usize,
    pub dropout:         f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            train_file:      "dataset/normalized-train.bin".to_string(),
            val_file:        "dataset/normalized-val.bin".to_string(),
            output_dir:      "output".to_string(),
            checkpoint_name: "validations".to_string(),
            iterations:      10_000,
            batch_size:      100,
            eval_every:      100,
            lr:              1e-4,
            seed:            None,
            restore:         false,
            show:            false,
            preview_path:    None,
            class_names:     Vec::new(),
            conv1_channels:  32,
            conv2_channels:  64,
            kernel_size:     5,
            hidden_size:     1024,
            dropout:         0.5,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            bail!("batch size must be positive");
        }
        if self.iterations == 0 {
            bail!("iterations must be positive");
        }
        if self.eval_every == 0 {
            bail!("eval-every must be positive");
        }
        if !(self.lr > 0.0) {
            bail!("learning rate must be positive, got {}", self.lr);
        }
        if !(0.0..1.0).contains(&self.dropout) {
            bail!("dropout must be in [0, 1), got {}", self.dropout);
        }
        Ok(())
    }

    /// Network shape for data with the given class count and image size.
    pub fn model_config(&self, num_classes: usize, width: usize, height: usize) -> ClassifierConfig {
        ClassifierConfig::new(num_classes, height, width)
            .with_conv1_channels(self.conv1_channels)
            .with_conv2_channels(self.conv2_channels)
            .with_kernel_size(self.kernel_size)
            .with_hidden_size(self.hidden_size)
            .with_dropout(self.dropout)
    }

    pub fn preview_path(&self) -> PathBuf {
        match &self.preview_path {
            Some(p) => PathBuf::from(p),
            None    => PathBuf::from(&self.output_dir).join("preview.png"),
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<TrainingSummary> {
        let cfg = &self.config;

        // ── Step 1: Reject bad settings before touching the disk ─────────────
        cfg.validate()?;

        // ── Step 2: Load both sets ────────────────────────────────────────────
        let mut train_set = load_set(&cfg.train_file)?;
        let mut val_set   = load_set(&cfg.val_file)?;

        if train_set.is_empty() || val_set.is_empty() {
            bail!("training and validation sets must both contain samples");
        }
        if !train_set.is_compatible_with(&val_set) {
            bail!(
                "validation set '{}' ({} classes, {}x{}) does not match training set '{}' ({} classes, {}x{})",
                cfg.val_file, val_set.num_classes(), val_set.width(), val_set.height(),
                cfg.train_file, train_set.num_classes(), train_set.width(), train_set.height(),
            );
        }

        // ── Step 3: Shuffle samples together with their labels ────────────────
        let mut rng = seeded_rng(cfg.seed);
        shuffle_samples(&mut train_set.samples, &mut rng);
        shuffle_samples(&mut val_set.samples, &mut rng);

        tracing::info!(
            "Class histogram (train): {:?}",
            train_set.class_histogram()
        );

        // ── Step 4: Model shape follows the data ──────────────────────────────
        let model_cfg = cfg.model_config(train_set.num_classes(), train_set.width(), train_set.height());
        model_cfg.validate()?;

        // ── Step 5: Preview grid ──────────────────────────────────────────────
        if cfg.show {
            let layout = GridLayout::new(train_set.width(), train_set.height(), 4);
            write_preview(&train_set, &cfg.preview_path(), &layout, &cfg.class_names)?;
        }

        // ── Step 6: Check restore target, save configs ───────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.output_dir, &cfg.checkpoint_name)?;
        if cfg.restore {
            if let Some(stored) = ckpt_manager.stored_model_config()? {
                if !stored.same_architecture(&model_cfg) {
                    bail!(
                        "checkpoint in '{}' was trained with a different architecture; \
                         drop --restore or match the stored model_config.json",
                        cfg.output_dir
                    );
                }
            }
            if !ckpt_manager.exists() {
                bail!(
                    "--restore given but no checkpoint at '{}'",
                    ckpt_manager.weights_path().display()
                );
            }
        }
        ckpt_manager.save_config(cfg)?;
        ckpt_manager.save_model_config(&model_cfg)?;

        let metrics = MetricsLogger::new(&cfg.output_dir, cfg.restore)?;

        // ── Step 7: Train (Layer 5) ───────────────────────────────────────────
        run_training(cfg, &model_cfg, train_set, val_set, &ckpt_manager, &metrics)
    }
}

fn load_set(path: &str) -> Result<ImageSet> {
    let loader = BinDatasetLoader::new(path);
    tracing::info!("Loading dataset '{}'", loader.describe());
    loader
        .load()
        .with_context(|| format!("Failed to load '{}'", path))
}
