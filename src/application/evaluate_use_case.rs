// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Rebuilds the saved model and scores it on a dataset:
//
//   Step 1: Read model_config.json       (Layer 6 - infra)
//   Step 2: Load the dataset             (Layer 4 - data)
//   Step 3: Check it fits the model
//   Step 4: Load weights                 (Layer 6 - infra)
//   Step 5: Loss / accuracy / per class  (Layer 5 - ml)

use anyhow::{bail, Result};
use burn::prelude::*;

use crate::data::{dataset::ImageDataset, loader::load_training_data};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::evaluator::{evaluate, ordered_loader, Evaluation};
use crate::ml::InferBackend;

#[derive(Debug, Clone)]
pub struct EvaluateConfig {
    pub output_dir:      String,
    pub checkpoint_name: String,
    pub dataset:         String,
    pub batch_size:      usize,
}

impl Default for EvaluateConfig {
    fn default() -> Self {
        Self {
            output_dir:      "output".to_string(),
            checkpoint_name: "validations".to_string(),
            dataset:         "dataset/normalized-val.bin".to_string(),
            batch_size:      100,
        }
    }
}

/// Evaluation plus the class names stored with the run, if any.
#[derive(Debug, Clone)]
pub struct EvaluationReport {
    pub evaluation:  Evaluation,
    pub class_names: Vec<String>,
}

pub struct EvaluateUseCase {
    config: EvaluateConfig,
}

impl EvaluateUseCase {
    pub fn new(config: EvaluateConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<EvaluationReport> {
        let device = <InferBackend as Backend>::Device::default();
        self.execute_on::<InferBackend>(device)
    }

    pub fn execute_on<B: Backend>(&self, device: B::Device) -> Result<EvaluationReport> {
        let cfg = &self.config;
        if cfg.batch_size == 0 {
            bail!("batch size must be positive");
        }

        // ── Step 1: Architecture ──────────────────────────────────────────────
        let ckpt      = CheckpointManager::new(&cfg.output_dir, &cfg.checkpoint_name)?;
        let model_cfg = ckpt.load_model_config()?;

        // ── Step 2 + 3: Dataset must match the network input ──────────────────
        let set = load_training_data(&cfg.dataset)?;
        if set.num_classes() != model_cfg.num_classes
            || set.width() != model_cfg.width
            || set.height() != model_cfg.height
        {
            bail!(
                "dataset '{}' ({} classes, {}x{}) does not fit the model ({} classes, {}x{})",
                cfg.dataset, set.num_classes(), set.width(), set.height(),
                model_cfg.num_classes, model_cfg.width, model_cfg.height,
            );
        }

        // ── Step 4: Weights ───────────────────────────────────────────────────
        let model = ckpt.load_model(model_cfg.init::<B>(&device), &device)?;
        if let Some(meta) = ckpt.load_meta()? {
            tracing::info!(
                "Checkpoint from iteration {} (val_acc={:.4})",
                meta.iteration, meta.val_accuracy
            );
        }

        // ── Step 5: Score ─────────────────────────────────────────────────────
        let loader = ordered_loader::<B>(
            ImageDataset::from(set),
            cfg.batch_size,
            model_cfg.width,
            model_cfg.height,
            device,
        );
        let evaluation = evaluate(&model, loader.as_ref(), model_cfg.num_classes)?;

        // Names are optional, a run without train_config.json still evaluates
        let class_names = match ckpt.load_config() {
            Ok(train_cfg) => train_cfg.class_names,
            Err(e) => {
                tracing::warn!("No class names available: {e}");
                Vec::new()
            }
        };

        Ok(EvaluationReport { evaluation, class_names })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    use crate::application::train_use_case::TrainConfig;
    use crate::data::loader::encode_dataset;
    use crate::domain::sample::{DatasetHeader, ImageSet, Sample};
    use crate::infra::checkpoint::CheckpointMeta;
    use crate::ml::model::ClassifierConfig;

    type TestBackend = NdArray;

    fn write_set(path: &std::path::Path, classes: u32, side: u32) {
        let header = DatasetHeader { num_classes: classes, samples_per_class: 3, width: side, height: side };
        let samples = (0..header.expected_rows())
            .map(|row| Sample::new(vec![(row * 20) as u8; header.image_size()], header.label_for_row(row)))
            .collect();
        std::fs::write(path, encode_dataset(&ImageSet::new(header, samples))).unwrap();
    }

    fn saved_run(dir: &std::path::Path) -> EvaluateConfig {
        let model_cfg = ClassifierConfig::new(2, 4, 4)
            .with_conv1_channels(2)
            .with_conv2_channels(2)
            .with_kernel_size(3)
            .with_hidden_size(4);
        let ckpt  = CheckpointManager::new(dir, "validations").unwrap();
        let model = model_cfg.init::<TestBackend>(&Default::default());
        ckpt.save_model_config(&model_cfg).unwrap();
        ckpt.save_model(&model, &CheckpointMeta { iteration: 1, val_accuracy: 0.5, train_accuracy: 0.5 })
            .unwrap();

        EvaluateConfig {
            output_dir: dir.display().to_string(),
            dataset:    dir.join("eval.bin").display().to_string(),
            batch_size: 4,
            ..EvaluateConfig::default()
        }
    }

    #[test]
    fn test_evaluate_saved_checkpoint() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = saved_run(tmp.path());
        write_set(&tmp.path().join("eval.bin"), 2, 4);

        let ckpt = CheckpointManager::new(tmp.path(), "validations").unwrap();
        let names = vec!["a".to_string(), "b".to_string()];
        ckpt.save_config(&TrainConfig { class_names: names.clone(), ..TrainConfig::default() })
            .unwrap();

        let report = EvaluateUseCase::new(cfg).execute_on::<TestBackend>(Default::default()).unwrap();
        assert_eq!(report.evaluation.total, 6);
        assert_eq!(report.evaluation.per_class.len(), 2);
        assert_eq!(report.class_names, names);
    }

    #[test]
    fn test_dataset_shape_mismatch_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = saved_run(tmp.path());
        write_set(&tmp.path().join("eval.bin"), 2, 8);

        let err = EvaluateUseCase::new(cfg).execute_on::<TestBackend>(Default::default()).unwrap_err();
        assert!(err.to_string().contains("does not fit"));
    }

    #[test]
    fn test_missing_model_config_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = EvaluateConfig { output_dir: tmp.path().display().to_string(), ..EvaluateConfig::default() };
        assert!(EvaluateUseCase::new(cfg).execute_on::<TestBackend>(Default::default()).is_err());
    }
}
