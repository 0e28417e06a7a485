// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores the best model using Burn's CompactRecorder.
//
// Files kept in the output directory:
//   {name}.mpk           ← weights of the best model so far
//   {name}.json          ← iteration + accuracies of that model
//   model_config.json    ← ClassifierConfig, to rebuild the network
//   train_config.json    ← full TrainConfig of the run
//
// The weights file is overwritten each time validation accuracy
// improves, so it always holds the best model, not the latest.
//
// CompactRecorder:
//   - Serialises parameters to MessagePack at half precision
//   - Loading fails if the architecture does not match
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use serde::{Deserialize, Serialize};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::{ClassifierConfig, ImageClassifier};

/// Extension CompactRecorder appends to the weights stem.
const WEIGHTS_EXT: &str = "mpk";

/// Metadata written next to the weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMeta {
    /// 1-based iteration the weights were taken at
    pub iteration:      usize,
    pub val_accuracy:   f64,
    pub train_accuracy: f64,
}

pub struct CheckpointManager {
    dir:  PathBuf,
    name: String,
}

impl CheckpointManager {
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<PathBuf>, name: impl Into<String>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint dir '{}'", dir.display()))?;
        Ok(Self { dir, name: name.into() })
    }

    /// Path handed to the recorder; it appends `.mpk` itself.
    fn weights_stem(&self) -> PathBuf {
        self.dir.join(&self.name)
    }

    pub fn weights_path(&self) -> PathBuf {
        self.dir.join(format!("{}.{WEIGHTS_EXT}", self.name))
    }

    fn meta_path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.name))
    }

    /// True once a weights file has been written.
    pub fn exists(&self) -> bool {
        self.weights_path().exists()
    }

    /// Overwrite the checkpoint with `model` and its metadata.
    pub fn save_model<B: Backend>(
        &self,
        model: &ImageClassifier<B>,
        meta:  &CheckpointMeta,
    ) -> Result<()> {
        let path = self.weights_stem();

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .map_err(|e| {
                anyhow::anyhow!("Failed to save checkpoint to '{}': {e}", path.display())
            })?;

        fs::write(self.meta_path(), serde_json::to_string_pretty(meta)?)
            .with_context(|| format!("Failed to write '{}'", self.meta_path().display()))?;

        tracing::debug!(
            "Saved checkpoint '{}' (iteration {}, val_acc={:.4})",
            self.weights_path().display(), meta.iteration, meta.val_accuracy
        );
        Ok(())
    }

    /// Load the saved weights into `model`.
    /// The model must have the architecture the checkpoint was taken from.
    pub fn load_model<B: Backend>(
        &self,
        model:  ImageClassifier<B>,
        device: &B::Device,
    ) -> Result<ImageClassifier<B>> {
        let path = self.weights_stem();

        if !self.exists() {
            anyhow::bail!(
                "No checkpoint at '{}'. Have you trained the model first?",
                self.weights_path().display()
            );
        }

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .map_err(|e| {
                anyhow::anyhow!("Cannot load checkpoint '{}': {e}", path.display())
            })?;

        tracing::info!("Loaded checkpoint '{}'", self.weights_path().display());
        Ok(model.load_record(record))
    }

    /// Metadata of the stored checkpoint, None if nothing was saved yet.
    pub fn load_meta(&self) -> Result<Option<CheckpointMeta>> {
        let path = self.meta_path();
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        self.write_json("train_config.json", cfg)
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        self.read_json("train_config.json")
    }

    pub fn save_model_config(&self, cfg: &ClassifierConfig) -> Result<()> {
        self.write_json("model_config.json", cfg)
    }

    pub fn load_model_config(&self) -> Result<ClassifierConfig> {
        self.read_json("model_config.json")
    }

    /// Model config stored by an earlier run, if any.
    pub fn stored_model_config(&self) -> Result<Option<ClassifierConfig>> {
        if self.dir.join("model_config.json").exists() {
            self.load_model_config().map(Some)
        } else {
            Ok(None)
        }
    }

    fn write_json<T: Serialize>(&self, file: &str, value: &T) -> Result<()> {
        let path = self.dir.join(file);
        fs::write(&path, serde_json::to_string_pretty(value)?)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::debug!("Saved '{}'", path.display());
        Ok(())
    }

    fn read_json<T: for<'de> Deserialize<'de>>(&self, file: &str) -> Result<T> {
        let path = self.dir.join(file);
        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!("Cannot read '{}'. Make sure you have run 'train' first.", path.display())
            })?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed '{}'", path.display()))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::record::FileRecorder;

    type TestBackend = NdArray;

    fn tiny() -> ClassifierConfig {
        ClassifierConfig::new(2, 4, 4)
            .with_conv1_channels(2)
            .with_conv2_channels(2)
            .with_kernel_size(3)
            .with_hidden_size(4)
    }

    #[test]
    fn test_save_and_load_weights() {
        let tmp    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(tmp.path().join("nested"), "best").unwrap();
        let device = Default::default();

        assert!(!ckpt.exists());
        assert!(ckpt.load_meta().unwrap().is_none());

        let saved = tiny().init::<TestBackend>(&device);
        let meta  = CheckpointMeta { iteration: 101, val_accuracy: 0.75, train_accuracy: 0.8 };
        ckpt.save_model(&saved, &meta).unwrap();

        assert!(ckpt.exists());
        assert_eq!(ckpt.weights_path(), tmp.path().join("nested").join("best.mpk"));
        assert_eq!(ckpt.load_meta().unwrap(), Some(meta));

        // A fresh model has different random weights until the record is loaded
        let images = Tensor::<TestBackend, 4>::ones([1, 1, 4, 4], &device);
        let loaded = ckpt.load_model(tiny().init::<TestBackend>(&device), &device).unwrap();

        let expected: Vec<f32> = saved.forward(images.clone()).into_data().to_vec().unwrap();
        let actual:   Vec<f32> = loaded.forward(images).into_data().to_vec().unwrap();
        for (a, b) in expected.iter().zip(actual.iter()) {
            // CompactRecorder stores half precision
            assert!((a - b).abs() < 1e-2, "{a} vs {b}");
        }
    }

    #[test]
    fn test_weights_extension_matches_recorder() {
        assert_eq!(<CompactRecorder as FileRecorder<TestBackend>>::file_extension(), WEIGHTS_EXT);
    }

    #[test]
    fn test_load_without_checkpoint_errors() {
        let tmp  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(tmp.path(), "none").unwrap();
        let err  = ckpt.load_model(tiny().init::<TestBackend>(&Default::default()), &Default::default());
        assert!(err.is_err());
    }

    #[test]
    fn test_config_round_trip() {
        let tmp  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(tmp.path(), "best").unwrap();

        assert!(ckpt.stored_model_config().unwrap().is_none());
        ckpt.save_model_config(&tiny()).unwrap();
        let back = ckpt.load_model_config().unwrap();
        assert_eq!(back.num_classes, 2);
        assert_eq!(back.kernel_size, 3);

        let cfg = TrainConfig { iterations: 42, ..TrainConfig::default() };
        ckpt.save_config(&cfg).unwrap();
        assert_eq!(ckpt.load_config().unwrap().iterations, 42);
    }
}
