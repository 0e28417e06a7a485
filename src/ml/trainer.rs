// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Iteration-based training with Adam:
//
//   for i in 0..iterations
//     batch  ← BatchSampler (shuffled pass over the train set)
//     forward, cross-entropy, backward, Adam step
//     add batch accuracy to the running training accuracy
//     every eval_every iterations (i = 0 included):
//       validate on the full validation set
//       if val accuracy beats the best so far → checkpoint, mark '*'
//       print + append a metrics row, reset the running accuracy
//
//   - Training uses TrainBackend (Autodiff<..>) for gradients
//   - model.valid() returns the model on the inner backend,
//     with dropout disabled, for validation
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    data::dataloader::batcher::Batcher,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::ImageBatcher,
    dataset::ImageDataset,
    sampler::{seeded_rng, BatchSampler},
};
use crate::domain::sample::ImageSet;
use crate::infra::{
    checkpoint::{CheckpointManager, CheckpointMeta},
    metrics::{MetricsLogger, ValidationRecord},
};
use crate::ml::evaluator::{accuracy_counts, evaluate, ordered_loader};
use crate::ml::model::{ClassifierConfig, ImageClassifier};
use crate::ml::TrainBackend;

/// What a finished run achieved.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    pub iterations:        usize,
    /// Best validation accuracy seen, including one seeded from a restored checkpoint
    pub best_accuracy:     f64,
    /// 1-based iteration of the best checkpoint written by this run
    pub best_iteration:    Option<usize>,
    pub checkpoints_saved: usize,
}

pub fn run_training(
    cfg:          &TrainConfig,
    model_cfg:    &ClassifierConfig,
    train_set:    ImageSet,
    val_set:      ImageSet,
    ckpt_manager: &CheckpointManager,
    metrics:      &MetricsLogger,
) -> Result<TrainingSummary> {
    let device = <TrainBackend as Backend>::Device::default();
    tracing::info!("Using device: {:?}", device);
    train_loop::<TrainBackend>(cfg, model_cfg, train_set, val_set, ckpt_manager, metrics, device)
}

pub fn train_loop<B: AutodiffBackend>(
    cfg:          &TrainConfig,
    model_cfg:    &ClassifierConfig,
    train_set:    ImageSet,
    val_set:      ImageSet,
    ckpt_manager: &CheckpointManager,
    metrics:      &MetricsLogger,
    device:       B::Device,
) -> Result<TrainingSummary> {
    if let Some(seed) = cfg.seed {
        B::seed(seed);
    }

    // ── Build or restore model ────────────────────────────────────────────────
    let mut model: ImageClassifier<B> = model_cfg.init(&device);
    let mut best_accuracy = 0.0f64;

    if cfg.restore {
        model = ckpt_manager.load_model(model, &device)?;
        if let Some(meta) = ckpt_manager.load_meta()? {
            best_accuracy = meta.val_accuracy;
            tracing::info!(
                "Restored checkpoint from iteration {} (val_acc={:.4})",
                meta.iteration, meta.val_accuracy
            );
        }
    }
    tracing::info!(
        "Model ready: {} parameters, {} classes, {}x{} input",
        model.num_params(), model_cfg.num_classes, model_cfg.width, model_cfg.height
    );

    let mut optim = AdamConfig::new().init::<B, ImageClassifier<B>>();

    // ── Training batches (autodiff backend) ───────────────────────────────────
    let train_dataset = ImageDataset::from(train_set);
    let train_batcher = ImageBatcher::<B>::new(device.clone(), model_cfg.width, model_cfg.height);
    let sampler_rng   = seeded_rng(cfg.seed.map(|s| s.wrapping_add(1)));
    let mut sampler   = BatchSampler::new(train_dataset.sample_count(), cfg.batch_size, sampler_rng);

    // ── Validation loader (inner backend, no autodiff overhead) ──────────────
    let val_count  = val_set.len();
    let val_loader = ordered_loader::<B::InnerBackend>(
        ImageDataset::from(val_set),
        cfg.batch_size,
        model_cfg.width,
        model_cfg.height,
        device.clone(),
    );

    println!("train data size: {}", train_dataset.sample_count());
    println!("validation data size: {}", val_count);

    let mut summary = TrainingSummary {
        iterations:        0,
        best_accuracy,
        best_iteration:    None,
        checkpoints_saved: 0,
    };
    let mut train_acc_sum = 0.0f64;
    let mut since_report  = 0usize;

    for i in 0..cfg.iterations {
        let indices = sampler.next_batch();
        let batch   = train_batcher.batch(train_dataset.gather(&indices));

        let (loss, logits) = model.forward_loss(batch.images, batch.labels.clone());
        let (correct, total) = accuracy_counts(logits, batch.labels);
        train_acc_sum += correct as f64 / total.max(1) as f64;
        since_report  += 1;

        let grads = GradientsParams::from_grads(loss.backward(), &model);
        model = optim.step(cfg.lr, model, grads);
        summary.iterations = i + 1;

        if i % cfg.eval_every != 0 {
            continue;
        }

        // ── Validation round ──────────────────────────────────────────────────
        let eval = evaluate(&model.valid(), val_loader.as_ref(), model_cfg.num_classes)?;
        let train_accuracy = train_acc_sum / since_report as f64;

        let mut record = ValidationRecord::new(i + 1, train_accuracy, eval.accuracy, eval.loss, false);
        record.improved = record.is_improvement(summary.best_accuracy);
        let improved = record.improved;
        if improved {
            summary.best_accuracy  = eval.accuracy;
            summary.best_iteration = Some(i + 1);
            summary.checkpoints_saved += 1;
            ckpt_manager.save_model(
                &model,
                &CheckpointMeta {
                    iteration:      i + 1,
                    val_accuracy:   eval.accuracy,
                    train_accuracy,
                },
            )?;
        }

        println!(
            "accuracy #{}: {:.9}% {}{:.9}%",
            i + 1,
            train_accuracy * 100.0,
            if improved { '*' } else { ' ' },
            eval.accuracy * 100.0,
        );

        metrics.log(&record)?;

        train_acc_sum = 0.0;
        since_report  = 0;
    }

    tracing::info!(
        "Training complete: best val_acc={:.4} after {} iterations ({} passes over the data)",
        summary.best_accuracy, summary.iterations, sampler.passes()
    );
    Ok(summary)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    use crate::domain::sample::{DatasetHeader, Sample};

    type TestBackend = Autodiff<NdArray>;

    /// Two trivially separable classes: dark and bright 8x8 squares.
    fn toy_set(per_class: u32) -> ImageSet {
        let header = DatasetHeader { num_classes: 2, samples_per_class: per_class, width: 8, height: 8 };
        let samples = (0..2 * per_class as usize)
            .map(|row| {
                let label = header.label_for_row(row);
                let level = if label == 0 { 10 + (row % 5) as u8 } else { 240 - (row % 5) as u8 };
                Sample::new(vec![level; 64], label)
            })
            .collect();
        ImageSet::new(header, samples)
    }

    fn toy_model() -> ClassifierConfig {
        ClassifierConfig::new(2, 8, 8)
            .with_conv1_channels(4)
            .with_conv2_channels(4)
            .with_kernel_size(3)
            .with_hidden_size(8)
            .with_dropout(0.0)
    }

    fn toy_config(dir: &std::path::Path) -> TrainConfig {
        TrainConfig {
            output_dir: dir.display().to_string(),
            iterations: 21,
            batch_size: 8,
            eval_every: 10,
            lr:         1e-3,
            seed:       Some(3),
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_smoke_training_run() {
        let tmp     = tempfile::tempdir().unwrap();
        let cfg     = toy_config(tmp.path());
        let ckpt    = CheckpointManager::new(tmp.path(), "toy").unwrap();
        let metrics = MetricsLogger::new(tmp.path(), false).unwrap();
        let device  = Default::default();

        let summary = train_loop::<TestBackend>(
            &cfg, &toy_model(), toy_set(12), toy_set(4), &ckpt, &metrics, device,
        ).unwrap();

        assert_eq!(summary.iterations, 21);

        // Validation at i = 0, 10, 20
        let csv = std::fs::read_to_string(metrics.csv_path()).unwrap();
        assert_eq!(csv.lines().count(), 1 + 3);

        // A balanced two-class set cannot score 0 on every round
        assert!(summary.checkpoints_saved >= 1);
        assert!(ckpt.exists());
        let meta = ckpt.load_meta().unwrap().unwrap();
        assert_eq!(Some(meta.iteration), summary.best_iteration);
        assert_eq!(meta.val_accuracy, summary.best_accuracy);
    }

    #[test]
    fn test_restore_seeds_best_accuracy() {
        let tmp     = tempfile::tempdir().unwrap();
        let ckpt    = CheckpointManager::new(tmp.path(), "toy").unwrap();
        let metrics = MetricsLogger::new(tmp.path(), false).unwrap();
        let device  = Default::default();

        // Pretend an earlier run reached a perfect score
        let model = toy_model().init::<TestBackend>(&device);
        ckpt.save_model(&model, &CheckpointMeta { iteration: 7, val_accuracy: 1.0, train_accuracy: 1.0 })
            .unwrap();

        let cfg = TrainConfig { restore: true, iterations: 1, ..toy_config(tmp.path()) };
        let summary = train_loop::<TestBackend>(
            &cfg, &toy_model(), toy_set(4), toy_set(2), &ckpt, &metrics, device,
        ).unwrap();

        // Nothing can beat 1.0, so the stored checkpoint is untouched
        assert_eq!(summary.checkpoints_saved, 0);
        assert_eq!(ckpt.load_meta().unwrap().unwrap().iteration, 7);
    }

    #[test]
    fn test_restore_without_checkpoint_fails() {
        let tmp     = tempfile::tempdir().unwrap();
        let ckpt    = CheckpointManager::new(tmp.path(), "missing").unwrap();
        let metrics = MetricsLogger::new(tmp.path(), false).unwrap();
        let cfg     = TrainConfig { restore: true, ..toy_config(tmp.path()) };

        let result = train_loop::<TestBackend>(
            &cfg, &toy_model(), toy_set(2), toy_set(2), &ckpt, &metrics, Default::default(),
        );
        assert!(result.is_err());
    }
}
