// ============================================================
// Layer 5 — Evaluator
// ============================================================
// Runs a model over a whole dataset without gradients and
// reports loss, overall accuracy, and a per-class tally.
// Used for the periodic validation rounds during training and
// by the `evaluate` command.
//
//   argmax(1) returns [batch, 1], so predictions are flattened
//   to [batch] before comparing with the labels.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    nn::loss::CrossEntropyLossConfig,
    prelude::*,
};

use crate::data::{batcher::{ImageBatch, ImageBatcher}, dataset::ImageDataset};
use crate::ml::model::ImageClassifier;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassTally {
    pub correct: usize,
    pub total:   usize,
}

impl ClassTally {
    pub fn accuracy(&self) -> f64 {
        if self.total > 0 { self.correct as f64 / self.total as f64 } else { 0.0 }
    }
}

#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Mean cross-entropy per sample
    pub loss:      f64,
    /// Fraction in [0, 1]
    pub accuracy:  f64,
    pub correct:   usize,
    pub total:     usize,
    pub per_class: Vec<ClassTally>,
}

/// Deterministic, unshuffled loader over a dataset.
pub fn ordered_loader<B: Backend>(
    dataset:    ImageDataset,
    batch_size: usize,
    width:      usize,
    height:     usize,
    device:     B::Device,
) -> Arc<dyn DataLoader<ImageBatch<B>>> {
    let batcher = ImageBatcher::<B>::new(device, width, height);
    DataLoaderBuilder::new(batcher)
        .batch_size(batch_size)
        .num_workers(1)
        .build(dataset)
}

/// (correct, total) for one batch of logits.
pub fn accuracy_counts<B: Backend>(logits: Tensor<B, 2>, labels: Tensor<B, 1, Int>) -> (usize, usize) {
    let total = labels.dims()[0];
    let correct = logits
        .argmax(1)
        .flatten::<1>(0, 1)
        .equal(labels)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>();
    (correct as usize, total)
}

pub fn evaluate<B: Backend>(
    model:       &ImageClassifier<B>,
    loader:      &dyn DataLoader<ImageBatch<B>>,
    num_classes: usize,
) -> Result<Evaluation> {
    let mut loss_sum  = 0.0f64;
    let mut per_class = vec![ClassTally::default(); num_classes];
    let mut correct   = 0usize;
    let mut total     = 0usize;

    for batch in loader.iter() {
        let logits = model.forward(batch.images);
        let ce = CrossEntropyLossConfig::new().init(&logits.device());
        let n  = batch.labels.dims()[0];

        let batch_loss: f64 = ce
            .forward(logits.clone(), batch.labels.clone())
            .into_scalar()
            .elem::<f64>();
        loss_sum += batch_loss * n as f64;

        let preds = to_i64(logits.argmax(1).flatten::<1>(0, 1))?;
        let truth = to_i64(batch.labels)?;

        for (p, t) in preds.iter().zip(truth.iter()) {
            let hit = p == t;
            if let Some(tally) = per_class.get_mut(*t as usize) {
                tally.total += 1;
                if hit {
                    tally.correct += 1;
                }
            }
            if hit {
                correct += 1;
            }
            total += 1;
        }
    }

    let loss     = if total > 0 { loss_sum / total as f64 } else { f64::NAN };
    let accuracy = if total > 0 { correct as f64 / total as f64 } else { 0.0 };

    tracing::debug!("Evaluated {} samples: acc={:.4} loss={:.4}", total, accuracy, loss);

    Ok(Evaluation { loss, accuracy, correct, total, per_class })
}

fn to_i64<B: Backend>(t: Tensor<B, 1, Int>) -> Result<Vec<i64>> {
    t.into_data()
        .convert::<i64>()
        .to_vec::<i64>()
        .map_err(|e| anyhow!("failed to decode tensor data: {e:?}"))
}
