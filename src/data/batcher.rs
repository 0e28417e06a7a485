// ============================================================
// Layer 4 — Image Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<Sample> into
// tensors the CNN can consume.
//
//   Input:  N Samples, each W*H bytes
//   Output: images [N, 1, H, W] as f32 in [0, 1]
//           labels [N] as Int
//
// Every sample in a dataset has the same size, so the pixels
// are flattened into one Vec and reshaped once.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::domain::sample::Sample;

/// A batch of images ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct ImageBatch<B: Backend> {
    /// Shape: [batch_size, 1, height, width]
    pub images: Tensor<B, 4>,

    /// Class index per image, shape: [batch_size]
    pub labels: Tensor<B, 1, Int>,
}

#[derive(Clone, Debug)]
pub struct ImageBatcher<B: Backend> {
    pub device: B::Device,
    width:      usize,
    height:     usize,
}

impl<B: Backend> ImageBatcher<B> {
    pub fn new(device: B::Device, width: usize, height: usize) -> Self {
        Self { device, width, height }
    }
}

impl<B: Backend> Batcher<Sample, ImageBatch<B>> for ImageBatcher<B> {
    fn batch(&self, items: Vec<Sample>) -> ImageBatch<B> {
        let batch_size = items.len();

        // u8 intensities → [0, 1]
        let pixels: Vec<f32> = items
            .iter()
            .flat_map(|s| s.pixels.iter().map(|&p| p as f32 / 255.0))
            .collect();

        let labels: Vec<i32> = items
            .iter()
            .map(|s| s.label as i32)
            .collect();

        let images = Tensor::<B, 1>::from_floats(
            pixels.as_slice(), &self.device
        ).reshape([batch_size, 1, self.height, self.width]);

        let labels = Tensor::<B, 1, Int>::from_ints(
            labels.as_slice(), &self.device
        );

        ImageBatch { images, labels }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_batch_shapes() {
        let device  = Default::default();
        let batcher = ImageBatcher::<TestBackend>::new(device, 3, 2);
        let items   = vec![
            Sample::new(vec![0; 6], 0),
            Sample::new(vec![255; 6], 1),
        ];

        let batch = batcher.batch(items);
        assert_eq!(batch.images.dims(), [2, 1, 2, 3]);
        assert_eq!(batch.labels.dims(), [2]);
    }

    #[test]
    fn test_pixels_are_scaled_to_unit_range() {
        let device  = Default::default();
        let batcher = ImageBatcher::<TestBackend>::new(device, 2, 1);
        let batch   = batcher.batch(vec![Sample::new(vec![0, 255], 3)]);

        let values: Vec<f32> = batch.images.into_data().to_vec::<f32>().unwrap();
        assert_eq!(values, vec![0.0, 1.0]);

        let labels: Vec<i64> = batch.labels.into_data().convert::<i64>().to_vec::<i64>().unwrap();
        assert_eq!(labels, vec![3]);
    }
}
