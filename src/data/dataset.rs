use burn::data::dataset::Dataset;

use crate::domain::sample::{ImageSet, Sample};

/// In-memory image samples behind Burn's Dataset trait,
/// so a DataLoader can call .get(index) and .len().
pub struct ImageDataset {
    samples: Vec<Sample>,
}

impl ImageDataset {
    pub fn new(samples: Vec<Sample>) -> Self { Self { samples } }

    pub fn sample_count(&self) -> usize { self.samples.len() }

    /// Clone the samples at `indices`, in that order.
    pub fn gather(&self, indices: &[usize]) -> Vec<Sample> {
        indices.iter().filter_map(|&i| self.samples.get(i).cloned()).collect()
    }
}

impl From<ImageSet> for ImageDataset {
    fn from(set: ImageSet) -> Self {
        Self::new(set.samples)
    }
}

impl Dataset<Sample> for ImageDataset {
    fn get(&self, index: usize) -> Option<Sample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
