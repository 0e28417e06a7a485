// ============================================================
// Layer 3 — Sample Domain Types
// ============================================================
// A dataset file stores N classes × M samples of W×H grayscale
// pixels. Labels are never written to disk: the i-th block of
// M consecutive rows belongs to class i.
//
//   row:    0 .. M-1 | M .. 2M-1 | ... | (N-1)M .. NM-1
//   label:      0    |     1     | ... |      N-1
//
// Reference: Rust Book §5 (Structs and Methods)

use serde::{Deserialize, Serialize};

/// The four little-endian u32 fields at the start of a dataset file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetHeader {
    pub num_classes:       u32,
    /// Rows per class block, not the total row count.
    pub samples_per_class: u32,
    pub width:             u32,
    pub height:            u32,
}

impl DatasetHeader {
    /// Bytes in one flattened image (width * height)
    pub fn image_size(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Number of rows a well-formed payload must contain
    pub fn expected_rows(&self) -> usize {
        self.num_classes as usize * self.samples_per_class as usize
    }

    /// Implicit label of a payload row.
    pub fn label_for_row(&self, row: usize) -> usize {
        row / self.samples_per_class.max(1) as usize
    }
}

/// One image and its class index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Row-major grayscale intensities, `height` rows of `width` bytes
    pub pixels: Vec<u8>,
    pub label:  usize,
}

impl Sample {
    pub fn new(pixels: Vec<u8>, label: usize) -> Self {
        Self { pixels, label }
    }

    /// Pixels of row `y` for an image `width` pixels wide.
    pub fn row(&self, y: usize, width: usize) -> &[u8] {
        &self.pixels[y * width..(y + 1) * width]
    }
}

/// A fully loaded dataset held in memory.
#[derive(Debug, Clone)]
pub struct ImageSet {
    pub header:  DatasetHeader,
    pub samples: Vec<Sample>,
}

impl ImageSet {
    pub fn new(header: DatasetHeader, samples: Vec<Sample>) -> Self {
        Self { header, samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn num_classes(&self) -> usize {
        self.header.num_classes as usize
    }

    pub fn width(&self) -> usize {
        self.header.width as usize
    }

    pub fn height(&self) -> usize {
        self.header.height as usize
    }

    /// Count of samples per label, indexed by class.
    pub fn class_histogram(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.num_classes()];
        for s in &self.samples {
            if let Some(c) = counts.get_mut(s.label) {
                *c += 1;
            }
        }
        counts
    }

    /// Two sets can share a model when class count and image size agree.
    /// Samples-per-class is allowed to differ (validation sets are smaller).
    pub fn is_compatible_with(&self, other: &ImageSet) -> bool {
        self.header.num_classes == other.header.num_classes
            && self.header.width == other.header.width
            && self.header.height == other.header.height
    }
}

/// Display name for a class label.
/// Falls back to `class <i>` when no names were configured.
pub fn label_name(names: &[String], label: usize) -> String {
    names
        .get(label)
        .cloned()
        .unwrap_or_else(|| format!("class {label}"))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn header(classes: u32, per_class: u32) -> DatasetHeader {
        DatasetHeader { num_classes: classes, samples_per_class: per_class, width: 3, height: 2 }
    }

    #[test]
    fn test_labels_follow_contiguous_blocks() {
        let h = header(3, 4);
        let labels: Vec<usize> = (0..h.expected_rows()).map(|r| h.label_for_row(r)).collect();
        assert_eq!(labels, vec![0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2]);
    }

    #[test]
    fn test_image_size_and_rows() {
        let h = header(2, 5);
        assert_eq!(h.image_size(), 6);
        assert_eq!(h.expected_rows(), 10);
    }

    #[test]
    fn test_sample_row_slices() {
        let s = Sample::new(vec![1, 2, 3, 4, 5, 6], 0);
        assert_eq!(s.row(0, 3), &[1, 2, 3]);
        assert_eq!(s.row(1, 3), &[4, 5, 6]);
    }

    #[test]
    fn test_class_histogram() {
        let set = ImageSet::new(
            header(2, 2),
            vec![
                Sample::new(vec![0; 6], 0),
                Sample::new(vec![0; 6], 1),
                Sample::new(vec![0; 6], 1),
            ],
        );
        assert_eq!(set.class_histogram(), vec![1, 2]);
    }

    #[test]
    fn test_compatibility_ignores_samples_per_class() {
        let a = ImageSet::new(header(2, 10), Vec::new());
        let b = ImageSet::new(header(2, 3), Vec::new());
        let c = ImageSet::new(header(3, 10), Vec::new());
        assert!(a.is_compatible_with(&b));
        assert!(!a.is_compatible_with(&c));
    }

    #[test]
    fn test_label_name_fallback() {
        let names = vec!["circle".to_string(), "square".to_string()];
        assert_eq!(label_name(&names, 1), "square");
        assert_eq!(label_name(&names, 7), "class 7");
        assert_eq!(label_name(&[], 0), "class 0");
    }
}
