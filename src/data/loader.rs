// ============================================================
// Layer 4 — Binary Dataset Loader
// ============================================================
// Reads the packed dataset container:
//
//   offset  size  field
//   0       4     num_classes        (u32, little-endian)
//   4       4     samples_per_class  (u32, little-endian)
//   8       4     width              (u32, little-endian)
//   12      4     height             (u32, little-endian)
//   16      ..    pixels, one width*height block per sample
//
// Labels are implicit (see domain::sample). Anything that does
// not describe exactly num_classes * samples_per_class images is
// rejected instead of being guessed at.
//
// Reference: byteorder crate documentation
//            Rust Book §9 (Error Handling)

use std::{
    fs,
    io::Cursor,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use thiserror::Error;

use crate::domain::sample::{DatasetHeader, ImageSet, Sample};
use crate::domain::traits::SampleSource;

/// Size of the fixed header in bytes
pub const HEADER_LEN: usize = 16;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File is {len} bytes, shorter than the 16-byte header")]
    TruncatedHeader { len: usize },

    #[error("Header field '{field}' is zero")]
    ZeroDimension { field: &'static str },

    #[error("Header dimensions overflow the address space")]
    HeaderOverflow,

    #[error("Payload of {payload} bytes is not a multiple of the image size {image_size}")]
    RaggedPayload { payload: usize, image_size: usize },

    #[error("Expected {expected} samples (classes × samples per class), found {found}")]
    SampleCountMismatch { expected: usize, found: usize },
}

/// Loads a dataset file from disk.
/// Implements the SampleSource trait from Layer 3.
pub struct BinDatasetLoader {
    path: PathBuf,
}

impl BinDatasetLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SampleSource for BinDatasetLoader {
    fn load(&self) -> Result<ImageSet> {
        let bytes = fs::read(&self.path)
            .with_context(|| format!("Cannot read dataset '{}'", self.path.display()))?;

        let set = parse_dataset(&bytes).map_err(|e| {
            anyhow::anyhow!("Invalid dataset '{}': {}", self.path.display(), e)
        })?;

        tracing::debug!(
            "Loaded '{}': {} classes × {} samples of {}x{}",
            self.path.display(),
            set.header.num_classes,
            set.header.samples_per_class,
            set.header.width,
            set.header.height,
        );
        Ok(set)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Read and parse a dataset file. Samples come back grouped by label;
/// callers shuffle.
pub fn load_training_data(path: impl Into<PathBuf>) -> Result<ImageSet> {
    BinDatasetLoader::new(path).load()
}

/// Decode the 16-byte header.
pub fn parse_header(bytes: &[u8]) -> Result<DatasetHeader, DatasetError> {
    if bytes.len() < HEADER_LEN {
        return Err(DatasetError::TruncatedHeader { len: bytes.len() });
    }

    let mut r = Cursor::new(&bytes[..HEADER_LEN]);
    let header = DatasetHeader {
        num_classes:       r.read_u32::<LittleEndian>()?,
        samples_per_class: r.read_u32::<LittleEndian>()?,
        width:             r.read_u32::<LittleEndian>()?,
        height:            r.read_u32::<LittleEndian>()?,
    };

    for (field, value) in [
        ("num_classes",       header.num_classes),
        ("samples_per_class", header.samples_per_class),
        ("width",             header.width),
        ("height",            header.height),
    ] {
        if value == 0 {
            return Err(DatasetError::ZeroDimension { field });
        }
    }

    Ok(header)
}

/// Parse a complete dataset image held in memory.
pub fn parse_dataset(bytes: &[u8]) -> Result<ImageSet, DatasetError> {
    let header = parse_header(bytes)?;

    let image_size = (header.width as usize)
        .checked_mul(header.height as usize)
        .ok_or(DatasetError::HeaderOverflow)?;
    let expected = (header.num_classes as usize)
        .checked_mul(header.samples_per_class as usize)
        .ok_or(DatasetError::HeaderOverflow)?;

    let payload = &bytes[HEADER_LEN..];
    if payload.len() % image_size != 0 {
        return Err(DatasetError::RaggedPayload { payload: payload.len(), image_size });
    }

    let found = payload.len() / image_size;
    if found != expected {
        return Err(DatasetError::SampleCountMismatch { expected, found });
    }

    let samples = payload
        .chunks_exact(image_size)
        .enumerate()
        .map(|(row, pixels)| Sample::new(pixels.to_vec(), header.label_for_row(row)))
        .collect();

    Ok(ImageSet::new(header, samples))
}

/// Serialise an image set back into the container format.
/// Samples must already be grouped by label in ascending order.
pub fn encode_dataset(set: &ImageSet) -> Vec<u8> {
    let h = &set.header;
    let mut out = Vec::with_capacity(HEADER_LEN + set.len() * h.image_size());
    for v in [h.num_classes, h.samples_per_class, h.width, h.height] {
        out.extend_from_slice(&v.to_le_bytes());
    }
    for s in &set.samples {
        out.extend_from_slice(&s.pixels);
    }
    out
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn raw(classes: u32, per_class: u32, w: u32, h: u32, payload: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for v in [classes, per_class, w, h] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn test_parses_header_and_labels() {
        // 2 classes × 2 samples of 2x1 pixels
        let bytes = raw(2, 2, 2, 1, &[1, 2, 3, 4, 5, 6, 7, 8]);
        let set   = parse_dataset(&bytes).unwrap();

        assert_eq!(set.header.num_classes, 2);
        assert_eq!(set.header.width, 2);
        assert_eq!(set.len(), 4);
        assert_eq!(set.samples[0].pixels, vec![1, 2]);
        assert_eq!(set.samples[3].pixels, vec![7, 8]);

        let labels: Vec<usize> = set.samples.iter().map(|s| s.label).collect();
        assert_eq!(labels, vec![0, 0, 1, 1]);
    }

    #[test]
    fn test_header_is_little_endian() {
        let mut bytes = vec![0x01, 0x01, 0, 0]; // 257 classes
        bytes.extend_from_slice(&[1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0]);
        let header = parse_header(&bytes).unwrap();
        assert_eq!(header.num_classes, 257);
    }

    #[test]
    fn test_short_file_is_truncated_header() {
        let err = parse_dataset(&[1, 0, 0]).unwrap_err();
        assert!(matches!(err, DatasetError::TruncatedHeader { len: 3 }));
    }

    #[test]
    fn test_zero_field_is_rejected() {
        let err = parse_dataset(&raw(2, 0, 2, 2, &[])).unwrap_err();
        assert!(matches!(err, DatasetError::ZeroDimension { field: "samples_per_class" }));
    }

    #[test]
    fn test_partial_trailing_image_is_rejected() {
        let err = parse_dataset(&raw(1, 1, 2, 2, &[0, 0, 0, 0, 9])).unwrap_err();
        assert!(matches!(err, DatasetError::RaggedPayload { payload: 5, image_size: 4 }));
    }

    #[test]
    fn test_row_count_must_match_header() {
        // Header promises 2 × 2 = 4 images, payload has 3
        let err = parse_dataset(&raw(2, 2, 1, 1, &[0, 0, 0])).unwrap_err();
        assert!(matches!(err, DatasetError::SampleCountMismatch { expected: 4, found: 3 }));
    }

    #[test]
    fn test_encode_then_parse_preserves_pixels() {
        let bytes = raw(3, 1, 1, 2, &[10, 11, 20, 21, 30, 31]);
        let set   = parse_dataset(&bytes).unwrap();
        assert_eq!(encode_dataset(&set), bytes);
    }

    #[test]
    fn test_loader_reads_file() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.bin");
        fs::write(&path, raw(2, 1, 1, 1, &[0, 255])).unwrap();

        let set = BinDatasetLoader::new(&path).load().unwrap();
        assert_eq!(set.samples[1], Sample::new(vec![255], 1));
    }

    #[test]
    fn test_loader_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = BinDatasetLoader::new(dir.path().join("absent.bin")).load().unwrap_err();
        assert!(err.to_string().contains("Cannot read dataset"));
    }
}
