// ============================================================
// Layer 6 — Dataset Preview
// ============================================================
// Renders samples into a grayscale contact sheet PNG:
//
//   ┌────┐  ┌────┐  ┌────┐  ┌────┐  ┌────┐
//   │ s0 │  │ s1 │  │ s2 │  │ s3 │  │ s4 │     4 rows × 5 columns
//   └────┘  └────┘  └────┘  └────┘  └────┘     each cell = one sample
//   ┌────┐  ...                                scaled by `scale`,
//                                              GAP-pixel gray gutters
//
// Cells without a sample stay black. Grids whose size overflows
// u32 or exceeds MAX_PIXELS are rejected.

use anyhow::{anyhow, Context, Result};
use image::{GrayImage, Luma};
use std::{fs, path::Path};

use crate::domain::sample::Sample;

pub const GRID_ROWS: usize = 4;
pub const GRID_COLS: usize = 5;

/// Gutter width between cells, in output pixels
const GAP: u32 = 2;
const GUTTER: Luma<u8> = Luma([128]);
/// Largest sheet we are willing to allocate (256 MiB of gray pixels)
const MAX_PIXELS: u64 = 1 << 28;

/// Geometry of a contact sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub rows:   usize,
    pub cols:   usize,
    pub width:  usize,
    pub height: usize,
    pub scale:  u32,
}

impl GridLayout {
    pub fn new(width: usize, height: usize, scale: u32) -> Self {
        Self { rows: GRID_ROWS, cols: GRID_COLS, width, height, scale: scale.max(1) }
    }

    pub fn capacity(&self) -> usize {
        self.rows * self.cols
    }

    /// One side of the sheet: `count` cells of `side * scale` plus gutters.
    fn extent(&self, side: usize, count: usize) -> Option<u32> {
        let cell   = u32::try_from(side).ok()?.checked_mul(self.scale)?;
        let count  = u32::try_from(count).ok()?;
        let gutter = count.checked_sub(1)?.checked_mul(GAP)?;
        count.checked_mul(cell)?.checked_add(gutter)
    }

    fn cell_w(&self) -> u32 {
        self.width as u32 * self.scale
    }

    fn cell_h(&self) -> u32 {
        self.height as u32 * self.scale
    }

    /// Output image size in pixels.
    /// Errors when the sheet would not fit in memory.
    pub fn dimensions(&self) -> Result<(u32, u32)> {
        let too_large = || {
            anyhow!(
                "preview of {}x{} images at scale {} is too large",
                self.width, self.height, self.scale
            )
        };
        let w = self.extent(self.width, self.cols).ok_or_else(too_large)?;
        let h = self.extent(self.height, self.rows).ok_or_else(too_large)?;
        if u64::from(w) * u64::from(h) > MAX_PIXELS {
            return Err(too_large());
        }
        Ok((w, h))
    }

    /// Top-left corner of cell `index`, row-major.
    /// Only meaningful once `dimensions` has succeeded.
    pub fn origin(&self, index: usize) -> (u32, u32) {
        let col = (index % self.cols) as u32;
        let row = (index / self.cols) as u32;
        (col * (self.cell_w() + GAP), row * (self.cell_h() + GAP))
    }
}

/// Draw up to `layout.capacity()` samples.
pub fn render_grid(samples: &[Sample], layout: &GridLayout) -> Result<GrayImage> {
    let (w, h) = layout.dimensions()?;
    let mut img = GrayImage::new(w, h);

    // Paint everything as gutter, then cover it with cells
    for p in img.pixels_mut() {
        *p = GUTTER;
    }
    for index in 0..layout.capacity() {
        let (ox, oy) = layout.origin(index);
        for y in 0..layout.cell_h() {
            for x in 0..layout.cell_w() {
                img.put_pixel(ox + x, oy + y, Luma([0]));
            }
        }
    }

    for (index, sample) in samples.iter().take(layout.capacity()).enumerate() {
        let (ox, oy) = layout.origin(index);
        for y in 0..layout.height {
            let row = sample.row(y, layout.width);
            for (x, &v) in row.iter().enumerate() {
                for dy in 0..layout.scale {
                    for dx in 0..layout.scale {
                        img.put_pixel(
                            ox + x as u32 * layout.scale + dx,
                            oy + y as u32 * layout.scale + dy,
                            Luma([v]),
                        );
                    }
                }
            }
        }
    }

    Ok(img)
}

/// Render and write a PNG, creating parent directories.
pub fn save_preview(path: &Path, samples: &[Sample], layout: &GridLayout) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create '{}'", parent.display()))?;
        }
    }

    render_grid(samples, layout)?
        .save(path)
        .with_context(|| format!("Cannot write preview '{}'", path.display()))?;

    tracing::debug!("Wrote preview '{}'", path.display());
    Ok(())
}
