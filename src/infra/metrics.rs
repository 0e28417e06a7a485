// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends one CSV row per validation round.
//
// Columns:
//   - iteration:      1-based iteration the round ran after
//   - train_accuracy: mean batch accuracy since the last round
//   - val_accuracy:   accuracy over the whole validation set
//   - val_loss:       mean cross-entropy over the validation set
//   - improved:       1 if this round wrote a new checkpoint
//
// Output file: {output_dir}/metrics.csv
//
//   iteration,train_accuracy,val_accuracy,val_loss,improved
//   1,0.480000,0.512500,0.693012,1
//   101,0.871000,0.902500,0.281554,1
//   ...

use anyhow::Result;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};
use serde::{Deserialize, Serialize};

const CSV_HEADER: &str = "iteration,train_accuracy,val_accuracy,val_loss,improved";

/// One validation round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRecord {
    pub iteration:      usize,
    pub train_accuracy: f64,
    pub val_accuracy:   f64,
    pub val_loss:       f64,
    pub improved:       bool,
}

impl ValidationRecord {
    pub fn new(
        iteration:      usize,
        train_accuracy: f64,
        val_accuracy:   f64,
        val_loss:       f64,
        improved:       bool,
    ) -> Self {
        Self { iteration, train_accuracy, val_accuracy, val_loss, improved }
    }

    /// Strictly better than the best accuracy seen so far
    pub fn is_improvement(&self, best_accuracy: f64) -> bool {
        self.val_accuracy > best_accuracy
    }

    fn to_csv_row(&self) -> String {
        format!(
            "{},{:.6},{:.6},{:.6},{}",
            self.iteration,
            self.train_accuracy,
            self.val_accuracy,
            self.val_loss,
            u8::from(self.improved),
        )
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// A fresh run starts a new CSV with just the header.
    /// A restored run keeps appending to the existing log.
    pub fn new(dir: impl Into<PathBuf>, restore: bool) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let csv_path = dir.join("metrics.csv");
        if !restore || !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "{CSV_HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, r: &ValidationRecord) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)?;
        writeln!(f, "{}", r.to_csv_row())?;

        tracing::debug!(
            "Logged iteration {}: train_acc={:.4}, val_acc={:.4}",
            r.iteration, r.train_accuracy, r.val_accuracy,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_improvement_is_strict() {
        let r = ValidationRecord::new(101, 0.9, 0.8, 0.4, true);
        assert!(r.is_improvement(0.7));
        assert!(!r.is_improvement(0.8));
    }

    #[test]
    fn test_rows_are_appended_across_loggers() {
        let tmp = tempfile::tempdir().unwrap();

        let first = MetricsLogger::new(tmp.path(), false).unwrap();
        first.log(&ValidationRecord::new(1, 0.5, 0.25, 1.5, true)).unwrap();

        // Restoring must not rewrite the header
        let second = MetricsLogger::new(tmp.path(), true).unwrap();
        second.log(&ValidationRecord::new(101, 0.75, 0.2, 1.25, false)).unwrap();

        let csv = fs::read_to_string(second.csv_path()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines, vec![
            CSV_HEADER,
            "1,0.500000,0.250000,1.500000,1",
            "101,0.750000,0.200000,1.250000,0",
        ]);
    }

    #[test]
    fn test_fresh_run_starts_a_new_log() {
        let tmp = tempfile::tempdir().unwrap();

        let first = MetricsLogger::new(tmp.path(), false).unwrap();
        first.log(&ValidationRecord::new(1, 0.5, 0.25, 1.5, true)).unwrap();

        let second = MetricsLogger::new(tmp.path(), false).unwrap();
        second.log(&ValidationRecord::new(1, 0.75, 0.5, 1.0, true)).unwrap();

        let csv = fs::read_to_string(second.csv_path()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines, vec![CSV_HEADER, "1,0.750000,0.500000,1.000000,1"]);
    }
}
