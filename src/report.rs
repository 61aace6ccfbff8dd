//! Plot files and progress reporting.
//!
//! Per-epoch series are written as gnuplot-friendly rows:
//! `"\t{epoch}\t\t{value}\n"` with 1-based epochs.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::{EpochReport, EpochSink, Error, Result};

/// Write one row per value, numbering epochs from 1.
pub fn write_plot_data<W: Write>(mut out: W, values: &[f64]) -> io::Result<()> {
    for (i, value) in values.iter().enumerate() {
        writeln!(out, "\t{}\t\t{value}", i + 1)?;
    }
    out.flush()
}

/// [`write_plot_data`] into a newly created file at `path`.
pub fn save_plot_data<P: AsRef<Path>>(path: P, values: &[f64]) -> Result<()> {
    let path = path.as_ref();
    let io_err = |e: io::Error| Error::Io(format!("failed to write {}: {e}", path.display()));
    let file = File::create(path).map_err(io_err)?;
    write_plot_data(BufWriter::new(file), values).map_err(io_err)
}

/// Arithmetic mean, or `None` for an empty series.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Logs every `every`-th epoch at `info` level.
#[derive(Debug, Clone, Copy)]
pub struct TracingSink {
    every: usize,
}

impl TracingSink {
    /// `every == 0` is treated as `1`.
    pub fn new(every: usize) -> Self {
        Self {
            every: every.max(1),
        }
    }
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new(100)
    }
}

impl EpochSink for TracingSink {
    fn record_epoch(&mut self, report: &EpochReport) {
        if report.epoch == 1 || report.epoch % self.every == 0 {
            info!(
                epoch = report.epoch,
                error = report.network_error,
                hit_percentage = report.hit_percentage,
                "training"
            );
        }
    }
}
