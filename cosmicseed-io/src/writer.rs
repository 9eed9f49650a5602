//! File writers for seeding output.

use crate::{Error, Result};
use cosmicseed_algorithms::EventOutput;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Layout of a seed output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One JSON [`EventOutput`] per line, seeds and statistics included.
    JsonLines,
    /// One row per line seed.
    Csv,
}

impl OutputFormat {
    /// Picks the format from a file extension (`jsonl`, `json`, `csv`).
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedFormat`] for any other extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("jsonl" | "json") => Ok(Self::JsonLines),
            Some("csv") => Ok(Self::Csv),
            _ => Err(Error::UnsupportedFormat(path.display().to_string())),
        }
    }
}

const CSV_HEADER: &str =
    "run,subrun,event,time_cluster,t0,x0,y0,z0,dx,dy,dz,converged,n_raw_hits,raw_hits";

/// Writer for seed output.
pub struct SeedFileWriter {
    writer: BufWriter<File>,
    format: OutputFormat,
}

impl SeedFileWriter {
    /// Creates a writer, choosing the format from the file extension.
    ///
    /// # Errors
    /// Returns an error for an unknown extension or if the file cannot be
    /// created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let format = OutputFormat::from_path(path.as_ref())?;
        Self::create_with_format(path, format)
    }

    /// Creates a writer with an explicit format.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create_with_format<P: AsRef<Path>>(path: P, format: OutputFormat) -> Result<Self> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        if format == OutputFormat::Csv {
            writeln!(writer, "{CSV_HEADER}")?;
        }
        Ok(Self { writer, format })
    }

    /// Output format of this writer.
    #[must_use]
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Appends one event's output.
    ///
    /// # Errors
    /// Returns an error if writing or encoding fails.
    pub fn write_event(&mut self, output: &EventOutput) -> Result<()> {
        match self.format {
            OutputFormat::JsonLines => {
                serde_json::to_writer(&mut self.writer, output)?;
                writeln!(self.writer)?;
            }
            OutputFormat::Csv => {
                let id = output.id;
                for line in &output.line_seeds {
                    let raw_hits = line
                        .raw_hit_indices
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(";");
                    writeln!(
                        self.writer,
                        "{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
                        id.run,
                        id.subrun,
                        id.event,
                        line.time_cluster,
                        line.t0,
                        line.intercept.x,
                        line.intercept.y,
                        line.intercept.z,
                        line.direction.x,
                        line.direction.y,
                        line.direction.z,
                        u8::from(line.converged),
                        line.raw_hit_indices.len(),
                        raw_hits
                    )?;
                }
            }
        }
        Ok(())
    }

    /// Flushes the writer.
    ///
    /// # Errors
    /// Returns an error if the underlying file cannot be flushed.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
