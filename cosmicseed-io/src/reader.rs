//! Memory-mapped file readers.
//!

use crate::{Error, Result};
use cosmicseed_core::calibration::{Calibration, RunConditions};
use cosmicseed_core::event::EventData;
use log::debug;
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};

/// A memory-mapped file reader.
///
/// Uses memmap2 to access file contents without loading the entire file
/// into memory.
pub struct MappedFileReader {
    mmap: Mmap,
    path: PathBuf,
}

impl MappedFileReader {
    /// Opens a file for memory-mapped reading.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or memory-mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;
        // SAFETY: The file is opened read-only and we assume it is not modified concurrently.
        // This is the standard safety contract for memory mapping.
        #[allow(unsafe_code)]
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self {
            mmap,
            path: path.as_ref().to_path_buf(),
        })
    }

    /// Returns the file contents as a byte slice.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap[..]
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// Returns true if the file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    /// Path the file was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Reader for event files.
///
/// An event file is a sequence of JSON event objects, one per line or
/// simply concatenated.
pub struct EventFileReader {
    reader: MappedFileReader,
}

impl EventFileReader {
    /// Opens an event file for reading.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or memory-mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = MappedFileReader::open(path)?;
        debug!(
            "{}: mapped {} bytes",
            reader.path().display(),
            reader.len()
        );
        Ok(Self { reader })
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub fn file_size(&self) -> usize {
        self.reader.len()
    }

    /// Iterates over the events in file order.
    ///
    /// A malformed record yields an error; iteration stops after it.
    pub fn events(&self) -> impl Iterator<Item = Result<EventData>> + '_ {
        let path = self.reader.path();
        let mut failed = false;
        serde_json::Deserializer::from_slice(self.reader.as_bytes())
            .into_iter::<EventData>()
            .map_while(move |item| {
                if failed {
                    return None;
                }
                Some(item.map_err(|e| {
                    failed = true;
                    Error::InvalidFormat(format!("{}: {e}", path.display()))
                }))
            })
    }

    /// Reads every event in the file.
    ///
    /// # Errors
    /// Returns an error for the first malformed record.
    pub fn read_all(&self) -> Result<Vec<EventData>> {
        self.events().collect()
    }
}

/// Loads a conditions file.
///
/// The file holds either a per-run table (`runs`, `fallback`) or a single
/// calibration, which then applies to every run.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed, or holds invalid
/// constants.
pub fn read_conditions<P: AsRef<Path>>(path: P) -> Result<RunConditions> {
    let reader = MappedFileReader::open(path)?;
    let value: serde_json::Value = serde_json::from_slice(reader.as_bytes())?;
    let is_table = value
        .as_object()
        .is_some_and(|fields| fields.contains_key("runs") || fields.contains_key("fallback"));

    let conditions = if is_table {
        serde_json::from_value(value)?
    } else {
        let calibration: Calibration = serde_json::from_value(value)?;
        RunConditions::new().with_fallback(calibration)
    };
    conditions.validate()?;
    Ok(conditions)
}
