//! JSON array file sink.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use vehicle_domain::{VehicleObserver, VehicleSnapshot, VehicleUpdate};

use crate::error::{PublishError, Result};

/// Appends every update to a file holding a single JSON array.
///
/// The opening bracket is written on creation and the closing bracket on
/// [`FileSink::finish`] or drop, so the file is valid JSON once closed.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    entries: usize,
}

impl FileSink {
    /// Create (or truncate) the output file and write the array opening.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut writer = BufWriter::new(File::create(&path)?);
        writer.write_all(b"[\n")?;
        writer.flush()?;

        info!(path = %path.display(), "File sink initialized");
        Ok(Self {
            path,
            writer: Some(writer),
            entries: 0,
        })
    }

    /// Append one payload as the next array element.
    pub fn publish(&mut self, update: &VehicleUpdate) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| PublishError::Closed(self.path.display().to_string()))?;

        let payload = serde_json::to_string(update)?;
        if self.entries > 0 {
            writer.write_all(b",\n")?;
        }
        writer.write_all(b"  ")?;
        writer.write_all(payload.as_bytes())?;
        writer.flush()?;

        self.entries += 1;
        Ok(())
    }

    /// Close the array and the file. Further publishes fail.
    pub fn finish(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            if self.entries > 0 {
                writer.write_all(b"\n")?;
            }
            writer.write_all(b"]\n")?;
            writer.flush()?;
            info!(path = %self.path.display(), entries = self.entries, "File sink closed");
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of elements written so far
    pub const fn entries(&self) -> usize {
        self.entries
    }
}

impl VehicleObserver for FileSink {
    fn name(&self) -> &str {
        "file"
    }

    fn notify(&mut self, snapshot: &VehicleSnapshot) -> vehicle_domain::Result<()> {
        Ok(self.publish(&VehicleUpdate::now(snapshot))?)
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            warn!(path = %self.path.display(), error = %e, "Failed to close file sink");
        }
    }
}
