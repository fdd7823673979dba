//! Dump-file writer.
//!
//! Serializes a buffer snapshot as plain text, one decimal value per line,
//! oldest sample first. The file is written to a temporary sibling and
//! renamed over the target, so a concurrent reader sees either the previous
//! dump or the new one in full, never a half-written file. Last writer wins.

use crate::data::Sample;
use crate::error::{AcqError, AppResult};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writer bound to a fixed dump path.
#[derive(Debug, Clone)]
pub struct DumpWriter {
    path: PathBuf,
}

impl DumpWriter {
    /// Writer that rewrites `path` on every dump.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The dump path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Replace the dump file with the given snapshot.
    pub fn write_snapshot(&self, samples: &[Sample]) -> AppResult<()> {
        let staging = self.staging_path();
        self.write_to(&staging, samples)
            .and_then(|()| fs::rename(&staging, &self.path))
            .map_err(|source| AcqError::Dump {
                path: self.path.clone(),
                source,
            })?;

        debug!(samples = samples.len(), path = %self.path.display(), "dump file replaced");
        Ok(())
    }

    fn write_to(&self, staging: &Path, samples: &[Sample]) -> std::io::Result<()> {
        let mut writer = BufWriter::new(File::create(staging)?);
        for sample in samples {
            writeln!(writer, "{sample}")?;
        }
        writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(values: impl IntoIterator<Item = u16>) -> Vec<Sample> {
        values
            .into_iter()
            .map(|v| Sample::new(v).expect("test value in range"))
            .collect()
    }

    #[test]
    fn dump_is_one_decimal_per_line_oldest_first() {
        let dir = tempfile::tempdir().expect("tempdir");
        let writer = DumpWriter::new(dir.path().join("buffer"));

        writer
            .write_snapshot(&samples([5, 0, 1023, 42]))
            .expect("dump");

        let text = fs::read_to_string(writer.path()).expect("read dump");
        assert_eq!(text, "5\n0\n1023\n42\n");
    }

    #[test]
    fn each_dump_fully_replaces_the_previous_one() {
        let dir = tempfile::tempdir().expect("tempdir");
        let writer = DumpWriter::new(dir.path().join("buffer"));

        writer.write_snapshot(&samples(0..100)).expect("first dump");
        writer.write_snapshot(&samples([7, 7, 7])).expect("second dump");

        let text = fs::read_to_string(writer.path()).expect("read dump");
        assert_eq!(text, "7\n7\n7\n");
        // the staging file does not linger
        assert!(!writer.staging_path().exists());
    }

    #[test]
    fn empty_snapshot_produces_an_empty_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let writer = DumpWriter::new(dir.path().join("buffer"));

        writer.write_snapshot(&[]).expect("dump");
        assert_eq!(fs::read_to_string(writer.path()).expect("read"), "");
    }

    #[test]
    fn unwritable_directory_reports_a_dump_error() {
        let writer = DumpWriter::new("/nonexistent-luxd-dir/buffer");
        assert!(matches!(
            writer.write_snapshot(&samples([1])),
            Err(AcqError::Dump { .. })
        ));
    }
}
