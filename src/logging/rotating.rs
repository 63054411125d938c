//! Size-rotated log file.
//!
//! `RotatingFile` is a plain blocking [`io::Write`] sink. The server never writes to
//! it from a runtime thread: [`super::file_writer`] moves it onto the dedicated
//! `tracing-appender` worker thread, which is its only writer.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Append-only log file that rotates itself by size.
///
/// Before a write that would bring the active file to `max_bytes` or more, the
/// files are shifted (`path.N-1 -> path.N`, ..., `path -> path.1`, dropping anything
/// beyond `max_files`) and a fresh empty file is started. A `max_bytes` of zero
/// disables rotation.
#[derive(Debug)]
pub struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    max_files: usize,
    file: Option<File>,
    size: u64,
}

impl RotatingFile {
    /// Open (or create) the log file, creating parent directories as needed.
    pub fn open(path: impl Into<PathBuf>, max_bytes: u64, max_files: usize) -> io::Result<Self> {
        let mut sink = Self {
            path: path.into(),
            max_bytes,
            max_files: max_files.max(1),
            file: None,
            size: 0,
        };
        sink.open_handle()?;
        Ok(sink)
    }

    /// Path of the active log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes currently in the active file.
    pub fn size(&self) -> u64 {
        self.size
    }

    fn open_handle(&mut self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        self.size = file.metadata().map(|m| m.len()).unwrap_or(0);
        self.file = Some(file);
        Ok(())
    }

    fn rotated_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }

    fn rotate_if_needed(&mut self, incoming: u64) -> io::Result<()> {
        if self.max_bytes == 0 || self.size + incoming < self.max_bytes {
            return Ok(());
        }

        self.file = None;

        for index in (0..self.max_files).rev() {
            let src = if index == 0 {
                self.path.clone()
            } else {
                self.rotated_path(index)
            };
            if !src.exists() {
                continue;
            }
            let dst = self.rotated_path(index + 1);
            if dst.exists() {
                fs::remove_file(&dst)?;
            }
            fs::rename(&src, &dst)?;
        }

        File::create(&self.path)?;
        self.open_handle()
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.rotate_if_needed(buf.len() as u64)?;
        if self.file.is_none() {
            self.open_handle()?;
        }
        let Some(file) = self.file.as_mut() else {
            return Err(io::Error::new(io::ErrorKind::NotFound, "log file unavailable"));
        };

        match file.write_all(buf) {
            Ok(()) => {
                self.size += buf.len() as u64;
                Ok(buf.len())
            }
            Err(e) => {
                // reopened on the next write
                self.file = None;
                Err(e)
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}
