use super::{DestinationStore, EntryStat};
use crate::{FilesError, FilesResult};
use chrono::{DateTime, Utc};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// A destination backed by a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Opens `name` for writing, failing if it already exists.
    fn create_new(&self, name: &str) -> FilesResult<fs::File> {
        let target = self.path_of(name);
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => FilesError::TargetTaken(name.to_owned()),
                _ => FilesError::Io(io::Error::new(
                    e.kind(),
                    format!("Failed to create {}: {}", target.display(), e),
                )),
            })
    }

    /// Removes a partially written entry. The original write error is what gets reported.
    fn discard_partial(&self, name: &str) {
        let target = self.path_of(name);
        if let Err(e) = fs::remove_file(&target) {
            tracing::warn!("could not remove partial file {}: {}", target.display(), e);
        }
    }
}

impl DestinationStore for FsStore {
    fn location(&self) -> &Path {
        &self.root
    }

    fn ensure_exists(&self) -> FilesResult<()> {
        if self.root.exists() && !self.root.is_dir() {
            return Err(FilesError::DestinationUnavailable {
                path: self.root.clone(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "path is not a directory"),
            });
        }

        fs::create_dir_all(&self.root).map_err(|source| FilesError::DestinationUnavailable {
            path: self.root.clone(),
            source,
        })
    }

    fn exists(&self, name: &str) -> bool {
        self.path_of(name).exists()
    }

    fn list(&self) -> FilesResult<Vec<String>> {
        let mut names = Vec::new();
        if !self.root.exists() {
            return Ok(names);
        }
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.path().is_file() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => tracing::warn!("skipping non UTF-8 entry {:?}", raw),
            }
        }
        names.sort();
        Ok(names)
    }

    fn open(&self, name: &str) -> FilesResult<Box<dyn Read + '_>> {
        let file = fs::File::open(self.path_of(name))?;
        Ok(Box::new(io::BufReader::new(file)))
    }

    fn write_from_path(&self, source: &Path, name: &str) -> FilesResult<()> {
        let mut input = fs::File::open(source).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => FilesError::SourceNotFound(source.to_path_buf()),
            _ => FilesError::Io(io::Error::new(
                e.kind(),
                format!("Failed to open source file {}: {}", source.display(), e),
            )),
        })?;

        let mut output = self.create_new(name)?;
        if let Err(e) = io::copy(&mut input, &mut output).and_then(|_| output.flush()) {
            drop(output);
            self.discard_partial(name);
            return Err(FilesError::Io(e));
        }
        Ok(())
    }

    fn write_from_buffer(&self, bytes: &[u8], name: &str) -> FilesResult<()> {
        let mut output = self.create_new(name)?;
        if let Err(e) = output.write_all(bytes).and_then(|_| output.flush()) {
            drop(output);
            self.discard_partial(name);
            return Err(FilesError::Io(e));
        }
        Ok(())
    }

    fn stat(&self, name: &str) -> FilesResult<EntryStat> {
        let metadata = fs::metadata(self.path_of(name))?;
        Ok(EntryStat {
            size: metadata.len(),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
        })
    }
}
