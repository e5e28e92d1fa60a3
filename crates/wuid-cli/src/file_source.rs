use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Mutex,
};

use wuid::{EpochSource, RenewError};

/// An [`EpochSource`] persisting the last allocated epoch in a text file.
///
/// Each allocation reads the file, increments the value and atomically
/// replaces the file through a rename. Allocations within one process are
/// serialized; separate processes must not share a file without an external
/// lock.
#[derive(Debug)]
pub struct FileEpochSource {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FileEpochSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_last(&self) -> Result<u64, RenewError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(0),
            Ok(raw) => Ok(raw.trim().parse()?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(0),
            Err(err) => Err(err.into()),
        }
    }

    fn write_last(&self, value: u64) -> Result<(), RenewError> {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        fs::write(&tmp, format!("{value}\n"))?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl EpochSource for FileEpochSource {
    fn next_epoch(&self) -> Result<u64, RenewError> {
        let _guard = self
            .guard
            .lock()
            .map_err(|_| "epoch file lock poisoned")?;
        let next = self
            .read_last()?
            .checked_add(1)
            .ok_or("epoch counter exhausted")?;
        self.write_last(next)?;
        tracing::debug!(path = %self.path.display(), epoch = next, "allocated epoch");
        Ok(next)
    }
}
