use std::cell::RefCell;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::ProfileError;

/// Nonvolatile storage for the serialized profiles.
///
/// Storage is best effort: implementations log failures instead of returning
/// them, and the in-memory state remains authoritative.
pub trait Storage {
    /// Replace the stored text.
    fn save(&self, data: &str);

    /// The stored text, if any.
    fn load(&self) -> Option<String>;
}

/// Storage that lives as long as the value does.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    data: RefCell<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage preloaded with `data`.
    pub fn with_data(data: impl Into<String>) -> Self {
        Self {
            data: RefCell::new(Some(data.into())),
        }
    }
}

impl Storage for MemoryStorage {
    fn save(&self, data: &str) {
        *self.data.borrow_mut() = Some(data.to_string());
    }

    fn load(&self) -> Option<String> {
        self.data.borrow().clone()
    }
}

/// Storage backed by a single file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn try_save(&self, data: &str) -> Result<(), ProfileError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, data)?;
        debug!(path = %self.path.display(), bytes = data.len(), "saved profiles");
        Ok(())
    }

    /// Read the file. A missing file is not an error.
    pub fn try_load(&self) -> Result<Option<String>, ProfileError> {
        match fs::read_to_string(&self.path) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

impl Storage for FileStorage {
    fn save(&self, data: &str) {
        if let Err(err) = self.try_save(data) {
            warn!(path = %self.path.display(), error = %err, "failed to save profiles");
        }
    }

    fn load(&self) -> Option<String> {
        self.try_load().unwrap_or_else(|err| {
            warn!(path = %self.path.display(), error = %err, "failed to load profiles");
            None
        })
    }
}
