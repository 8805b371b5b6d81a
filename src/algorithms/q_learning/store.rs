//! Persistence of learned state between episodes.

use std::cell::RefCell;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use ndarray::ArrayD;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::ModelError;

/// Everything that survives from one episode to the next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub table: ArrayD<f64>,
    pub episode: u64,
    pub epsilon: f64,
    pub learning_rate: f64,
}

/// Loads and saves a [`ModelSnapshot`] as one opaque unit.
pub trait ModelStore {
    /// Returns the stored snapshot.
    ///
    /// [`ModelError::Unavailable`] signals that nothing has been stored yet.
    fn load(&self) -> Result<ModelSnapshot, ModelError>;

    fn save(&self, snapshot: &ModelSnapshot) -> Result<(), ModelError>;
}

/// JSON file store with atomic replacement on save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ModelStore for JsonFileStore {
    fn load(&self) -> Result<ModelSnapshot, ModelError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(ModelError::Unavailable),
            Err(e) => return Err(ModelError::Io(e)),
        };
        let snapshot =
            serde_json::from_slice(&bytes).map_err(|e| ModelError::Corrupt(e.to_string()))?;
        debug!("Read model from {:?}", self.path);
        Ok(snapshot)
    }

    fn save(&self, snapshot: &ModelSnapshot) -> Result<(), ModelError> {
        let bytes =
            serde_json::to_vec(snapshot).map_err(|e| ModelError::Encode(e.to_string()))?;
        let temp_path = self.path.with_extension("tmp");

        let written = fs::write(&temp_path, bytes)
            .and_then(|()| fs::File::open(&temp_path)?.sync_all())
            .and_then(|()| fs::rename(&temp_path, &self.path));
        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&temp_path) {
                if cleanup.kind() != ErrorKind::NotFound {
                    warn!(error = %cleanup, "Failed to remove {:?}", temp_path);
                }
            }
            return Err(ModelError::Io(e));
        }

        debug!("Atomically wrote model to {:?}", self.path);
        Ok(())
    }
}

/// In-process store, mainly for tests and embedders with their own storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: RefCell<Option<ModelSnapshot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `snapshot`.
    pub fn with_snapshot(snapshot: ModelSnapshot) -> Self {
        Self {
            slot: RefCell::new(Some(snapshot)),
        }
    }

    pub fn snapshot(&self) -> Option<ModelSnapshot> {
        self.slot.borrow().clone()
    }
}

impl ModelStore for MemoryStore {
    fn load(&self) -> Result<ModelSnapshot, ModelError> {
        self.slot.borrow().clone().ok_or(ModelError::Unavailable)
    }

    fn save(&self, snapshot: &ModelSnapshot) -> Result<(), ModelError> {
        *self.slot.borrow_mut() = Some(snapshot.clone());
        Ok(())
    }
}

impl<S: ModelStore + ?Sized> ModelStore for &S {
    fn load(&self) -> Result<ModelSnapshot, ModelError> {
        (**self).load()
    }

    fn save(&self, snapshot: &ModelSnapshot) -> Result<(), ModelError> {
        (**self).save(snapshot)
    }
}
