//! Backings for the retained fleet state.
//!
//! The dispatcher never persists anything. Whoever drives it keeps the state
//! between cycles through a [`StateStore`]: in process memory (the state dies
//! with the process) or in a JSON file that survives restarts.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::StoreError;
use crate::model::FleetState;
use crate::traits::StateStore;

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<FleetState>,
}

impl MemoryStore {
    pub fn new(state: FleetState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<FleetState, StoreError> {
        Ok(self.state.lock().clone())
    }

    fn save(&self, state: &FleetState) -> Result<(), StoreError> {
        *self.state.lock() = state.clone();
        Ok(())
    }
}

/// Fleet state kept as pretty-printed JSON in a single file.
///
/// A missing file reads as an empty fleet. Writes go through a temporary
/// file and a rename so a crash never leaves half a document behind.
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

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<FleetState, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(FleetState::default()),
            Err(err) => return Err(self.io_error(err)),
        };

        serde_json::from_str(&contents).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, state: &FleetState) -> Result<(), StoreError> {
        let tmp_path = self.path.with_extension("tmp");
        let file = File::create(&tmp_path).map_err(|err| self.io_error(err))?;
        let mut writer = BufWriter::new(file);

        serde_json::to_writer_pretty(&mut writer, state).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        writer.flush().map_err(|err| self.io_error(err))?;
        drop(writer);

        fs::rename(&tmp_path, &self.path).map_err(|err| self.io_error(err))
    }
}
