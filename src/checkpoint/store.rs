//! Checkpoint files keyed by container short id

use crate::checkpoint::CheckpointRecord;
use crate::error::CheckpointError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Directory of checkpoint files, one per container
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the checkpoint file for a container
    pub fn path_for(&self, container_id: &str) -> PathBuf {
        self.dir.join(container_id)
    }

    pub fn exists(&self, container_id: &str) -> bool {
        self.path_for(container_id).is_file()
    }

    /// Read and decode a container's checkpoint
    pub fn load(&self, container_id: &str) -> Result<CheckpointRecord, CheckpointError> {
        let path = self.path_for(container_id);
        let data = std::fs::read(&path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => CheckpointError::NotFound { path: path.clone() },
            _ => CheckpointError::Read {
                path: path.clone(),
                source,
            },
        })?;

        let record: CheckpointRecord =
            serde_json::from_slice(&data).map_err(|source| CheckpointError::Malformed {
                path: path.clone(),
                source,
            })?;

        validate(&record).map_err(|reason| CheckpointError::Invalid { path, reason })?;
        Ok(record)
    }
}

fn validate(record: &CheckpointRecord) -> Result<(), String> {
    if record.netns.is_empty() {
        return Err("netns is empty".to_string());
    }
    if record.ifname.is_empty() {
        return Err("ifname is empty".to_string());
    }
    if record.result.interfaces.is_empty() {
        return Err("result has no interfaces".to_string());
    }
    Ok(())
}
