use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use super::error::{
    CreateSnapshotDirectorySnafu, ParseSnapshotSnafu, ReadSnapshotSnafu, SerializeSnapshotSnafu,
    StoreResult, WriteSnapshotSnafu,
};
use super::types::{RoomRecord, ScriptDocument};

const DEFAULT_SNAPSHOT_RELATIVE_PATH: &str = ".chatstage/snapshot.json";

/// Everything the snapshot file holds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SnapshotPayload {
    #[serde(default)]
    pub rooms: Vec<RoomRecord>,
    #[serde(default)]
    pub scripts: Vec<ScriptDocument>,
}

/// Best-effort local snapshot of the in-memory stores.
///
/// The contract is deliberately weak: a failed save is a logged warning, a
/// missing or corrupt file loads as empty state. Nothing here may take the
/// application down.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new(PathBuf::from(DEFAULT_SNAPSHOT_RELATIVE_PATH))
    }
}

impl SnapshotStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saves the payload, downgrading any failure to a warning.
    pub fn save_best_effort(&self, payload: &SnapshotPayload) {
        if let Err(error) = self.save(payload) {
            tracing::warn!(
                path = %self.path.display(),
                error = %error,
                "snapshot save failed; continuing without persistence"
            );
        }
    }

    /// Loads the payload, falling back to empty state on any failure.
    pub fn load_or_default(&self) -> SnapshotPayload {
        match self.load() {
            Ok(payload) => payload,
            Err(error) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %error,
                    "snapshot load failed; starting from empty state"
                );
                SnapshotPayload::default()
            }
        }
    }

    fn save(&self, payload: &SnapshotPayload) -> StoreResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).context(CreateSnapshotDirectorySnafu {
                stage: "create-snapshot-directory",
                path: parent.display().to_string(),
            })?;
        }

        let serialized = serde_json::to_string_pretty(payload).context(SerializeSnapshotSnafu {
            stage: "serialize-snapshot",
        })?;
        std::fs::write(&self.path, serialized).context(WriteSnapshotSnafu {
            stage: "write-snapshot",
            path: self.path.display().to_string(),
        })
    }

    fn load(&self) -> StoreResult<SnapshotPayload> {
        if !self.path.exists() {
            return Ok(SnapshotPayload::default());
        }

        let content = std::fs::read_to_string(&self.path).context(ReadSnapshotSnafu {
            stage: "read-snapshot",
            path: self.path.display().to_string(),
        })?;
        serde_json::from_str(&content).context(ParseSnapshotSnafu {
            stage: "parse-snapshot",
            path: self.path.display().to_string(),
        })
    }
}
