use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

use chatstage_engine::Script;

use super::error::{NotFoundSnafu, StoreResult};
use super::ids::{RoomId, ScriptId};
use super::snapshot::SnapshotPayload;
use super::types::{DEFAULT_ROOM_NAME, NewRoom, RoomPatch, RoomRecord, ScriptDocument};
use super::{RoomStore, ScriptStore};

/// In-memory store backing the whole client-local application state.
///
/// Persistence beyond the best-effort snapshot is explicitly out of scope;
/// this is the single source of truth while the process lives.
#[derive(Debug, Default)]
pub struct MemoryStore {
    scripts: RwLock<HashMap<ScriptId, ScriptDocument>>,
    rooms: RwLock<HashMap<RoomId, RoomRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from a previously captured snapshot.
    pub fn from_snapshot(payload: SnapshotPayload) -> Self {
        let store = Self::new();
        {
            let mut scripts = store.scripts.write().unwrap_or_else(|poison| poison.into_inner());
            for document in payload.scripts {
                scripts.insert(document.id, document);
            }
        }
        {
            let mut rooms = store.rooms.write().unwrap_or_else(|poison| poison.into_inner());
            for room in payload.rooms {
                rooms.insert(room.id, room);
            }
        }
        store
    }

    /// Captures the current state for the best-effort snapshot file.
    pub fn to_snapshot(&self) -> SnapshotPayload {
        let mut payload = SnapshotPayload {
            scripts: self
                .scripts
                .read()
                .unwrap_or_else(|poison| poison.into_inner())
                .values()
                .cloned()
                .collect(),
            rooms: self
                .rooms
                .read()
                .unwrap_or_else(|poison| poison.into_inner())
                .values()
                .cloned()
                .collect(),
        };
        payload
            .scripts
            .sort_by(|left, right| sort_recent_desc(left.updated_at_unix_seconds, right.updated_at_unix_seconds));
        payload
            .rooms
            .sort_by(|left, right| sort_recent_desc(left.updated_at_unix_seconds, right.updated_at_unix_seconds));
        payload
    }
}

impl ScriptStore for MemoryStore {
    fn save_script(&self, script: Script) -> StoreResult<ScriptDocument> {
        let document = ScriptDocument {
            id: ScriptId::new_v7(),
            script,
            updated_at_unix_seconds: current_unix_timestamp_seconds(),
        };
        self.scripts
            .write()
            .unwrap_or_else(|poison| poison.into_inner())
            .insert(document.id, document.clone());
        Ok(document)
    }

    fn list_scripts(&self) -> StoreResult<Vec<ScriptDocument>> {
        let mut documents: Vec<ScriptDocument> = self
            .scripts
            .read()
            .unwrap_or_else(|poison| poison.into_inner())
            .values()
            .cloned()
            .collect();
        documents.sort_by(|left, right| {
            sort_recent_desc(left.updated_at_unix_seconds, right.updated_at_unix_seconds)
        });
        Ok(documents)
    }

    fn get_script(&self, id: ScriptId) -> StoreResult<Option<ScriptDocument>> {
        Ok(self
            .scripts
            .read()
            .unwrap_or_else(|poison| poison.into_inner())
            .get(&id)
            .cloned())
    }

    fn delete_script(&self, id: ScriptId) -> StoreResult<()> {
        let removed = self
            .scripts
            .write()
            .unwrap_or_else(|poison| poison.into_inner())
            .remove(&id);
        if removed.is_none() {
            return NotFoundSnafu {
                stage: "delete-script",
                entity: "script",
                id: id.to_string(),
            }
            .fail();
        }

        // Unbind any room that pointed at the removed script.
        let mut rooms = self.rooms.write().unwrap_or_else(|poison| poison.into_inner());
        for room in rooms.values_mut() {
            if room.script_id == Some(id) {
                room.script_id = None;
            }
        }
        Ok(())
    }
}

impl RoomStore for MemoryStore {
    fn create_room(&self, input: NewRoom) -> StoreResult<RoomRecord> {
        let mut name = input.name;
        if name.trim().is_empty() {
            name = DEFAULT_ROOM_NAME.to_string();
        }

        let room = RoomRecord {
            id: RoomId::new_v7(),
            name,
            theme: input.theme,
            script_id: None,
            updated_at_unix_seconds: current_unix_timestamp_seconds(),
        };
        self.rooms
            .write()
            .unwrap_or_else(|poison| poison.into_inner())
            .insert(room.id, room.clone());
        Ok(room)
    }

    fn list_rooms(&self) -> StoreResult<Vec<RoomRecord>> {
        let mut rooms: Vec<RoomRecord> = self
            .rooms
            .read()
            .unwrap_or_else(|poison| poison.into_inner())
            .values()
            .cloned()
            .collect();
        rooms.sort_by(|left, right| {
            sort_recent_desc(left.updated_at_unix_seconds, right.updated_at_unix_seconds)
        });
        Ok(rooms)
    }

    fn get_room(&self, id: RoomId) -> StoreResult<Option<RoomRecord>> {
        Ok(self
            .rooms
            .read()
            .unwrap_or_else(|poison| poison.into_inner())
            .get(&id)
            .cloned())
    }

    fn update_room(&self, id: RoomId, patch: RoomPatch) -> StoreResult<RoomRecord> {
        let mut rooms = self.rooms.write().unwrap_or_else(|poison| poison.into_inner());
        let Some(room) = rooms.get_mut(&id) else {
            return NotFoundSnafu {
                stage: "update-room",
                entity: "room",
                id: id.to_string(),
            }
            .fail();
        };

        if let Some(name) = patch.name
            && !name.trim().is_empty()
        {
            room.name = name;
        }
        if let Some(theme) = patch.theme {
            room.theme = theme;
        }
        room.updated_at_unix_seconds = current_unix_timestamp_seconds();
        Ok(room.clone())
    }

    fn assign_script(&self, id: RoomId, script_id: Option<ScriptId>) -> StoreResult<RoomRecord> {
        if let Some(script_id) = script_id
            && self.get_script(script_id)?.is_none()
        {
            return NotFoundSnafu {
                stage: "assign-script",
                entity: "script",
                id: script_id.to_string(),
            }
            .fail();
        }

        let mut rooms = self.rooms.write().unwrap_or_else(|poison| poison.into_inner());
        let Some(room) = rooms.get_mut(&id) else {
            return NotFoundSnafu {
                stage: "assign-script",
                entity: "room",
                id: id.to_string(),
            }
            .fail();
        };

        room.script_id = script_id;
        room.updated_at_unix_seconds = current_unix_timestamp_seconds();
        Ok(room.clone())
    }

    fn delete_room(&self, id: RoomId) -> StoreResult<()> {
        let removed = self
            .rooms
            .write()
            .unwrap_or_else(|poison| poison.into_inner())
            .remove(&id);
        if removed.is_none() {
            return NotFoundSnafu {
                stage: "delete-room",
                entity: "room",
                id: id.to_string(),
            }
            .fail();
        }
        Ok(())
    }
}

fn sort_recent_desc(left: u64, right: u64) -> std::cmp::Ordering {
    right.cmp(&left)
}

fn current_unix_timestamp_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_secs())
}
