use serde::{Deserialize, Serialize};

use chatstage_engine::Script;

use super::ids::{RoomId, ScriptId};

/// Default room name used when inputs arrive empty.
pub const DEFAULT_ROOM_NAME: &str = "New Room";

/// A stored, authored script document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptDocument {
    pub id: ScriptId,
    pub script: Script,
    pub updated_at_unix_seconds: u64,
}

/// A simulated chat room: presentation shell plus an optional script binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomRecord {
    pub id: RoomId,
    pub name: String,
    pub theme: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_id: Option<ScriptId>,
    pub updated_at_unix_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRoom {
    pub name: String,
    pub theme: String,
}

impl NewRoom {
    pub fn new(name: impl Into<String>, theme: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            theme: theme.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoomPatch {
    pub name: Option<String>,
    pub theme: Option<String>,
}
