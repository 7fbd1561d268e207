pub mod error;
pub mod ids;
pub mod memory;
pub mod snapshot;
pub mod types;

pub use error::{StoreError, StoreResult};
pub use ids::{RoomId, ScriptId};
pub use memory::MemoryStore;
pub use snapshot::{SnapshotPayload, SnapshotStore};
pub use types::{DEFAULT_ROOM_NAME, NewRoom, RoomPatch, RoomRecord, ScriptDocument};

use chatstage_engine::Script;

pub trait ScriptStore: Send + Sync {
    fn save_script(&self, script: Script) -> StoreResult<ScriptDocument>;
    fn list_scripts(&self) -> StoreResult<Vec<ScriptDocument>>;
    fn get_script(&self, id: ScriptId) -> StoreResult<Option<ScriptDocument>>;
    fn delete_script(&self, id: ScriptId) -> StoreResult<()>;
}

pub trait RoomStore: Send + Sync {
    fn create_room(&self, input: NewRoom) -> StoreResult<RoomRecord>;
    fn list_rooms(&self) -> StoreResult<Vec<RoomRecord>>;
    fn get_room(&self, id: RoomId) -> StoreResult<Option<RoomRecord>>;
    fn update_room(&self, id: RoomId, patch: RoomPatch) -> StoreResult<RoomRecord>;
    fn assign_script(&self, id: RoomId, script_id: Option<ScriptId>) -> StoreResult<RoomRecord>;
    fn delete_room(&self, id: RoomId) -> StoreResult<()>;
}

pub trait Store: ScriptStore + RoomStore {}

impl<T> Store for T where T: ScriptStore + RoomStore {}
