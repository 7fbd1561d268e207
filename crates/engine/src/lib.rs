pub mod ambient;
pub mod config;
pub mod error;
pub mod events;
pub mod ids;
pub mod message;
pub mod playback;
pub mod projection;
pub mod script;
pub mod session;
pub mod surface;
pub mod typing;

pub use ambient::{AmbientConfig, AmbientEvent, AmbientSampler};
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use events::{MessageSentHook, SessionEvent, SessionHooks};
pub use ids::{MessageId, SYSTEM_SPEAKER, SpeakerId, USER_SPEAKER};
pub use message::{LiveMessage, Origin, ReplyPreview};
pub use playback::{Effect, Epoch, PlaybackMachine, PlaybackPhase, StepStage};
pub use projection::{
    BubbleAlignment, BubbleKind, ChatBubble, ReplyLine, TypingRow, project, project_typing,
};
pub use script::{Persona, Script, ScriptedMessage};
pub use session::{
    SessionEventStream, SessionHandle, SessionLaunch, SessionSnapshot, SessionWorker,
    start_session, start_session_seeded,
};
pub use surface::{RestrictedFeature, accept_send_text};
pub use typing::{TypingConfig, TypingEstimator};
