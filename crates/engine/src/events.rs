use std::fmt;
use std::sync::Arc;

use crate::ids::{MessageId, SpeakerId};
use crate::message::LiveMessage;
use crate::playback::PlaybackPhase;
use crate::surface::RestrictedFeature;

/// Events emitted by a running session, in occurrence order.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    PhaseChanged { phase: PlaybackPhase },
    TypingStarted { speaker_id: SpeakerId },
    TypingStopped { speaker_id: SpeakerId },
    /// Fired for every message that becomes visible, regardless of origin.
    MessageRevealed { message: LiveMessage },
    /// Fired additionally for user-originated sends, so hosts can forward
    /// or persist them.
    MessageSent { message: LiveMessage },
    ReplyTargetChanged { target: Option<MessageId> },
    /// Exactly one signal per gated invocation; the action never ran.
    FeatureRestricted { feature: RestrictedFeature },
    SessionReset,
}

/// Callback invoked for every user-originated send.
pub type MessageSentHook = Arc<dyn Fn(&LiveMessage) + Send + Sync>;

/// Host integration hooks, injected at launch. No ambient globals: a host
/// that wants to persist or forward operator messages registers here.
#[derive(Default, Clone)]
pub struct SessionHooks {
    pub on_message_sent: Option<MessageSentHook>,
}

impl SessionHooks {
    pub fn with_on_message_sent(
        mut self,
        hook: impl Fn(&LiveMessage) + Send + Sync + 'static,
    ) -> Self {
        self.on_message_sent = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for SessionHooks {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SessionHooks")
            .field("on_message_sent", &self.on_message_sent.is_some())
            .finish()
    }
}
