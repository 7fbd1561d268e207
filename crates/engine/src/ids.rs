use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier for one message in a session's visible stream.
///
/// Scripted messages carry ids assigned at authoring time; messages injected
/// at runtime (ambient events, user sends) are minted from a session-local
/// counter that starts above the script's maximum id.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct MessageId(pub u64);

impl MessageId {
    /// Creates a typed message identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Reference key for a persona.
///
/// `"system"` and `"user"` are reserved sentinel speakers: the former tags
/// synthetic notices and promotional injections, the latter tags messages
/// authored live by the operator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeakerId(String);

/// Reserved speaker id for synthetic system/promotional messages.
pub const SYSTEM_SPEAKER: &str = "system";
/// Reserved speaker id for live operator messages.
pub const USER_SPEAKER: &str = "user";

impl SpeakerId {
    /// Creates a typed speaker identifier.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the reserved system sentinel speaker.
    pub fn system() -> Self {
        Self(SYSTEM_SPEAKER.to_string())
    }

    /// Returns the reserved user sentinel speaker.
    pub fn user() -> Self {
        Self(USER_SPEAKER.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_system(&self) -> bool {
        self.0 == SYSTEM_SPEAKER
    }

    pub fn is_user(&self) -> bool {
        self.0 == USER_SPEAKER
    }

    /// True for sentinel speakers that must not appear in persona rosters.
    pub fn is_reserved(&self) -> bool {
        self.is_system() || self.is_user()
    }
}

impl fmt::Display for SpeakerId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl From<&str> for SpeakerId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for SpeakerId {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}
