use std::future::Future;
use std::pin::Pin;

use chatstage_engine::{Persona, Script};

use crate::error::GenerateResult;

/// Rough pacing used to turn a requested duration into a line budget.
const LINES_PER_MINUTE: usize = 6;
/// Floor/ceiling for one generated conversation.
const MIN_LINES: usize = 4;
const MAX_LINES: usize = 120;

/// Structured request handed to a script generator: who talks, about what,
/// in which register, and roughly how long the staged conversation runs.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptRequest {
    pub personas: Vec<Persona>,
    /// Conversation topic; substituted into `{topic}` placeholders.
    pub theme: String,
    pub tone: String,
    pub duration_minutes: u32,
}

impl ScriptRequest {
    pub fn new(personas: Vec<Persona>, theme: impl Into<String>) -> Self {
        Self {
            personas,
            theme: theme.into(),
            tone: "casual".to_string(),
            duration_minutes: 5,
        }
    }

    pub fn with_tone(mut self, tone: impl Into<String>) -> Self {
        self.tone = tone.into();
        self
    }

    pub fn with_duration_minutes(mut self, duration_minutes: u32) -> Self {
        self.duration_minutes = duration_minutes;
        self
    }

    /// Line budget implied by the requested duration.
    pub fn line_budget(&self) -> usize {
        (self.duration_minutes as usize * LINES_PER_MINUTE).clamp(MIN_LINES, MAX_LINES)
    }
}

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One opaque text-generation collaborator.
///
/// Implementations either call out to a provider or synthesize locally; a
/// parse/shape failure surfaces one descriptive error and applies nothing.
/// Dropping the returned future cancels in-flight provider work.
pub trait ScriptGenerator: Send + Sync {
    fn id(&self) -> &str;
    fn generate<'a>(&'a self, request: ScriptRequest) -> BoxFuture<'a, GenerateResult<Script>>;
}
