use serde::{Deserialize, Serialize};

use crate::ambient::AmbientConfig;
use crate::error::EngineResult;
use crate::typing::TypingConfig;

/// All session tunables in one place, injected at launch.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub typing: TypingConfig,
    #[serde(default)]
    pub ambient: AmbientConfig,
}

impl EngineConfig {
    /// Validates every sub-config before a session is launched, so a bad
    /// tunable fails at the boundary instead of degrading mid-playback.
    pub fn validated(self) -> EngineResult<Self> {
        self.typing.validate()?;
        self.ambient.validate()?;
        Ok(self)
    }
}
