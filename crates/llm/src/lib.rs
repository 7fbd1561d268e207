mod error;
mod generate;
mod local;
mod parse;
mod prompt;
mod rig_adapter;

pub use error::{GenerateError, GenerateResult};
pub use generate::{BoxFuture, ScriptGenerator, ScriptRequest};
pub use local::{LOCAL_PROVIDER_ID, LocalScriptGenerator, PhrasePools};
pub use parse::{GeneratedLine, lines_to_script, parse_generated_lines};
pub use prompt::{SCRIPT_SYSTEM_PREAMBLE, build_script_prompt};
pub use rig_adapter::{ProviderConfig, RIG_OPENAI_PROVIDER_ID, RigScriptGenerator};

use std::sync::Arc;

/// Builds a generator for the given provider id; unknown ids fall back to
/// the offline local generator so a demo room always has content.
pub fn create_generator(config: Option<ProviderConfig>) -> GenerateResult<Arc<dyn ScriptGenerator>> {
    match config {
        Some(config) if !config.api_key.is_empty() => {
            Ok(Arc::new(RigScriptGenerator::new(config)?))
        }
        _ => Ok(Arc::new(LocalScriptGenerator::default())),
    }
}
