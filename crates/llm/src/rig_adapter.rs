use futures::StreamExt;
use rig::completion::{CompletionModel, Message as RigMessage};
use rig::prelude::CompletionClient;
use rig::providers::openai;
use snafu::{ResultExt, ensure};

use chatstage_engine::Script;

use crate::error::{
    CompletionsFailedSnafu, EmptyRosterSnafu, GenerateResult, HttpClientSnafu, MissingApiKeySnafu,
};
use crate::generate::{BoxFuture, ScriptGenerator, ScriptRequest};
use crate::parse::{lines_to_script, parse_generated_lines};
use crate::prompt::{SCRIPT_SYSTEM_PREAMBLE, build_script_prompt};

pub const RIG_OPENAI_PROVIDER_ID: &str = "openai";

/// Connection settings for the generation provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub provider_id: String,
    pub api_key: String,
    pub endpoint: String,
    pub model_id: String,
    pub temperature: Option<f64>,
}

impl ProviderConfig {
    pub fn new(
        provider_id: impl Into<String>,
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model_id: impl Into<String>,
    ) -> Self {
        Self {
            provider_id: provider_id.into().trim().to_string(),
            api_key: api_key.into().trim().to_string(),
            endpoint: endpoint.into().trim().to_string(),
            model_id: model_id.into().trim().to_string(),
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Script generator backed by a rig OpenAI-compatible provider.
///
/// The provider streams free text; the full reply is accumulated and then
/// parsed under the strict line contract, so a malformed response rejects as
/// one descriptive error without partially applying anything.
pub struct RigScriptGenerator {
    config: ProviderConfig,
}

impl RigScriptGenerator {
    pub fn new(config: ProviderConfig) -> GenerateResult<Self> {
        ensure!(
            !config.api_key.is_empty(),
            MissingApiKeySnafu {
                stage: "rig-generator-new",
                provider_id: config.provider_id.clone(),
            }
        );

        Ok(Self { config })
    }

    fn build_client(config: &ProviderConfig) -> GenerateResult<openai::Client> {
        let mut builder = openai::Client::builder().api_key(config.api_key.as_str());
        if !config.endpoint.is_empty() {
            builder = builder.base_url(config.endpoint.as_str());
        }
        builder.build().context(HttpClientSnafu {
            stage: "build-client",
        })
    }

    /// Streams one completion to the end and returns the accumulated text.
    /// Dropping the future mid-stream cancels the provider call.
    async fn collect_completion(&self, prompt: String) -> GenerateResult<String> {
        let client = Self::build_client(&self.config)?;
        let model = client.completion_model(self.config.model_id.clone());

        let mut builder = model
            .completion_request(RigMessage::user(prompt))
            .preamble(SCRIPT_SYSTEM_PREAMBLE.to_string());
        if let Some(temperature) = self.config.temperature {
            builder = builder.temperature(temperature);
        }

        let mut stream = builder.stream().await.context(CompletionsFailedSnafu {
            stage: "open-stream",
        })?;

        let mut accumulated = String::new();
        while let Some(item) = stream.next().await {
            let item = item.context(CompletionsFailedSnafu {
                stage: "stream-chunk",
            })?;
            if let rig::streaming::StreamedAssistantContent::Text(text) = item {
                accumulated.push_str(&text.text);
            }
        }

        tracing::debug!(
            provider_id = %self.config.provider_id,
            model_id = %self.config.model_id,
            reply_chars = accumulated.len(),
            "collected generation reply"
        );
        Ok(accumulated)
    }
}

impl ScriptGenerator for RigScriptGenerator {
    fn id(&self) -> &str {
        RIG_OPENAI_PROVIDER_ID
    }

    fn generate<'a>(&'a self, request: ScriptRequest) -> BoxFuture<'a, GenerateResult<Script>> {
        Box::pin(async move {
            ensure!(
                !request.personas.is_empty(),
                EmptyRosterSnafu {
                    stage: "rig-generate",
                }
            );

            let prompt = build_script_prompt(&request);
            let raw = self.collect_completion(prompt).await?;
            let lines = parse_generated_lines(&raw)?;
            lines_to_script(request.theme.clone(), &request.personas, lines)
        })
    }
}
