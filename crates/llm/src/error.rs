use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum GenerateError {
    #[snafu(display("missing API key for provider '{provider_id}'"))]
    MissingApiKey {
        stage: &'static str,
        provider_id: String,
    },
    #[snafu(display("script request has no personas to cast"))]
    EmptyRoster { stage: &'static str },
    #[snafu(display("http client failed on `{stage}`, {source}"))]
    HttpClient {
        stage: &'static str,
        source: rig::http_client::Error,
    },
    #[snafu(display("completions failed on `{stage}`, {source}"))]
    CompletionsFailed {
        stage: &'static str,
        source: rig::completion::CompletionError,
    },
    #[snafu(display("generated content is not a valid JSON line array: {details}"))]
    InvalidGeneratedJson {
        stage: &'static str,
        details: String,
    },
    #[snafu(display("generated line {index} is malformed: {details}"))]
    MalformedGeneratedLine {
        stage: &'static str,
        index: usize,
        details: String,
    },
    #[snafu(display("generated speaker '{speaker}' is not in the persona roster"))]
    UnknownGeneratedSpeaker {
        stage: &'static str,
        speaker: String,
    },
    #[snafu(display("generation produced no lines"))]
    EmptyGeneration { stage: &'static str },
}

pub type GenerateResult<T> = Result<T, GenerateError>;
