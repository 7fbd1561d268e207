use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum EngineError {
    #[snafu(display("typing configuration is invalid: {details}"))]
    InvalidTypingConfig {
        stage: &'static str,
        details: String,
    },
    #[snafu(display("ambient configuration is invalid: {details}"))]
    InvalidAmbientConfig {
        stage: &'static str,
        details: String,
    },
    #[snafu(display("session worker is no longer running"))]
    SessionClosed { stage: &'static str },
}

pub type EngineResult<T> = Result<T, EngineError>;
