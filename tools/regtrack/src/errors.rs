use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegressError {
    #[error("io error: {0}")]
    Io(String),
    #[error("store format error: {0}")]
    StoreFormat(String),
    #[error("inconsistent state: {0}")]
    InconsistentState(String),
    #[error("invalid config: {0}")]
    Config(String),
    #[error("cli error: {0}")]
    Cli(String),
    #[error("event stream error: {0}")]
    EventStream(String),
}
