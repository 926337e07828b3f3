#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed frame: element {index} is not an object (got {kind})")]
    MalformedFrame { index: usize, kind: &'static str },
}
