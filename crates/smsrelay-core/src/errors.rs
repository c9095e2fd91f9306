/// Core error type for the relay.
///
/// Adapter crates map their specific errors into this type so the core can
/// handle failures consistently (drop-and-log vs. fail startup).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("watch error: {0}")]
    Watch(String),

    #[error("sink error: {0}")]
    Sink(String),
}

pub type Result<T> = std::result::Result<T, Error>;
