use thiserror::Error;

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Queue closed: {0}")]
    QueueClosed(&'static str),

    #[error("Invalid lifecycle transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Join error: {0}")]
    Join(String),
}

pub type Result<T> = std::result::Result<T, PoolError>;
