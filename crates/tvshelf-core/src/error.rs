use thiserror::Error;

#[derive(Debug, Error)]
pub enum TvShelfError {
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database actor closed")]
    Closed,
}
