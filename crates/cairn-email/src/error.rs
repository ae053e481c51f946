use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("not signed in")]
    Unauthenticated,
    #[error("invalid data: {0}")]
    Data(String),
}
