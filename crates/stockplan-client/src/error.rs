use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("{path} returned {status}: {body}")]
  Status {
    path:   String,
    status: u16,
    body:   String,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
