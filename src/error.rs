use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("cache unavailable: {0}")]
    CacheUnavailable(String),
    #[error("gravatar request failed")]
    Upstream,
}

impl ServiceError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Configuration(_) => 500,
            Self::Validation(_) => 400,
            Self::CacheUnavailable(_) => 503,
            Self::Upstream => 502,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("{0}")]
    Unavailable(String),
}

impl From<CacheError> for ServiceError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Unavailable(reason) => Self::CacheUnavailable(reason),
        }
    }
}
