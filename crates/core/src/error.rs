use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("empty input: {0}")]
    EmptyInput(&'static str),
    #[error("dimension mismatch: expected {expected}, got {actual} ({context})")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("sampling error: {0}")]
    Sampling(String),
    #[error("serde json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;

impl From<rand::distributions::WeightedError> for SimError {
    fn from(value: rand::distributions::WeightedError) -> Self {
        Self::Sampling(value.to_string())
    }
}

impl From<rand_distr::DirichletError> for SimError {
    fn from(value: rand_distr::DirichletError) -> Self {
        Self::Sampling(value.to_string())
    }
}

impl From<rand_distr::GammaError> for SimError {
    fn from(value: rand_distr::GammaError) -> Self {
        Self::Sampling(value.to_string())
    }
}
