use crate::role::Role;

/// Errors raised while building or solving an arrangement model.
#[derive(Debug, thiserror::Error)]
pub enum ArrangementError {
    #[error("flower '{flower}' has a weight but no candidate length list")]
    MissingLengths { flower: String },
    #[error("flower '{flower}' has candidate lengths but no weight")]
    MissingWeight { flower: String },
    #[error("flower catalog is empty")]
    EmptyCatalog,
    #[error("vessel dimensions must be positive and finite (width={width}, height={height})")]
    InvalidVessel { width: f64, height: f64 },
    #[error("num_reads must be at least 1")]
    InvalidReadCount,
    #[error("base arrangement has no {field} for role {role}")]
    MissingBaseValue { role: Role, field: &'static str },
    #[error("sampler failed: {0}")]
    Sampler(String),
}

pub type Result<T> = std::result::Result<T, ArrangementError>;
