use std::path::PathBuf;

/// Errors raised while parsing stored records or loading scoring settings.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown activity kind: {0}")]
    UnknownActivityKind(String),

    #[error("unknown payment status: {0}")]
    UnknownPaymentStatus(String),

    #[error("unknown member status: {0}")]
    UnknownMemberStatus(String),

    #[error("unknown metrics period: {0}")]
    UnknownPeriod(String),

    #[error("unknown risk level: {0}")]
    UnknownRiskLevel(String),

    #[error("unknown risk factor: {0}")]
    UnknownRiskFactor(String),

    /// Factor weights must be non-negative and sum to 1.0.
    #[error("invalid factor weights: {0}")]
    InvalidWeights(String),

    #[error("failed to read scoring config {path}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse scoring config {path}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
