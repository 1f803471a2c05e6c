use thiserror::Error;

use crate::state::LinkId;

/// Errors raised by the accounting and compensation core.
#[derive(Debug, Error)]
pub enum DtmError {
    /// Autonomous system numbers start at 1.
    #[error("invalid AS number {0}, must be greater than 0")]
    InvalidAsNumber(u32),
    /// The vector carries no value mapping at all.
    #[error("vector for AS {as_number} has no value mapping")]
    MissingValues { as_number: u32 },
    /// A theta coefficient outside of [0, 1].
    #[error("theta coefficient {value} is outside of [0, 1]")]
    InvalidTheta { value: f64 },
    /// Exactly one tunnel traffic vector is expected per sample.
    #[error("expected exactly one tunnel traffic vector, got {0}")]
    TunnelVectorCount(usize),
    /// The measured vector has no value for a link of the reference.
    #[error("no measured value for {0}")]
    MissingMeasurement(LinkId),
    /// Link metadata could not be resolved.
    #[error("no link metadata for {0}")]
    MissingLink(LinkId),
    /// No charging rule is configured.
    #[error("no system control parameters configured")]
    MissingBillingParameters,
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("storage failure: {0}")]
    Storage(#[source] anyhow::Error),
}

impl DtmError {
    /// Whether the error belongs to the invalid-argument family, i.e. the
    /// caller handed over something that can never succeed as is.
    pub fn is_invalid_argument(&self) -> bool {
        !matches!(self, DtmError::Storage(_) | DtmError::Config(_))
    }
}

pub type Result<T, E = DtmError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_family() {
        assert!(DtmError::InvalidAsNumber(0).is_invalid_argument());
        assert!(DtmError::TunnelVectorCount(2).is_invalid_argument());
        assert!(DtmError::MissingLink(LinkId::new("link1", "isp1")).is_invalid_argument());
        assert!(!DtmError::Storage(anyhow::anyhow!("db down")).is_invalid_argument());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            DtmError::TunnelVectorCount(3).to_string(),
            "expected exactly one tunnel traffic vector, got 3"
        );
        assert_eq!(
            DtmError::MissingLink(LinkId::new("link1", "isp1")).to_string(),
            "no link metadata for link1@isp1"
        );
    }
}
