/// Domain-specific error types for the pricing engine.
/// Every failure is reported synchronously where it is detected:
/// - Nothing is retried internally
/// - No numeric sentinel (NaN, None) ever stands in for a failure
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("invalid range: {0}")]
    InvalidRange(String),

    #[error("numeric degeneracy: {0}")]
    NumericDegeneracy(String),

    #[error("implied volatility did not converge after {iterations} iterations (last sigma {last_sigma})")]
    NonConvergence { iterations: usize, last_sigma: f64 },

    #[error("config error: {0}")]
    Config(String),

    #[error("worker task failed: {0}")]
    Worker(String),
}

impl EngineError {
    /// Stable identifier for the error kind, used by the HTTP adapter.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidParameter(_) => "invalid_parameter",
            Self::InvalidRange(_) => "invalid_range",
            Self::NumericDegeneracy(_) => "numeric_degeneracy",
            Self::NonConvergence { .. } => "non_convergence",
            Self::Config(_) => "config",
            Self::Worker(_) => "worker",
        }
    }
}

impl From<tokio::task::JoinError> for EngineError {
    fn from(e: tokio::task::JoinError) -> Self {
        EngineError::Worker(e.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Fails with `InvalidRange` unless `value` is finite and strictly positive.
pub(crate) fn ensure_positive(name: &str, value: f64) -> EngineResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidRange(format!("{name} must be positive and finite, got {value}")))
    }
}

/// Fails with `InvalidRange` unless `value` is finite.
pub(crate) fn ensure_finite(name: &str, value: f64) -> EngineResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(EngineError::InvalidRange(format!("{name} must be finite, got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_identifiers() {
        assert_eq!(EngineError::InvalidParameter("x".into()).kind(), "invalid_parameter");
        assert_eq!(EngineError::InvalidRange("x".into()).kind(), "invalid_range");
        assert_eq!(EngineError::NumericDegeneracy("x".into()).kind(), "numeric_degeneracy");
        let e = EngineError::NonConvergence { iterations: 100, last_sigma: 0.4 };
        assert_eq!(e.kind(), "non_convergence");
        assert!(e.to_string().contains("100 iterations"));
    }

    #[test]
    fn test_guards() {
        assert!(ensure_positive("spot", 1.0).is_ok());
        assert!(ensure_positive("spot", 0.0).is_err());
        assert!(ensure_positive("spot", f64::NAN).is_err());
        assert!(ensure_positive("spot", f64::INFINITY).is_err());
        assert!(ensure_finite("rate", -0.01).is_ok());
        assert!(ensure_finite("rate", f64::NAN).is_err());
    }
}
