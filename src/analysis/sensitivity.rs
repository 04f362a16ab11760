use crate::analysis::linspace;
use crate::contract::OptionContract;
use crate::errors::{EngineError, EngineResult};
use crate::models::black_scholes::BlackScholesEngine;
use std::str::FromStr;

/// Number of points in a sensitivity sweep.
pub const SWEEP_POINTS: usize = 50;

/// Default relative variation around the base value (±20%).
pub const DEFAULT_VARIATION: f64 = 0.2;

/// Floor for swept time to maturity, keeping T > 0.
const MIN_TIME: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SensitivityTarget {
    Spot,
    Volatility,
    Time,
    Rate,
}

impl SensitivityTarget {
    fn base_value(self, c: &OptionContract) -> f64 {
        match self {
            Self::Spot => c.spot(),
            Self::Volatility => c.volatility(),
            Self::Time => c.time_to_maturity(),
            Self::Rate => c.rate(),
        }
    }

    fn apply(self, c: &OptionContract, value: f64) -> EngineResult<OptionContract> {
        match self {
            Self::Spot => c.with_spot(value),
            Self::Volatility => c.with_volatility(value),
            Self::Time => c.with_time(value),
            Self::Rate => c.with_rate(value),
        }
    }
}

impl FromStr for SensitivityTarget {
    type Err = EngineError;

    fn from_str(s: &str) -> EngineResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spot" => Ok(Self::Spot),
            "volatility" => Ok(Self::Volatility),
            "time" => Ok(Self::Time),
            "rate" => Ok(Self::Rate),
            other => Err(EngineError::InvalidParameter(format!("invalid sensitivity parameter: {other}"))),
        }
    }
}

/// Parallel sequences: `prices[i]` is the Black-Scholes price at `values[i]`.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SensitivityReport {
    pub parameter: SensitivityTarget,
    pub values: Vec<f64>,
    pub prices: Vec<f64>,
}

/// Sweep one market parameter over `[base*(1-range), base*(1+range)]`
/// and reprice with Black-Scholes at each point.
pub fn sensitivity_analysis(
    contract: &OptionContract,
    target: SensitivityTarget,
    variation_range: f64,
) -> EngineResult<SensitivityReport> {
    if !variation_range.is_finite() || variation_range < 0.0 {
        return Err(EngineError::InvalidRange(format!(
            "variation range must be finite and non-negative, got {variation_range}"
        )));
    }

    let base = target.base_value(contract);
    let mut low = base * (1.0 - variation_range);
    let high = base * (1.0 + variation_range);
    if target == SensitivityTarget::Time {
        low = low.max(MIN_TIME);
    }

    let bs = BlackScholesEngine::new();
    let values = linspace(low, high, SWEEP_POINTS);
    let prices = values
        .iter()
        .map(|&v| target.apply(contract, v).map(|c| bs.price(&c)))
        .collect::<EngineResult<Vec<f64>>>()?;

    tracing::debug!(parameter = ?target, low, high, "sensitivity sweep complete");

    Ok(SensitivityReport { parameter: target, values, prices })
}
