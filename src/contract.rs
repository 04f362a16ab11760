use crate::errors::{ensure_finite, ensure_positive, EngineError, EngineResult};
use std::str::FromStr;

// ── Option Kind ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    Call,
    Put,
}

impl OptionKind {
    /// Payoff at exercise for an underlying level `spot`.
    #[inline]
    pub fn intrinsic(self, spot: f64, strike: f64) -> f64 {
        match self {
            Self::Call => (spot - strike).max(0.0),
            Self::Put => (strike - spot).max(0.0),
        }
    }
}

impl FromStr for OptionKind {
    type Err = EngineError;

    fn from_str(s: &str) -> EngineResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "call" => Ok(Self::Call),
            "put" => Ok(Self::Put),
            other => Err(EngineError::InvalidParameter(format!(
                "option kind must be 'call' or 'put', got '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for OptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call => write!(f, "call"),
            Self::Put => write!(f, "put"),
        }
    }
}

// ── Exercise Style ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseStyle {
    #[default]
    European,
    American,
}

impl FromStr for ExerciseStyle {
    type Err = EngineError;

    fn from_str(s: &str) -> EngineResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "european" => Ok(Self::European),
            "american" => Ok(Self::American),
            other => Err(EngineError::InvalidParameter(format!(
                "exercise style must be 'european' or 'american', got '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for ExerciseStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::European => write!(f, "european"),
            Self::American => write!(f, "american"),
        }
    }
}

// ── Position ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    #[default]
    Long,
    Short,
}

impl FromStr for Position {
    type Err = EngineError;

    fn from_str(s: &str) -> EngineResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "long" => Ok(Self::Long),
            "short" => Ok(Self::Short),
            other => Err(EngineError::InvalidParameter(format!(
                "position must be 'long' or 'short', got '{other}'"
            ))),
        }
    }
}

// ── Option Contract ──

/// Immutable vanilla option terms.
///
/// Spot, strike, maturity and volatility are strictly positive and finite;
/// the rate is finite and may be negative. Every constructor validates, so a
/// contract that exists is always safe to price.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct OptionContract {
    spot: f64,
    strike: f64,
    time_to_maturity: f64,
    rate: f64,
    volatility: f64,
    kind: OptionKind,
}

impl OptionContract {
    pub fn new(
        spot: f64,
        strike: f64,
        time_to_maturity: f64,
        rate: f64,
        volatility: f64,
        kind: OptionKind,
    ) -> EngineResult<Self> {
        ensure_positive("spot price", spot)?;
        ensure_positive("strike price", strike)?;
        ensure_positive("time to maturity", time_to_maturity)?;
        ensure_finite("risk-free rate", rate)?;
        ensure_positive("volatility", volatility)?;

        Ok(Self { spot, strike, time_to_maturity, rate, volatility, kind })
    }

    #[inline]
    pub fn spot(&self) -> f64 {
        self.spot
    }

    #[inline]
    pub fn strike(&self) -> f64 {
        self.strike
    }

    #[inline]
    pub fn time_to_maturity(&self) -> f64 {
        self.time_to_maturity
    }

    #[inline]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    #[inline]
    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    #[inline]
    pub fn kind(&self) -> OptionKind {
        self.kind
    }

    /// Payoff of this contract if exercised with the underlying at `spot`.
    #[inline]
    pub fn intrinsic(&self, spot: f64) -> f64 {
        self.kind.intrinsic(spot, self.strike)
    }

    /// Discount factor e^(-rT) to maturity.
    #[inline]
    pub fn discount_factor(&self) -> f64 {
        (-self.rate * self.time_to_maturity).exp()
    }

    pub fn with_spot(&self, spot: f64) -> EngineResult<Self> {
        Self::new(spot, self.strike, self.time_to_maturity, self.rate, self.volatility, self.kind)
    }

    pub fn with_strike(&self, strike: f64) -> EngineResult<Self> {
        Self::new(self.spot, strike, self.time_to_maturity, self.rate, self.volatility, self.kind)
    }

    pub fn with_time(&self, time_to_maturity: f64) -> EngineResult<Self> {
        Self::new(self.spot, self.strike, time_to_maturity, self.rate, self.volatility, self.kind)
    }

    pub fn with_rate(&self, rate: f64) -> EngineResult<Self> {
        Self::new(self.spot, self.strike, self.time_to_maturity, rate, self.volatility, self.kind)
    }

    pub fn with_volatility(&self, volatility: f64) -> EngineResult<Self> {
        Self::new(self.spot, self.strike, self.time_to_maturity, self.rate, volatility, self.kind)
    }
}
