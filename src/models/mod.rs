pub mod rng;
pub mod black_scholes;
pub mod binomial;
pub mod monte_carlo;

use crate::contract::OptionContract;
use crate::errors::{EngineError, EngineResult};
use std::collections::BTreeMap;
use std::str::FromStr;

use self::binomial::BinomialLatticeEngine;
use self::black_scholes::BlackScholesEngine;
use self::monte_carlo::MonteCarloEngine;

/// All pricing engines implement this trait.
/// Engines are immutable after construction: pricing never mutates `self`.
/// Send + Sync required so one engine can serve blocking worker threads.
pub trait PricingModel: Send + Sync {
    fn name(&self) -> &'static str;

    /// Price only. Cheapest path through the engine.
    fn price(&self, contract: &OptionContract) -> EngineResult<f64>;

    /// Price plus whatever Greeks the engine produces natively.
    fn evaluate(&self, contract: &OptionContract) -> EngineResult<PricingResult>;
}

/// Output of any engine: a price and an optional Greek name → value map.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PricingResult {
    pub price: f64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub greeks: BTreeMap<&'static str, f64>,
}

impl PricingResult {
    pub fn price_only(price: f64) -> Self {
        Self { price, greeks: BTreeMap::new() }
    }

    pub fn with_greek(mut self, name: &'static str, value: f64) -> Self {
        self.greeks.insert(name, value);
        self
    }

    pub fn greek(&self, name: &str) -> Option<f64> {
        self.greeks.get(name).copied()
    }
}

/// Model selector accepted at the adapter boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    BlackScholes,
    BinomialTree,
    MonteCarlo,
}

impl FromStr for ModelKind {
    type Err = EngineError;

    fn from_str(s: &str) -> EngineResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "black-scholes" => Ok(Self::BlackScholes),
            "binomial-tree" => Ok(Self::BinomialTree),
            "monte-carlo" => Ok(Self::MonteCarlo),
            other => Err(EngineError::InvalidParameter(format!("unknown model type '{other}'"))),
        }
    }
}

/// Closed set of pricing engines behind the uniform `PricingModel` interface.
#[derive(Debug, Clone)]
pub enum PricingEngine {
    BlackScholes(BlackScholesEngine),
    Binomial(BinomialLatticeEngine),
    MonteCarlo(MonteCarloEngine),
}

impl PricingEngine {
    pub fn kind(&self) -> ModelKind {
        match self {
            Self::BlackScholes(_) => ModelKind::BlackScholes,
            Self::Binomial(_) => ModelKind::BinomialTree,
            Self::MonteCarlo(_) => ModelKind::MonteCarlo,
        }
    }

    #[inline]
    fn inner(&self) -> &dyn PricingModel {
        match self {
            Self::BlackScholes(e) => e,
            Self::Binomial(e) => e,
            Self::MonteCarlo(e) => e,
        }
    }
}

impl PricingModel for PricingEngine {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn price(&self, contract: &OptionContract) -> EngineResult<f64> {
        self.inner().price(contract)
    }

    fn evaluate(&self, contract: &OptionContract) -> EngineResult<PricingResult> {
        self.inner().evaluate(contract)
    }
}

impl From<BlackScholesEngine> for PricingEngine {
    fn from(e: BlackScholesEngine) -> Self {
        Self::BlackScholes(e)
    }
}

impl From<BinomialLatticeEngine> for PricingEngine {
    fn from(e: BinomialLatticeEngine) -> Self {
        Self::Binomial(e)
    }
}

impl From<MonteCarloEngine> for PricingEngine {
    fn from(e: MonteCarloEngine) -> Self {
        Self::MonteCarlo(e)
    }
}
