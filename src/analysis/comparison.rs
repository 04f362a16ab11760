use crate::contract::{ExerciseStyle, OptionContract};
use crate::errors::EngineResult;
use crate::models::binomial::BinomialLatticeEngine;
use crate::models::black_scholes::{BlackScholesEngine, Greeks};
use crate::models::monte_carlo::{MonteCarloEngine, DEFAULT_PATH_STEPS};

/// Engine settings used by a comparison run.
#[derive(Debug, Clone, Copy)]
pub struct ComparisonSettings {
    pub binomial_steps: usize,
    pub simulations: usize,
    pub path_steps: usize,
    pub seed: u64,
}

impl Default for ComparisonSettings {
    fn default() -> Self {
        Self {
            binomial_steps: 100,
            simulations: 10_000,
            path_steps: DEFAULT_PATH_STEPS,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct BlackScholesSummary {
    pub price: f64,
    pub greeks: Greeks,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct BinomialSummary {
    pub price: f64,
    pub delta: f64,
    pub gamma: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct MonteCarloSummary {
    pub price: f64,
    pub confidence_interval: [f64; 2],
    pub std_error: f64,
}

/// One sub-report per model. No reconciliation between them.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct ComparisonReport {
    pub black_scholes: BlackScholesSummary,
    pub binomial_tree: BinomialSummary,
    pub monte_carlo: MonteCarloSummary,
}

/// Fans one contract out to all three engines. Any engine failure fails
/// the whole comparison; there are no partial reports.
pub fn compare_models(contract: &OptionContract, settings: &ComparisonSettings) -> EngineResult<ComparisonReport> {
    let bs = BlackScholesEngine::new();
    let binomial = BinomialLatticeEngine::new(settings.binomial_steps, ExerciseStyle::European)?;
    let mc = MonteCarloEngine::new(settings.simulations)?
        .with_steps(settings.path_steps)?
        .with_seed(settings.seed);

    let black_scholes = BlackScholesSummary {
        price: bs.price(contract),
        greeks: bs.greeks(contract),
    };

    let lattice = binomial.price_with_greeks(contract)?;
    let binomial_tree = BinomialSummary {
        price: lattice.price,
        delta: lattice.delta,
        gamma: lattice.gamma,
    };

    let estimate = mc.price_with_confidence(contract);
    let monte_carlo = MonteCarloSummary {
        price: estimate.price,
        confidence_interval: [estimate.lower, estimate.upper],
        std_error: estimate.standard_error,
    };

    tracing::debug!(
        bs = black_scholes.price,
        binomial = binomial_tree.price,
        mc = monte_carlo.price,
        "model comparison complete"
    );

    Ok(ComparisonReport { black_scholes, binomial_tree, monte_carlo })
}
