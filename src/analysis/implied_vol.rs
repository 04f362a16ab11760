use crate::contract::{OptionContract, OptionKind};
use crate::errors::{ensure_positive, EngineError, EngineResult};
use crate::models::black_scholes::BlackScholesEngine;

/// Newton-Raphson implied volatility solver over Black-Scholes.
///
/// sigma <- sigma + (market - price(sigma)) / vega(sigma)
///
/// with vega un-scaled (dV/dsigma). Non-positive updates are clamped to 0.01.
#[derive(Debug, Clone, Copy)]
pub struct ImpliedVolatilitySolver {
    initial_guess: f64,
    tolerance: f64,
    max_iterations: usize,
}

/// Outcome of a solve. Exhausting the iteration budget is a normal outcome,
/// not an error; `into_result` converts it for callers that want one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImpliedVolatility {
    Converged { sigma: f64, iterations: usize },
    NotConverged { last_sigma: f64, iterations: usize },
}

impl ImpliedVolatility {
    pub fn sigma(&self) -> Option<f64> {
        match *self {
            Self::Converged { sigma, .. } => Some(sigma),
            Self::NotConverged { .. } => None,
        }
    }

    pub fn into_result(self) -> EngineResult<f64> {
        match self {
            Self::Converged { sigma, .. } => Ok(sigma),
            Self::NotConverged { last_sigma, iterations } => {
                Err(EngineError::NonConvergence { iterations, last_sigma })
            }
        }
    }
}

const SIGMA_FLOOR: f64 = 0.01;

impl ImpliedVolatilitySolver {
    pub fn new() -> Self {
        Self { initial_guess: 0.3, tolerance: 1e-5, max_iterations: 100 }
    }

    pub fn with_initial_guess(mut self, sigma: f64) -> EngineResult<Self> {
        ensure_positive("initial volatility guess", sigma)?;
        self.initial_guess = sigma;
        Ok(self)
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> EngineResult<Self> {
        ensure_positive("tolerance", tolerance)?;
        self.tolerance = tolerance;
        Ok(self)
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Recover the volatility at which Black-Scholes reproduces `market_price`.
    ///
    /// Fails with `NumericDegeneracy` as soon as vega is exactly zero.
    pub fn solve(
        &self,
        market_price: f64,
        spot: f64,
        strike: f64,
        time_to_maturity: f64,
        rate: f64,
        kind: OptionKind,
    ) -> EngineResult<ImpliedVolatility> {
        ensure_positive("market price", market_price)?;
        let bs = BlackScholesEngine::new();
        let mut contract = OptionContract::new(spot, strike, time_to_maturity, rate, self.initial_guess, kind)?;

        for iteration in 0..self.max_iterations {
            let price = bs.price(&contract);
            let diff = market_price - price;

            if diff.abs() < self.tolerance {
                tracing::debug!(sigma = contract.volatility(), iteration, "implied volatility converged");
                return Ok(ImpliedVolatility::Converged {
                    sigma: contract.volatility(),
                    iterations: iteration,
                });
            }

            let vega = bs.vega(&contract) * 100.0;
            if vega == 0.0 {
                return Err(EngineError::NumericDegeneracy(format!(
                    "vega is zero at sigma={} after {iteration} iterations",
                    contract.volatility()
                )));
            }

            let mut next = contract.volatility() + diff / vega;
            if next <= 0.0 {
                next = SIGMA_FLOOR;
            }
            contract = contract.with_volatility(next).map_err(|_| {
                EngineError::NumericDegeneracy(format!("newton step produced non-finite sigma {next}"))
            })?;
        }

        tracing::warn!(
            market_price,
            last_sigma = contract.volatility(),
            iterations = self.max_iterations,
            "implied volatility did not converge"
        );
        Ok(ImpliedVolatility::NotConverged {
            last_sigma: contract.volatility(),
            iterations: self.max_iterations,
        })
    }
}

impl Default for ImpliedVolatilitySolver {
    fn default() -> Self {
        Self::new()
    }
}
