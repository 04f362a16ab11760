use crate::contract::{OptionContract, OptionKind};
use crate::errors::EngineResult;
use crate::models::{PricingModel, PricingResult};
use statrs::distribution::{Continuous, ContinuousCDF, Normal};

/// Black-Scholes European option pricing.
///
/// d1 = (ln(S/K) + (r + sigma^2/2)*T) / (sigma * sqrt(T))
/// d2 = d1 - sigma * sqrt(T)
///
/// call = S*Phi(d1) - K*e^(-rT)*Phi(d2)
/// put  = K*e^(-rT)*Phi(-d2) - S*Phi(-d1)
///
/// Contracts are validated on construction, so every formula here is total.
#[derive(Debug, Clone)]
pub struct BlackScholesEngine {
    /// Standard normal distribution (created once, reused)
    normal: Normal,
}

/// Full analytic Greek set.
///
/// Vega and rho are per 1-point move (scaled by 1/100), theta is per calendar day.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Greeks {
    pub delta: f64,
    pub gamma: f64,
    pub vega: f64,
    pub theta: f64,
    pub rho: f64,
}

impl Greeks {
    pub fn into_result(self, price: f64) -> PricingResult {
        PricingResult::price_only(price)
            .with_greek("delta", self.delta)
            .with_greek("gamma", self.gamma)
            .with_greek("vega", self.vega)
            .with_greek("theta", self.theta)
            .with_greek("rho", self.rho)
    }
}

impl BlackScholesEngine {
    pub fn new() -> Self {
        Self { normal: Normal::standard() }
    }

    #[inline]
    pub fn d1_d2(&self, c: &OptionContract) -> (f64, f64) {
        let sigma_sqrt_t = c.volatility() * c.time_to_maturity().sqrt();
        let d1 = ((c.spot() / c.strike()).ln()
            + (c.rate() + 0.5 * c.volatility() * c.volatility()) * c.time_to_maturity())
            / sigma_sqrt_t;
        (d1, d1 - sigma_sqrt_t)
    }

    pub fn price(&self, c: &OptionContract) -> f64 {
        let (d1, d2) = self.d1_d2(c);
        let pv_strike = c.strike() * c.discount_factor();
        match c.kind() {
            OptionKind::Call => c.spot() * self.normal.cdf(d1) - pv_strike * self.normal.cdf(d2),
            OptionKind::Put => pv_strike * self.normal.cdf(-d2) - c.spot() * self.normal.cdf(-d1),
        }
    }

    pub fn delta(&self, c: &OptionContract) -> f64 {
        let (d1, _) = self.d1_d2(c);
        match c.kind() {
            OptionKind::Call => self.normal.cdf(d1),
            OptionKind::Put => self.normal.cdf(d1) - 1.0,
        }
    }

    /// Same for calls and puts.
    pub fn gamma(&self, c: &OptionContract) -> f64 {
        let (d1, _) = self.d1_d2(c);
        self.normal.pdf(d1) / (c.spot() * c.volatility() * c.time_to_maturity().sqrt())
    }

    /// Per 1-point volatility move (dV/dsigma / 100).
    pub fn vega(&self, c: &OptionContract) -> f64 {
        let (d1, _) = self.d1_d2(c);
        c.spot() * self.normal.pdf(d1) * c.time_to_maturity().sqrt() / 100.0
    }

    /// Per calendar day (annual theta / 365).
    pub fn theta(&self, c: &OptionContract) -> f64 {
        let (d1, d2) = self.d1_d2(c);
        let decay = -c.spot() * self.normal.pdf(d1) * c.volatility() / (2.0 * c.time_to_maturity().sqrt());
        let carry = c.rate() * c.strike() * c.discount_factor();
        let annual = match c.kind() {
            OptionKind::Call => decay - carry * self.normal.cdf(d2),
            OptionKind::Put => decay + carry * self.normal.cdf(-d2),
        };
        annual / 365.0
    }

    /// Per 1-point rate move (dV/dr / 100).
    pub fn rho(&self, c: &OptionContract) -> f64 {
        let (_, d2) = self.d1_d2(c);
        let k_t_df = c.strike() * c.time_to_maturity() * c.discount_factor();
        match c.kind() {
            OptionKind::Call => k_t_df * self.normal.cdf(d2) / 100.0,
            OptionKind::Put => -k_t_df * self.normal.cdf(-d2) / 100.0,
        }
    }

    pub fn greeks(&self, c: &OptionContract) -> Greeks {
        Greeks {
            delta: self.delta(c),
            gamma: self.gamma(c),
            vega: self.vega(c),
            theta: self.theta(c),
            rho: self.rho(c),
        }
    }
}

impl Default for BlackScholesEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PricingModel for BlackScholesEngine {
    #[inline]
    fn name(&self) -> &'static str {
        "Black-Scholes"
    }

    fn price(&self, contract: &OptionContract) -> EngineResult<f64> {
        Ok(BlackScholesEngine::price(self, contract))
    }

    fn evaluate(&self, contract: &OptionContract) -> EngineResult<PricingResult> {
        let price = BlackScholesEngine::price(self, contract);
        let greeks = self.greeks(contract);
        tracing::debug!(price, delta = greeks.delta, "black-scholes evaluated");
        Ok(greeks.into_result(price))
    }
}
