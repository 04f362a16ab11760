use crate::contract::OptionContract;
use crate::errors::{ensure_positive, EngineError, EngineResult};
use crate::models::rng::RandomPathGenerator;
use crate::models::{PricingModel, PricingResult};
use statrs::distribution::{ContinuousCDF, Normal};

/// Default time steps per simulated path.
pub const DEFAULT_PATH_STEPS: usize = 100;

/// Default two-sided confidence level for the price interval.
pub const DEFAULT_CONFIDENCE: f64 = 0.95;

/// Default relative spot bump for finite-difference delta.
pub const DEFAULT_SPOT_BUMP: f64 = 0.01;

/// Default absolute volatility bump for finite-difference vega.
pub const DEFAULT_VOL_BUMP: f64 = 0.01;

/// Monte Carlo pricing under geometric Brownian motion.
///
/// S_t = S_{t-1} * exp((r - sigma^2/2)*dt + sigma*sqrt(dt)*Z),  Z ~ N(0, 1)
///
/// The engine is configuration only. Every call builds its own
/// `RandomPathGenerator` from the seed, so a seeded engine is fully
/// reproducible and can be shared across threads without a lock.
#[derive(Debug, Clone)]
pub struct MonteCarloEngine {
    simulations: usize,
    steps: usize,
    seed: Option<u64>,
    confidence_level: f64,
}

/// Point estimate with its sampling uncertainty.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct ConfidenceEstimate {
    pub price: f64,
    pub std_dev: f64,
    pub standard_error: f64,
    pub confidence_level: f64,
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceEstimate {
    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

/// Simulated price paths, row-major: `paths` rows of `steps + 1` prices.
#[derive(Debug, Clone)]
pub struct PathEnsemble {
    paths: usize,
    steps: usize,
    data: Vec<f64>,
}

impl PathEnsemble {
    #[inline]
    pub fn paths(&self) -> usize {
        self.paths
    }

    #[inline]
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Prices along path `i`, starting at spot.
    #[inline]
    pub fn path(&self, i: usize) -> &[f64] {
        let width = self.steps + 1;
        &self.data[i * width..(i + 1) * width]
    }

    pub fn terminal_prices(&self) -> impl Iterator<Item = f64> + '_ {
        self.data.chunks_exact(self.steps + 1).map(|row| row[self.steps])
    }

    /// Observation times 0, dt, ..., T.
    pub fn time_grid(&self, time_to_maturity: f64) -> Vec<f64> {
        let dt = time_to_maturity / self.steps as f64;
        (0..=self.steps).map(|t| t as f64 * dt).collect()
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.data.chunks_exact(self.steps + 1).map(<[f64]>::to_vec).collect()
    }
}

/// Per-step GBM constants. Shared by pricing and path inspection so both
/// produce bit-identical prices from the same draws.
#[derive(Debug, Clone, Copy)]
struct GbmStep {
    drift: f64,
    diffusion: f64,
}

impl GbmStep {
    fn new(c: &OptionContract, steps: usize) -> Self {
        let dt = c.time_to_maturity() / steps as f64;
        let sigma = c.volatility();
        Self {
            drift: (c.rate() - 0.5 * sigma * sigma) * dt,
            diffusion: sigma * dt.sqrt(),
        }
    }

    #[inline]
    fn advance(&self, price: f64, z: f64) -> f64 {
        price * (self.drift + self.diffusion * z).exp()
    }
}

impl MonteCarloEngine {
    pub fn new(simulations: usize) -> EngineResult<Self> {
        if simulations == 0 {
            return Err(EngineError::InvalidRange("simulation count must be at least 1".into()));
        }
        Ok(Self {
            simulations,
            steps: DEFAULT_PATH_STEPS,
            seed: None,
            confidence_level: DEFAULT_CONFIDENCE,
        })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_steps(mut self, steps: usize) -> EngineResult<Self> {
        if steps == 0 {
            return Err(EngineError::InvalidRange("path step count must be at least 1".into()));
        }
        self.steps = steps;
        Ok(self)
    }

    pub fn with_confidence_level(mut self, level: f64) -> EngineResult<Self> {
        if !(level > 0.0 && level < 1.0) {
            return Err(EngineError::InvalidRange(format!(
                "confidence level must lie strictly between 0 and 1, got {level}"
            )));
        }
        self.confidence_level = level;
        Ok(self)
    }

    #[inline]
    pub fn simulations(&self) -> usize {
        self.simulations
    }

    #[inline]
    pub fn steps(&self) -> usize {
        self.steps
    }

    #[inline]
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Discounted payoff of every simulated path. Paths are walked one at a
    /// time, so memory stays O(simulations) regardless of the step count.
    fn discounted_payoffs(&self, c: &OptionContract, rng: &mut RandomPathGenerator) -> Vec<f64> {
        let step = GbmStep::new(c, self.steps);
        let df = c.discount_factor();
        let mut shocks = vec![0.0; self.steps];
        (0..self.simulations)
            .map(|_| {
                rng.fill_normal(&mut shocks);
                let terminal = shocks.iter().fold(c.spot(), |s, &z| step.advance(s, z));
                df * c.intrinsic(terminal)
            })
            .collect()
    }

    fn price_with_rng(&self, c: &OptionContract, rng: &mut RandomPathGenerator) -> f64 {
        let payoffs = self.discounted_payoffs(c, rng);
        payoffs.iter().sum::<f64>() / payoffs.len() as f64
    }

    /// Sample mean of discounted payoffs.
    pub fn price(&self, c: &OptionContract) -> f64 {
        let mut rng = RandomPathGenerator::new(self.seed);
        self.price_with_rng(c, &mut rng)
    }

    /// Price with sample standard deviation, standard error and a two-sided
    /// interval `price ± z * standard_error`, z = Phi^-1((1 + level) / 2).
    ///
    /// The deviation uses the n-1 (Bessel) divisor. A population deviation
    /// (divisor n) would be smaller by a factor sqrt((n-1)/n): about 0.005%
    /// at 10,000 simulations, and exactly 0 in both forms when n = 1.
    pub fn price_with_confidence(&self, c: &OptionContract) -> ConfidenceEstimate {
        let mut rng = RandomPathGenerator::new(self.seed);
        let payoffs = self.discounted_payoffs(c, &mut rng);
        let n = payoffs.len() as f64;
        let price = payoffs.iter().sum::<f64>() / n;

        let std_dev = if payoffs.len() > 1 {
            let ss: f64 = payoffs.iter().map(|x| (x - price) * (x - price)).sum();
            (ss / (n - 1.0)).sqrt()
        } else {
            0.0
        };
        let standard_error = std_dev / n.sqrt();
        let z = Normal::standard().inverse_cdf(0.5 * (1.0 + self.confidence_level));

        tracing::debug!(
            simulations = self.simulations,
            steps = self.steps,
            price,
            standard_error,
            "monte carlo priced"
        );

        ConfidenceEstimate {
            price,
            std_dev,
            standard_error,
            confidence_level: self.confidence_level,
            lower: price - z * standard_error,
            upper: price + z * standard_error,
        }
    }

    /// Seed used for both legs of a bump-and-revalue, so the difference is
    /// taken under common random numbers.
    fn revaluation_seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random::<u64>)
    }

    /// Finite-difference delta: reprice with spot bumped by `relative_bump`
    /// and divide the price change by the absolute bump `S * relative_bump`.
    pub fn delta(&self, c: &OptionContract, relative_bump: f64) -> EngineResult<f64> {
        ensure_positive("spot bump", relative_bump)?;
        let bumped = c.with_spot(c.spot() * (1.0 + relative_bump))?;
        let seed = self.revaluation_seed();
        let base = self.price_with_rng(c, &mut RandomPathGenerator::from_seed(seed));
        let up = self.price_with_rng(&bumped, &mut RandomPathGenerator::from_seed(seed));
        Ok((up - base) / (c.spot() * relative_bump))
    }

    /// Finite-difference vega per 1-point volatility move.
    pub fn vega(&self, c: &OptionContract, bump: f64) -> EngineResult<f64> {
        ensure_positive("volatility bump", bump)?;
        let bumped = c.with_volatility(c.volatility() + bump)?;
        let seed = self.revaluation_seed();
        let base = self.price_with_rng(c, &mut RandomPathGenerator::from_seed(seed));
        let up = self.price_with_rng(&bumped, &mut RandomPathGenerator::from_seed(seed));
        Ok((up - base) / bump / 100.0)
    }

    /// Small ensemble for inspection, independent of the pricing simulation
    /// count. Uses its own generator, so later pricing calls are unaffected.
    pub fn sample_paths(&self, c: &OptionContract, num_paths: usize) -> EngineResult<PathEnsemble> {
        if num_paths == 0 {
            return Err(EngineError::InvalidRange("path count must be at least 1".into()));
        }
        let mut rng = RandomPathGenerator::new(self.seed);
        let step = GbmStep::new(c, self.steps);
        let width = self.steps + 1;
        let mut data = vec![0.0; num_paths * width];

        let mut shocks = vec![0.0; self.steps];
        for row in data.chunks_exact_mut(width) {
            rng.fill_normal(&mut shocks);
            row[0] = c.spot();
            for (t, &z) in shocks.iter().enumerate() {
                row[t + 1] = step.advance(row[t], z);
            }
        }

        Ok(PathEnsemble { paths: num_paths, steps: self.steps, data })
    }
}

impl PricingModel for MonteCarloEngine {
    #[inline]
    fn name(&self) -> &'static str {
        "Monte Carlo"
    }

    fn price(&self, contract: &OptionContract) -> EngineResult<f64> {
        Ok(MonteCarloEngine::price(self, contract))
    }

    fn evaluate(&self, contract: &OptionContract) -> EngineResult<PricingResult> {
        let estimate = self.price_with_confidence(contract);
        Ok(PricingResult::price_only(estimate.price)
            .with_greek("delta", self.delta(contract, DEFAULT_SPOT_BUMP)?)
            .with_greek("vega", self.vega(contract, DEFAULT_VOL_BUMP)?))
    }
}
