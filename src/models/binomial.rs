use crate::contract::{ExerciseStyle, OptionContract};
use crate::errors::{EngineError, EngineResult};
use crate::models::{PricingModel, PricingResult};

/// Cox-Ross-Rubinstein binomial lattice pricing (European and American).
///
/// dt = T/N, u = e^(sigma*sqrt(dt)), d = 1/u
/// p  = (e^(r*dt) - d) / (u - d), one-step discount e^(-r*dt)
///
/// Node (j, i) with j <= i <= N carries S*u^(i-j)*d^j, where j counts down-moves.
#[derive(Debug, Clone, Copy)]
pub struct BinomialLatticeEngine {
    steps: usize,
    exercise: ExerciseStyle,
}

/// Step constants derived once per pricing call.
#[derive(Debug, Clone, Copy)]
struct StepParams {
    up: f64,
    down: f64,
    prob_up: f64,
    discount: f64,
}

/// Depth-0 to depth-2 slice of a rolled-back lattice. Backward induction
/// keeps a single O(N) value vector, and only the levels the price and
/// Greeks read are retained. Owned by one pricing call.
#[derive(Debug, Clone)]
pub struct Lattice {
    steps: usize,
    stock: Vec<Vec<f64>>,
    value: Vec<Vec<f64>>,
}

/// Deepest level retained after backward induction.
const RETAINED_DEPTH: usize = 2;

fn ensure_gamma_depth(steps: usize) -> EngineResult<()> {
    if steps < 2 {
        return Err(EngineError::InvalidRange(format!(
            "insufficient lattice depth for gamma: need at least 2 steps, got {steps}"
        )));
    }
    Ok(())
}

impl Lattice {
    #[inline]
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Deepest retained level, `min(steps, 2)`.
    #[inline]
    pub fn depth(&self) -> usize {
        self.stock.len() - 1
    }

    /// Stock price after `i` steps with `j` down-moves. Panics if `i > depth()`.
    #[inline]
    pub fn stock(&self, j: usize, i: usize) -> f64 {
        self.stock[i][j]
    }

    /// Option value after `i` steps with `j` down-moves. Panics if `i > depth()`.
    #[inline]
    pub fn value(&self, j: usize, i: usize) -> f64 {
        self.value[i][j]
    }

    #[inline]
    pub fn root_value(&self) -> f64 {
        self.value(0, 0)
    }

    /// (V(0,1) - V(1,1)) / (S(0,1) - S(1,1))
    pub fn delta(&self) -> f64 {
        (self.value(0, 1) - self.value(1, 1)) / (self.stock(0, 1) - self.stock(1, 1))
    }

    /// Second difference across depth 2, normalized by half the outer spread.
    pub fn gamma(&self) -> EngineResult<f64> {
        ensure_gamma_depth(self.steps)?;
        let delta_up = (self.value(0, 2) - self.value(1, 2)) / (self.stock(0, 2) - self.stock(1, 2));
        let delta_down = (self.value(1, 2) - self.value(2, 2)) / (self.stock(1, 2) - self.stock(2, 2));
        Ok((delta_up - delta_down) / ((self.stock(0, 2) - self.stock(2, 2)) / 2.0))
    }
}

/// Lattice price with its native Greeks.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct BinomialReport {
    pub price: f64,
    pub delta: f64,
    pub gamma: f64,
}

impl BinomialLatticeEngine {
    pub fn new(steps: usize, exercise: ExerciseStyle) -> EngineResult<Self> {
        if steps == 0 {
            return Err(EngineError::InvalidRange("binomial step count must be at least 1".into()));
        }
        Ok(Self { steps, exercise })
    }

    #[inline]
    pub fn steps(&self) -> usize {
        self.steps
    }

    #[inline]
    pub fn exercise(&self) -> ExerciseStyle {
        self.exercise
    }

    fn step_params(&self, c: &OptionContract) -> StepParams {
        let dt = c.time_to_maturity() / self.steps as f64;
        let up = (c.volatility() * dt.sqrt()).exp();
        let down = 1.0 / up;
        let prob_up = ((c.rate() * dt).exp() - down) / (up - down);
        if !(0.0..=1.0).contains(&prob_up) {
            tracing::warn!(
                prob_up,
                steps = self.steps,
                "risk-neutral probability outside [0, 1]; lattice admits arbitrage"
            );
        }
        StepParams { up, down, prob_up, discount: (-c.rate() * dt).exp() }
    }

    /// Run backward induction from the terminal payoffs, keeping the top
    /// levels of the lattice. Memory is O(N); time is O(N^2).
    pub fn build_lattice(&self, c: &OptionContract) -> Lattice {
        let n = self.steps;
        let sp = self.step_params(c);
        let stock_at = |j: usize, i: usize| c.spot() * sp.up.powi((i - j) as i32) * sp.down.powi(j as i32);
        let depth = n.min(RETAINED_DEPTH);

        let mut values: Vec<f64> = (0..=n).map(|j| c.intrinsic(stock_at(j, n))).collect();
        let mut retained = vec![Vec::new(); depth + 1];
        if n <= depth {
            retained[n] = values.clone();
        }

        let american = self.exercise == ExerciseStyle::American;
        for i in (0..n).rev() {
            // values[j] and values[j + 1] still hold level i + 1 when node j is rolled back
            for j in 0..=i {
                let continuation = sp.discount * (sp.prob_up * values[j] + (1.0 - sp.prob_up) * values[j + 1]);
                values[j] = if american {
                    continuation.max(c.intrinsic(stock_at(j, i)))
                } else {
                    continuation
                };
            }
            values.truncate(i + 1);
            if i <= depth {
                retained[i] = values.clone();
            }
        }

        let stock = (0..=depth).map(|i| (0..=i).map(|j| stock_at(j, i)).collect::<Vec<f64>>()).collect();
        Lattice { steps: n, stock, value: retained }
    }

    pub fn price(&self, c: &OptionContract) -> f64 {
        self.build_lattice(c).root_value()
    }

    pub fn delta(&self, c: &OptionContract) -> f64 {
        self.build_lattice(c).delta()
    }

    /// Fails fast with `InvalidRange` when the lattice has fewer than 2 steps.
    pub fn gamma(&self, c: &OptionContract) -> EngineResult<f64> {
        ensure_gamma_depth(self.steps)?;
        self.build_lattice(c).gamma()
    }

    /// Price, delta and gamma from a single lattice build.
    pub fn price_with_greeks(&self, c: &OptionContract) -> EngineResult<BinomialReport> {
        ensure_gamma_depth(self.steps)?;
        let lattice = self.build_lattice(c);
        let report = BinomialReport {
            price: lattice.root_value(),
            delta: lattice.delta(),
            gamma: lattice.gamma()?,
        };
        tracing::debug!(
            steps = self.steps,
            exercise = %self.exercise,
            price = report.price,
            "binomial lattice priced"
        );
        Ok(report)
    }
}

impl PricingModel for BinomialLatticeEngine {
    #[inline]
    fn name(&self) -> &'static str {
        "Binomial Tree"
    }

    fn price(&self, contract: &OptionContract) -> EngineResult<f64> {
        Ok(BinomialLatticeEngine::price(self, contract))
    }

    fn evaluate(&self, contract: &OptionContract) -> EngineResult<PricingResult> {
        let report = self.price_with_greeks(contract)?;
        Ok(PricingResult::price_only(report.price)
            .with_greek("delta", report.delta)
            .with_greek("gamma", report.gamma))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::OptionKind;
    use crate::models::black_scholes::BlackScholesEngine;

    fn contract(kind: OptionKind) -> OptionContract {
        OptionContract::new(100.0, 100.0, 1.0, 0.05, 0.2, kind).unwrap()
    }

    #[test]
    fn test_zero_steps_rejected() {
        assert!(matches!(
            BinomialLatticeEngine::new(0, ExerciseStyle::European),
            Err(EngineError::InvalidRange(_))
        ));
    }

    #[test]
    fn test_converges_to_black_scholes_atm() {
        let bs = BlackScholesEngine::new();
        let engine = BinomialLatticeEngine::new(500, ExerciseStyle::European).unwrap();
        for kind in [OptionKind::Call, OptionKind::Put] {
            let c = contract(kind);
            let diff = (engine.price(&c) - bs.price(&c)).abs();
            assert!(diff < 1e-2, "{kind} lattice vs BS gap {diff} too large");
        }
    }

    #[test]
    fn test_finer_lattice_is_closer() {
        let bs = BlackScholesEngine::new();
        let c = contract(OptionKind::Call);
        let coarse = BinomialLatticeEngine::new(10, ExerciseStyle::European).unwrap();
        let fine = BinomialLatticeEngine::new(500, ExerciseStyle::European).unwrap();
        let gap_coarse = (coarse.price(&c) - bs.price(&c)).abs();
        let gap_fine = (fine.price(&c) - bs.price(&c)).abs();
        assert!(gap_fine < gap_coarse, "N=500 gap {gap_fine} should beat N=10 gap {gap_coarse}");
    }

    #[test]
    fn test_american_put_at_least_european() {
        let cases = [
            (100.0, 100.0, 1.0, 0.05, 0.2),
            (90.0, 100.0, 0.5, 0.08, 0.3),
            (60.0, 100.0, 2.0, 0.1, 0.25),
            (120.0, 100.0, 1.0, 0.0, 0.4),
        ];
        let eu = BinomialLatticeEngine::new(200, ExerciseStyle::European).unwrap();
        let am = BinomialLatticeEngine::new(200, ExerciseStyle::American).unwrap();
        for (s, k, t, r, v) in cases {
            let c = OptionContract::new(s, k, t, r, v, OptionKind::Put).unwrap();
            let (pe, pa) = (eu.price(&c), am.price(&c));
            assert!(pa >= pe - 1e-12, "american {pa} < european {pe} for ({s},{k},{t},{r},{v})");
        }
        // Deep ITM put with positive rates carries a strictly positive premium
        let deep = OptionContract::new(60.0, 100.0, 2.0, 0.1, 0.25, OptionKind::Put).unwrap();
        assert!(am.price(&deep) > eu.price(&deep) + 1.0);
        assert!(am.price(&deep) >= deep.intrinsic(60.0));
    }

    #[test]
    fn test_american_call_no_dividend_equals_european() {
        let c = contract(OptionKind::Call);
        let eu = BinomialLatticeEngine::new(100, ExerciseStyle::European).unwrap().price(&c);
        let am = BinomialLatticeEngine::new(100, ExerciseStyle::American).unwrap().price(&c);
        assert!((am - eu).abs() < 1e-10, "american call {am} vs european {eu}");
    }

    #[test]
    fn test_lattice_nodes() {
        let engine = BinomialLatticeEngine::new(3, ExerciseStyle::European).unwrap();
        let lattice = engine.build_lattice(&contract(OptionKind::Call));
        assert_eq!(lattice.steps(), 3);
        assert_eq!(lattice.depth(), 2);
        assert_eq!(lattice.stock(0, 0), 100.0);
        // Up then down returns to spot
        assert!((lattice.stock(1, 2) - 100.0).abs() < 1e-10);
        assert!(lattice.stock(0, 2) > lattice.stock(1, 2));
        assert!(lattice.value(0, 1) > lattice.value(1, 1));
    }

    #[test]
    fn test_one_step_lattice_matches_hand_rollback() {
        let c = contract(OptionKind::Call);
        let lattice = BinomialLatticeEngine::new(1, ExerciseStyle::European).unwrap().build_lattice(&c);
        assert_eq!(lattice.depth(), 1);
        let up = (0.2f64).exp();
        let p = ((0.05f64).exp() - 1.0 / up) / (up - 1.0 / up);
        let expected = (-0.05f64).exp() * p * (100.0 * up - 100.0);
        assert!((lattice.root_value() - expected).abs() < 1e-10, "{}", lattice.root_value());
        assert_eq!(lattice.value(1, 1), 0.0);
    }

    #[test]
    fn test_deep_american_lattice_keeps_top_levels_only() {
        let bs = BlackScholesEngine::new();
        let c = contract(OptionKind::Put);
        let engine = BinomialLatticeEngine::new(3_000, ExerciseStyle::American).unwrap();
        let lattice = engine.build_lattice(&c);
        assert_eq!(lattice.steps(), 3_000);
        assert_eq!(lattice.depth(), 2);
        let report = engine.price_with_greeks(&c).unwrap();
        assert!(report.price > bs.price(&c), "american put {} should carry early-exercise value", report.price);
        assert!(report.gamma > 0.0 && report.delta < 0.0);
    }

    #[test]
    fn test_greeks_near_black_scholes() {
        let bs = BlackScholesEngine::new();
        let c = contract(OptionKind::Call);
        let report = BinomialLatticeEngine::new(500, ExerciseStyle::European)
            .unwrap()
            .price_with_greeks(&c)
            .unwrap();
        assert!((report.delta - bs.delta(&c)).abs() < 5e-3, "delta {}", report.delta);
        assert!((report.gamma - bs.gamma(&c)).abs() < 1e-3, "gamma {}", report.gamma);
    }

    #[test]
    fn test_gamma_requires_two_steps() {
        let engine = BinomialLatticeEngine::new(1, ExerciseStyle::European).unwrap();
        let c = contract(OptionKind::Put);
        assert!(engine.price(&c) > 0.0);
        assert!(engine.delta(&c) < 0.0);
        assert!(matches!(engine.gamma(&c), Err(EngineError::InvalidRange(_))));
        assert!(matches!(engine.price_with_greeks(&c), Err(EngineError::InvalidRange(_))));
        let two = BinomialLatticeEngine::new(2, ExerciseStyle::European).unwrap();
        assert!(two.gamma(&c).unwrap() > 0.0);
    }
}
