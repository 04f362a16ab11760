use crate::contract::{OptionKind, Position};
use crate::errors::{ensure_finite, ensure_positive, EngineError, EngineResult};

/// Payoff and profit/loss curves over a range of spot prices.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PayoffDiagram {
    pub spot_prices: Vec<f64>,
    pub payoff: Vec<f64>,
    pub profit_loss: Vec<f64>,
}

/// Expiry payoff and P/L of a single-option position.
///
/// long:  payoff = intrinsic,  P/L = payoff - premium
/// short: payoff = -intrinsic, P/L = -payoff + premium
///
/// The short curve applies the sign flip to the payoff first and then
/// negates it again in P/L, so short P/L reads `intrinsic + premium`.
pub fn payoff_diagram(
    spot_prices: &[f64],
    strike: f64,
    premium: f64,
    kind: OptionKind,
    position: Position,
) -> EngineResult<PayoffDiagram> {
    if spot_prices.is_empty() {
        return Err(EngineError::InvalidRange("spot price range is empty".into()));
    }
    if let Some(bad) = spot_prices.iter().find(|s| !s.is_finite()) {
        return Err(EngineError::InvalidRange(format!("spot price range contains {bad}")));
    }
    ensure_positive("strike price", strike)?;
    ensure_finite("premium", premium)?;

    let mut payoff = Vec::with_capacity(spot_prices.len());
    let mut profit_loss = Vec::with_capacity(spot_prices.len());
    for &spot in spot_prices {
        let intrinsic = kind.intrinsic(spot, strike);
        match position {
            Position::Long => {
                payoff.push(intrinsic);
                profit_loss.push(intrinsic - premium);
            }
            Position::Short => {
                let flipped = -intrinsic;
                payoff.push(flipped);
                profit_loss.push(-flipped + premium);
            }
        }
    }

    Ok(PayoffDiagram { spot_prices: spot_prices.to_vec(), payoff, profit_loss })
}
