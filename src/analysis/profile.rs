use crate::analysis::linspace;
use crate::contract::OptionContract;
use crate::errors::{ensure_positive, EngineError, EngineResult};
use crate::models::black_scholes::BlackScholesEngine;
use crate::models::{PricingEngine, PricingModel};

/// Model price across a range of spot prices.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PriceProfile {
    pub model: &'static str,
    pub spot_prices: Vec<f64>,
    pub prices: Vec<f64>,
}

/// Black-Scholes Greeks across a range of spot prices.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct GreeksProfile {
    pub spot_prices: Vec<f64>,
    pub delta: Vec<f64>,
    pub gamma: Vec<f64>,
    pub vega: Vec<f64>,
    pub theta: Vec<f64>,
}

/// Black-Scholes prices on a strike × maturity grid: `prices[m][k]` is the
/// price at `maturities[m]` and `strikes[k]`.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PriceSurface {
    pub strikes: Vec<f64>,
    pub maturities: Vec<f64>,
    pub prices: Vec<Vec<f64>>,
}

fn spot_grid(spot_min: f64, spot_max: f64, points: usize) -> EngineResult<Vec<f64>> {
    ensure_positive("minimum spot", spot_min)?;
    ensure_positive("maximum spot", spot_max)?;
    if spot_min >= spot_max {
        return Err(EngineError::InvalidRange(format!(
            "spot range must be increasing, got [{spot_min}, {spot_max}]"
        )));
    }
    if points < 2 {
        return Err(EngineError::InvalidRange(format!("need at least 2 points, got {points}")));
    }
    Ok(linspace(spot_min, spot_max, points))
}

pub fn price_profile(
    engine: &PricingEngine,
    contract: &OptionContract,
    spot_min: f64,
    spot_max: f64,
    points: usize,
) -> EngineResult<PriceProfile> {
    let spot_prices = spot_grid(spot_min, spot_max, points)?;
    let prices = spot_prices
        .iter()
        .map(|&s| engine.price(&contract.with_spot(s)?))
        .collect::<EngineResult<Vec<f64>>>()?;
    Ok(PriceProfile { model: engine.name(), spot_prices, prices })
}

pub fn greeks_profile(
    contract: &OptionContract,
    spot_min: f64,
    spot_max: f64,
    points: usize,
) -> EngineResult<GreeksProfile> {
    let spot_prices = spot_grid(spot_min, spot_max, points)?;
    let bs = BlackScholesEngine::new();
    let mut profile = GreeksProfile {
        spot_prices: Vec::with_capacity(points),
        delta: Vec::with_capacity(points),
        gamma: Vec::with_capacity(points),
        vega: Vec::with_capacity(points),
        theta: Vec::with_capacity(points),
    };
    for s in spot_prices {
        let greeks = bs.greeks(&contract.with_spot(s)?);
        profile.spot_prices.push(s);
        profile.delta.push(greeks.delta);
        profile.gamma.push(greeks.gamma);
        profile.vega.push(greeks.vega);
        profile.theta.push(greeks.theta);
    }
    Ok(profile)
}

pub fn price_surface(contract: &OptionContract, strikes: &[f64], maturities: &[f64]) -> EngineResult<PriceSurface> {
    if strikes.is_empty() || maturities.is_empty() {
        return Err(EngineError::InvalidRange("price surface needs at least one strike and one maturity".into()));
    }
    let bs = BlackScholesEngine::new();
    let prices = maturities
        .iter()
        .map(|&t| {
            let at_maturity = contract.with_time(t)?;
            strikes
                .iter()
                .map(|&k| Ok(bs.price(&at_maturity.with_strike(k)?)))
                .collect::<EngineResult<Vec<f64>>>()
        })
        .collect::<EngineResult<Vec<Vec<f64>>>>()?;
    Ok(PriceSurface { strikes: strikes.to_vec(), maturities: maturities.to_vec(), prices })
}
