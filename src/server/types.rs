use crate::contract::{OptionContract, OptionKind};
use crate::errors::EngineResult;

/// Market inputs shared by every pricing endpoint.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractFields {
    pub spot_price: f64,
    pub strike_price: f64,
    pub time_to_maturity: f64,
    pub risk_free_rate: f64,
    pub volatility: f64,
    pub option_type: Option<String>,
}

/// Parse an optional option-type string, defaulting to "call".
pub fn parse_kind(raw: Option<&str>) -> EngineResult<OptionKind> {
    raw.unwrap_or("call").parse()
}

impl ContractFields {
    pub fn kind(&self) -> EngineResult<OptionKind> {
        parse_kind(self.option_type.as_deref())
    }

    /// Kind is parsed first so an unknown option type fails before any
    /// numeric validation.
    pub fn to_contract(&self) -> EngineResult<OptionContract> {
        let kind = self.kind()?;
        OptionContract::new(
            self.spot_price,
            self.strike_price,
            self.time_to_maturity,
            self.risk_free_rate,
            self.volatility,
            kind,
        )
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinomialRequest {
    #[serde(flatten)]
    pub contract: ContractFields,
    pub steps: Option<usize>,
    pub exercise: Option<String>,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonteCarloRequest {
    #[serde(flatten)]
    pub contract: ContractFields,
    pub simulations: Option<usize>,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivityRequest {
    #[serde(flatten)]
    pub contract: ContractFields,
    pub parameter: String,
    pub variation_range: Option<f64>,
}

/// Implied-volatility input: the contract without a volatility.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpliedVolRequest {
    pub market_price: f64,
    pub spot_price: f64,
    pub strike_price: f64,
    pub time_to_maturity: f64,
    pub risk_free_rate: f64,
    pub option_type: Option<String>,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoffRequest {
    pub strike_price: f64,
    pub premium: f64,
    pub option_type: Option<String>,
    pub position: Option<String>,
    pub spot_min: Option<f64>,
    pub spot_max: Option<f64>,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathsRequest {
    #[serde(flatten)]
    pub contract: ContractFields,
    pub num_paths: Option<usize>,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    #[serde(flatten)]
    pub contract: ContractFields,
    pub model: Option<String>,
    pub spot_min: Option<f64>,
    pub spot_max: Option<f64>,
    pub steps: Option<usize>,
    pub simulations: Option<usize>,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceRequest {
    #[serde(flatten)]
    pub contract: ContractFields,
    pub strikes: Vec<f64>,
    pub maturities: Vec<f64>,
}

// ── Responses ──

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct Interval {
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonteCarloResponse {
    pub price: f64,
    pub standard_error: f64,
    pub confidence_interval: Interval,
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpliedVolResponse {
    pub implied_volatility: f64,
    pub iterations: usize,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathsResponse {
    pub time_grid: Vec<f64>,
    pub paths: Vec<Vec<f64>>,
    pub strike_price: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_type_defaults_to_call() {
        let f: ContractFields = serde_json::from_value(serde_json::json!({
            "spotPrice": 100.0, "strikePrice": 100.0, "timeToMaturity": 1.0,
            "riskFreeRate": 0.05, "volatility": 0.2
        }))
        .unwrap();
        assert_eq!(f.to_contract().unwrap().kind(), OptionKind::Call);
    }

    #[test]
    fn test_flattened_request_fields() {
        let req: BinomialRequest = serde_json::from_value(serde_json::json!({
            "spotPrice": 100.0, "strikePrice": 90.0, "timeToMaturity": 1.0,
            "riskFreeRate": 0.05, "volatility": 0.2, "optionType": "PUT",
            "steps": 50, "exercise": "american"
        }))
        .unwrap();
        assert_eq!(req.steps, Some(50));
        assert_eq!(req.contract.to_contract().unwrap().kind(), OptionKind::Put);
    }
}
