use crate::analysis::comparison::{self, ComparisonReport, ComparisonSettings};
use crate::analysis::implied_vol::{ImpliedVolatility, ImpliedVolatilitySolver};
use crate::analysis::payoff::{self, PayoffDiagram};
use crate::analysis::profile::{self, GreeksProfile, PriceProfile, PriceSurface};
use crate::analysis::linspace;
use crate::analysis::sensitivity::{self, SensitivityReport, DEFAULT_VARIATION};
use crate::contract::{ExerciseStyle, Position};
use crate::errors::EngineResult;
use crate::models::binomial::{BinomialLatticeEngine, BinomialReport};
use crate::models::black_scholes::BlackScholesEngine;
use crate::models::monte_carlo::MonteCarloEngine;
use crate::models::{ModelKind, PricingEngine, PricingModel, PricingResult};
use crate::server::types::*;
use crate::server::ApiError;
use crate::state::{AppState, CounterSnapshot};
use axum::extract::State;
use axum::response::Json;
use std::sync::Arc;

/// Points on adapter-generated spot ranges.
const RANGE_POINTS: usize = 100;

/// Default paths returned for inspection.
const DEFAULT_SAMPLE_PATHS: usize = 100;

type ApiResult<T> = Result<Json<T>, ApiError>;

fn finish<T>(state: &AppState, result: EngineResult<T>) -> ApiResult<T> {
    match result {
        Ok(v) => {
            state.record_success();
            Ok(Json(v))
        }
        Err(e) => {
            state.record_failure();
            Err(ApiError(e))
        }
    }
}

/// Run CPU-bound engine work off the async executor.
async fn blocking<T, F>(work: F) -> EngineResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> EngineResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work).await?
}

/// Monte Carlo engine from adapter config, with the request's simulation
/// count capped at the configured maximum.
fn monte_carlo_engine(state: &AppState, simulations: Option<usize>) -> EngineResult<MonteCarloEngine> {
    let cfg = &state.config;
    let requested = simulations.unwrap_or(cfg.mc_simulations);
    let simulations = requested.min(cfg.max_simulations);
    if simulations < requested {
        tracing::debug!(requested, simulations, "simulation count capped");
    }
    MonteCarloEngine::new(simulations)?
        .with_steps(cfg.mc_path_steps)?
        .with_confidence_level(cfg.mc_confidence)
        .map(|e| e.with_seed(cfg.mc_seed))
}

fn binomial_engine(state: &AppState, steps: Option<usize>, exercise: Option<&str>) -> EngineResult<BinomialLatticeEngine> {
    let exercise = match exercise {
        Some(raw) => raw.parse()?,
        None => ExerciseStyle::European,
    };
    let steps = steps.unwrap_or(state.config.binomial_steps).min(state.config.max_binomial_steps);
    BinomialLatticeEngine::new(steps, exercise)
}

/// Default spot window [0.5K, 1.5K] around the strike.
fn spot_window(strike: f64, spot_min: Option<f64>, spot_max: Option<f64>) -> (f64, f64) {
    (spot_min.unwrap_or(strike * 0.5), spot_max.unwrap_or(strike * 1.5))
}

/// GET /api/health -- liveness
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy", "message": "Options pricing API is running" }))
}

/// GET /api/counters -- request counters (lock-free reads)
pub async fn get_counters(State(state): State<Arc<AppState>>) -> Json<CounterSnapshot> {
    Json(state.counters.snapshot())
}

/// POST /api/price/black-scholes -- closed-form price + five Greeks
pub async fn price_black_scholes(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ContractFields>,
) -> ApiResult<PricingResult> {
    let result = req
        .to_contract()
        .and_then(|c| BlackScholesEngine::new().evaluate(&c));
    finish(&state, result)
}

/// POST /api/price/binomial-tree -- lattice price, delta, gamma
pub async fn price_binomial_tree(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BinomialRequest>,
) -> ApiResult<BinomialReport> {
    let prepared = req
        .contract
        .to_contract()
        .and_then(|c| Ok((c, binomial_engine(&state, req.steps, req.exercise.as_deref())?)));
    let result = match prepared {
        Ok((contract, engine)) => {
            let report = blocking(move || engine.price_with_greeks(&contract)).await;
            if report.is_ok() {
                state.record_lattice(engine.steps());
            }
            report
        }
        Err(e) => Err(e),
    };
    finish(&state, result)
}

/// POST /api/price/monte-carlo -- simulated price with confidence interval
pub async fn price_monte_carlo(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MonteCarloRequest>,
) -> ApiResult<MonteCarloResponse> {
    let prepared = req
        .contract
        .to_contract()
        .and_then(|c| Ok((c, monte_carlo_engine(&state, req.simulations)?)));
    let result = match prepared {
        Ok((contract, engine)) => {
            let simulations = engine.simulations();
            let estimate = blocking(move || Ok(engine.price_with_confidence(&contract))).await;
            if estimate.is_ok() {
                state.record_simulations(simulations);
            }
            estimate.map(|e| MonteCarloResponse {
                price: e.price,
                standard_error: e.standard_error,
                confidence_interval: Interval { lower: e.lower, upper: e.upper },
            })
        }
        Err(e) => Err(e),
    };
    finish(&state, result)
}

/// POST /api/compare -- all three models side by side
pub async fn compare(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ContractFields>,
) -> ApiResult<ComparisonReport> {
    let cfg = &state.config;
    let settings = ComparisonSettings {
        binomial_steps: cfg.binomial_steps,
        simulations: cfg.mc_simulations,
        path_steps: cfg.mc_path_steps,
        seed: cfg.mc_seed,
    };
    let result = match req.to_contract() {
        Ok(contract) => blocking(move || comparison::compare_models(&contract, &settings)).await,
        Err(e) => Err(e),
    };
    if result.is_ok() {
        state.record_simulations(settings.simulations);
        state.record_lattice(settings.binomial_steps);
    }
    finish(&state, result)
}

/// POST /api/analyze/payoff -- payoff and P/L over a spot range
pub async fn analyze_payoff(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PayoffRequest>,
) -> ApiResult<PayoffDiagram> {
    let result = (|| -> EngineResult<_> {
        let kind = parse_kind(req.option_type.as_deref())?;
        let position = match req.position.as_deref() {
            Some(raw) => raw.parse()?,
            None => Position::Long,
        };
        let (lo, hi) = spot_window(req.strike_price, req.spot_min, req.spot_max);
        let spots = linspace(lo, hi, RANGE_POINTS);
        payoff::payoff_diagram(&spots, req.strike_price, req.premium, kind, position)
    })();
    finish(&state, result)
}

/// POST /api/analyze/sensitivity -- Black-Scholes sweep of one parameter
pub async fn analyze_sensitivity(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SensitivityRequest>,
) -> ApiResult<SensitivityReport> {
    let result = (|| -> EngineResult<_> {
        let contract = req.contract.to_contract()?;
        let target = req.parameter.parse()?;
        sensitivity::sensitivity_analysis(&contract, target, req.variation_range.unwrap_or(DEFAULT_VARIATION))
    })();
    finish(&state, result)
}

/// POST /api/implied-volatility -- Newton-Raphson volatility from a market price
pub async fn implied_volatility(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ImpliedVolRequest>,
) -> ApiResult<ImpliedVolResponse> {
    let result = (|| -> EngineResult<_> {
        let kind = parse_kind(req.option_type.as_deref())?;
        let outcome = ImpliedVolatilitySolver::new().solve(
            req.market_price,
            req.spot_price,
            req.strike_price,
            req.time_to_maturity,
            req.risk_free_rate,
            kind,
        )?;
        let iterations = match outcome {
            ImpliedVolatility::Converged { iterations, .. } | ImpliedVolatility::NotConverged { iterations, .. } => {
                iterations
            }
        };
        Ok(ImpliedVolResponse { implied_volatility: outcome.into_result()?, iterations })
    })();
    finish(&state, result)
}

/// POST /api/simulate/paths -- small GBM ensemble for inspection
pub async fn simulate_paths(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PathsRequest>,
) -> ApiResult<PathsResponse> {
    let num_paths = req.num_paths.unwrap_or(DEFAULT_SAMPLE_PATHS).min(state.config.max_sample_paths);
    let prepared = req
        .contract
        .to_contract()
        .and_then(|c| Ok((c, monte_carlo_engine(&state, None)?)));
    let result = match prepared {
        Ok((contract, engine)) => {
            blocking(move || {
                let ensemble = engine.sample_paths(&contract, num_paths)?;
                Ok(PathsResponse {
                    time_grid: ensemble.time_grid(contract.time_to_maturity()),
                    paths: ensemble.to_rows(),
                    strike_price: contract.strike(),
                })
            })
            .await
        }
        Err(e) => Err(e),
    };
    finish(&state, result)
}

/// POST /api/analyze/price-profile -- model price across spot
pub async fn analyze_price_profile(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProfileRequest>,
) -> ApiResult<PriceProfile> {
    let prepared = (|| -> EngineResult<_> {
        let contract = req.contract.to_contract()?;
        let model: ModelKind = req.model.as_deref().unwrap_or("black-scholes").parse()?;
        let engine: PricingEngine = match model {
            ModelKind::BlackScholes => BlackScholesEngine::new().into(),
            ModelKind::BinomialTree => binomial_engine(&state, req.steps, None)?.into(),
            ModelKind::MonteCarlo => monte_carlo_engine(&state, req.simulations)?.into(),
        };
        Ok((contract, engine))
    })();
    let (lo, hi) = spot_window(req.contract.strike_price, req.spot_min, req.spot_max);
    let result = match prepared {
        Ok((contract, engine)) => {
            blocking(move || profile::price_profile(&engine, &contract, lo, hi, RANGE_POINTS)).await
        }
        Err(e) => Err(e),
    };
    finish(&state, result)
}

/// POST /api/analyze/greeks-profile -- Black-Scholes Greeks across spot
pub async fn analyze_greeks_profile(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProfileRequest>,
) -> ApiResult<GreeksProfile> {
    let (lo, hi) = spot_window(req.contract.strike_price, req.spot_min, req.spot_max);
    let result = req
        .contract
        .to_contract()
        .and_then(|c| profile::greeks_profile(&c, lo, hi, RANGE_POINTS));
    finish(&state, result)
}

/// POST /api/analyze/price-surface -- Black-Scholes price over strikes × maturities
pub async fn analyze_price_surface(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SurfaceRequest>,
) -> ApiResult<PriceSurface> {
    let result = req
        .contract
        .to_contract()
        .and_then(|c| profile::price_surface(&c, &req.strikes, &req.maturities));
    finish(&state, result)
}

#[cfg(test)]
mod tests {
    use crate::config::AppConfig;
    use crate::server::router;
    use crate::state::AppState;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        let config = AppConfig { mc_simulations: 2_000, mc_path_steps: 10, ..AppConfig::default() };
        router(Arc::new(AppState::new(config)))
    }

    fn contract_json() -> Value {
        json!({
            "spotPrice": 100.0,
            "strikePrice": 100.0,
            "timeToMaturity": 1.0,
            "riskFreeRate": 0.05,
            "volatility": 0.2
        })
    }

    fn with(mut base: Value, extra: Value) -> Value {
        if let (Some(b), Some(e)) = (base.as_object_mut(), extra.as_object()) {
            for (k, v) in e {
                b.insert(k.clone(), v.clone());
            }
        }
        base
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(b) => builder
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
        send(app, "POST", uri, Some(body)).await
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(), "GET", "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_black_scholes_reference() {
        let (status, body) = post(&app(), "/api/price/black-scholes", contract_json()).await;
        assert_eq!(status, StatusCode::OK);
        let price = body["price"].as_f64().unwrap();
        assert!((price - 10.4506).abs() < 1e-3, "price={price}");
        assert!((body["greeks"]["delta"].as_f64().unwrap() - 0.6368).abs() < 1e-4);
    }

    #[tokio::test]
    async fn test_invalid_option_type_rejected_everywhere() {
        let app = app();
        let bad = with(contract_json(), json!({ "optionType": "straddle" }));
        for uri in [
            "/api/price/black-scholes",
            "/api/price/binomial-tree",
            "/api/price/monte-carlo",
            "/api/compare",
        ] {
            let (status, body) = post(&app, uri, bad.clone()).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["kind"], "invalid_parameter", "{uri}");
        }
    }

    #[tokio::test]
    async fn test_non_positive_spot_is_invalid_range() {
        let bad = with(contract_json(), json!({ "spotPrice": 0.0 }));
        let (status, body) = post(&app(), "/api/price/black-scholes", bad).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_range");
    }

    #[tokio::test]
    async fn test_binomial_american_put_and_depth_guard() {
        let app = app();
        let put = with(contract_json(), json!({ "optionType": "put", "exercise": "american", "steps": 200 }));
        let (status, body) = post(&app, "/api/price/binomial-tree", put).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["price"].as_f64().unwrap() > 5.5);
        assert!(body["delta"].as_f64().unwrap() < 0.0);

        let shallow = with(contract_json(), json!({ "steps": 1 }));
        let (status, body) = post(&app, "/api/price/binomial-tree", shallow).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_range");
    }

    #[tokio::test]
    async fn test_binomial_step_count_capped() {
        let config = AppConfig { max_binomial_steps: 300, ..AppConfig::default() };
        let app = router(Arc::new(AppState::new(config)));
        let deep = with(contract_json(), json!({ "optionType": "put", "exercise": "american", "steps": 1_000_000 }));
        let (status, body) = post(&app, "/api/price/binomial-tree", deep).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["price"].as_f64().unwrap() > 5.5);
        let (_, counters) = send(&app, "GET", "/api/counters", None).await;
        assert_eq!(counters["lattice_nodes_built"], 301 * 302 / 2);
    }

    #[tokio::test]
    async fn test_monte_carlo_reproducible() {
        let app = app();
        let (s1, a) = post(&app, "/api/price/monte-carlo", contract_json()).await;
        let (s2, b) = post(&app, "/api/price/monte-carlo", contract_json()).await;
        assert_eq!(s1, StatusCode::OK);
        assert_eq!(s2, StatusCode::OK);
        assert_eq!(a, b);
        let price = a["price"].as_f64().unwrap();
        assert!(a["confidenceInterval"]["lower"].as_f64().unwrap() <= price);
        assert!(a["confidenceInterval"]["upper"].as_f64().unwrap() >= price);
        assert!(a["standardError"].as_f64().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_compare_sections() {
        let (status, body) = post(&app(), "/api/compare", contract_json()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["black_scholes"]["price"].is_number());
        assert!(body["binomial_tree"]["gamma"].is_number());
        assert!(body["monte_carlo"]["std_error"].is_number());
    }

    #[tokio::test]
    async fn test_implied_volatility_round_trip_and_degeneracy() {
        let app = app();
        let req = json!({
            "marketPrice": 10.450583572185565,
            "spotPrice": 100.0, "strikePrice": 100.0,
            "timeToMaturity": 1.0, "riskFreeRate": 0.05
        });
        let (status, body) = post(&app, "/api/implied-volatility", req).await;
        assert_eq!(status, StatusCode::OK);
        let iv = body["impliedVolatility"].as_f64().unwrap();
        assert!((iv - 0.2).abs() < 1e-4, "iv={iv}");

        let degenerate = json!({
            "marketPrice": 1.0, "spotPrice": 100.0, "strikePrice": 1e9,
            "timeToMaturity": 1.0, "riskFreeRate": 0.05
        });
        let (status, body) = post(&app, "/api/implied-volatility", degenerate).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["kind"], "numeric_degeneracy");
    }

    #[tokio::test]
    async fn test_sensitivity_and_unknown_parameter() {
        let app = app();
        let ok = with(contract_json(), json!({ "parameter": "volatility" }));
        let (status, body) = post(&app, "/api/analyze/sensitivity", ok).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["values"].as_array().unwrap().len(), 50);
        assert_eq!(body["parameter"], "volatility");

        let bad = with(contract_json(), json!({ "parameter": "dividend" }));
        let (status, body) = post(&app, "/api/analyze/sensitivity", bad).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_parameter");
    }

    #[tokio::test]
    async fn test_payoff_default_window() {
        let req = json!({ "strikePrice": 100.0, "premium": 5.0 });
        let (status, body) = post(&app(), "/api/analyze/payoff", req).await;
        assert_eq!(status, StatusCode::OK);
        let spots = body["spot_prices"].as_array().unwrap();
        assert_eq!(spots.len(), 100);
        assert_eq!(spots[0].as_f64().unwrap(), 50.0);
        assert_eq!(spots[99].as_f64().unwrap(), 150.0);
        assert_eq!(body["profit_loss"][0].as_f64().unwrap(), -5.0);
    }

    #[tokio::test]
    async fn test_paths_and_profiles() {
        let app = app();
        let (status, body) = post(&app, "/api/simulate/paths", with(contract_json(), json!({ "numPaths": 5 }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["paths"].as_array().unwrap().len(), 5);
        assert_eq!(body["timeGrid"].as_array().unwrap().len(), 11);

        let (status, body) = post(
            &app,
            "/api/analyze/price-profile",
            with(contract_json(), json!({ "model": "binomial-tree", "steps": 20 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["model"], "Binomial Tree");
        assert_eq!(body["prices"].as_array().unwrap().len(), 100);

        let (status, _) = post(&app, "/api/analyze/price-profile", with(contract_json(), json!({ "model": "sabr" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = post(&app, "/api/analyze/greeks-profile", contract_json()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["delta"].as_array().unwrap().len(), 100);

        let surface = with(contract_json(), json!({ "strikes": [90.0, 110.0], "maturities": [0.5, 1.0, 2.0] }));
        let (status, body) = post(&app, "/api/analyze/price-surface", surface).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["prices"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_counters_track_outcomes() {
        let app = app();
        post(&app, "/api/price/black-scholes", contract_json()).await;
        post(&app, "/api/price/black-scholes", with(contract_json(), json!({ "optionType": "straddle" }))).await;
        post(&app, "/api/price/monte-carlo", contract_json()).await;
        let (status, body) = send(&app, "GET", "/api/counters", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["requests_served"], 2);
        assert_eq!(body["requests_failed"], 1);
        assert_eq!(body["simulations_run"], 2_000);
    }
}
