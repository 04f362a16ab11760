use option_pricer::config::AppConfig;
use option_pricer::server;
use option_pricer::state::AppState;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    eprintln!("[option_pricer] binary started, setting up logging...");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("option pricing service starting");

    let cfg = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("config error: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        binomial_steps = cfg.binomial_steps,
        mc_simulations = cfg.mc_simulations,
        mc_seed = cfg.mc_seed,
        mc_path_steps = cfg.mc_path_steps,
        "engine defaults loaded"
    );

    let port = cfg.server_port;
    let app = server::router(Arc::new(AppState::new(cfg)));

    let addr = format!("0.0.0.0:{port}");
    tracing::info!("server listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("bind error: {e}");
            std::process::exit(1);
        });

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {e}");
    }
}
