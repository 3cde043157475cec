use cadence_server::{AppState, Cli};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let mode = cli.processing_mode()?;
    let server_url = cli.resolved_server_url();

    std::fs::create_dir_all(&cli.states_dir)?;
    std::fs::create_dir_all(&cli.phases_dir)?;

    let state = AppState::new(
        cli.states_dir.clone(),
        cli.phases_dir.clone(),
        server_url,
        mode,
        "no task instructions configured".to_string(),
        cli.llm_gateway_url.clone(),
    );

    let app = cadence_server::api::router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", cli.port)).await?;
    tracing::info!(port = cli.port, mode = %mode, "cadence-server listening");
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(log_level: &str) {
    let default_directive = match log_level {
        "debug" => "debug",
        "warning" => "warn",
        "error" => "error",
        _ => "info",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("{default_directive},cadence=debug"))),
        )
        .json()
        .init();
}
