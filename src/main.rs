use mealspin_api::{config::Config, routes::create_router, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "mealspin_api=debug,tower_http=info".to_string());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let state = AppState::from_config(&config);
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
