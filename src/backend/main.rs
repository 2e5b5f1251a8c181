/**
 * Huddle Gateway Entry Point
 *
 * Loads settings, initializes tracing and serves the real-time gateway.
 */

#[cfg(feature = "ssr")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let settings = huddle::backend::server::config::load_settings()?;
    let addr = settings.gateway.socket_addr()?;

    let (app, state) = huddle::backend::server::init::create_app(settings).await;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Huddle gateway listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(huddle::backend::server::shutdown_signal(state.registry.clone()))
        .await?;

    tracing::info!("Huddle gateway stopped");
    Ok(())
}

#[cfg(not(feature = "ssr"))]
fn main() {
    eprintln!("Server requires the 'ssr' feature to be enabled.");
    eprintln!("Run with: cargo run --bin huddle-gateway --features ssr");
    std::process::exit(1);
}
