use focus_watch::config::DashboardConfig;
use focus_watch::StealthFlag;
use focus_watch_dashboard::{ServerConfig, StatusBus, start_server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "focus_watch=info,focus_watch_dashboard=debug".into()),
        )
        .init();

    // Bind address from env or default
    let mut dashboard = DashboardConfig::default();
    if let Ok(bind) = std::env::var("FW_BIND") {
        dashboard.bind_addr = bind;
    }

    let bus = StatusBus::new(16);
    let stealth = StealthFlag::new(false);
    let handle = start_server(bus, stealth, ServerConfig::from(&dashboard)).await?;

    tokio::select! {
        _ = handle => {}
        _ = tokio::signal::ctrl_c() => tracing::info!("shutting down"),
    }
    Ok(())
}
