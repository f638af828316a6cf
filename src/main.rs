use std::sync::Arc;

use tracing::info;

use medsupply_api::{app, config, db, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load_config()?;
    config::init_tracing(cfg.log_level());

    let pool = db::establish_connection_from_app_config(&cfg).await?;
    if cfg.auto_migrate {
        db::run_migrations(&pool).await?;
    }
    db::check_connection(&pool).await?;

    let addr = format!("{}:{}", cfg.host, cfg.port);
    let state = AppState {
        db: Arc::new(pool),
        config: Arc::new(cfg),
    };

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "Server listening");
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
