use actix_web::{web, App, HttpServer};
use engagement_service::config::{LogFormat, StoreBackend};
use engagement_service::handlers::{self, AppState};
use engagement_service::repository::{DocumentStore, MemoryStore, PgDocumentStore};
use engagement_service::Config;
use std::io;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate =
            signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = terminate.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    }
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }
}

async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn DocumentStore>> {
    match (config.store, config.database.as_ref()) {
        (StoreBackend::Postgres, Some(db)) => {
            let store = PgDocumentStore::connect(db).await?;
            store.migrate().await?;
            tracing::info!(
                max_connections = db.max_connections,
                "PostgreSQL document store ready"
            );
            Ok(Arc::new(store))
        }
        (StoreBackend::Postgres, None) => {
            anyhow::bail!("postgres backend selected without database configuration")
        }
        (StoreBackend::Memory, _) => {
            tracing::warn!("Using in-memory document store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("ERROR: Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    init_tracing(config.logging.format);

    tracing::info!(
        env = %config.app.env,
        store = ?config.store,
        "Starting engagement-service"
    );

    let store = build_store(&config).await.map_err(|e| {
        tracing::error!("Store initialization failed: {:#}", e);
        io::Error::new(io::ErrorKind::Other, format!("{:#}", e))
    })?;

    let state = web::Data::new(AppState::new(store, config.feed.clone()));
    let bind_addr = (config.app.host.clone(), config.app.http_port);

    tracing::info!("HTTP server listening on {}:{}", bind_addr.0, bind_addr.1);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(handlers::configure)
    })
    .bind(bind_addr)?
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    tokio::select! {
        result = server_task => {
            match result {
                Ok(Ok(())) => tracing::info!("HTTP server stopped"),
                Ok(Err(e)) => {
                    tracing::error!("HTTP server error: {}", e);
                    return Err(e);
                }
                Err(e) => {
                    tracing::error!("HTTP server task join error: {}", e);
                    return Err(io::Error::new(io::ErrorKind::Other, e.to_string()));
                }
            }
        }
        _ = &mut shutdown => {
            tracing::info!("Shutdown signal received");
            server_handle.stop(true).await;
        }
    }

    tracing::info!("engagement-service shut down");
    Ok(())
}
