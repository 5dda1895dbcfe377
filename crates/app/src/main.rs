use std::{sync::Arc, time::Duration};

use engine::{Console, GraphStore, MemoryStore, SqliteStore};
use migration::{Migrator, MigratorTrait};
use settings::Store;

mod settings;

/// How often a SQLite store looks for writes made by other processes.
const WATCH_INTERVAL: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;
    let mut tasks = tokio::task::JoinSet::new();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "kvfit={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let store = open_store(&settings.store).await?;
    let console = Arc::new(Console::builder().store(store).build().await?);
    let sync = console.spawn_sync();

    if let Some(server) = settings.server {
        let console = console.clone();
        tasks.spawn(async move {
            tracing::info!("Found server settings...");
            let bind = server.bind.clone().unwrap_or_else(|| "127.0.0.1".to_string());
            let addr = format!("{}:{}", bind, server.port);
            let listener = match tokio::net::TcpListener::bind(addr).await {
                Ok(listener) => listener,
                Err(err) => {
                    tracing::error!("failed to bind server listener: {err}");
                    return;
                }
            };
            if let Err(err) =
                server::run_with_listener(console, server.credentials(), listener).await
            {
                tracing::error!("server failed: {err}");
            }
        });
    } else {
        tracing::warn!("no server configured, only syncing");
    }

    tasks.spawn(async move {
        if let Err(err) = sync.await {
            tracing::error!("sync task stopped: {err}");
        }
    });

    while tasks.join_next().await.is_some() {
        tasks.shutdown().await;
    }

    Ok(())
}

async fn open_store(
    config: &Store,
) -> Result<Arc<dyn GraphStore>, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Store::Memory => return Ok(Arc::new(MemoryStore::new())),
        Store::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    let store = Arc::new(SqliteStore::new(database));
    store.spawn_watch(WATCH_INTERVAL);
    Ok(store)
}
