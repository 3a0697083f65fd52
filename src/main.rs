use std::sync::Arc;

use color_eyre::eyre::Result;
use dotenv::dotenv;
use tokio::sync::watch;
use tracing::{error, info};
use tutorsync_api::{config::ApiConfig, ApiState};
use tutorsync_db::{create_pool, schema::initialize_database, PgStore};
use tutorsync_scheduler::{clock::SystemClock, config::SchedulerConfig, Scheduler};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenv().ok();

    let config = ApiConfig::from_env()?;
    let scheduler_config = SchedulerConfig::from_env()?;
    tutorsync_api::init_tracing(config.log_level)?;

    let db_pool = create_pool(&config.database_url).await?;
    initialize_database(&db_pool).await?;
    let store = Arc::new(PgStore::new(db_pool));

    let mut scheduler = Scheduler::build(scheduler_config, store.clone(), Arc::new(SystemClock))?;
    let state = Arc::new(ApiState::new(store, &scheduler));

    // Flipped to true once on shutdown; every background task watches it.
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let tasks = scheduler.start(cancel_rx.clone());

    let mut server_cancel = cancel_rx;
    let shutdown = async move {
        let _ = server_cancel.wait_for(|stop| *stop).await;
    };
    let mut server = tokio::spawn(tutorsync_api::start_server(config, state, shutdown));

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Shutdown signal received");
        }
        result = &mut server => {
            match result {
                Ok(Ok(())) => info!("Server stopped"),
                Ok(Err(e)) => error!("Server failed: {:?}", e),
                Err(e) => error!("Server task aborted: {}", e),
            }
        }
    }

    let _ = cancel_tx.send(true);
    if !server.is_finished() {
        if let Ok(Err(e)) = server.await {
            error!("Server failed during shutdown: {:?}", e);
        }
    }
    for task in tasks {
        if let Err(e) = task.await {
            error!("Background task ended abnormally: {}", e);
        }
    }

    info!("Shutdown complete");
    Ok(())
}
