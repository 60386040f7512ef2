//! Service bootstrap
//!
//! Wires the concrete collaborators (sqlite database, HTTP chain client,
//! in-process shared store) into the scheduler, confirmation poller,
//! price sampler and notification consumer, then runs them until Ctrl-C.

use crate::arguments::Arguments;
use crate::chain::http::HttpChainClient;
use crate::config::EngineConfig;
use crate::confirm::ConfirmationPoller;
use crate::events::EventBus;
use crate::lock::WalletLockManager;
use crate::logger::{self, LogTag};
use crate::notifications::{self, LogNotifier, Notifier, TelegramNotifier};
use crate::persistence::sqlite::Database;
use crate::pricing::{sampler::PriceSampler, PriceResolver};
use crate::scheduler::OrderScheduler;
use crate::store::MemoryStore;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub async fn run(args: Arguments) -> Result<()> {
    logger::init(args.debug, args.verbose);
    logger::info(LogTag::System, "swapbot starting up");

    let config = EngineConfig::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config))?;
    logger::info(
        LogTag::Config,
        &format!("Config loaded from {}", args.config),
    );

    let database = Arc::new(
        Database::open(Path::new(&config.database.path))
            .with_context(|| format!("Failed to open database at {}", config.database.path))?,
    );

    let chain = Arc::new(
        HttpChainClient::new(&config.chain.base_url, &config.chain.api_key)
            .context("Failed to build chain client")?,
    );

    // Single-process deployment keeps wallet locks in memory. A multi-
    // instance deployment swaps in a SharedStore backed by Redis here.
    let shared_store = MemoryStore::new();
    let locks = Arc::new(WalletLockManager::new(Arc::new(shared_store)));

    let resolver = Arc::new(PriceResolver::new(database.clone(), chain.clone()));

    let (events, events_rx) = EventBus::new();
    let notifier: Arc<dyn Notifier> = if config.telegram.bot_token.is_empty() {
        logger::info(LogTag::Notify, "No Telegram token configured, logging notifications");
        Arc::new(LogNotifier)
    } else {
        Arc::new(TelegramNotifier::new(&config.telegram.bot_token))
    };

    let scheduler = Arc::new(OrderScheduler::new(
        database.clone(),
        chain.clone(),
        chain.clone(),
        resolver.clone(),
        locks.clone(),
        events,
    ));
    let poller = Arc::new(ConfirmationPoller::new(locks.clone(), chain.clone()));
    let sampler = Arc::new(PriceSampler::new(
        database.clone(),
        resolver.clone(),
        Duration::from_secs(config.scheduler.price_sample_interval_secs),
    ));

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    ctrlc::set_handler({
        let shutdown_tx = shutdown_tx.clone();
        move || {
            let _ = shutdown_tx.send(true);
        }
    })
    .context("Failed to install Ctrl-C handler")?;

    let notify_task = tokio::spawn(notifications::run_notification_loop(events_rx, notifier));

    let scheduler_task = {
        let scheduler = scheduler.clone();
        let shutdown = shutdown_rx.clone();
        let interval = Duration::from_secs(config.scheduler.order_interval_secs);
        tokio::spawn(async move { scheduler.run(shutdown, interval).await })
    };

    let confirm_task = {
        let poller = poller.clone();
        let shutdown = shutdown_rx.clone();
        let interval = Duration::from_secs(config.scheduler.confirm_interval_secs);
        tokio::spawn(async move { poller.run(shutdown, interval).await })
    };

    let sampler_task = {
        let sampler = sampler.clone();
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move { sampler.run(shutdown).await })
    };

    logger::info(LogTag::System, "All services running");

    let _ = scheduler_task.await;
    let _ = confirm_task.await;
    let _ = sampler_task.await;

    // Dropping the last scheduler handle drops the event sender; the
    // consumer drains the channel and exits
    drop(scheduler);
    let _ = notify_task.await;

    logger::info(LogTag::System, "swapbot stopped");
    Ok(())
}
