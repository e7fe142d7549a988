//! Watch command: tail the document store and dispatch trigger events.
//!
//! A local stand-in for the hosting platform's trigger delivery. Newly
//! created documents are picked up by rowid and routed through the
//! trigger router until interrupted with Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use console::style;
use tracing::info;

use td_core::config::ConfigHandle;
use td_core::constants::DEFAULT_WATCH_INTERVAL_MS;
use td_core::error::TdResult;
use td_functions::event_bus::{EventBus, StoreEvent};
use td_functions::relay::RelayService;
use td_functions::router::TriggerRouter;

pub async fn run(config: ConfigHandle, interval_ms: Option<u64>) -> TdResult<()> {
    let interval = Duration::from_millis(interval_ms.unwrap_or(DEFAULT_WATCH_INTERVAL_MS));

    let db = super::init_database(&config).await?;
    let gateway = super::create_gateway(&config).await?;
    let invite_url_base = config.read().await.relay.invite_url_base.clone();

    let relay = RelayService::new(db.clone(), gateway, &invite_url_base);
    let router = Arc::new(TriggerRouter::new(Arc::new(relay)));

    let bus = EventBus::new(256);
    let rx = bus.subscribe();
    let worker = {
        let router = Arc::clone(&router);
        tokio::spawn(async move { router.run(rx).await })
    };

    let mut cursor = db.latest_rowid()?;
    println!(
        "  {} Watching for new documents (every {}ms, from rowid {cursor}). Ctrl-C to stop.",
        style("...").dim(),
        interval.as_millis()
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!();
                info!("watch interrupted, shutting down");
                break;
            }
            _ = tokio::time::sleep(interval) => {
                for (rowid, doc) in db.documents_after(cursor)? {
                    cursor = rowid;
                    info!("document created: {}", doc.path);
                    bus.emit(StoreEvent::DocumentCreated {
                        path: doc.path.to_string(),
                        fields: doc.fields,
                    });
                }
            }
        }
    }

    // Closing the bus stops the router loop
    drop(bus);
    let _ = worker.await;

    println!("  {} Watch stopped.", style("OK").green().bold());
    Ok(())
}
