//! Wiring of the document, slot, observer, and refresh schedule.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context as _;
use greeting_core::{
    DisplaySlot, Document, GreetingScheduler, GreetingUpdater, HourSource, TaskHandle, WidgetConfig,
};
use greeting_observer::{AppState, BroadcastSlot, ObserverHandle, ServerConfig, spawn_observer};
use tokio::sync::watch;
use tracing::info;

/// A running widget.
pub struct App {
    slot: Arc<BroadcastSlot>,
    refresh: TaskHandle,
    observer: Option<ObserverHandle>,
    stop: watch::Sender<bool>,
}

impl App {
    /// Build and start every component.
    ///
    /// Order matters: the slot is registered and the observer is serving
    /// before the document is marked ready, so the first update always
    /// finds its slot.
    pub async fn start(config: &WidgetConfig, clock: Arc<dyn HourSource>) -> anyhow::Result<Self> {
        let document = Arc::new(Document::new());
        let slot = Arc::new(BroadcastSlot::new(config.widget.slot_id.clone()));
        document.register(Arc::clone(&slot) as Arc<dyn DisplaySlot>);

        let (stop, _) = watch::channel(false);
        let observer = if config.observer.enabled {
            let mut stop_rx = stop.subscribe();
            let state = Arc::new(AppState::new(Arc::clone(&slot)));
            let handle = spawn_observer(&ServerConfig::from(&config.observer), state, async move {
                let _ = stop_rx.wait_for(|stop| *stop).await;
            })
            .await
            .context("failed to start observer")?;
            info!(addr = %handle.addr, "Observer started");
            Some(handle)
        } else {
            info!("Observer disabled");
            None
        };

        let updater = Arc::new(GreetingUpdater::from_config(
            Arc::clone(&document),
            clock,
            config,
        ));
        let refresh = GreetingScheduler::start(
            updater,
            Arc::clone(&document),
            config.widget.refresh_interval(),
        )?;

        document.mark_ready();

        Ok(Self {
            slot,
            refresh,
            observer,
            stop,
        })
    }

    /// The slot the greeting is written into.
    #[cfg(test)]
    pub const fn slot(&self) -> &Arc<BroadcastSlot> {
        &self.slot
    }

    /// Address the observer is bound to, if it is enabled.
    pub fn observer_addr(&self) -> Option<SocketAddr> {
        self.observer.as_ref().map(|o| o.addr)
    }

    /// Stop the refresh schedule and the observer, then wait for both.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        self.refresh.shutdown().await?;
        let last = self.slot.snapshot();
        info!(
            slot_id = %last.slot_id,
            text = %last.text,
            revision = last.revision,
            "Refresh schedule stopped"
        );
        self.stop.send_replace(true);
        if let Some(observer) = self.observer {
            observer
                .task
                .await
                .context("observer task failed during shutdown")?;
        }
        info!("greeting-widget shutdown complete");
        Ok(())
    }
}
