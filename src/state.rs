use std::sync::{PoisonError, RwLock};

use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::order::{LogEvent, Order};
use crate::models::rider::Rider;
use crate::models::settings::SystemSettings;
use crate::observability::metrics::Metrics;

pub struct AppState {
    pub orders: DashMap<Uuid, Order>,
    pub riders: DashMap<Uuid, Rider>,
    /// Append-only event log per order, newest first.
    pub order_logs: DashMap<Uuid, Vec<LogEvent>>,
    /// Active configuration document; replaced wholesale, never patched.
    pub settings: RwLock<SystemSettings>,
    pub log_events_tx: broadcast::Sender<LogEvent>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(settings: SystemSettings, event_buffer_size: usize) -> Self {
        let (log_events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            orders: DashMap::new(),
            riders: DashMap::new(),
            order_logs: DashMap::new(),
            settings: RwLock::new(settings),
            log_events_tx,
            metrics: Metrics::new(),
        }
    }

    pub fn settings_snapshot(&self) -> SystemSettings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn replace_settings(&self, settings: SystemSettings) {
        *self
            .settings
            .write()
            .unwrap_or_else(PoisonError::into_inner) = settings;
    }

    pub fn append_log(&self, event: LogEvent) {
        self.order_logs
            .entry(event.order_id)
            .or_default()
            .insert(0, event.clone());
        let _ = self.log_events_tx.send(event);
    }
}
