use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn},
    notify::{BroadcastNotifier, Notifier},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
    pub notifier: Arc<dyn Notifier>,
    /// Source for websocket subscriptions; `notifier` publishes into it in production.
    pub live: BroadcastNotifier,
}

impl AppState {
    /// Wires the broadcast channel as the notifier.
    pub fn new(pool: DbPool, orm: OrmConn, config: AppConfig) -> Self {
        let live = BroadcastNotifier::new(config.notify_capacity);
        Self {
            pool,
            orm,
            config: Arc::new(config),
            notifier: Arc::new(live.clone()),
            live,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }
}
