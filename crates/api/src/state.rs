use std::sync::Arc;

use station_core::clock::Clock;
use station_events::EventBus;
use station_scheduler::{EventBusNotifier, GenerationClaim, PgTrackStore, StationScheduler};

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all handlers via `State<AppState>`.
///
/// Cheap to clone; everything inside is an `Arc` or a pool handle.
#[derive(Clone)]
pub struct AppState {
    pub pool: station_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Connected realtime clients.
    pub ws_manager: Arc<WsManager>,
    pub event_bus: Arc<EventBus>,
    pub scheduler: StationScheduler,
    pub generation: GenerationClaim,
}

impl AppState {
    /// Wire the scheduler and generation claim to Postgres and the event bus.
    pub fn new(pool: station_db::DbPool, config: ServerConfig, clock: Arc<dyn Clock>) -> Self {
        let event_bus = Arc::new(EventBus::default());
        let store = Arc::new(PgTrackStore::new(pool.clone()));
        let notifier = Arc::new(EventBusNotifier::new(Arc::clone(&event_bus)));

        Self {
            pool,
            config: Arc::new(config),
            ws_manager: Arc::new(WsManager::new()),
            event_bus,
            scheduler: StationScheduler::new(store.clone(), notifier, clock),
            generation: GenerationClaim::new(store),
        }
    }
}
