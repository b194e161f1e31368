use tokio::sync::broadcast;

use crate::models::event::DeliveryEvent;
use crate::models::order::Order;
use crate::models::partner::Partner;
use crate::observability::metrics::Metrics;
use crate::store::Collection;

/// Shared handles, built once in `main` and passed to every component.
/// The collections stand in for the durable document store; their
/// conditional-update primitive is the only synchronization the engine
/// relies on.
pub struct AppState {
    pub orders: Collection<Order>,
    pub partners: Collection<Partner>,
    pub delivery_events_tx: broadcast::Sender<DeliveryEvent>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(event_buffer_size: usize) -> Self {
        let (delivery_events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            orders: Collection::new(),
            partners: Collection::new(),
            delivery_events_tx,
            metrics: Metrics::new(),
        }
    }
}
