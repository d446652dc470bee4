pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

use std::sync::Arc;

use shared_config::AppConfig;
use shared_store::AccountStore;

use services::checkout::{CheckoutService, EventDedupe};
use services::lifecycle::LifecycleCoordinator;

/// Booking routes share long-lived state: the coordinator carries the
/// per-practitioner confirmation locks and the dedupe set remembers
/// already-processed payment events.
#[derive(Clone)]
pub struct BookingState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn AccountStore>,
    pub checkout: Arc<CheckoutService>,
    pub coordinator: Arc<LifecycleCoordinator>,
    pub seen_events: Arc<EventDedupe>,
}
