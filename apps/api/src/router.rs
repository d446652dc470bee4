use std::sync::Arc;

use axum::{routing::get, Router};

use auth_cell::AuthState;
use booking_cell::services::checkout::{CheckoutService, EventDedupe};
use booking_cell::services::lifecycle::LifecycleCoordinator;
use booking_cell::services::meeting::MeetingClient;
use booking_cell::BookingState;
use doctor_cell::DoctorState;
use notification_cell::{HttpMailer, NotificationGateway};
use shared_config::AppConfig;
use shared_store::memory::MemoryStore;
use shared_store::AccountStore;

/// Wire the cells together. The flat route paths live inside each cell's
/// router; this only composes them over the shared store and mailer.
pub fn create_router(config: Arc<AppConfig>) -> Router {
    let store: Arc<dyn AccountStore> = Arc::new(MemoryStore::new());
    let notifier: Arc<dyn NotificationGateway> = Arc::new(HttpMailer::new(config.clone()));

    let auth_state = AuthState {
        config: config.clone(),
        store: store.clone(),
        notifier: notifier.clone(),
    };

    let doctor_state = DoctorState {
        config: config.clone(),
        store: store.clone(),
    };

    let coordinator = Arc::new(LifecycleCoordinator::new(
        store.clone(),
        MeetingClient::new(&config),
        notifier.clone(),
    ));
    let booking_state = BookingState {
        config: config.clone(),
        store: store.clone(),
        checkout: Arc::new(CheckoutService::new(config.clone(), store.clone())),
        coordinator,
        seen_events: Arc::new(EventDedupe::default()),
    };

    Router::new()
        .route("/", get(|| async { "Telehealth API is running!" }))
        .merge(auth_cell::router::router(auth_state))
        .merge(doctor_cell::router::router(doctor_state))
        .merge(booking_cell::router::router(booking_state))
}
