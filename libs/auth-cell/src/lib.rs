pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

use std::sync::Arc;

use notification_cell::NotificationGateway;
use shared_config::AppConfig;
use shared_store::AccountStore;

/// Everything the credential routes need, injected once at startup.
#[derive(Clone)]
pub struct AuthState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn AccountStore>,
    pub notifier: Arc<dyn NotificationGateway>,
}
