pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

use std::sync::Arc;

use shared_config::AppConfig;
use shared_store::AccountStore;

#[derive(Clone)]
pub struct DoctorState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn AccountStore>,
}
