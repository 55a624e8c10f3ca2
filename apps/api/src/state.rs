//! Shared handler state.

use std::sync::Arc;

use ruedas_core::SaleTerms;
use ruedas_db::Database;

use crate::auth::JwtManager;
use crate::config::ApiConfig;
use crate::notifications::NotificationHub;

/// Cloned into every request; all fields are cheap handles.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ApiConfig>,
    pub hub: NotificationHub,
    pub jwt: Arc<JwtManager>,
    pub terms: SaleTerms,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let jwt = JwtManager::new(config.secret_key.clone(), config.token_lifetime_secs);
        let terms = config.sale_terms();

        AppState {
            db,
            config: Arc::new(config),
            hub: NotificationHub::default(),
            jwt: Arc::new(jwt),
            terms,
        }
    }
}
