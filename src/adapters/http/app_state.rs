use std::sync::Arc;

use axum::extract::FromRef;

use crate::{adapters::http::auth::Verifier, infra::config::AppConfig};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub verifier: Verifier,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let config = Arc::new(config);
        Self {
            verifier: Verifier::new(config.clone()),
            config,
        }
    }
}

impl FromRef<AppState> for Verifier {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.verifier.clone()
    }
}
