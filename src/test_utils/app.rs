use axum_test::TestServer;

use crate::{
    adapters::http::app_state::AppState,
    infra::{app::create_app, config::AppConfig},
};

/// The full application, layers included, behind a test server.
pub fn create_test_server(config: AppConfig) -> TestServer {
    TestServer::new(create_app(AppState::new(config))).unwrap()
}
