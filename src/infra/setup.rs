use std::fs::File;
use std::path::Path;

use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::http::app_state::AppState,
    infra::{config::AppConfig, error::InfraError},
};

pub fn init_app_state() -> AppState {
    AppState::new(AppConfig::from_env())
}

pub fn init_tracing(log_file: Option<&Path>) -> Result<(), InfraError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "markethub_api=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false) // don't show target (module path)
        .with_level(true)
        .pretty();

    // File (structured JSON logs), only when configured
    let json_layer = match log_file {
        Some(path) => {
            let file = File::create(path).map_err(|source| InfraError::LogFile {
                path: path.to_path_buf(),
                source,
            })?;
            Some(
                fmt::layer()
                    .json()
                    .with_writer(file)
                    .with_current_span(true)
                    .with_span_list(true)
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();

    Ok(())
}
