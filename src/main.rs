use dotenvy::dotenv;
use tracing::info;

use markethub_api::infra::{
    app::create_app,
    error::InfraError,
    setup::{init_app_state, init_tracing},
};
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let app_state = init_app_state();

    init_tracing(app_state.config.log_file.as_deref())?;

    let bind_addr = app_state.config.bind_addr;
    let error_mode = app_state.config.error_mode;

    let app = create_app(app_state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(InfraError::TcpBind)?;

    info!(
        error_mode = ?error_mode,
        "Backend listening at {}",
        &listener.local_addr().map_err(InfraError::TcpBind)?
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(InfraError::Server)?;

    Ok(())
}
