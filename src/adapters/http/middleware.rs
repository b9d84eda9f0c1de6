use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{
    adapters::http::auth::{Identity, RoleGate},
    app_error::AppError,
};

/// Rejects the request unless it carries a valid, unexpired credential.
pub async fn authenticate(_identity: Identity, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// Rejects callers whose role is outside the gate's allowed set.
///
/// Takes an [`Identity`], so the credential is always verified first.
pub async fn authorize(
    State(gate): State<RoleGate>,
    Identity(claims): Identity,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    gate.allowed.check(claims.role)?;

    tracing::debug!(
        subject = %claims.sub,
        role = %claims.role,
        allowed = %gate.allowed,
        "Access granted"
    );

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{Router, http::StatusCode, middleware, routing::get};
    use axum_test::TestServer;

    use super::*;
    use crate::{
        access_policy::RoleSet,
        adapters::http::auth::Verifier,
        entities::role::Role,
        test_utils::{create_test_config, create_test_token},
    };

    fn guarded(allowed: RoleSet) -> (TestServer, Arc<crate::infra::config::AppConfig>) {
        let config = Arc::new(create_test_config(|_| {}));
        let gate = RoleGate::new(Verifier::new(config.clone()), allowed);

        let app = Router::new()
            .route(
                "/guarded",
                get(|Identity(claims): Identity| async move { claims.sub }),
            )
            .route_layer(middleware::from_fn_with_state(gate.clone(), authorize))
            .with_state(gate);

        (TestServer::new(app).unwrap(), config)
    }

    #[tokio::test]
    async fn allowed_role_reaches_the_handler_with_its_identity() {
        let (server, config) = guarded(RoleSet::from([Role::Admin, Role::Sysadmin]));
        let token = create_test_token(&config, "admin-1", Role::Sysadmin);

        let response = server
            .get("/guarded")
            .add_header("Authorization", format!("Bearer {}", token))
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.text(), "admin-1");
    }

    #[tokio::test]
    async fn other_roles_are_forbidden() {
        let (server, config) = guarded(RoleSet::from(Role::Admin));
        let token = create_test_token(&config, "user-1", Role::User);

        let response = server
            .get("/guarded")
            .add_header("Authorization", format!("Bearer {}", token))
            .await;

        assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
        let body: serde_json::Value = response.json();
        assert_eq!(
            body.get("message").unwrap(),
            "user is not authorized to perform this action"
        );
    }

    #[tokio::test]
    async fn gate_verifies_before_checking_roles() {
        let (server, _) = guarded(RoleSet::from(Role::Admin));

        let response = server.get("/guarded").await;

        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    }
}
