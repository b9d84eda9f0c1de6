pub mod app_error_impl;
pub mod app_state;
pub mod auth;
pub mod extract;
pub mod middleware;
pub mod responder;
pub mod routes;
