pub mod access_policy;
pub mod app_error;
pub mod fault;
pub mod jwt;
