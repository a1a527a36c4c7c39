pub mod api;
pub mod auth;
pub mod client_session;
pub mod gateway;
pub mod http;
pub mod report_csv;
