pub mod handlers;
pub mod http;
pub mod server;
pub mod types;
