pub mod clock;
pub mod config;
pub mod http_server;
pub mod notifier;
pub mod render;
pub mod session_store;

#[macro_use] extern crate log;
