pub mod aggregate;
pub mod config;
pub mod error;
pub mod fake_source;
pub mod fpl_api;
pub mod http_client;
pub mod logging;
pub mod schedule;
pub mod server;
pub mod snapshot;
pub mod team_colors;
pub mod trigger;
