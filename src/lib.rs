pub mod config;
pub mod error;
pub mod hls;
pub mod metrics;
pub mod proxy;
pub mod resolver;
pub mod server;
