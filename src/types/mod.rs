pub mod config;
pub mod monitor;
pub mod record;
pub mod snapshot;
