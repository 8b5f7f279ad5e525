pub mod adapters;
pub mod config;
pub mod dispatch;
pub mod executor;
pub mod history;
pub mod oracle;
pub mod sandbox;
pub mod server;
pub mod shared;
