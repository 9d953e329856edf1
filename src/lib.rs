pub mod client;
pub mod cmd;
pub mod connection;
pub mod db;
pub mod file_manager;
pub mod server;

/// Transport-level errors are boxed; `Send + Sync` so handler results can
/// cross `tokio::spawn`.
pub type Error = Box<dyn std::error::Error + Send + Sync>;
