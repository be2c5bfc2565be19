pub mod cache;
pub mod config;
pub mod protocol;
pub mod server;

pub use cache::{CacheKey, CacheStats, ComparisonCache};
pub use config::ServerConfig;
pub use server::McpServer;
