//! KraznikUnderverse mint service library.

pub mod blockchain;
pub mod config;
pub mod contract;
pub mod http;
pub mod lifecycle;
pub mod mint;
pub mod observability;
pub mod wallet;

pub use config::schema::MintConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use mint::MintClient;
