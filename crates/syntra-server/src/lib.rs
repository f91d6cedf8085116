pub mod config;
pub mod http;

pub use config::{Config, EmbeddingProvider};
pub use http::{create_router, AppState};
