pub mod app_config;
pub mod database;
pub mod dispatcher;
pub mod observability;

pub use app_config::AppConfig;
pub use database::DatabaseConfig;
pub use dispatcher::DispatcherConfig;
pub use observability::{LogFormat, ObservabilityConfig};
