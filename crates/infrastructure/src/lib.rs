pub mod database;
pub mod in_memory_directory;
pub mod observability;

pub use database::*;
pub use in_memory_directory::InMemoryDriverDirectory;
pub use observability::init_logging;
