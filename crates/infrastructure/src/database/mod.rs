pub mod sqlite;

pub use sqlite::{DatabaseManager, SqliteDriverDirectory};
