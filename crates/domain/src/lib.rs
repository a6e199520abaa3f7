pub mod entities;
pub mod repositories;
pub mod value_objects;

pub use dispatch_errors::{DispatchError, DispatchResult};
pub use entities::*;
pub use repositories::*;
pub use value_objects::*;
