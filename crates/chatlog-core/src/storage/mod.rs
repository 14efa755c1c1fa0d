pub mod schema;
pub mod store;

pub use store::{SourceTableStatus, Store, TableStats};
