//! Record store: SQLite-backed document collections

pub mod collection;
pub mod connect;
pub mod models;

pub use collection::{Collection, CollectionRole, InsertOutcome};
pub use connect::{connect, connect_in_memory, connect_readonly};
pub use models::{Document, PersonRecord};
