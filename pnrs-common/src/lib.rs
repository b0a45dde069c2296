//! # PNRS Common Library
//!
//! Shared code for the phone number relay service:
//! - Error type
//! - Configuration loading
//! - Stored documents and the person record model
//! - Record store client (collections backed by SQLite)

pub mod config;
pub mod db;
pub mod error;

pub use db::{Collection, CollectionRole, Document, InsertOutcome, PersonRecord};
pub use error::{Error, Result};
