//! pdn-core - Core library for PDN
//!
//! This crate contains the shared models, live collection mirrors, and
//! session/editing state used by all PDN interfaces. Persistence, querying,
//! and real-time sync are delegated to a hosted document store reached
//! through the boundaries in [`store`] and [`auth`].

pub mod app;
pub mod auth;
pub mod error;
pub mod models;
pub mod retry;
pub mod store;

pub use app::App;
pub use error::{Error, Result};
pub use models::{Category, CategoryId, Color, Note, NoteId, UserId};
