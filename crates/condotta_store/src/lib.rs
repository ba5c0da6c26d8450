//! PostgreSQL persistence for Condotta.
//!
//! [`FactionRepository`] is the durable [`condotta_core::FactionStore`]
//! implementation. Schema and row types stay private to this crate; callers
//! only ever see the entity types from `condotta_core`.

mod connection;
mod models;
mod repository;
pub(crate) mod schema;

pub use connection::{establish_connection, run_migrations};
pub use repository::FactionRepository;
