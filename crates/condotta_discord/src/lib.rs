//! Discord transport for Condotta.
//!
//! This crate binds the engine in `condotta_core` to Discord: the
//! [`DiscordProvisioner`] implements the resource seam over Serenity's HTTP
//! client, [`CondottaHandler`] routes gateway events and interactions into
//! the engine, and [`CondottaBot`] owns the client lifecycle.

mod client;
mod commands;
mod handler;
mod messages;
mod provisioner;
mod services;

pub use client::CondottaBot;
pub use handler::CondottaHandler;
pub use provisioner::DiscordProvisioner;
pub use services::Services;
