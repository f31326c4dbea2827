//! Pantry app: configuration, row adapter and the demo session.
//!
//! The binary in `main.rs` loads [`config::Config`], installs tracing,
//! registers metric descriptions and plays [`session::run`].

pub mod adapter;
pub mod config;
pub mod session;

pub use adapter::RowAdapter;
pub use config::{Config, ConfigError};
pub use session::{SessionError, SessionReport};
