//! # Splice Workspace
//!
//! The authority side of Splice: versioned timeline histories, the HTTP
//! server that exposes them, and the clients that talk to it.
//!
//! - [`WorkspaceState`] holds every timeline's checkpoint history
//! - [`server::router`] serves it over HTTP
//! - [`HttpAuthority`] and [`LocalAuthority`] implement
//!   [`splice_editor::RemoteAuthority`] over the network and in-process

pub mod authority;
pub mod client;
pub mod config;
pub mod server;
pub mod state;

pub use authority::LocalAuthority;
pub use client::HttpAuthority;
pub use config::{Config, ConfigError, DEFAULT_CONFIG_NAME};
pub use server::{router, ApiError, AppState, AUTHOR_HEADER};
pub use state::{StateError, TimelineHistory, WorkspaceState};
