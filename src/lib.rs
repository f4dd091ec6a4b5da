//! Client core for the nail design generator.
//!
//! Selections become per-model generation requests that are fanned out
//! concurrently through an authenticated gateway; the merged results feed a
//! [`session::ResultSession`] whose saves, like the favorite/delete actions on
//! [`library::DesignLibrary`], are applied optimistically and rolled back on failure.

pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod generator;
pub mod library;
pub mod models;
pub mod selection;
pub mod session;

pub use auth::{AuthProvider, Identity, StaticTokenProvider};
pub use config::Config;
pub use error::{DesignError, Result};
pub use gateway::Gateway;
pub use generator::{GenerationOutcome, Generator};
pub use library::{DesignLibrary, LoadState, PendingDelete, SortOrder};
pub use selection::{AttributeSelection, CompleteSelection, RequestBuilder, Section};
pub use session::ResultSession;
