/// Scouter Share - share tokens and deep links for Robot Scouter records
///
/// Teams and templates are shared by stamping a generated token into
/// each record and queueing the token for cleanup; recipients claim the
/// records through a trusted remote function.

pub mod api;
pub mod auth;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod functions;
pub mod links;
pub mod model;
pub mod server;
pub mod sharing;
pub mod store;

pub use context::AppContext;
pub use error::{ShareError, ShareResult};
