/// API routes and handlers
pub mod links;
pub mod owners;
pub mod share;

use crate::context::AppContext;
use axum::Router;

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(share::routes())
        .merge(owners::routes())
        .merge(links::routes())
}
