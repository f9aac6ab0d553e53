mod dto;
pub mod handlers;
pub mod mentions;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::document_routes())
}
