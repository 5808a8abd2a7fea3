//! HTTP API module for the liveness and device polling endpoints.

pub mod handlers;
pub mod routes;

pub use handlers::{collect_frames, AppState, RepoTarget};
pub use routes::create_router;
