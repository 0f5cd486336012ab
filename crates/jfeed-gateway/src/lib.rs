//! jfeed gateway - serves the jfeed core over HTTP.
//!
//! Page paths go through the redirect middleware; `/api/*` exposes the home
//! feed, path resolution and cache maintenance as JSON.

mod error;
mod handlers;
mod middleware;
pub mod server;

pub use error::ApiError;
pub use server::{build_router, start_server, AppState};
