//! Request routing: path classification and redirect decisions.

mod path;
mod resolver;

pub use path::{archive_path, classify, encode_path, RoutePath};
pub use resolver::{RouteDecision, Resolver};
