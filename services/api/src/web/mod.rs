pub mod admin;
pub mod auth;
pub mod events;
pub mod middleware;
pub mod records;
pub mod rest;
pub mod state;
pub mod summary;

pub use middleware::{require_admin, require_auth};
pub use rest::ApiDoc;
