//! HTTP routes.

pub mod cors;
pub mod forward;
pub mod login;

pub use cors::{preflight_middleware, preflight_response};
pub use forward::forward_handler;
pub use login::{is_auth, login, login_callback};
