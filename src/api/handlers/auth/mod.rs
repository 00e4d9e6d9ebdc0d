//! Auth handlers and supporting modules.
//!
//! ## Login Throttling
//!
//! `POST /v1/auth/login` refuses further attempts for a `(username, client IP)`
//! pair once it has accumulated the configured number of failed attempts
//! (default 20) inside the trailing window (default 1 hour). The count is read
//! from the `login_attempts` table on every request, so several server
//! processes agree without shared memory.
//!
//! ## Transport Session
//!
//! Every response to a client without a `fleetpass_session` cookie carries a
//! freshly generated one. Logins made with that cookie are tracked in
//! `user_sessions`; logout deactivates the row and clears the cookie.

pub(crate) mod login;
pub(crate) mod session;
mod state;
pub(crate) mod token;
pub(crate) mod types;
pub(crate) mod utils;

pub use state::{AuthConfig, AuthState};
