//! # Fleetpass
//!
//! `fleetpass` is the account and session authority for a logistics marketplace
//! serving two kinds of users: **companies** that post work and **drivers** who take it.
//!
//! ## Login throttling
//!
//! Every login attempt that names a username is appended to `login_attempts` together
//! with the client IP and user agent. Before credentials are checked, failed attempts
//! for the same `(username, ip_address)` pair inside a trailing window are counted; once
//! the count reaches the limit (20 per hour by default) the request is refused with
//! `too_many_attempts` and nothing is written. The lock clears on its own as old
//! failures age out of the window.
//!
//! ## Session registry
//!
//! Each browser carries an opaque transport session key in the `fleetpass_session`
//! cookie. A successful login binds that key to the user in `user_sessions`; logout
//! deactivates it. Sessions idle for longer than five hours are deactivated on their
//! next lookup.
//!
//! ## Tokens
//!
//! Successful logins return an HS256 access and refresh token pair. Refresh tokens are
//! stateless and are exchanged for new access tokens at `/v1/auth/token/refresh`.
//!
//! The schema lives in `sql/schema.sql`.

pub mod api;
pub mod auth;
pub mod cli;
