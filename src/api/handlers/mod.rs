//! API handlers for fleetpass.

pub mod accounts;
pub mod auth;
pub mod error;
pub mod health;
