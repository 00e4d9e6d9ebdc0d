use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

use crate::auth::{
    service::DEFAULT_SESSION_IDLE_TIMEOUT_SECONDS,
    throttle::{DEFAULT_MAX_ATTEMPTS, DEFAULT_WINDOW_SECONDS},
    tokens::{
        DEFAULT_ACCESS_TOKEN_TTL_SECONDS, DEFAULT_REFRESH_TOKEN_TTL_SECONDS, MAX_TOKEN_TTL_SECONDS,
    },
};

pub const ARG_JWT_SECRET: &str = "jwt-secret";
pub const ARG_FRONTEND_BASE_URL: &str = "frontend-base-url";
pub const ARG_ACCESS_TOKEN_TTL_SECONDS: &str = "access-token-ttl-seconds";
pub const ARG_REFRESH_TOKEN_TTL_SECONDS: &str = "refresh-token-ttl-seconds";
pub const ARG_THROTTLE_MAX_ATTEMPTS: &str = "throttle-max-attempts";
pub const ARG_THROTTLE_WINDOW_SECONDS: &str = "throttle-window-seconds";
pub const ARG_SESSION_IDLE_TIMEOUT_SECONDS: &str = "session-idle-timeout-seconds";

#[derive(Debug)]
pub struct Options {
    pub jwt_secret: SecretString,
    pub frontend_base_url: String,
    pub access_token_ttl_seconds: i64,
    pub refresh_token_ttl_seconds: i64,
    pub throttle_max_attempts: u32,
    pub throttle_window_seconds: u32,
    pub session_idle_timeout_seconds: u32,
}

impl Options {
    /// # Errors
    /// Returns an error if a required argument is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let jwt_secret = matches
            .get_one::<String>(ARG_JWT_SECRET)
            .cloned()
            .context("missing required argument: --jwt-secret")?;
        let frontend_base_url = matches
            .get_one::<String>(ARG_FRONTEND_BASE_URL)
            .cloned()
            .unwrap_or_else(|| "http://localhost:3000".to_string());

        Ok(Self {
            jwt_secret: SecretString::from(jwt_secret),
            frontend_base_url,
            access_token_ttl_seconds: matches
                .get_one::<i64>(ARG_ACCESS_TOKEN_TTL_SECONDS)
                .copied()
                .unwrap_or(DEFAULT_ACCESS_TOKEN_TTL_SECONDS),
            refresh_token_ttl_seconds: matches
                .get_one::<i64>(ARG_REFRESH_TOKEN_TTL_SECONDS)
                .copied()
                .unwrap_or(DEFAULT_REFRESH_TOKEN_TTL_SECONDS),
            throttle_max_attempts: matches
                .get_one::<u32>(ARG_THROTTLE_MAX_ATTEMPTS)
                .copied()
                .unwrap_or(DEFAULT_MAX_ATTEMPTS),
            throttle_window_seconds: matches
                .get_one::<u32>(ARG_THROTTLE_WINDOW_SECONDS)
                .copied()
                .unwrap_or(DEFAULT_WINDOW_SECONDS),
            session_idle_timeout_seconds: matches
                .get_one::<u32>(ARG_SESSION_IDLE_TIMEOUT_SECONDS)
                .copied()
                .unwrap_or(DEFAULT_SESSION_IDLE_TIMEOUT_SECONDS),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    let command = with_token_args(command);
    with_throttle_args(command)
}

fn with_token_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_JWT_SECRET)
                .long(ARG_JWT_SECRET)
                .help("Secret used to sign access and refresh tokens (HS256)")
                .env("FLEETPASS_JWT_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_FRONTEND_BASE_URL)
                .long(ARG_FRONTEND_BASE_URL)
                .help("Frontend base URL, used for CORS and the Secure cookie flag")
                .env("FLEETPASS_FRONTEND_BASE_URL")
                .default_value("http://localhost:3000"),
        )
        .arg(
            Arg::new(ARG_ACCESS_TOKEN_TTL_SECONDS)
                .long(ARG_ACCESS_TOKEN_TTL_SECONDS)
                .help("Lifetime of access tokens minted from a refresh token")
                .env("FLEETPASS_ACCESS_TOKEN_TTL_SECONDS")
                .default_value("300")
                .value_parser(clap::value_parser!(i64).range(1..=MAX_TOKEN_TTL_SECONDS)),
        )
        .arg(
            Arg::new(ARG_REFRESH_TOKEN_TTL_SECONDS)
                .long(ARG_REFRESH_TOKEN_TTL_SECONDS)
                .help("Lifetime of refresh tokens")
                .env("FLEETPASS_REFRESH_TOKEN_TTL_SECONDS")
                .default_value("86400")
                .value_parser(clap::value_parser!(i64).range(1..=MAX_TOKEN_TTL_SECONDS)),
        )
}

fn with_throttle_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_THROTTLE_MAX_ATTEMPTS)
                .long(ARG_THROTTLE_MAX_ATTEMPTS)
                .help("Failed logins per username and IP before lockout")
                .env("FLEETPASS_THROTTLE_MAX_ATTEMPTS")
                .default_value("20")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new(ARG_THROTTLE_WINDOW_SECONDS)
                .long(ARG_THROTTLE_WINDOW_SECONDS)
                .help("Trailing window in seconds over which failures are counted")
                .env("FLEETPASS_THROTTLE_WINDOW_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new(ARG_SESSION_IDLE_TIMEOUT_SECONDS)
                .long(ARG_SESSION_IDLE_TIMEOUT_SECONDS)
                .help("Idle time after which a session is deactivated")
                .env("FLEETPASS_SESSION_IDLE_TIMEOUT_SECONDS")
                .default_value("18000")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
}
