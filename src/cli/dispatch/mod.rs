use crate::cli::{
    actions::{server::Args, Action},
    commands::auth::Options,
};
use anyhow::{Context, Result};

/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let options = Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        jwt_secret: options.jwt_secret,
        frontend_base_url: options.frontend_base_url,
        access_token_ttl_seconds: options.access_token_ttl_seconds,
        refresh_token_ttl_seconds: options.refresh_token_ttl_seconds,
        throttle_max_attempts: options.throttle_max_attempts,
        throttle_window_seconds: options.throttle_window_seconds,
        session_idle_timeout_seconds: options.session_idle_timeout_seconds,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;
    use secrecy::ExposeSecret;

    #[test]
    fn handler_builds_server_action() -> Result<()> {
        temp_env::with_vars(
            [
                ("FLEETPASS_PORT", None::<&str>),
                ("FLEETPASS_DSN", None),
                ("FLEETPASS_JWT_SECRET", None),
                ("FLEETPASS_THROTTLE_MAX_ATTEMPTS", None),
                ("FLEETPASS_SESSION_IDLE_TIMEOUT_SECONDS", None),
            ],
            || {
                let matches = commands::new().get_matches_from(vec![
                    "fleetpass",
                    "--dsn",
                    "postgres://localhost/fleetpass",
                    "--jwt-secret",
                    "s3cret",
                    "--throttle-max-attempts",
                    "3",
                ]);

                let Action::Server(args) = handler(&matches)?;
                assert_eq!(args.port, 8080);
                assert_eq!(args.dsn, "postgres://localhost/fleetpass");
                assert_eq!(args.jwt_secret.expose_secret(), "s3cret");
                assert_eq!(args.throttle_max_attempts, 3);
                assert_eq!(args.throttle_window_seconds, 3600);
                assert_eq!(args.session_idle_timeout_seconds, 18000);
                assert_eq!(args.access_token_ttl_seconds, 300);
                assert_eq!(args.refresh_token_ttl_seconds, 86400);
                assert_eq!(args.frontend_base_url, "http://localhost:3000");
                Ok(())
            },
        )
    }
}
