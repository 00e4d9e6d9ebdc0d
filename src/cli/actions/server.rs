use crate::{
    api::{self, handlers::auth::AuthConfig},
    auth::{throttle::ThrottlePolicy, AuthSettings},
    cli::telemetry,
};
use anyhow::Result;
use secrecy::SecretString;
use tracing::info;
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub jwt_secret: SecretString,
    pub frontend_base_url: String,
    pub access_token_ttl_seconds: i64,
    pub refresh_token_ttl_seconds: i64,
    pub throttle_max_attempts: u32,
    pub throttle_window_seconds: u32,
    pub session_idle_timeout_seconds: u32,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database is unreachable or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let auth_config = AuthConfig::new(args.frontend_base_url);
    let auth_settings = AuthSettings {
        jwt_secret: args.jwt_secret,
        access_token_ttl_seconds: args.access_token_ttl_seconds,
        refresh_token_ttl_seconds: args.refresh_token_ttl_seconds,
        throttle: ThrottlePolicy::new(args.throttle_max_attempts, args.throttle_window_seconds),
        session_idle_timeout_seconds: args.session_idle_timeout_seconds,
    };

    let result = api::new(args.port, args.dsn, auth_config, auth_settings).await;

    telemetry::shutdown_tracer();

    result
}

fn log_startup_args(args: &Args) {
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("dsn", redact_dsn(&args.dsn)),
        ("frontend_base_url", args.frontend_base_url.clone()),
        (
            "throttle",
            format!(
                "{} failures / {}s",
                args.throttle_max_attempts, args.throttle_window_seconds
            ),
        ),
        (
            "session_idle_timeout",
            format!("{}s", args.session_idle_timeout_seconds),
        ),
        (
            "token_ttl",
            format!(
                "access {}s, refresh {}s",
                args.access_token_ttl_seconds, args.refresh_token_ttl_seconds
            ),
        ),
    ];

    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!(
        "fleetpass {} - {}\n\nStartup configuration:",
        env!("CARGO_PKG_VERSION"),
        short_commit(api::GIT_COMMIT_HASH)
    );
    for (key, value) in &entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}

fn redact_dsn(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("REDACTED"));
            }
            parsed.to_string()
        }
        Err(_) => "invalid-dsn".to_string(),
    }
}

fn short_commit(hash: &str) -> &str {
    let trimmed = hash.trim();
    trimmed.get(..7).unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redact_dsn_hides_password() {
        assert_eq!(
            redact_dsn("postgres://fleet:hunter2@db:5432/fleetpass"),
            "postgres://fleet:REDACTED@db:5432/fleetpass"
        );
    }

    #[test]
    fn redact_dsn_without_password() {
        assert_eq!(
            redact_dsn("postgres://db:5432/fleetpass"),
            "postgres://db:5432/fleetpass"
        );
        assert_eq!(redact_dsn("not a url"), "invalid-dsn");
    }

    #[test]
    fn short_commit_truncates() {
        assert_eq!(short_commit("0123456789abcdef"), "0123456");
        assert_eq!(short_commit("abc"), "abc");
    }

    #[test]
    fn args_debug_hides_jwt_secret() {
        let args = Args {
            port: 8080,
            dsn: "postgres://db/fleetpass".to_string(),
            jwt_secret: SecretString::from("s3cret".to_string()),
            frontend_base_url: "http://localhost:3000".to_string(),
            access_token_ttl_seconds: 300,
            refresh_token_ttl_seconds: 86400,
            throttle_max_attempts: 20,
            throttle_window_seconds: 3600,
            session_idle_timeout_seconds: 18000,
        };
        assert!(!format!("{args:?}").contains("s3cret"));
    }
}
