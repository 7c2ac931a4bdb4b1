//! Server configuration, loaded from environment variables at startup with
//! optional command-line overrides.

use clap::Parser;

/// Command-line overrides for the most commonly changed settings. Everything
/// else is environment-only.
#[derive(Debug, Parser)]
#[command(name = "triage-server", version, about = "Quality-analysis chat relay server")]
pub struct Cli {
    /// TCP address to bind, e.g. 0.0.0.0:3000
    #[arg(long)]
    pub bind: Option<String>,

    /// sqlx database URL, e.g. sqlite://triage.db
    #[arg(long)]
    pub database_url: Option<String>,

    /// Base URL of the inference backend, e.g. http://localhost:8000
    #[arg(long)]
    pub backend_url: Option<String>,

    /// tracing filter, e.g. info or debug,tower_http=warn
    #[arg(long)]
    pub log: Option<String>,
}

/// Runtime configuration for triage-server.
///
/// Every field has a sensible default so the server works out-of-the-box
/// without any environment variables set.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:3000"`).
    pub bind_address: String,

    /// SQLite (or other) database URL (default: `"sqlite://triage.db"`).
    /// Supports any sqlx-compatible connection string.
    pub database_url: String,

    /// Base URL of the inference backend that serves the chat graph
    /// (default: `"http://localhost:8000"`).
    pub backend_url: String,

    /// Model name sent to the backend when a chat request names none.
    pub default_model: String,

    /// Ollama host queried for locally installed models
    /// (default: `"http://localhost:11434"`).
    pub ollama_host: String,

    /// HMAC secret for session tokens. The default is for development only;
    /// set `TRIAGE_AUTH_SECRET` in any real deployment.
    pub auth_secret: String,

    /// Session token lifetime in hours.
    pub token_ttl_hours: i64,

    /// Seed admin account, created on startup if the email is unknown.
    pub admin_email: String,
    pub admin_password: String,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,

    /// Serve Swagger UI at `/swagger-ui` (disable in production).
    pub enable_swagger: bool,

    /// Comma-separated CORS origin allow-list; unset means wildcard.
    pub cors_allowed_origins: Option<String>,
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            bind_address: env_or("TRIAGE_BIND", "0.0.0.0:3000"),
            database_url: env_or("TRIAGE_DATABASE_URL", "sqlite://triage.db"),
            backend_url: env_or("TRIAGE_BACKEND_URL", "http://localhost:8000"),
            default_model: env_or("TRIAGE_DEFAULT_MODEL", "qwen3:32b"),
            ollama_host: env_or("TRIAGE_OLLAMA_HOST", "http://localhost:11434"),
            auth_secret: env_or("TRIAGE_AUTH_SECRET", "triage-dev-secret"),
            token_ttl_hours: parse_env("TRIAGE_TOKEN_TTL_HOURS", 24),
            admin_email: env_or("TRIAGE_ADMIN_EMAIL", "admin@triage.local"),
            admin_password: env_or("TRIAGE_ADMIN_PASSWORD", "admin1234"),
            log_level: env_or("TRIAGE_LOG", "info"),
            log_json: std::env::var("TRIAGE_LOG_JSON")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            enable_swagger: std::env::var("TRIAGE_ENABLE_SWAGGER")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true),
            cors_allowed_origins: std::env::var("TRIAGE_CORS_ORIGINS").ok(),
        }
    }

    /// Environment config with command-line flags applied on top.
    pub fn load(cli: Cli) -> Self {
        let mut cfg = Self::from_env();
        if let Some(bind) = cli.bind {
            cfg.bind_address = bind;
        }
        if let Some(url) = cli.database_url {
            cfg.database_url = url;
        }
        if let Some(url) = cli.backend_url {
            cfg.backend_url = url;
        }
        if let Some(level) = cli.log {
            cfg.log_level = level;
        }
        cfg
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn cli_overrides_win_over_defaults() {
        let cli = Cli {
            bind: Some("127.0.0.1:9999".into()),
            database_url: None,
            backend_url: Some("http://10.0.0.5:8000".into()),
            log: None,
        };
        let cfg = Config::load(cli);
        assert_eq!(cfg.bind_address, "127.0.0.1:9999");
        assert_eq!(cfg.backend_url, "http://10.0.0.5:8000");
        assert_eq!(cfg.default_model, "qwen3:32b");
    }
}
