//! Application configuration loaded from environment variables.

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `5000`)
/// - `DATABASE_URL` — PostgreSQL URL; absent selects the in-memory store
/// - `JWT_SECRET` — token signing secret
/// - `APP_ENV` — `"production"` hardens cookie attributes
/// - `RECONCILE_INTERVAL_SECS` — counter reconciliation period, 0 disables
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub production: bool,
    pub reconcile_interval_secs: u64,
}

/// Placeholder secret for local runs; main warns when it survives into
/// a production deployment.
pub const DEV_JWT_SECRET: &str = "insecure-dev-secret";

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            database_url: std::env::var("DATABASE_URL").ok(),
            jwt_secret: std::env::var("JWT_SECRET").unwrap_or_else(|_| DEV_JWT_SECRET.to_string()),
            production: std::env::var("APP_ENV").is_ok_and(|env| env == "production"),
            reconcile_interval_secs: std::env::var("RECONCILE_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            database_url: None,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            production: false,
            reconcile_interval_secs: 0,
        }
    }
}
