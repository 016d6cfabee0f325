// Configuration module entry point
// Manages application configuration and shared runtime state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{
    AuthConfig, Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig,
    SessionConfig, StorageConfig,
};

/// Default config file name (without extension)
pub const DEFAULT_CONFIG_PATH: &str = "config";

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("RANGO").separator("__"))
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.show_headers", false)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.server_name", "rango/0.1")?
            .set_default("http.max_body_size", 1_048_576)? // 1MB
            .set_default("session.cookie_name", "sessionid")?
            .set_default("session.max_age", 1_209_600)? // two weeks
            .set_default("session.visit_interval", 86_400)? // one day
            .set_default("auth.remote_user_header", "X-Remote-User")?
            .set_default("auth.login_url", "/accounts/login/")?
            .build()?;

        settings.try_deserialize()
    }

    /// Load configuration using the path given as first CLI argument
    pub fn load() -> Result<Self, config::ConfigError> {
        let path = std::env::args()
            .nth(1)
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&path)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let cfg = Config::load_from("no-such-rango-config").unwrap();
        assert_eq!(cfg.server.port, 8000);
        assert_eq!(cfg.session.cookie_name, "sessionid");
        assert_eq!(cfg.session.visit_interval(), chrono::Duration::days(1));
        assert_eq!(cfg.auth.remote_user_header, "X-Remote-User");
        assert_eq!(cfg.logging.access_log_format, "combined");
        assert!(cfg.storage.data_file.is_none());
    }

    #[test]
    fn test_socket_addr() {
        let cfg = Config::load_from("no-such-rango-config").unwrap();
        assert_eq!(cfg.socket_addr().unwrap().to_string(), "127.0.0.1:8000");
    }
}
