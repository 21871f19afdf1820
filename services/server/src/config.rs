//! Server configuration loaded from the environment

use std::env;
use std::path::PathBuf;

/// Runtime configuration for the backend
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port the HTTP server binds to
    pub port: u16,
    /// Directory uploaded photos are stored in
    pub uploads_dir: PathBuf,
    /// Session lifetime in hours
    pub session_ttl_hours: i64,
}

impl ServerConfig {
    /// Create a new ServerConfig from environment variables
    ///
    /// # Environment Variables
    /// - `PORT`: listen port (default: 5000)
    /// - `UPLOADS_DIR`: photo storage directory (default: "uploads")
    /// - `SESSION_TTL_HOURS`: session lifetime (default: 24)
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5000);

        let uploads_dir = env::var("UPLOADS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("uploads"));

        let session_ttl_hours = env::var("SESSION_TTL_HOURS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(24);

        Self {
            port,
            uploads_dir,
            session_ttl_hours,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_server_config_defaults() {
        unsafe {
            env::remove_var("PORT");
            env::remove_var("UPLOADS_DIR");
            env::remove_var("SESSION_TTL_HOURS");
        }

        let config = ServerConfig::from_env();
        assert_eq!(config.port, 5000);
        assert_eq!(config.uploads_dir, PathBuf::from("uploads"));
        assert_eq!(config.session_ttl_hours, 24);
    }

    #[test]
    #[serial]
    fn test_server_config_overrides() {
        unsafe {
            env::set_var("PORT", "8080");
            env::set_var("UPLOADS_DIR", "/var/lib/studio/uploads");
            env::set_var("SESSION_TTL_HOURS", "48");
        }

        let config = ServerConfig::from_env();
        assert_eq!(config.port, 8080);
        assert_eq!(config.uploads_dir, PathBuf::from("/var/lib/studio/uploads"));
        assert_eq!(config.session_ttl_hours, 48);

        unsafe {
            env::remove_var("PORT");
            env::remove_var("UPLOADS_DIR");
            env::remove_var("SESSION_TTL_HOURS");
        }
    }

    #[test]
    #[serial]
    fn test_server_config_bad_port_falls_back() {
        unsafe {
            env::set_var("PORT", "not-a-port");
        }

        let config = ServerConfig::from_env();
        assert_eq!(config.port, 5000);

        unsafe {
            env::remove_var("PORT");
        }
    }
}
