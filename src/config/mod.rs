//! Configuration module for Socksden
//!
//! This module provides configuration types and parsing for the server.

mod server;

pub use server::{AuthConfig, Config, ServerConfig, TcpConfig};

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

    parse_config(&content)
}

/// Parse configuration from a TOML string
pub fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).with_context(|| "Failed to parse configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.server.listen_addr, "127.0.0.1:1080");
        assert!(!config.server.auth.required);
    }

    #[test]
    fn test_parse_full_config() {
        let config_str = r#"
[server]
listen_addr = "0.0.0.0:1080"
connect_timeout = 15

[server.tcp]
nodelay = false
keepalive_secs = 30
keepalive_interval = 10

[server.auth]
required = true

[server.auth.users]
foo = "bar"
admin = "hunter2"
"#;

        let config = parse_config(config_str).unwrap();
        assert_eq!(config.server.listen_addr, "0.0.0.0:1080");
        assert_eq!(config.server.connect_timeout, 15);
        assert!(!config.server.tcp.nodelay);
        assert_eq!(config.server.tcp.keepalive_secs, 30);
        assert!(config.server.auth.required);
        assert_eq!(config.server.auth.users["foo"], "bar");
        assert_eq!(config.server.auth.users.len(), 2);
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nlisten_addr = \"127.0.0.1:9999\"").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.server.listen_addr, "127.0.0.1:9999");
    }

    #[test]
    fn test_load_config_missing_file() {
        assert!(load_config("/nonexistent/socksden.toml").is_err());
    }
}
