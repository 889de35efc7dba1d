use anyhow::Result;
use figment::{providers::{Env, Format, Serialized, Toml}, Figment};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub site: SiteConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub enable_cors: bool,
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout_secs: default_request_timeout(),
            enable_cors: false,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

/// Where the regional rule tables come from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Rules TOML; the embedded tables are used when unset
    pub path: Option<String>,
}

/// Panel orientation assumed when a quote does not specify one
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub tilt_deg: f64,
    pub azimuth_deg: f64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            tilt_deg: 30.0,
            azimuth_deg: 180.0,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::figment("config/default.toml").extract().map_err(Into::into)
    }

    /// Defaults, then the TOML file, then `SQE__` environment overrides
    pub fn figment(path: &str) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("SQE__").split("__"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults_without_file() {
        Jail::expect_with(|_jail| {
            let cfg: Config = Config::figment("missing.toml").extract()?;
            assert_eq!(cfg.server.port, 8080);
            assert!(cfg.rules.path.is_none());
            assert_eq!(cfg.site.azimuth_deg, 180.0);
            Ok(())
        });
    }

    #[test]
    fn test_file_and_env_overrides() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "quote.toml",
                r#"
                [server]
                host = "0.0.0.0"
                port = 9000

                [rules]
                path = "config/regions.toml"
                "#,
            )?;
            jail.set_env("SQE__SERVER__PORT", "9100");
            jail.set_env("SQE__SITE__TILT_DEG", "15.0");

            let cfg: Config = Config::figment("quote.toml").extract()?;
            assert_eq!(cfg.server.host, "0.0.0.0");
            assert_eq!(cfg.server.port, 9100);
            assert_eq!(cfg.rules.path.as_deref(), Some("config/regions.toml"));
            assert_eq!(cfg.site.tilt_deg, 15.0);
            Ok(())
        });
    }

    #[test]
    fn test_socket_addr() {
        let server = ServerConfig::default();
        assert_eq!(server.socket_addr().unwrap().port(), 8080);
    }
}
