//! Settings of the console binary.
//!
//! Values are read from `settings.toml` in the working directory and can be
//! overridden through `KVFIT__*` environment variables, e.g.
//! `KVFIT__SERVER__PORT=8080`.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

/// Where the local replica of the graph is kept.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Store {
    #[default]
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    #[serde(default)]
    pub store: Store,
    pub server: Option<Server>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("KVFIT").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}

impl Server {
    /// Basic auth is enabled only when both values are set.
    pub fn credentials(&self) -> Option<server::Credentials> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some(server::Credentials {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn defaults_to_memory_store() {
        let settings = parse("");
        assert!(matches!(settings.store, Store::Memory));
        assert_eq!(settings.app.level, "info");
        assert!(settings.server.is_none());
    }

    #[test]
    fn reads_sqlite_store_and_server() {
        let settings = parse(
            r#"
            [app]
            level = "debug"

            [store]
            sqlite = "kvfit.db"

            [server]
            port = 3000
            username = "front-desk"
            password = "secret"
            "#,
        );
        assert!(matches!(settings.store, Store::Sqlite(ref path) if path == "kvfit.db"));
        let server = settings.server.unwrap();
        assert_eq!(server.port, 3000);
        assert!(server.credentials().is_some());
    }

    #[test]
    fn partial_credentials_disable_auth() {
        let settings = parse(
            r#"
            [server]
            port = 3000
            username = "front-desk"
            "#,
        );
        assert!(settings.server.unwrap().credentials().is_none());
    }
}
