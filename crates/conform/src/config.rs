//! Connection configuration.
//!
//! Required keys: `host`, `dbname`, `user`, `password`. `port` is optional.
//! Configuration can come from a key/value map, a TOML document or the
//! environment (after loading a `.env` file, if present).

use crate::error::{OrmError, OrmResult};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

/// Environment variables read by [`ConnectionConfig::from_env`].
pub const ENV_HOST: &str = "CONFORM_DB_HOST";
pub const ENV_DBNAME: &str = "CONFORM_DB_NAME";
pub const ENV_USER: &str = "CONFORM_DB_USER";
pub const ENV_PASSWORD: &str = "CONFORM_DB_PASSWORD";
pub const ENV_PORT: &str = "CONFORM_DB_PORT";

/// Database connection settings.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectionConfig {
    pub host: String,
    pub dbname: String,
    pub user: String,
    pub password: String,
    #[serde(default)]
    pub port: Option<u16>,
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("port", &self.port)
            .finish()
    }
}

impl ConnectionConfig {
    pub fn new(
        host: impl Into<String>,
        dbname: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            dbname: dbname.into(),
            user: user.into(),
            password: password.into(),
            port: None,
        }
    }

    /// Set the port (consuming).
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Build from a key/value map. Missing required keys are a [`OrmError::Config`].
    pub fn from_map(map: &HashMap<String, String>) -> OrmResult<Self> {
        let required = |key: &str| {
            map.get(key)
                .cloned()
                .ok_or_else(|| OrmError::Config(format!("missing required key '{key}'")))
        };
        let port = map.get("port").map(|p| parse_port(p)).transpose()?;
        Ok(Self {
            host: required("host")?,
            dbname: required("dbname")?,
            user: required("user")?,
            password: required("password")?,
            port,
        })
    }

    /// Parse a TOML document. Keys may sit at the top level or under `[database]`.
    pub fn from_toml_str(raw: &str) -> OrmResult<Self> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Document {
            Nested { database: ConnectionConfig },
            Flat(ConnectionConfig),
        }

        let doc: Document = toml::from_str(raw)
            .map_err(|e| OrmError::Config(format!("failed to parse config: {e}")))?;
        Ok(match doc {
            Document::Nested { database } => database,
            Document::Flat(config) => config,
        })
    }

    /// Read `CONFORM_DB_*` variables, loading `.env` first if one exists.
    pub fn from_env() -> OrmResult<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(target: "conform.sql", path = %path.display(), "loaded .env");
        }
        let var = |key: &str| {
            std::env::var(key)
                .map_err(|_| OrmError::Config(format!("missing environment variable {key}")))
        };
        let port = std::env::var(ENV_PORT).ok().map(|p| parse_port(&p)).transpose()?;
        Ok(Self {
            host: var(ENV_HOST)?,
            dbname: var(ENV_DBNAME)?,
            user: var(ENV_USER)?,
            password: var(ENV_PASSWORD)?,
            port,
        })
    }

    /// libpq-style key/value connection string.
    pub fn connection_string(&self) -> String {
        let mut parts = vec![
            format!("host={}", quote_value(&self.host)),
            format!("dbname={}", quote_value(&self.dbname)),
            format!("user={}", quote_value(&self.user)),
            format!("password={}", quote_value(&self.password)),
        ];
        if let Some(port) = self.port {
            parts.push(format!("port={port}"));
        }
        parts.join(" ")
    }
}

fn parse_port(raw: &str) -> OrmResult<u16> {
    raw.trim()
        .parse()
        .map_err(|_| OrmError::Config(format!("invalid port '{raw}'")))
}

fn quote_value(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c == '\'' || c == '\\');
    if !needs_quotes {
        return value.to_string();
    }
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn from_map_requires_all_keys() {
        let full = map(&[("host", "db"), ("dbname", "app"), ("user", "u"), ("password", "p")]);
        let config = ConnectionConfig::from_map(&full).unwrap();
        assert_eq!(config, ConnectionConfig::new("db", "app", "u", "p"));

        let missing = map(&[("host", "db"), ("dbname", "app"), ("user", "u")]);
        let err = ConnectionConfig::from_map(&missing).unwrap_err();
        assert!(err.to_string().contains("'password'"));
    }

    #[test]
    fn from_map_rejects_bad_port() {
        let bad = map(&[
            ("host", "h"),
            ("dbname", "d"),
            ("user", "u"),
            ("password", "p"),
            ("port", "x"),
        ]);
        assert!(matches!(ConnectionConfig::from_map(&bad), Err(OrmError::Config(_))));
    }

    #[test]
    fn connection_string_quotes_when_needed() {
        let config = ConnectionConfig::new("localhost", "app", "me", "it's secret").port(5433);
        assert_eq!(
            config.connection_string(),
            "host=localhost dbname=app user=me password='it\\'s secret' port=5433"
        );
        assert_eq!(
            ConnectionConfig::new("h", "d", "u", "").connection_string(),
            "host=h dbname=d user=u password=''"
        );
    }

    #[test]
    fn connection_string_parses_as_postgres_config() {
        let config = ConnectionConfig::new("localhost", "app", "me", "p w").port(5433);
        let parsed: tokio_postgres::Config = config.connection_string().parse().unwrap();
        assert_eq!(parsed.get_dbname(), Some("app"));
        assert_eq!(parsed.get_user(), Some("me"));
        assert_eq!(parsed.get_password(), Some(&b"p w"[..]));
        assert_eq!(parsed.get_ports(), &[5433]);
    }

    #[test]
    fn toml_flat_and_nested() {
        let flat = "host = \"h\"\ndbname = \"d\"\nuser = \"u\"\npassword = \"p\"\n";
        assert_eq!(ConnectionConfig::from_toml_str(flat).unwrap().host, "h");

        let nested = "[database]\nhost = \"h\"\ndbname = \"d\"\nuser = \"u\"\n\
                      password = \"p\"\nport = 6000\n";
        assert_eq!(ConnectionConfig::from_toml_str(nested).unwrap().port, Some(6000));

        let missing = "host = \"h\"\n";
        assert!(matches!(ConnectionConfig::from_toml_str(missing), Err(OrmError::Config(_))));
    }

    #[test]
    fn debug_redacts_password() {
        let config = ConnectionConfig::new("h", "d", "u", "hunter2");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
