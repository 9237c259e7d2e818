use std::{collections::HashMap, env, net::IpAddr, path::Path};

use {
    derivative::Derivative,
    figment::{
        providers::{Env, Format, Toml},
        Figment,
    },
    serde::{Deserialize, Serialize},
    serde_json::{Map, Value},
    strum::{Display, EnumString},
};

use crate::{expand_tokens, ConfigError};

pub const ENV_PREFIX: &str = "BOOKSHELF_";
pub const RUN_MODE_VAR: &str = "RUN_MODE";

#[derive(Debug, Serialize, Deserialize, Derivative, Clone)]
#[derivative(Default)]
#[serde(default)]
pub struct SessionConfig {
    #[derivative(Default(value = "SameSiteConfig::Lax"))]
    pub same_site_policy: SameSiteConfig,
    pub secure: bool,
    #[derivative(Default(value = "1"))]
    pub expiry_days: i64,
}

#[derive(Debug, Serialize, Deserialize, Derivative, Clone)]
#[derivative(Default)]
#[serde(default)]
pub struct LoggerConfig {
    #[derivative(Default(value = "Verbosity::Info"))]
    pub verbosity: Verbosity,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum Verbosity {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum SameSiteConfig {
    Strict,
    Lax,
    None,
}

/// Paths of the authentication routes, relative to `base` until
/// [`Routes::with_base_prepend`] is applied.
#[derive(Debug, Serialize, Deserialize, Derivative, Clone, PartialEq, Eq)]
#[derivative(Default)]
#[serde(default)]
pub struct Routes {
    #[derivative(Default(value = "\"/\".into()"))]
    pub base: String,
    #[derivative(Default(value = "\"auth/signin\".into()"))]
    pub signin: String,
    #[derivative(Default(value = "\"auth/signout\".into()"))]
    pub signout: String,
    #[derivative(Default(value = "\"auth/callback\".into()"))]
    pub callback: String,
    #[derivative(Default(value = "\"auth/session\".into()"))]
    pub session: String,
}

impl Routes {
    #[must_use]
    pub fn with_base_prepend(&self) -> Self {
        let normalized_base = normalize_slash(&self.base);
        Self {
            signin: join_paths(&normalized_base, &self.signin),
            signout: join_paths(&normalized_base, &self.signout),
            callback: join_paths(&normalized_base, &self.callback),
            session: join_paths(&normalized_base, &self.session),
            base: normalized_base,
        }
    }
}

fn normalize_slash(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    }
}

fn join_paths(base: &str, path: &str) -> String {
    let trimmed_base = base.trim_end_matches('/');
    let trimmed_path = path.trim_start_matches('/');
    format!("{trimmed_base}/{trimmed_path}")
}

#[derive(Debug, Serialize, Deserialize, Derivative, Clone)]
#[derivative(Default)]
#[serde(default)]
pub struct Website {
    #[derivative(Default(value = "\"public/www\".into()"))]
    pub web_root: String,
    pub bind_ssl_config: SslConfig,
    #[derivative(Default(value = "IpAddr::from([127, 0, 0, 1])"))]
    pub bind_address: IpAddr,
    pub bind_ports: Ports,
    #[derivative(Default(value = "\"localhost\".into()"))]
    pub public_hostname: String,
    pub public_ports: Ports,
    pub public_ssl_enabled: bool,
}

impl Website {
    #[must_use]
    pub fn public_server_url(&self) -> String {
        let (protocol, port) = self.protocol_and_port();
        self.format_hostname_and_port(protocol, port)
    }

    #[must_use]
    pub fn format_public_server_url(&self, path: &str) -> String {
        let url = self.public_server_url();
        format!(
            "{}/{}",
            url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn protocol_and_port(&self) -> (&str, u16) {
        if self.public_ssl_enabled {
            ("https", self.public_ports.https)
        } else {
            ("http", self.public_ports.http)
        }
    }

    fn is_default_port(protocol: &str, port: u16) -> bool {
        matches!((protocol, port), ("http", 80) | ("https", 443))
    }

    fn format_hostname_and_port(&self, protocol: &str, port: u16) -> String {
        if Self::is_default_port(protocol, port) {
            format!("{}://{}", protocol, self.public_hostname)
        } else {
            format!("{}://{}:{}", protocol, self.public_hostname, port)
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Derivative, Clone)]
#[derivative(Default)]
#[serde(default)]
pub struct SslConfig {
    pub enabled: bool,
    #[derivative(Default(value = "\"config/cert.pem\".into()"))]
    pub cert_path: String,
    #[derivative(Default(value = "\"config/key.pem\".into()"))]
    pub key_path: String,
}

#[derive(Debug, Serialize, Deserialize, Derivative, Clone)]
#[derivative(Default)]
#[serde(default)]
pub struct Ports {
    #[derivative(Default(value = "80"))]
    pub http: u16,
    #[derivative(Default(value = "443"))]
    pub https: u16,
}

#[derive(Debug, Serialize, Deserialize, Derivative, Clone)]
#[derivative(Default)]
#[serde(default)]
pub struct DatabaseConfig {
    #[derivative(Default(value = "\"sqlite::memory:\".into()"))]
    pub url: String,
    #[derivative(Default(value = "1"))]
    pub max_connections: u32,
}

#[derive(Debug, Serialize, Deserialize, Derivative, Clone)]
#[derivative(Default)]
#[serde(default)]
pub struct AuthConfig {
    /// Roles granted to a user the first time they sign in.
    #[derivative(Default(value = "vec![\"reader\".into()]"))]
    pub default_roles: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ClientConfig {
    pub display_name: String,
    pub client_id: String,
    pub client_secret: String,
    pub auth_uri: String,
    pub token_uri: String,
    pub userinfo_uri: String,
    /// Field of the userinfo response that identifies the account, e.g.
    /// `login` for GitHub or `email` for Google.
    #[serde(default = "default_login_field")]
    pub login_field: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_login_field() -> String {
    "login".to_string()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SidebarLinkConfig {
    pub href: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    /// Pattern tested against the current path. Defaults to the escaped `href`.
    #[serde(rename = "match", default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

fn default_sidebar() -> Vec<SidebarLinkConfig> {
    vec![
        SidebarLinkConfig {
            href: "/".into(),
            label: "Home".into(),
            description: "Overview of your bookshelf".into(),
            icon: "home".into(),
            pattern: Some("^/$".into()),
        },
        SidebarLinkConfig {
            href: "/books".into(),
            label: "Books".into(),
            description: "Browse the books in the collection".into(),
            icon: "book".into(),
            pattern: Some("^/books$".into()),
        },
    ]
}

#[derive(Debug, Serialize, Deserialize, Derivative, Clone)]
#[derivative(Default)]
#[serde(default)]
pub struct Config {
    #[derivative(Default(value = "\"dev\".into()"))]
    pub run_mode: String,
    pub logger: LoggerConfig,
    pub website: Website,
    pub session: SessionConfig,
    pub routes: Routes,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub oauth_clients: HashMap<String, ClientConfig>,
    #[derivative(Default(value = "default_sidebar()"))]
    pub sidebar: Vec<SidebarLinkConfig>,
}

impl Config {
    /// Loads `default.toml`, then `local.toml` and `{RUN_MODE}.toml` when
    /// present, then `BOOKSHELF_` environment variables, and finally expands
    /// `${dotted.path}` tokens.
    ///
    /// # Errors
    ///
    /// Fails when a file cannot be parsed, a value has the wrong type, or a
    /// token cannot be resolved.
    pub fn load_from_dir(config_dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let run_mode = env::var(RUN_MODE_VAR).unwrap_or_else(|_| "dev".to_string());
        Self::load_with_run_mode(config_dir, &run_mode)
    }

    /// # Errors
    ///
    /// See [`Config::load_from_dir`].
    pub fn load_with_run_mode(
        config_dir: impl AsRef<Path>,
        run_mode: &str,
    ) -> Result<Self, ConfigError> {
        let mut config: Config = Self::figment_with_paths(config_dir.as_ref(), run_mode).extract()?;
        config.run_mode = run_mode.to_string();

        let config_value = serde_json::to_value(&config)?;
        let expanded = expand_tokens(&config_value)?;
        Ok(serde_json::from_value(expanded)?)
    }

    #[must_use]
    pub fn figment_with_paths(config_dir: &Path, run_mode: &str) -> Figment {
        let mut figment = Figment::new().merge(Toml::file(config_dir.join("default.toml")));

        for name in ["local.toml".to_string(), format!("{run_mode}.toml")] {
            let path = config_dir.join(name);
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}
