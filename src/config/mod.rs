use config::{Config, Environment, File};
use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;
use zoneforge_editor::EditorConfig;

use crate::cli::Cli;
use crate::error::{ClientError, ClientResult};

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub backend: BackendSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default)]
    pub log: LogSettings,
    /// Accept every confirmation without prompting
    #[serde(default)]
    pub assume_yes: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendSettings {
    pub base_url: String,
    /// No timeout when unset
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

impl BackendSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}

/// Credentials: a token, or a username/password pair to log in with
#[derive(Debug, Default, Deserialize)]
pub struct AuthSettings {
    #[serde(default)]
    pub token: Option<SecretString>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<SecretString>,
}

impl AuthSettings {
    pub fn token(&self) -> Option<&SecretString> {
        self.token.as_ref()
    }

    /// Username and password, when both are configured
    pub fn login(&self) -> Option<(&str, &SecretString)> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some((username.as_str(), password)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    /// Create settings from CLI arguments (config file, then environment, then CLI overrides)
    pub fn new_with_cli(cli: &Cli) -> ClientResult<Self> {
        let s = Config::builder()
            .add_source(File::from(cli.config.clone()).required(false))
            .add_source(
                Environment::with_prefix("ZONEFORGE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("backend.base_url", "http://127.0.0.1:5000")?
            .set_default("log.level", "info")?
            .build()?;

        let mut settings: Settings = s.try_deserialize()?;

        // CLI > env vars > config file
        settings.apply_cli_overrides(cli);
        settings.validate()?;

        Ok(settings)
    }

    fn apply_cli_overrides(&mut self, cli: &Cli) {
        if let Some(base_url) = &cli.base_url {
            self.backend.base_url = base_url.clone();
        }
        if let Some(timeout) = cli.timeout {
            self.backend.timeout_seconds = Some(timeout);
        }
        if let Some(token) = &cli.token {
            self.auth.token = Some(SecretString::from(token.clone()));
        }
        if let Some(username) = &cli.username {
            self.auth.username = Some(username.clone());
        }
        if let Some(password) = &cli.password {
            self.auth.password = Some(SecretString::from(password.clone()));
        }
        if let Some(policy) = cli.failure_policy {
            self.editor.failure_policy = policy.into();
        }
        if cli.yes {
            self.assume_yes = true;
        }
        match cli.verbose {
            0 => {}
            1 => self.log.level = "debug".to_string(),
            _ => self.log.level = "trace".to_string(),
        }
    }

    fn validate(&self) -> ClientResult<()> {
        let base_url = &self.backend.base_url;
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::InvalidSettings(format!(
                "backend.base_url must be an http(s) URL, got `{}`",
                base_url
            )));
        }
        if self.backend.timeout_seconds == Some(0) {
            return Err(ClientError::InvalidSettings(
                "backend.timeout_seconds must be greater than zero".to_string(),
            ));
        }
        if self.editor.password_length == 0 {
            return Err(ClientError::InvalidSettings(
                "editor.password_length must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Filter directive for the tracing subscriber
    pub fn log_directive(&self) -> String {
        format!("zoneforge={level},zoneforge_editor={level}", level = self.log.level)
    }
}
