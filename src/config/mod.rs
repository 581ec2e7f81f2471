//! Configuration management

mod cli;
mod file;

pub use cli::{usage, Cli, DEFAULT_CONFIG_PATH};

use crate::types::CopierError;
use file::ConfigFile;
use serde::{Serialize, Serializer};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

/// Connection details for the SSH target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteHost {
    /// Host name or IP address
    pub address: String,

    pub port: u16,

    pub username: String,

    #[serde(serialize_with = "redact")]
    pub password: String,

    /// Bound on connect, handshake and authentication (seconds)
    pub timeout_secs: u64,
}

impl RemoteHost {
    /// `user@host:port`, safe to print
    pub fn display_target(&self) -> String {
        format!("{}@{}:{}", self.username, self.address, self.port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RemoteHost {
    fn default() -> Self {
        Self {
            address: String::new(),
            port: 22,
            username: String::new(),
            password: String::new(),
            timeout_secs: 3,
        }
    }
}

/// Global configuration for copier, loaded once and read-only afterwards
#[derive(Debug, Clone, Default, Serialize)]
pub struct Config {
    /// Local roots to sync (at least one)
    pub local_paths: Vec<PathBuf>,

    /// Local directory that receives backups and feeds reverts
    pub backups_path: PathBuf,

    pub remote_host: RemoteHost,

    /// Remote directory mirroring the local roots
    pub remote_root: String,

    /// Hook commands run before the transfer (copy/revert)
    pub pre_commands: Vec<String>,

    /// Hook commands run after the transfer (copy/revert)
    pub post_commands: Vec<String>,

    /// Exclude patterns (gitignore globs)
    pub exclude: Vec<String>,

    /// Move the previous backups directory aside instead of deleting it
    pub keep_previous: bool,

    /// Dry run (show plan, don't connect)
    pub dry_run: bool,
}

impl Config {
    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self, CopierError> {
        if !path.is_file() {
            return Err(CopierError::Config(format!(
                "Config file at: {} does not exist!",
                path.display()
            )));
        }

        let text = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text).map_err(|e| match e {
            CopierError::Config(msg) => {
                CopierError::Config(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;

        tracing::debug!(config = %config.to_redacted_json(), "loaded configuration");
        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn from_toml_str(text: &str) -> Result<Self, CopierError> {
        let raw: ConfigFile =
            toml::from_str(text).map_err(|e| CopierError::Config(e.message().to_string()))?;

        let port = raw.target.port.resolve().map_err(CopierError::Config)?;

        let config = Self {
            local_paths: raw
                .local
                .path
                .into_vec()
                .into_iter()
                .map(PathBuf::from)
                .collect(),
            backups_path: PathBuf::from(raw.local.backups.trim()),
            remote_host: RemoteHost {
                address: raw.target.ip.trim().to_string(),
                port,
                username: raw.target.username.trim().to_string(),
                password: raw.target.password,
                timeout_secs: raw.target.timeout,
            },
            remote_root: raw.target.path.trim().to_string(),
            pre_commands: raw.target.pre.into_vec(),
            post_commands: raw.target.post.into_vec(),
            exclude: raw.local.exclude.into_vec(),
            keep_previous: raw.local.keep_previous,
            dry_run: false,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), CopierError> {
        if self.local_paths.is_empty() {
            return Err(CopierError::Config(
                "local.path must name at least one directory".to_string(),
            ));
        }

        if self.local_paths.iter().any(|p| p.as_os_str().is_empty()) {
            return Err(CopierError::Config(
                "local.path contains an empty entry".to_string(),
            ));
        }

        if self.backups_path.as_os_str().is_empty() {
            return Err(CopierError::Config("local.backups is empty".to_string()));
        }

        // Backup mode wipes backups_path: it must not be or contain a source root
        let backups = resolve_local(&self.backups_path);
        if let Some(root) = self
            .local_paths
            .iter()
            .find(|root| resolve_local(root).starts_with(&backups))
        {
            return Err(CopierError::Config(format!(
                "local.backups ({}) cannot be or contain the local.path entry {}",
                self.backups_path.display(),
                root.display()
            )));
        }

        if self.remote_host.address.is_empty() {
            return Err(CopierError::Config("target.ip is empty".to_string()));
        }

        if self.remote_host.username.is_empty() {
            return Err(CopierError::Config("target.username is empty".to_string()));
        }

        if self.remote_host.timeout_secs == 0 {
            return Err(CopierError::Config(
                "target.timeout must be at least 1 second".to_string(),
            ));
        }

        if self.remote_root.is_empty() {
            return Err(CopierError::Config("target.path is empty".to_string()));
        }

        Ok(())
    }

    /// JSON dump with the password masked
    pub fn to_redacted_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("<unserializable: {}>", e))
    }
}

impl TryFrom<&Cli> for Config {
    type Error = CopierError;

    fn try_from(cli: &Cli) -> Result<Self, Self::Error> {
        let mut config = Config::load(&cli.config)?;
        config.dry_run = cli.dry_run;
        Ok(config)
    }
}

/// Absolute form of `path` with `.`/`..` and symlinks resolved as far as it exists.
fn resolve_local(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };

    let mut lexical = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                lexical.pop();
            }
            other => lexical.push(other.as_os_str()),
        }
    }

    if let Ok(canonical) = lexical.canonicalize() {
        return canonical;
    }

    // Canonicalize the deepest existing ancestor and re-attach the rest
    let mut missing = Vec::new();
    let mut existing = lexical.as_path();
    while let Some(parent) = existing.parent() {
        if let Some(name) = existing.file_name() {
            missing.push(name.to_os_string());
        }
        existing = parent;
        if let Ok(canonical) = existing.canonicalize() {
            return missing
                .iter()
                .rev()
                .fold(canonical, |acc, part| acc.join(part));
        }
    }
    lexical
}

fn redact<S: Serializer>(secret: &str, serializer: S) -> Result<S::Ok, S::Error> {
    if secret.is_empty() {
        serializer.serialize_str("")
    } else {
        serializer.serialize_str("********")
    }
}
