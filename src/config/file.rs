//! On-disk configuration schema (TOML)

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct ConfigFile {
    pub local: LocalSection,
    pub target: TargetSection,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LocalSection {
    /// One or more local roots
    pub path: Lines,
    pub backups: String,
    #[serde(default)]
    pub exclude: Lines,
    #[serde(default)]
    pub keep_previous: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TargetSection {
    pub ip: String,
    #[serde(default = "default_port")]
    pub port: PortValue,
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub path: String,
    #[serde(default)]
    pub pre: Lines,
    #[serde(default)]
    pub post: Lines,
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

/// A list given either as an array or as a multi-line string
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Lines {
    Text(String),
    List(Vec<String>),
}

impl Default for Lines {
    fn default() -> Self {
        Lines::List(Vec::new())
    }
}

impl Lines {
    /// Trimmed, non-blank entries in order
    pub fn into_vec(self) -> Vec<String> {
        let raw: Vec<String> = match self {
            Lines::Text(text) => text.lines().map(str::to_string).collect(),
            Lines::List(items) => items,
        };
        raw.into_iter()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect()
    }
}

/// Port written as `22` or `"22"`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum PortValue {
    Number(i64),
    Text(String),
}

impl PortValue {
    pub fn resolve(&self) -> Result<u16, String> {
        let number = match self {
            PortValue::Number(n) => *n,
            PortValue::Text(text) => text
                .trim()
                .parse::<i64>()
                .map_err(|_| format!("port '{}' is not a number", text))?,
        };
        match u16::try_from(number) {
            Ok(port) if port > 0 => Ok(port),
            _ => Err(format!("port {} is out of range (1-65535)", number)),
        }
    }
}

fn default_port() -> PortValue {
    PortValue::Number(22)
}

fn default_timeout() -> u64 {
    3
}
