use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

use optin_sign::SecretKey;

use crate::error::{CliError, CliResult};

/// Where the signing key comes from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyConfig {
    /// Environment variable holding the key.
    #[serde(default = "default_env_var")]
    pub env_var: String,

    /// File holding the key. Takes precedence over `env_var` when set.
    /// A single trailing newline is stripped.
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Minimum accepted key length in bytes.
    #[serde(default = "default_min_length")]
    pub min_length: usize,
}

fn default_env_var() -> String {
    "OPTIN_SIGNING_KEY".to_string()
}

fn default_min_length() -> usize {
    1
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            env_var: default_env_var(),
            file: None,
            min_length: default_min_length(),
        }
    }
}

/// Top-level configuration for the `optin` binary.
///
/// Loaded from a TOML file (typically `~/.optin/config.toml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliConfig {
    #[serde(default)]
    pub key: KeyConfig,
}

/// Returns `$HOME/<suffix>` if HOME is available, otherwise `./<suffix>`.
fn dirs_or_default(suffix: &str) -> PathBuf {
    std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(suffix))
        .unwrap_or_else(|_| PathBuf::from(suffix))
}

impl CliConfig {
    /// Load configuration from a TOML file. If the file does not exist,
    /// returns a default configuration.
    pub fn load(path: &Path) -> CliResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let config: CliConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> CliResult<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("TOML serialize error: {}", e)))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn validate(&self) -> CliResult<()> {
        if self.key.env_var.trim().is_empty() {
            return Err(CliError::Config("key.env_var must not be empty".into()));
        }
        if self.key.min_length == 0 {
            return Err(CliError::Config("key.min_length must be > 0".into()));
        }
        Ok(())
    }

    pub fn default_config_path() -> PathBuf {
        dirs_or_default(".optin/config.toml")
    }

    /// Resolve the signing key from the process environment.
    pub fn resolve_key(&self, env_override: Option<&str>) -> CliResult<SecretKey> {
        self.resolve_key_with(env_override, |name| std::env::var(name).ok())
    }

    /// Resolve the signing key using `lookup` for environment variables.
    ///
    /// Order: `env_override` variable, then `key.file`, then `key.env_var`.
    pub fn resolve_key_with<F>(&self, env_override: Option<&str>, lookup: F) -> CliResult<SecretKey>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw: Zeroizing<String> = match (env_override, &self.key.file) {
            (Some(var), _) => Zeroizing::new(lookup(var).ok_or_else(|| {
                CliError::KeyUnavailable(format!("environment variable {} is not set", var))
            })?),
            (None, Some(path)) => {
                let mut contents = Zeroizing::new(std::fs::read_to_string(path).map_err(|e| {
                    CliError::KeyUnavailable(format!("cannot read {}: {}", path.display(), e))
                })?);
                strip_trailing_newline(&mut contents);
                contents
            }
            (None, None) => Zeroizing::new(lookup(&self.key.env_var).ok_or_else(|| {
                CliError::KeyUnavailable(format!(
                    "environment variable {} is not set",
                    self.key.env_var
                ))
            })?),
        };

        if raw.len() < self.key.min_length {
            return Err(CliError::KeyUnavailable(format!(
                "key is {} bytes, configured minimum is {}",
                raw.len(),
                self.key.min_length
            )));
        }
        Ok(SecretKey::new(raw.as_bytes())?)
    }
}

fn strip_trailing_newline(s: &mut String) {
    if s.ends_with('\n') {
        s.pop();
        if s.ends_with('\r') {
            s.pop();
        }
    }
}
