use thiserror::Error;

/// Errors surfaced by the command-line front end.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("signing error: {0}")]
    Sign(#[from] optin_sign::SignError),

    #[error("configuration error: {0}")]
    Config(String),

    /// No key could be read from the configured sources.
    #[error("signing key unavailable: {0}")]
    KeyUnavailable(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for CliError {
    fn from(e: toml::de::Error) -> Self {
        CliError::Config(format!("TOML parse error: {}", e))
    }
}

pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_error_display() {
        let err = CliError::Config("env_var must not be empty".into());
        assert_eq!(
            err.to_string(),
            "configuration error: env_var must not be empty"
        );
    }

    #[test]
    fn test_from_sign_error() {
        let err: CliError = optin_sign::SignError::EmptyKey.into();
        assert!(matches!(err, CliError::Sign(optin_sign::SignError::EmptyKey)));
        assert_eq!(err.to_string(), "signing error: secret key must not be empty");
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: CliError = io.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_toml_error() {
        let err = toml::from_str::<toml::Value>("= broken").unwrap_err();
        let err: CliError = err.into();
        assert!(err.to_string().starts_with("configuration error: TOML parse error"));
    }
}
