//! Tracing subscriber setup for the command line tool

use cas_linkml_core::{
    error::{LinkMLError, Result},
    settings::{LogFormat, LoggingSettings},
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter directive for `verbosity` extra `-v` flags on top of `base`
#[must_use]
pub fn effective_level(base: &str, verbosity: u8) -> String {
    match verbosity {
        0 => base.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Build the event filter: `RUST_LOG` when set, otherwise `level`
///
/// # Errors
///
/// Returns `LinkMLError::Config` when `level` is not a valid directive.
pub fn env_filter(level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level)
        .map_err(|e| LinkMLError::config(format!("invalid log level '{level}': {e}")))
}

/// Install the global subscriber, writing to stderr
///
/// Calling it twice is harmless; the second call reports an error that is
/// ignored so tests and embedding programs can call it freely.
///
/// # Errors
///
/// Returns `LinkMLError::Config` for an invalid level.
pub fn init(settings: &LoggingSettings) -> Result<()> {
    let filter = env_filter(&settings.level)?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match settings.format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    };
    if installed.is_err() {
        tracing::debug!("global subscriber already installed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_raises_level() {
        assert_eq!(effective_level("warn", 0), "warn");
        assert_eq!(effective_level("warn", 1), "debug");
        assert_eq!(effective_level("warn", 3), "trace");
    }

    #[test]
    fn test_invalid_level_rejected() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        assert!(env_filter("cas_linkml=[").is_err());
        assert!(env_filter("cas_linkml=debug,info").is_ok());
    }

    #[test]
    fn test_init_twice() {
        let settings = LoggingSettings::default();
        init(&settings).unwrap();
        init(&settings).unwrap();
    }
}
