//! Logging bootstrap.

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{Error, Result};
use tracing_subscriber::EnvFilter;

/// Builds the filter for `config`: its directives, or `RUST_LOG` when none
/// are configured, or `info` when neither is set.
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
	if config.level.trim().is_empty() {
		return Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));
	}
	EnvFilter::try_new(&config.level)
		.map_err(|e| Error::Logging(format!("invalid filter {:?}: {}", config.level, e)))
}

/// Installs a global fmt subscriber.
///
/// Returns `Ok(false)` when a global subscriber was already installed, so
/// calling it more than once is harmless.
pub fn init(config: &LoggingConfig) -> Result<bool> {
	let filter = env_filter(config)?;
	let installed = match config.format {
		LogFormat::Full => tracing_subscriber::fmt().with_env_filter(filter).try_init(),
		LogFormat::Compact => tracing_subscriber::fmt()
			.compact()
			.with_env_filter(filter)
			.try_init(),
	};
	Ok(installed.is_ok())
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn config(level: &str) -> LoggingConfig {
		LoggingConfig {
			level: level.to_string(),
			..LoggingConfig::default()
		}
	}

	#[rstest]
	#[case("info")]
	#[case("warn,trellis_urls=trace")]
	#[case("trellis_dispatch::application=debug")]
	fn test_env_filter_accepts_directives(#[case] level: &str) {
		assert!(env_filter(&config(level)).is_ok());
	}

	#[rstest]
	fn test_env_filter_rejects_bad_level() {
		let err = env_filter(&config("trellis=loud")).unwrap_err();

		assert!(matches!(err, Error::Logging(_)));
	}

	#[rstest]
	fn test_init_twice_is_harmless() {
		let config = LoggingConfig::default();

		init(&config).unwrap();
		let second = init(&config).unwrap();

		assert!(!second);
	}
}
