use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("failed to read {}: {source}", path.display())]
	Read {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
	#[error("failed to write {}: {source}", path.display())]
	Write {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
	#[error("failed to parse {}: {message}", path.display())]
	Parse { path: PathBuf, message: String },
	#[error("failed to serialize config: {0}")]
	Serialize(String),
	#[error("service '{service}': {reason}")]
	Invalid { service: String, reason: String },
	#[error("unknown service: {0}")]
	UnknownService(String),
	#[error("service '{0}' already exists")]
	DuplicateService(String),
	#[error("logRetentionDays must be at least 1")]
	Retention,
}

impl ConfigError {
	pub(crate) fn invalid(service: &str, reason: impl Into<String>) -> Self {
		ConfigError::Invalid {
			service: service.to_string(),
			reason: reason.into(),
		}
	}
}
