use std::io;
use svcman_core::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
	#[error("service '{0}' not found in config")]
	UnknownService(String),
	#[error("service '{name}' is running (pid {pid})")]
	ServiceRunning { name: String, pid: u32 },
	#[error(transparent)]
	Config(#[from] ConfigError),
	#[error("{context}: {source}")]
	Io {
		context: String,
		#[source]
		source: io::Error,
	},
}

impl EngineError {
	pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
		EngineError::Io { context: context.into(), source }
	}
}
