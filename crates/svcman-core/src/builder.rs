use crate::config::validate_definition;
use crate::error::ConfigError;
use crate::types::ServiceDefinition;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Assembles a validated [`ServiceDefinition`] from piecemeal edits.
///
/// This is how definitions get created or modified outside the config file;
/// the engine only ever sees the result of [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct ServiceDefinitionBuilder {
	name: String,
	command: Option<String>,
	args: Vec<String>,
	cwd: Option<PathBuf>,
	env: BTreeMap<String, String>,
	base_dir: Option<PathBuf>,
}

impl ServiceDefinitionBuilder {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			command: None,
			args: Vec::new(),
			cwd: None,
			env: BTreeMap::new(),
			base_dir: None,
		}
	}

	/// Starts from an existing definition, for modification.
	pub fn from_definition(def: &ServiceDefinition) -> Self {
		Self {
			name: def.name.clone(),
			command: Some(def.command.clone()),
			args: def.args.clone(),
			cwd: def.cwd.clone(),
			env: def.env.clone(),
			base_dir: None,
		}
	}

	/// Directory a relative `cwd` is resolved against at build time.
	pub fn base_dir(mut self, dir: impl AsRef<Path>) -> Self {
		self.base_dir = Some(dir.as_ref().to_path_buf());
		self
	}

	pub fn command(mut self, command: impl Into<String>) -> Self {
		self.command = Some(command.into());
		self
	}

	pub fn arg(mut self, arg: impl Into<String>) -> Self {
		self.args.push(arg.into());
		self
	}

	pub fn args<I, S>(mut self, args: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.args.extend(args.into_iter().map(Into::into));
		self
	}

	pub fn clear_args(mut self) -> Self {
		self.args.clear();
		self
	}

	pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
		self.cwd = Some(cwd.as_ref().to_path_buf());
		self
	}

	pub fn clear_cwd(mut self) -> Self {
		self.cwd = None;
		self
	}

	pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.env.insert(key.into(), value.into());
		self
	}

	/// Parses `KEY=VALUE`; surrounding whitespace on both halves is trimmed.
	pub fn env_assignment(self, assignment: &str) -> Result<Self, ConfigError> {
		let (key, value) = assignment.split_once('=').ok_or_else(|| {
			ConfigError::invalid(&self.name, format!("expected KEY=VALUE, got {:?}", assignment))
		})?;
		let key = key.trim().to_string();
		let value = value.trim().to_string();
		Ok(self.env(key, value))
	}

	pub fn unset_env(mut self, key: &str) -> Self {
		self.env.remove(key);
		self
	}

	pub fn build(self) -> Result<ServiceDefinition, ConfigError> {
		let command = self
			.command
			.ok_or_else(|| ConfigError::invalid(&self.name, "command is required"))?;
		let cwd = match (self.cwd, &self.base_dir) {
			(Some(cwd), Some(base)) if cwd.is_relative() => Some(base.join(cwd)),
			(cwd, _) => cwd,
		};
		let def = ServiceDefinition {
			name: self.name,
			command,
			args: self.args,
			cwd,
			env: self.env,
		};
		validate_definition(&def)?;
		Ok(def)
	}
}
