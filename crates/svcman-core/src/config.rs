use crate::error::ConfigError;
use crate::types::ServiceDefinition;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "config.json";

const MAX_NAME_LEN: usize = 64;

// ── On-disk document ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigDocument {
	#[serde(default = "default_retention", alias = "log_retention_days")]
	log_retention_days: usize,
	#[serde(default)]
	directories: Directories,
	#[serde(default)]
	services: IndexMap<String, ServiceEntry>,
}

impl Default for ConfigDocument {
	fn default() -> Self {
		Self {
			log_retention_days: default_retention(),
			directories: Directories::default(),
			services: IndexMap::new(),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Directories {
	#[serde(default = "default_log_dir")]
	logs: String,
	#[serde(default = "default_pid_dir")]
	pids: String,
}

impl Default for Directories {
	fn default() -> Self {
		Self { logs: default_log_dir(), pids: default_pid_dir() }
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ServiceEntry {
	command: String,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	args: Vec<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	cwd: Option<String>,
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	env: BTreeMap<String, String>,
}

impl From<&ServiceDefinition> for ServiceEntry {
	fn from(def: &ServiceDefinition) -> Self {
		Self {
			command: def.command.clone(),
			args: def.args.clone(),
			cwd: def.cwd.as_ref().map(|p| p.to_string_lossy().into_owned()),
			env: def.env.clone(),
		}
	}
}

fn default_retention() -> usize { 7 }
fn default_log_dir() -> String { "logs".into() }
fn default_pid_dir() -> String { "pids".into() }

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
	Json,
	Toml,
}

impl Format {
	fn for_path(path: &Path) -> Self {
		match path.extension().and_then(|e| e.to_str()) {
			Some("toml") => Format::Toml,
			_ => Format::Json,
		}
	}
}

// ── Resolved view ───────────────────────────────────────────────────────────

/// Engine-facing settings with every path made absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
	pub log_retention: usize,
	pub log_dir: PathBuf,
	pub pid_dir: PathBuf,
}

/// Owns the configuration file and the validated service definitions in it.
///
/// Relative paths in the file are resolved against the file's directory.
/// The raw document is kept alongside so that saving writes back what the
/// operator wrote rather than the resolved absolute forms.
#[derive(Debug, Clone)]
pub struct ConfigStore {
	path: PathBuf,
	base_dir: PathBuf,
	format: Format,
	document: ConfigDocument,
	services: Vec<ServiceDefinition>,
	settings: Settings,
}

impl ConfigStore {
	/// Loads `path`. A missing file yields an empty configuration.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = absolute(path.as_ref());
		let format = Format::for_path(&path);

		let document = if path.exists() {
			let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
				path: path.clone(),
				source,
			})?;
			parse_document(&path, format, &content)?
		} else {
			tracing::debug!("no config at {}, starting empty", path.display());
			ConfigDocument::default()
		};

		Self::from_document(path, format, document)
	}

	fn from_document(
		path: PathBuf,
		format: Format,
		document: ConfigDocument,
	) -> Result<Self, ConfigError> {
		if document.log_retention_days == 0 {
			return Err(ConfigError::Retention);
		}
		let base_dir = path
			.parent()
			.map(Path::to_path_buf)
			.unwrap_or_else(|| PathBuf::from("/"));

		let mut services = Vec::with_capacity(document.services.len());
		for (name, entry) in &document.services {
			let def = ServiceDefinition {
				name: name.clone(),
				command: entry.command.clone(),
				args: entry.args.clone(),
				cwd: entry.cwd.as_deref().map(|c| resolve(&base_dir, c)),
				env: entry.env.clone(),
			};
			validate_definition(&def)?;
			services.push(def);
		}

		let settings = Settings {
			log_retention: document.log_retention_days,
			log_dir: resolve(&base_dir, &document.directories.logs),
			pid_dir: resolve(&base_dir, &document.directories.pids),
		};

		Ok(Self { path, base_dir, format, document, services, settings })
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Directory relative paths in the file are resolved against.
	pub fn base_dir(&self) -> &Path {
		&self.base_dir
	}

	pub fn settings(&self) -> &Settings {
		&self.settings
	}

	/// Services in configuration order.
	pub fn services(&self) -> &[ServiceDefinition] {
		&self.services
	}

	pub fn names(&self) -> Vec<String> {
		self.services.iter().map(|s| s.name.clone()).collect()
	}

	pub fn get(&self, name: &str) -> Option<&ServiceDefinition> {
		self.services.iter().find(|s| s.name == name)
	}

	pub fn add(&mut self, def: ServiceDefinition) -> Result<(), ConfigError> {
		validate_definition(&def)?;
		if self.get(&def.name).is_some() {
			return Err(ConfigError::DuplicateService(def.name));
		}
		self.document.services.insert(def.name.clone(), ServiceEntry::from(&def));
		self.services.push(def);
		Ok(())
	}

	/// Replaces an existing definition in place, keeping its position.
	pub fn replace(&mut self, def: ServiceDefinition) -> Result<(), ConfigError> {
		validate_definition(&def)?;
		let slot = self
			.services
			.iter_mut()
			.find(|s| s.name == def.name)
			.ok_or_else(|| ConfigError::UnknownService(def.name.clone()))?;
		self.document.services.insert(def.name.clone(), ServiceEntry::from(&def));
		*slot = def;
		Ok(())
	}

	pub fn remove(&mut self, name: &str) -> Result<ServiceDefinition, ConfigError> {
		let index = self
			.services
			.iter()
			.position(|s| s.name == name)
			.ok_or_else(|| ConfigError::UnknownService(name.to_string()))?;
		self.document.services.shift_remove(name);
		Ok(self.services.remove(index))
	}

	pub fn save(&self) -> Result<(), ConfigError> {
		let content = match self.format {
			Format::Json => serde_json::to_string_pretty(&self.document)
				.map(|mut s| {
					s.push('\n');
					s
				})
				.map_err(|e| ConfigError::Serialize(e.to_string()))?,
			Format::Toml => toml::to_string_pretty(&self.document)
				.map_err(|e| ConfigError::Serialize(e.to_string()))?,
		};
		let write_err = |source| ConfigError::Write { path: self.path.clone(), source };
		if let Some(parent) = self.path.parent() {
			std::fs::create_dir_all(parent).map_err(write_err)?;
		}
		std::fs::write(&self.path, content).map_err(write_err)?;
		tracing::info!("saved config to {}", self.path.display());
		Ok(())
	}
}

fn parse_document(path: &Path, format: Format, content: &str) -> Result<ConfigDocument, ConfigError> {
	let parsed = match format {
		Format::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
		Format::Toml => toml::from_str(content).map_err(|e| e.to_string()),
	};
	parsed.map_err(|message| ConfigError::Parse { path: path.to_path_buf(), message })
}

fn absolute(path: &Path) -> PathBuf {
	if path.is_absolute() {
		return path.to_path_buf();
	}
	std::env::current_dir()
		.map(|cwd| cwd.join(path))
		.unwrap_or_else(|_| path.to_path_buf())
}

fn resolve(base: &Path, value: &str) -> PathBuf {
	let path = Path::new(value);
	if path.is_absolute() {
		path.to_path_buf()
	} else {
		base.join(path)
	}
}

// ── Validation ──────────────────────────────────────────────────────────────

/// Names end up as file-name components of PID and log files.
pub fn validate_name(name: &str) -> Result<(), ConfigError> {
	if name.is_empty() {
		return Err(ConfigError::invalid(name, "name must not be empty"));
	}
	if name.len() > MAX_NAME_LEN {
		return Err(ConfigError::invalid(name, format!("name longer than {} characters", MAX_NAME_LEN)));
	}
	if name.starts_with('.') || name.starts_with('-') {
		return Err(ConfigError::invalid(name, "name must not start with '.' or '-'"));
	}
	if let Some(c) = name
		.chars()
		.find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
	{
		return Err(ConfigError::invalid(name, format!("invalid character {:?} in name", c)));
	}
	Ok(())
}

pub fn validate_definition(def: &ServiceDefinition) -> Result<(), ConfigError> {
	validate_name(&def.name)?;
	if def.command.trim().is_empty() {
		return Err(ConfigError::invalid(&def.name, "command is required"));
	}
	for key in def.env.keys() {
		if key.is_empty() || key.contains('=') || key.contains('\0') {
			return Err(ConfigError::invalid(&def.name, format!("invalid environment key {:?}", key)));
		}
	}
	if let Some(cwd) = &def.cwd {
		if !cwd.is_absolute() {
			return Err(ConfigError::invalid(&def.name, "working directory must be absolute"));
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
		let path = dir.join(name);
		std::fs::write(&path, content).unwrap();
		path
	}

	#[test]
	fn missing_file_is_empty_with_defaults() {
		let tmp = tempfile::tempdir().unwrap();
		let store = ConfigStore::load(tmp.path().join("config.json")).unwrap();
		assert!(store.services().is_empty());
		assert_eq!(store.settings().log_retention, 7);
		assert_eq!(store.settings().log_dir, tmp.path().join("logs"));
		assert_eq!(store.settings().pid_dir, tmp.path().join("pids"));
	}

	#[test]
	fn json_keeps_configuration_order_and_resolves_paths() {
		let tmp = tempfile::tempdir().unwrap();
		let path = write(
			tmp.path(),
			"config.json",
			r#"{
				"logRetentionDays": 3,
				"directories": { "logs": "var/log", "pids": "/run/svcman" },
				"services": {
					"zeta": { "command": "sleep", "args": ["30"], "cwd": "work" },
					"alpha": { "command": "true", "env": { "MODE": "dev" } },
					"mid": { "command": "sh" }
				}
			}"#,
		);
		let store = ConfigStore::load(&path).unwrap();
		assert_eq!(store.names(), vec!["zeta", "alpha", "mid"]);
		assert_eq!(store.settings().log_retention, 3);
		assert_eq!(store.settings().log_dir, tmp.path().join("var/log"));
		assert_eq!(store.settings().pid_dir, PathBuf::from("/run/svcman"));

		let zeta = store.get("zeta").unwrap();
		assert_eq!(zeta.args, vec!["30"]);
		assert_eq!(zeta.cwd.as_deref(), Some(tmp.path().join("work").as_path()));
		assert_eq!(store.get("alpha").unwrap().env.get("MODE").map(String::as_str), Some("dev"));
		assert_eq!(store.get("mid").unwrap().cwd, None);
	}

	#[test]
	fn toml_format_by_extension() {
		let tmp = tempfile::tempdir().unwrap();
		let path = write(
			tmp.path(),
			"svcman.toml",
			r#"
log_retention_days = 2

[services.web]
command = "python3"
args = ["-m", "http.server"]

[services.web.env]
PORT = "8000"
"#,
		);
		let store = ConfigStore::load(&path).unwrap();
		assert_eq!(store.settings().log_retention, 2);
		let web = store.get("web").unwrap();
		assert_eq!(web.command_line(), "python3 -m http.server");
		assert_eq!(web.env.get("PORT").map(String::as_str), Some("8000"));
	}

	#[test]
	fn parse_errors_are_reported() {
		let tmp = tempfile::tempdir().unwrap();
		let path = write(tmp.path(), "config.json", "{ not json");
		assert!(matches!(ConfigStore::load(&path), Err(ConfigError::Parse { .. })));
	}

	#[test]
	fn validation_rejects_bad_entries() {
		let tmp = tempfile::tempdir().unwrap();
		let path = write(tmp.path(), "config.json", r#"{"services": {"../etc": {"command": "x"}}}"#);
		assert!(matches!(ConfigStore::load(&path), Err(ConfigError::Invalid { .. })));

		let path = write(tmp.path(), "config.json", r#"{"services": {"ok": {"command": "  "}}}"#);
		assert!(matches!(ConfigStore::load(&path), Err(ConfigError::Invalid { .. })));

		let path = write(tmp.path(), "config.json", r#"{"logRetentionDays": 0}"#);
		assert!(matches!(ConfigStore::load(&path), Err(ConfigError::Retention)));
	}

	#[test]
	fn name_rules() {
		assert!(validate_name("echo-loop").is_ok());
		assert!(validate_name("api_v2.worker").is_ok());
		assert!(validate_name("").is_err());
		assert!(validate_name(".hidden").is_err());
		assert!(validate_name("-flag").is_err());
		assert!(validate_name("a/b").is_err());
		assert!(validate_name(&"x".repeat(65)).is_err());
	}

	#[test]
	fn add_replace_remove_and_save_roundtrip() {
		let tmp = tempfile::tempdir().unwrap();
		let path = write(
			tmp.path(),
			"config.json",
			r#"{"services": {"first": {"command": "sleep", "args": ["1"], "cwd": "rel"}}}"#,
		);
		let mut store = ConfigStore::load(&path).unwrap();

		let second = ServiceDefinition {
			name: "second".into(),
			command: "sleep".into(),
			args: vec!["2".into()],
			cwd: None,
			env: BTreeMap::new(),
		};
		store.add(second.clone()).unwrap();
		assert!(matches!(store.add(second.clone()), Err(ConfigError::DuplicateService(_))));

		let mut changed = second.clone();
		changed.args = vec!["5".into()];
		store.replace(changed).unwrap();
		store.save().unwrap();

		let reloaded = ConfigStore::load(&path).unwrap();
		assert_eq!(reloaded.names(), vec!["first", "second"]);
		assert_eq!(reloaded.get("second").unwrap().args, vec!["5"]);

		// The untouched entry keeps its relative cwd on disk.
		let raw = std::fs::read_to_string(&path).unwrap();
		assert!(raw.contains(r#""cwd": "rel""#), "saved: {}", raw);

		let mut store = reloaded;
		store.remove("first").unwrap();
		assert!(matches!(store.remove("first"), Err(ConfigError::UnknownService(_))));
		assert_eq!(store.names(), vec!["second"]);
	}
}
