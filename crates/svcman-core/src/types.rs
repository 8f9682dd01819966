use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A named external command managed by svcman.
///
/// `cwd` is absolute once the definition has been through the config store or
/// the builder; `None` means the child inherits the invoker's directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDefinition {
	pub name: String,
	pub command: String,
	#[serde(default)]
	pub args: Vec<String>,
	#[serde(default)]
	pub cwd: Option<PathBuf>,
	#[serde(default)]
	pub env: BTreeMap<String, String>,
}

impl ServiceDefinition {
	/// Command and arguments joined with single spaces, as shown to operators
	/// and as matched by the reconciliation utility.
	pub fn command_line(&self) -> String {
		let mut line = self.command.clone();
		for arg in &self.args {
			line.push(' ');
			line.push_str(arg);
		}
		line
	}
}

/// Liveness of a service, computed fresh on every query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ServiceStatus {
	Running { pid: u32 },
	Stopped,
	/// A PID was on record but the process was gone; the record was deleted.
	StaleCleared { pid: u32 },
}

impl ServiceStatus {
	pub fn is_running(&self) -> bool {
		matches!(self, ServiceStatus::Running { .. })
	}

	pub fn pid(&self) -> Option<u32> {
		match self {
			ServiceStatus::Running { pid } => Some(*pid),
			_ => None,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StartOutcome {
	Started { pid: u32 },
	AlreadyRunning { pid: u32 },
	Failed {
		reason: String,
		#[serde(default)]
		log_tail: Vec<String>,
	},
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StopOutcome {
	Stopped { pid: u32 },
	/// Nothing live was on record (a stale record, if any, was cleared).
	NotRunning,
	/// The process survived the forceful signal; its PID record is kept.
	StillRunning { pid: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RestartOutcome {
	Restarted {
		previous: Option<u32>,
		start: StartOutcome,
	},
	/// Restart aborted before starting because the old process would not die.
	StopFailed { pid: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdoptOutcome {
	Adopted { pid: u32 },
	AlreadyTracked { pid: u32 },
	NoMatch,
	Ambiguous { pids: Vec<u32> },
}

/// Whether a per-service result counts towards overall success.
pub trait Outcome {
	fn is_success(&self) -> bool;
}

impl Outcome for StartOutcome {
	fn is_success(&self) -> bool {
		!matches!(self, StartOutcome::Failed { .. })
	}
}

impl Outcome for StopOutcome {
	fn is_success(&self) -> bool {
		!matches!(self, StopOutcome::StillRunning { .. })
	}
}

impl Outcome for RestartOutcome {
	fn is_success(&self) -> bool {
		match self {
			RestartOutcome::Restarted { start, .. } => start.is_success(),
			RestartOutcome::StopFailed { .. } => false,
		}
	}
}

impl Outcome for ServiceStatus {
	fn is_success(&self) -> bool {
		true
	}
}

impl Outcome for AdoptOutcome {
	fn is_success(&self) -> bool {
		matches!(self, AdoptOutcome::Adopted { .. } | AdoptOutcome::AlreadyTracked { .. })
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn command_line_joins_args() {
		let def = ServiceDefinition {
			name: "web".into(),
			command: "python3".into(),
			args: vec!["-m".into(), "http.server".into()],
			cwd: None,
			env: BTreeMap::new(),
		};
		assert_eq!(def.command_line(), "python3 -m http.server");
	}

	#[test]
	fn outcome_success() {
		assert!(StartOutcome::Started { pid: 1 }.is_success());
		assert!(StartOutcome::AlreadyRunning { pid: 1 }.is_success());
		assert!(!StartOutcome::Failed { reason: "x".into(), log_tail: vec![] }.is_success());
		assert!(StopOutcome::NotRunning.is_success());
		assert!(!StopOutcome::StillRunning { pid: 9 }.is_success());
		assert!(!RestartOutcome::StopFailed { pid: 9 }.is_success());
		assert!(!RestartOutcome::Restarted {
			previous: Some(3),
			start: StartOutcome::Failed { reason: "exited".into(), log_tail: vec![] },
		}
		.is_success());
	}

	#[test]
	fn status_serializes_tagged() {
		let json = serde_json::to_string(&ServiceStatus::Running { pid: 42 }).unwrap();
		assert_eq!(json, r#"{"state":"running","pid":42}"#);
		assert!(!ServiceStatus::StaleCleared { pid: 42 }.is_running());
	}
}
