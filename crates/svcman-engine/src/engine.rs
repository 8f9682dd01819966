use svcman_core::{
	AdoptOutcome, ConfigStore, RestartOutcome, ServiceDefinition, ServiceStatus, StartOutcome,
	StopOutcome,
};

use crate::batch::BatchReport;
use crate::error::EngineError;
use crate::launcher::Launcher;
use crate::logs::LogSink;
use crate::pid::{PidStore, Recorded};
use crate::reconcile;
use crate::terminator::{Termination, Terminator};
use crate::timings::Timings;

/// Entry point for callers: start, stop, restart and status of configured
/// services, one at a time or all of them.
///
/// Nothing is cached between calls. Every operation re-reads the PID record
/// and probes the process table, so concurrent invocations of the tool only
/// ever act on the current state of the host.
pub struct LifecycleEngine {
	config: ConfigStore,
	pids: PidStore,
	logs: LogSink,
	log_retention: usize,
	timings: Timings,
}

impl LifecycleEngine {
	pub fn new(config: ConfigStore) -> Self {
		Self::with_timings(config, Timings::default())
	}

	/// Builds the engine and applies log retention to every configured service.
	pub fn with_timings(config: ConfigStore, timings: Timings) -> Self {
		let settings = config.settings().clone();
		let engine = Self {
			pids: PidStore::new(settings.pid_dir),
			logs: LogSink::new(settings.log_dir),
			log_retention: settings.log_retention,
			config,
			timings,
		};
		for def in engine.config.services() {
			engine.logs.rotate(&def.name, settings.log_retention);
		}
		engine
	}

	pub fn config(&self) -> &ConfigStore {
		&self.config
	}

	pub fn config_mut(&mut self) -> &mut ConfigStore {
		&mut self.config
	}

	pub fn pids(&self) -> &PidStore {
		&self.pids
	}

	pub fn logs(&self) -> &LogSink {
		&self.logs
	}

	pub fn timings(&self) -> Timings {
		self.timings
	}

	fn definition(&self, name: &str) -> Result<&ServiceDefinition, EngineError> {
		self.config
			.get(name)
			.ok_or_else(|| EngineError::UnknownService(name.to_string()))
	}

	pub fn status(&self, name: &str) -> Result<ServiceStatus, EngineError> {
		self.definition(name)?;
		Ok(match self.pids.reconcile(name) {
			Recorded::Live(pid) => ServiceStatus::Running { pid },
			Recorded::Stale(pid) => ServiceStatus::StaleCleared { pid },
			Recorded::Nothing => ServiceStatus::Stopped,
		})
	}

	pub fn start(&self, name: &str) -> Result<StartOutcome, EngineError> {
		let def = self.definition(name)?;
		let launcher = Launcher::new(
			&self.pids,
			&self.logs,
			self.timings.grace_period,
			self.log_retention,
		);
		Ok(launcher.start(def))
	}

	pub fn stop(&self, name: &str) -> Result<StopOutcome, EngineError> {
		self.definition(name)?;
		let pid = match self.pids.reconcile(name) {
			Recorded::Live(pid) => pid,
			Recorded::Stale(_) | Recorded::Nothing => return Ok(StopOutcome::NotRunning),
		};
		Ok(match Terminator::new(&self.pids, self.timings).stop(name, pid) {
			Termination::Stopped => StopOutcome::Stopped { pid },
			Termination::StillRunning(pid) => StopOutcome::StillRunning { pid },
		})
	}

	/// Stop, settle, start. Not atomic: if the start half fails the service is
	/// left stopped.
	pub fn restart(&self, name: &str) -> Result<RestartOutcome, EngineError> {
		let previous = match self.stop(name)? {
			StopOutcome::StillRunning { pid } => {
				tracing::warn!("{}: failed to stop, aborting restart", name);
				return Ok(RestartOutcome::StopFailed { pid });
			}
			StopOutcome::Stopped { pid } => Some(pid),
			StopOutcome::NotRunning => None,
		};
		std::thread::sleep(self.timings.restart_delay);
		let start = self.start(name)?;
		Ok(RestartOutcome::Restarted { previous, start })
	}

	pub fn status_all(&self) -> BatchReport<ServiceStatus> {
		BatchReport::collect(self.config.names(), |name| self.status(name))
	}

	pub fn start_all(&self) -> BatchReport<StartOutcome> {
		BatchReport::collect(self.config.names(), |name| self.start(name))
	}

	pub fn stop_all(&self) -> BatchReport<StopOutcome> {
		BatchReport::collect(self.config.names(), |name| self.stop(name))
	}

	pub fn restart_all(&self) -> BatchReport<RestartOutcome> {
		BatchReport::collect(self.config.names(), |name| self.restart(name))
	}

	/// Last `lines` lines of the service's most recent log file.
	pub fn log_tail(&self, name: &str, lines: usize) -> Result<Vec<String>, EngineError> {
		self.definition(name)?;
		Ok(self.logs.tail(name, lines))
	}

	/// Records an externally started process as the service's PID, if exactly
	/// one process matches its command line. See [`crate::reconcile`].
	pub fn adopt(&self, name: &str) -> Result<AdoptOutcome, EngineError> {
		let def = self.definition(name)?;
		if let Recorded::Live(pid) = self.pids.reconcile(name) {
			return Ok(AdoptOutcome::AlreadyTracked { pid });
		}
		let command_line = def.command_line();
		let pids = reconcile::find_by_command_line(&command_line)
			.map_err(|e| EngineError::io("scanning process table", e))?;
		match pids.len() {
			0 => Ok(AdoptOutcome::NoMatch),
			1 => {
				let pid = pids[0];
				self.pids
					.save(name, pid)
					.map_err(|e| EngineError::io(format!("{}: recording pid {}", name, pid), e))?;
				tracing::info!("{}: adopted pid {} matching '{}'", name, pid, command_line);
				Ok(AdoptOutcome::Adopted { pid })
			}
			_ => Ok(AdoptOutcome::Ambiguous { pids }),
		}
	}

	/// Drops a stopped service from the configuration (in memory) together with
	/// its PID record. Refuses while the service is running.
	pub fn forget(&mut self, name: &str) -> Result<ServiceDefinition, EngineError> {
		if let ServiceStatus::Running { pid } = self.status(name)? {
			return Err(EngineError::ServiceRunning { name: name.to_string(), pid });
		}
		self.pids
			.clear(name)
			.map_err(|e| EngineError::io(format!("{}: removing pid file", name), e))?;
		Ok(self.config.remove(name)?)
	}
}
