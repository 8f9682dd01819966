use std::fs::File;
use std::io::{self, Write};
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use chrono::Local;
use svcman_core::{ServiceDefinition, StartOutcome};

use crate::logs::{self, LogSink};
use crate::pid::{PidStore, Recorded};
use crate::probe;

/// Log lines surfaced when a launch fails.
const FAILURE_TAIL_LINES: usize = 3;

pub struct Launcher<'a> {
	pids: &'a PidStore,
	logs: &'a LogSink,
	grace_period: Duration,
	log_retention: usize,
}

impl<'a> Launcher<'a> {
	pub fn new(
		pids: &'a PidStore,
		logs: &'a LogSink,
		grace_period: Duration,
		log_retention: usize,
	) -> Self {
		Self { pids, logs, grace_period, log_retention }
	}

	/// Launches `def` detached, unless a live process is already on record.
	pub fn start(&self, def: &ServiceDefinition) -> StartOutcome {
		let name = def.name.as_str();
		if let Recorded::Live(pid) = self.pids.reconcile(name) {
			return StartOutcome::AlreadyRunning { pid };
		}

		let log = self.open_log(name);
		// Today's file may be new, which can push the service past its limit.
		self.logs.rotate(name, self.log_retention);
		let mut child = match spawn_detached(def, log) {
			Ok(child) => child,
			Err(e) => {
				tracing::warn!("{}: failed to spawn '{}': {}", name, def.command, e);
				return StartOutcome::Failed {
					reason: format!("failed to spawn '{}': {}", def.command, e),
					log_tail: self.logs.tail(name, FAILURE_TAIL_LINES),
				};
			}
		};
		let pid = child.id();
		tracing::info!("{}: launched '{}' (pid {})", name, def.command_line(), pid);

		std::thread::sleep(self.grace_period);

		let exited = match child.try_wait() {
			Ok(Some(status)) => Some(status.to_string()),
			Ok(None) => None,
			Err(_) if probe::is_alive(pid) => None,
			Err(e) => Some(e.to_string()),
		};
		if let Some(status) = exited {
			tracing::warn!("{}: exited during startup ({})", name, status);
			return StartOutcome::Failed {
				reason: format!("exited during startup ({})", status),
				log_tail: self.logs.tail(name, FAILURE_TAIL_LINES),
			};
		}

		if let Err(e) = self.pids.save(name, pid) {
			tracing::warn!("{}: started but pid {} was not recorded: {}", name, pid, e);
		}
		StartOutcome::Started { pid }
	}

	/// Today's log with a session marker written, or `None` if the log is
	/// unusable, in which case output is discarded rather than blocking the
	/// launch.
	fn open_log(&self, name: &str) -> Option<File> {
		let mut file = match self.logs.open(name, logs::today()) {
			Ok(f) => f,
			Err(e) => {
				tracing::warn!("{}: cannot open log in {}: {}", name, self.logs.dir().display(), e);
				return None;
			}
		};
		if let Err(e) = file.write_all(logs::session_marker(Local::now()).as_bytes()) {
			tracing::warn!("{}: cannot write session marker: {}", name, e);
		}
		Some(file)
	}
}

fn spawn_detached(def: &ServiceDefinition, log: Option<File>) -> io::Result<Child> {
	let (stdout, stderr) = match log {
		Some(file) => {
			let err = file.try_clone()?;
			(Stdio::from(file), Stdio::from(err))
		}
		None => (Stdio::null(), Stdio::null()),
	};

	let mut cmd = Command::new(&def.command);
	cmd.args(&def.args)
		.envs(&def.env)
		.stdin(Stdio::null())
		.stdout(stdout)
		.stderr(stderr);
	if let Some(cwd) = &def.cwd {
		cmd.current_dir(cwd);
	}
	// New session: own process group for group-wide signals, no controlling
	// terminal, so the service outlives this invocation.
	// SAFETY: setsid is async-signal-safe and the closure allocates nothing.
	unsafe {
		cmd.pre_exec(|| nix::unistd::setsid().map(drop).map_err(io::Error::from));
	}
	cmd.spawn()
}
