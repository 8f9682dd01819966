use nix::errno::Errno;
use nix::sys::signal::{kill, killpg, Signal};
use nix::unistd::Pid;

use crate::pid::PidStore;
use crate::probe;
use crate::timings::Timings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
	Stopped,
	StillRunning(u32),
}

/// Stops a recorded process: SIGTERM to its group, bounded polling, SIGKILL,
/// then reconciles the PID record with what actually happened.
pub struct Terminator<'a> {
	pids: &'a PidStore,
	timings: Timings,
}

impl<'a> Terminator<'a> {
	pub fn new(pids: &'a PidStore, timings: Timings) -> Self {
		Self { pids, timings }
	}

	pub fn stop(&self, service: &str, pid: u32) -> Termination {
		let Some(target) = probe::to_pid(pid) else {
			self.clear(service);
			return Termination::Stopped;
		};

		tracing::info!("{}: sending SIGTERM to pid {}", service, pid);
		signal_group(target, Signal::SIGTERM);

		for _ in 0..self.timings.stop_poll_attempts {
			if !probe::is_alive(pid) {
				break;
			}
			std::thread::sleep(self.timings.stop_poll_interval);
		}

		if probe::is_alive(pid) {
			tracing::warn!(
				"{}: pid {} ignored SIGTERM for {} polls, sending SIGKILL",
				service,
				pid,
				self.timings.stop_poll_attempts
			);
			signal_group(target, Signal::SIGKILL);
			std::thread::sleep(self.timings.kill_wait);
		}

		if probe::is_alive(pid) {
			tracing::warn!("{}: pid {} still running after SIGKILL", service, pid);
			return Termination::StillRunning(pid);
		}
		self.clear(service);
		Termination::Stopped
	}

	fn clear(&self, service: &str) {
		if let Err(e) = self.pids.clear(service) {
			tracing::warn!("{}: failed to remove pid file: {}", service, e);
		}
	}
}

/// Signals the whole process group led by `pid`, or just `pid` when it leads
/// no group (e.g. an adopted process). A target that already exited is not
/// an error.
fn signal_group(pid: Pid, signal: Signal) {
	match killpg(pid, signal) {
		Ok(()) => return,
		Err(Errno::ESRCH) => {}
		Err(e) => tracing::debug!("killpg({}, {}) failed: {}, signalling process only", pid, signal, e),
	}
	match kill(pid, signal) {
		Ok(()) | Err(Errno::ESRCH) => {}
		Err(e) => tracing::warn!("kill({}, {}) failed: {}", pid, signal, e),
	}
}
