use nix::sys::signal::kill;
use nix::sys::wait::{waitpid, WaitPidFlag};
use nix::unistd::Pid;

/// Converts a recorded PID into a signalable one.
///
/// 0 and anything beyond `i32::MAX` would address a process group (or every
/// process) once handed to `kill(2)`, so they are rejected here.
pub fn to_pid(pid: u32) -> Option<Pid> {
	if pid == 0 || pid > i32::MAX as u32 {
		None
	} else {
		Some(Pid::from_raw(pid as i32))
	}
}

/// Whether `pid` currently denotes a live process we may signal.
///
/// Uses the null signal. `ESRCH` and `EPERM` both count as dead: a PID we
/// cannot signal is not one we launched, most likely a recycled identifier.
/// If `pid` is an exited child of this very process it is reaped first, so a
/// zombie is never reported alive. On Linux an orphaned zombie that nobody
/// has reaped yet also counts as dead.
pub fn is_alive(pid: u32) -> bool {
	let Some(target) = to_pid(pid) else {
		return false;
	};
	let _ = waitpid(target, Some(WaitPidFlag::WNOHANG));
	let alive = kill(target, None).is_ok() && !is_zombie(pid);
	tracing::debug!(pid, alive, "liveness probe");
	alive
}

#[cfg(target_os = "linux")]
fn is_zombie(pid: u32) -> bool {
	std::fs::read_to_string(format!("/proc/{}/stat", pid))
		.ok()
		.and_then(|stat| stat_state(&stat))
		== Some('Z')
}

#[cfg(not(target_os = "linux"))]
fn is_zombie(_pid: u32) -> bool {
	false
}

/// Process state letter from a `/proc/<pid>/stat` line. The command name may
/// itself contain parentheses, so the state follows the last `)`.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn stat_state(stat: &str) -> Option<char> {
	stat[stat.rfind(')')? + 1..].trim_start().chars().next()
}
