use std::time::Duration;

/// Fixed waits of the lifecycle actions. None of them can be cancelled once
/// started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
	/// How long a freshly launched process must survive to count as started.
	pub grace_period: Duration,
	pub stop_poll_interval: Duration,
	/// Liveness polls after the graceful signal before escalating.
	pub stop_poll_attempts: u32,
	/// Wait after the forceful signal before the final check.
	pub kill_wait: Duration,
	/// Settle time between the stop and start halves of a restart.
	pub restart_delay: Duration,
}

impl Default for Timings {
	fn default() -> Self {
		Self {
			grace_period: Duration::from_secs(2),
			stop_poll_interval: Duration::from_secs(1),
			stop_poll_attempts: 10,
			kill_wait: Duration::from_secs(1),
			restart_delay: Duration::from_secs(1),
		}
	}
}
