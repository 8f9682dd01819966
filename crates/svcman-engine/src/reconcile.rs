//! Best-effort discovery of externally started processes by command line.
//!
//! This is only for importing a process svcman did not launch. Substring
//! matching cannot tell two services running the same executable apart, so
//! nothing in the start/stop/status path relies on it; those trust PID
//! records re-validated by [`crate::probe`] only.

use std::io;
use std::process::Command;

/// PIDs whose full command line contains `command_line`, excluding this
/// process.
pub fn find_by_command_line(command_line: &str) -> io::Result<Vec<u32>> {
	let output = Command::new("ps").args(["-eo", "pid=,args="]).output()?;
	if !output.status.success() {
		return Err(io::Error::new(
			io::ErrorKind::Other,
			format!("ps exited with {}", output.status),
		));
	}
	let listing = String::from_utf8_lossy(&output.stdout);
	Ok(match_command_line(&listing, command_line, std::process::id()))
}

/// Parses `ps -o pid=,args=` output.
pub fn match_command_line(listing: &str, command_line: &str, exclude: u32) -> Vec<u32> {
	if command_line.trim().is_empty() {
		return Vec::new();
	}
	listing
		.lines()
		.filter_map(|line| {
			let (pid, args) = line.trim_start().split_once(char::is_whitespace)?;
			let pid: u32 = pid.parse().ok()?;
			(pid != exclude && args.contains(command_line)).then_some(pid)
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	const LISTING: &str = "    1 /sbin/init
  311 sleep 30
  312 sleep 300
  400 /usr/bin/python3 -m http.server 8000
  401 svcman adopt web
  bogus line
";

	#[test]
	fn matches_substrings() {
		assert_eq!(match_command_line(LISTING, "sleep 30", 0), vec![311, 312]);
		assert_eq!(match_command_line(LISTING, "python3 -m http.server", 0), vec![400]);
		assert!(match_command_line(LISTING, "nginx", 0).is_empty());
	}

	#[test]
	fn excludes_self_and_empty_needle() {
		assert_eq!(match_command_line(LISTING, "svcman adopt", 401), Vec::<u32>::new());
		assert!(match_command_line(LISTING, "  ", 0).is_empty());
	}

	#[test]
	fn finds_a_live_child() {
		let mut child = Command::new("sleep").arg("41.5").spawn().unwrap();
		let found = find_by_command_line("sleep 41.5").unwrap();
		assert!(found.contains(&child.id()), "found {:?}", found);
		child.kill().unwrap();
		child.wait().unwrap();
	}
}
