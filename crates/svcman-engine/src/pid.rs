use std::io;
use std::path::{Path, PathBuf};

use crate::probe;

/// What a PID record says once checked against the process table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorded {
	Nothing,
	Live(u32),
	/// The recorded process was gone and the record has been deleted.
	Stale(u32),
}

/// One `<service>.pid` file per service holding the decimal PID.
///
/// A record is only a hint: every reader goes through [`PidStore::reconcile`]
/// which re-validates it against the process table.
#[derive(Debug, Clone)]
pub struct PidStore {
	dir: PathBuf,
}

impl PidStore {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self { dir: dir.into() }
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	pub fn path_for(&self, service: &str) -> PathBuf {
		self.dir.join(format!("{}.pid", service))
	}

	/// Overwrites the record. Written to a sibling temp file and renamed so a
	/// concurrent reader never sees a half-written number.
	pub fn save(&self, service: &str, pid: u32) -> io::Result<()> {
		std::fs::create_dir_all(&self.dir)?;
		let path = self.path_for(service);
		let tmp = self.dir.join(format!(".{}.pid.{}", service, std::process::id()));
		std::fs::write(&tmp, pid.to_string())?;
		if let Err(e) = std::fs::rename(&tmp, &path) {
			let _ = std::fs::remove_file(&tmp);
			return Err(e);
		}
		tracing::debug!("wrote {} ({})", path.display(), pid);
		Ok(())
	}

	/// `None` when the file is missing or does not hold a PID.
	pub fn load(&self, service: &str) -> Option<u32> {
		std::fs::read_to_string(self.path_for(service))
			.ok()
			.and_then(|s| s.trim().parse().ok())
	}

	/// Deletes the record; a missing file is fine.
	pub fn clear(&self, service: &str) -> io::Result<()> {
		match std::fs::remove_file(self.path_for(service)) {
			Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
			_ => Ok(()),
		}
	}

	/// Loads the record and probes it, deleting it if the process is gone.
	pub fn reconcile(&self, service: &str) -> Recorded {
		let Some(pid) = self.load(service) else {
			return Recorded::Nothing;
		};
		if probe::is_alive(pid) {
			return Recorded::Live(pid);
		}
		match self.clear(service) {
			Ok(()) => tracing::info!("{}: cleared stale pid {}", service, pid),
			Err(e) => tracing::warn!("{}: failed to clear stale pid {}: {}", service, pid, e),
		}
		Recorded::Stale(pid)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	// Far above any default pid_max, so never a live process.
	const DEAD_PID: u32 = 2_000_000_000;

	#[test]
	fn save_load_clear() {
		let tmp = tempfile::tempdir().unwrap();
		let store = PidStore::new(tmp.path().join("pids"));
		assert_eq!(store.load("web"), None);

		store.save("web", 4242).unwrap();
		assert_eq!(std::fs::read_to_string(store.path_for("web")).unwrap(), "4242");
		assert_eq!(store.load("web"), Some(4242));

		store.save("web", 77).unwrap();
		assert_eq!(store.load("web"), Some(77));

		store.clear("web").unwrap();
		assert_eq!(store.load("web"), None);
		store.clear("web").unwrap();
	}

	#[test]
	fn garbage_reads_as_absent() {
		let tmp = tempfile::tempdir().unwrap();
		let store = PidStore::new(tmp.path());
		std::fs::write(store.path_for("web"), "not-a-number").unwrap();
		assert_eq!(store.load("web"), None);
		assert_eq!(store.reconcile("web"), Recorded::Nothing);

		std::fs::write(store.path_for("web"), "123\n").unwrap();
		assert_eq!(store.load("web"), Some(123));
	}

	#[test]
	fn reconcile_clears_stale_and_keeps_live() {
		let tmp = tempfile::tempdir().unwrap();
		let store = PidStore::new(tmp.path());

		store.save("ghost", DEAD_PID).unwrap();
		assert_eq!(store.reconcile("ghost"), Recorded::Stale(DEAD_PID));
		assert!(!store.path_for("ghost").exists());

		let me = std::process::id();
		store.save("me", me).unwrap();
		assert_eq!(store.reconcile("me"), Recorded::Live(me));
		assert!(store.path_for("me").exists());

		assert_eq!(store.reconcile("never"), Recorded::Nothing);
	}
}
