use chrono::{DateTime, Local, NaiveDate};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TAIL_WINDOW: u64 = 64 * 1024;

/// Today's date in local time, the partition key for new log output.
pub fn today() -> NaiveDate {
	Local::now().date_naive()
}

pub fn log_file_name(service: &str, date: NaiveDate) -> String {
	format!("{}-{}.log", service, date.format(DATE_FORMAT))
}

/// Extracts the date from `<service>-<YYYY-MM-DD>.log`.
///
/// The date part has to parse strictly, so `web-api-2026-01-02.log` is not
/// mistaken for a file of service `web`.
pub fn parse_log_date(service: &str, file_name: &str) -> Option<NaiveDate> {
	let date = file_name
		.strip_prefix(service)?
		.strip_prefix('-')?
		.strip_suffix(".log")?;
	if date.len() != 10 {
		return None;
	}
	NaiveDate::parse_from_str(date, DATE_FORMAT).ok()
}

pub fn session_marker(at: DateTime<Local>) -> String {
	format!("\n--- Service started at {} ---\n", at.format("%Y-%m-%d %H:%M:%S"))
}

/// Per-service, date-partitioned, append-only log files in one directory.
#[derive(Debug, Clone)]
pub struct LogSink {
	dir: PathBuf,
}

impl LogSink {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self { dir: dir.into() }
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	pub fn path_for(&self, service: &str, date: NaiveDate) -> PathBuf {
		self.dir.join(log_file_name(service, date))
	}

	pub fn open(&self, service: &str, date: NaiveDate) -> io::Result<File> {
		fs::create_dir_all(&self.dir)?;
		OpenOptions::new()
			.create(true)
			.append(true)
			.open(self.path_for(service, date))
	}

	pub fn append(&self, service: &str, date: NaiveDate, data: &[u8]) -> io::Result<()> {
		let mut file = self.open(service, date)?;
		file.write_all(data)
	}

	/// All of the service's log files, oldest first.
	pub fn files(&self, service: &str) -> Vec<PathBuf> {
		let entries = match fs::read_dir(&self.dir) {
			Ok(e) => e,
			Err(_) => return Vec::new(),
		};
		let mut files: Vec<(String, PathBuf)> = entries
			.flatten()
			.filter_map(|entry| {
				let name = entry.file_name().to_string_lossy().into_owned();
				parse_log_date(service, &name)?;
				Some((name, entry.path()))
			})
			.collect();
		// The fixed-width date makes name order chronological.
		files.sort();
		files.into_iter().map(|(_, path)| path).collect()
	}

	pub fn latest(&self, service: &str) -> Option<PathBuf> {
		self.files(service).pop()
	}

	/// Deletes all but the newest `keep` files of `service`. Returns how many
	/// were removed; failures are logged and skipped.
	pub fn rotate(&self, service: &str, keep: usize) -> usize {
		let files = self.files(service);
		if files.len() <= keep {
			return 0;
		}
		let excess = files.len() - keep;
		let mut removed = 0;
		for path in files.iter().take(excess) {
			match fs::remove_file(path) {
				Ok(()) => {
					tracing::info!("{}: removed old log {}", service, path.display());
					removed += 1;
				}
				Err(e) => tracing::warn!("{}: failed to remove {}: {}", service, path.display(), e),
			}
		}
		removed
	}

	/// Last `lines` lines of the most recent log file.
	pub fn tail(&self, service: &str, lines: usize) -> Vec<String> {
		match self.latest(service) {
			Some(path) => tail_file(&path, lines).unwrap_or_default(),
			None => Vec::new(),
		}
	}
}

fn tail_file(path: &Path, lines: usize) -> io::Result<Vec<String>> {
	let mut file = File::open(path)?;
	let len = file.metadata()?.len();
	let offset = len.saturating_sub(TAIL_WINDOW);
	file.seek(SeekFrom::Start(offset))?;
	let mut buf = Vec::new();
	file.read_to_end(&mut buf)?;

	let text = String::from_utf8_lossy(&buf);
	let mut all: Vec<&str> = text.lines().collect();
	if offset > 0 && !all.is_empty() {
		// Started mid-line.
		all.remove(0);
	}
	let start = all.len().saturating_sub(lines);
	Ok(all[start..].iter().map(|l| l.to_string()).collect())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn date(y: i32, m: u32, d: u32) -> NaiveDate {
		NaiveDate::from_ymd_opt(y, m, d).unwrap()
	}

	#[test]
	fn file_names() {
		assert_eq!(log_file_name("web", date(2026, 2, 14)), "web-2026-02-14.log");
		assert_eq!(parse_log_date("web", "web-2026-02-14.log"), Some(date(2026, 2, 14)));
		assert_eq!(parse_log_date("web", "web-api-2026-02-14.log"), None);
		assert_eq!(parse_log_date("web-api", "web-api-2026-02-14.log"), Some(date(2026, 2, 14)));
		assert_eq!(parse_log_date("web", "web-2026-2-14.log"), None);
		assert_eq!(parse_log_date("web", "web-2026-02-14.txt"), None);
		assert_eq!(parse_log_date("web", "web.log"), None);
	}

	#[test]
	fn session_marker_format() {
		let at = Local::now();
		let marker = session_marker(at);
		assert!(marker.starts_with("\n--- Service started at "));
		assert!(marker.ends_with(" ---\n"));
	}

	#[test]
	fn append_creates_directory() {
		let tmp = tempfile::tempdir().unwrap();
		let sink = LogSink::new(tmp.path().join("nested/logs"));
		let day = date(2026, 10, 18);
		sink.append("web", day, b"one\n").unwrap();
		sink.append("web", day, b"two\n").unwrap();
		let content = fs::read_to_string(sink.path_for("web", day)).unwrap();
		assert_eq!(content, "one\ntwo\n");
	}

	#[test]
	fn rotate_keeps_newest_per_service() {
		let tmp = tempfile::tempdir().unwrap();
		let sink = LogSink::new(tmp.path());
		for day in 1..=5 {
			sink.append("web", date(2026, 1, day), b"x\n").unwrap();
		}
		sink.append("web-api", date(2025, 12, 31), b"y\n").unwrap();
		fs::write(tmp.path().join("notes.txt"), "keep me").unwrap();

		assert_eq!(sink.rotate("web", 2), 3);
		let left: Vec<String> = sink
			.files("web")
			.iter()
			.map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
			.collect();
		assert_eq!(left, vec!["web-2026-01-04.log", "web-2026-01-05.log"]);
		assert_eq!(sink.files("web-api").len(), 1);
		assert!(tmp.path().join("notes.txt").exists());
		assert_eq!(sink.rotate("web", 2), 0);
	}

	#[test]
	fn rotation_across_year_boundary() {
		let tmp = tempfile::tempdir().unwrap();
		let sink = LogSink::new(tmp.path());
		sink.append("db", date(2025, 12, 30), b"a\n").unwrap();
		sink.append("db", date(2025, 12, 31), b"b\n").unwrap();
		sink.append("db", date(2026, 1, 1), b"c\n").unwrap();
		sink.rotate("db", 1);
		assert_eq!(sink.latest("db"), Some(sink.path_for("db", date(2026, 1, 1))));
		assert_eq!(sink.files("db").len(), 1);
	}

	#[test]
	fn tail_reads_latest_file() {
		let tmp = tempfile::tempdir().unwrap();
		let sink = LogSink::new(tmp.path());
		assert!(sink.tail("web", 3).is_empty());

		sink.append("web", date(2026, 1, 1), b"old\n").unwrap();
		sink.append("web", date(2026, 1, 2), b"l1\nl2\nl3\nl4\n").unwrap();
		assert_eq!(sink.tail("web", 3), vec!["l2", "l3", "l4"]);
		assert_eq!(sink.tail("web", 10).len(), 4);
	}

	#[test]
	fn tail_of_large_file_drops_partial_line() {
		let tmp = tempfile::tempdir().unwrap();
		let sink = LogSink::new(tmp.path());
		let day = date(2026, 1, 1);
		let line = "0123456789".repeat(10);
		let mut body = String::new();
		for i in 0..2000 {
			body.push_str(&format!("{} {}\n", i, line));
		}
		sink.append("big", day, body.as_bytes()).unwrap();
		let tail = sink.tail("big", 2);
		assert_eq!(tail, vec![format!("1998 {}", line), format!("1999 {}", line)]);
	}
}
