use owo_colors::OwoColorize;
use serde::Serialize;
use svcman_core::{
	AdoptOutcome, RestartOutcome, ServiceDefinition, ServiceStatus, StartOutcome, StopOutcome,
};
use svcman_engine::{BatchReport, EngineError};

// --- Outcomes ---

pub fn print_start(name: &str, outcome: &StartOutcome) {
	match outcome {
		StartOutcome::Started { pid } => {
			println!(" {} {} started (pid {})", "●".green(), name.bold(), pid)
		}
		StartOutcome::AlreadyRunning { pid } => {
			println!(" {} {} already running (pid {})", "●".green(), name.bold(), pid)
		}
		StartOutcome::Failed { reason, log_tail } => {
			println!(" {} {} {}", "●".red(), name.bold(), "failed to start".red());
			println!("   {}", reason);
			for line in log_tail {
				println!("   {} {}", "│".dimmed(), line.dimmed());
			}
		}
	}
}

pub fn print_stop(name: &str, outcome: &StopOutcome) {
	match outcome {
		StopOutcome::Stopped { pid } => {
			println!(" {} {} stopped (pid {})", "●".red(), name.bold(), pid)
		}
		StopOutcome::NotRunning => println!(" {} {} not running", "○".dimmed(), name.bold()),
		StopOutcome::StillRunning { pid } => println!(
			" {} {} {} (pid {}) after SIGKILL",
			"●".yellow(),
			name.bold(),
			"STILL RUNNING".yellow().bold(),
			pid
		),
	}
}

pub fn print_restart(name: &str, outcome: &RestartOutcome) {
	match outcome {
		RestartOutcome::Restarted { start, .. } => print_start(name, start),
		RestartOutcome::StopFailed { pid } => {
			print_stop(name, &StopOutcome::StillRunning { pid: *pid });
			println!("   restart aborted");
		}
	}
}

pub fn print_adopt(name: &str, outcome: &AdoptOutcome) {
	match outcome {
		AdoptOutcome::Adopted { pid } => {
			println!(" {} {} adopted (pid {})", "●".green(), name.bold(), pid)
		}
		AdoptOutcome::AlreadyTracked { pid } => {
			println!(" {} {} already tracked (pid {})", "●".green(), name.bold(), pid)
		}
		AdoptOutcome::NoMatch => {
			println!(" {} {} no matching process found", "○".dimmed(), name.bold())
		}
		AdoptOutcome::Ambiguous { pids } => {
			let pids: Vec<String> = pids.iter().map(|p| p.to_string()).collect();
			println!(
				" {} {} {} pids {}",
				"●".yellow(),
				name.bold(),
				"ambiguous:".yellow(),
				pids.join(", ")
			);
		}
	}
}

pub fn print_error(name: &str, err: &EngineError) {
	eprintln!(" {} {} {}", "✗".red(), name.bold(), err);
}

/// Prints every entry with `print` and reports whether the batch succeeded.
pub fn print_batch<T, F>(report: &BatchReport<T>, print: F) -> bool
where
	T: svcman_core::Outcome,
	F: Fn(&str, &T),
{
	if report.is_empty() {
		eprintln!("no services configured");
	}
	for entry in &report.entries {
		match &entry.result {
			Ok(outcome) => print(&entry.name, outcome),
			Err(e) => print_error(&entry.name, e),
		}
	}
	report.success()
}

// --- Status ---

fn state_label(status: &ServiceStatus) -> String {
	match status {
		ServiceStatus::Running { pid } => format!("{} {}", "RUNNING".green(), pid),
		ServiceStatus::Stopped => "STOPPED".red().to_string(),
		ServiceStatus::StaleCleared { pid } => {
			format!("{} {}", "STOPPED".red(), format!("(cleared stale pid {})", pid).dimmed())
		}
	}
}

fn circle(status: &ServiceStatus) -> String {
	if status.is_running() {
		"●".green().to_string()
	} else {
		"●".red().to_string()
	}
}

pub fn print_status_line(name: &str, status: &ServiceStatus, width: usize) {
	println!(" {} {:<width$} {}", circle(status), name, state_label(status), width = width);
}

pub fn print_status_detail(def: &ServiceDefinition, status: &ServiceStatus, log_tail: &[String]) {
	print_status_line(&def.name, status, def.name.len());
	println!("   {} {}", "command".dimmed(), def.command_line());
	if let Some(cwd) = &def.cwd {
		println!("   {} {}", "cwd".dimmed(), cwd.display());
	}
	if !log_tail.is_empty() {
		println!("   {}", "recent output".dimmed());
		for line in log_tail {
			println!("   {} {}", "│".dimmed(), line);
		}
	}
}

pub fn print_list(rows: &[(&ServiceDefinition, Result<ServiceStatus, EngineError>)]) {
	if rows.is_empty() {
		eprintln!("no services configured");
		return;
	}
	let width = rows.iter().map(|(d, _)| d.name.len()).max().unwrap_or(0);
	for (def, status) in rows {
		match status {
			Ok(status) => println!(
				" {} {:<width$} {:<10} {}",
				circle(status),
				def.name,
				status.pid().map(|p| p.to_string()).unwrap_or_else(|| "-".to_string()),
				def.command_line().dimmed(),
				width = width
			),
			Err(e) => print_error(&def.name, e),
		}
	}
}

#[derive(Serialize)]
struct StatusJson<'a> {
	name: &'a str,
	#[serde(flatten)]
	status: Option<&'a ServiceStatus>,
	#[serde(skip_serializing_if = "Option::is_none")]
	error: Option<String>,
}

pub fn status_json(entries: &[(&str, &Result<ServiceStatus, EngineError>)]) -> serde_json::Result<String> {
	let rows: Vec<StatusJson> = entries
		.iter()
		.map(|(name, result)| StatusJson {
			name,
			status: result.as_ref().ok(),
			error: result.as_ref().err().map(|e| e.to_string()),
		})
		.collect();
	serde_json::to_string_pretty(&rows)
}
