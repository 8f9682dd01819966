mod cli;
mod logger;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use cli::{Cli, Command, ModifyArgs, Selection, Target};
use owo_colors::OwoColorize;
use svcman_core::{ConfigStore, Outcome, ServiceDefinitionBuilder, ServiceStatus, StopOutcome};
use svcman_engine::{EngineError, LifecycleEngine};

/// Lines of recent output shown by `status <name>`.
const STATUS_TAIL_LINES: usize = 5;

fn main() -> ExitCode {
	let cli = Cli::parse();
	logger::init(cli.verbose);

	match run(cli) {
		Ok(true) => ExitCode::SUCCESS,
		Ok(false) => ExitCode::FAILURE,
		Err(e) => {
			eprintln!("{} {}", "error:".red().bold(), e);
			ExitCode::FAILURE
		}
	}
}

fn run(cli: Cli) -> Result<bool, EngineError> {
	let config = ConfigStore::load(&cli.config)?;
	let mut engine = LifecycleEngine::new(config);

	match cli.command {
		Command::Start(target) => cmd_start(&engine, &target),
		Command::Stop(target) => cmd_stop(&engine, &target),
		Command::Restart(target) => cmd_restart(&engine, &target),
		Command::Status { target, json } => cmd_status(&engine, &target, json),
		Command::List => cmd_list(&engine),
		Command::Logs { name, lines } => cmd_logs(&engine, &name, lines),
		Command::Add { name, cwd, env, command } => cmd_add(&mut engine, name, cwd, &env, command),
		Command::Modify(args) => cmd_modify(&mut engine, args),
		Command::Delete { name, stop } => cmd_delete(&mut engine, &name, stop),
		Command::Adopt { name } => {
			let outcome = engine.adopt(&name)?;
			output::print_adopt(&name, &outcome);
			Ok(outcome.is_success())
		}
	}
}

fn current_dir() -> Result<PathBuf, EngineError> {
	std::env::current_dir().map_err(|source| EngineError::Io {
		context: "reading current directory".to_string(),
		source,
	})
}

fn cmd_start(engine: &LifecycleEngine, target: &Target) -> Result<bool, EngineError> {
	match target.selection() {
		Selection::One(name) => {
			let outcome = engine.start(name)?;
			output::print_start(name, &outcome);
			Ok(outcome.is_success())
		}
		Selection::All => Ok(output::print_batch(&engine.start_all(), output::print_start)),
	}
}

fn cmd_stop(engine: &LifecycleEngine, target: &Target) -> Result<bool, EngineError> {
	match target.selection() {
		Selection::One(name) => {
			let outcome = engine.stop(name)?;
			output::print_stop(name, &outcome);
			Ok(outcome.is_success())
		}
		Selection::All => Ok(output::print_batch(&engine.stop_all(), output::print_stop)),
	}
}

fn cmd_restart(engine: &LifecycleEngine, target: &Target) -> Result<bool, EngineError> {
	match target.selection() {
		Selection::One(name) => {
			let outcome = engine.restart(name)?;
			output::print_restart(name, &outcome);
			Ok(outcome.is_success())
		}
		Selection::All => Ok(output::print_batch(&engine.restart_all(), output::print_restart)),
	}
}

fn cmd_status(engine: &LifecycleEngine, target: &Target, json: bool) -> Result<bool, EngineError> {
	match target.selection() {
		Selection::One(name) => {
			let status = engine.status(name);
			if json {
				print_json(&[(name, &status)]);
				return status.map(|_| true);
			}
			let status = status?;
			let tail = engine.log_tail(name, STATUS_TAIL_LINES)?;
			if let Some(def) = engine.config().get(name) {
				output::print_status_detail(def, &status, &tail);
			}
			Ok(true)
		}
		Selection::All => {
			let report = engine.status_all();
			if json {
				let rows: Vec<(&str, &Result<ServiceStatus, EngineError>)> = report
					.entries
					.iter()
					.map(|e| (e.name.as_str(), &e.result))
					.collect();
				print_json(&rows);
			} else {
				if report.is_empty() {
					eprintln!("no services configured");
				}
				let width = report.entries.iter().map(|e| e.name.len()).max().unwrap_or(0);
				for entry in &report.entries {
					match &entry.result {
						Ok(status) => output::print_status_line(&entry.name, status, width),
						Err(e) => output::print_error(&entry.name, e),
					}
				}
			}
			Ok(report.entries.iter().all(|e| e.result.is_ok()))
		}
	}
}

fn print_json(rows: &[(&str, &Result<ServiceStatus, EngineError>)]) {
	match output::status_json(rows) {
		Ok(text) => println!("{}", text),
		Err(e) => eprintln!("{} {}", "error:".red().bold(), e),
	}
}

fn cmd_list(engine: &LifecycleEngine) -> Result<bool, EngineError> {
	let rows: Vec<_> = engine
		.config()
		.services()
		.iter()
		.map(|def| (def, engine.status(&def.name)))
		.collect();
	output::print_list(&rows);
	Ok(true)
}

fn cmd_logs(engine: &LifecycleEngine, name: &str, lines: usize) -> Result<bool, EngineError> {
	let tail = engine.log_tail(name, lines)?;
	if tail.is_empty() && engine.logs().latest(name).is_none() {
		eprintln!("no logs for {}", name);
		return Ok(false);
	}
	for line in tail {
		println!("{}", line);
	}
	Ok(true)
}

fn cmd_add(
	engine: &mut LifecycleEngine,
	name: String,
	cwd: Option<PathBuf>,
	env: &[String],
	command: Vec<String>,
) -> Result<bool, EngineError> {
	let mut parts = command.into_iter();
	let program = parts.next().unwrap_or_default();
	let mut builder = ServiceDefinitionBuilder::new(name.as_str())
		.base_dir(current_dir()?)
		.command(program)
		.args(parts);
	if let Some(cwd) = cwd {
		builder = builder.cwd(cwd);
	}
	for assignment in env {
		builder = builder.env_assignment(assignment)?;
	}
	let def = builder.build()?;
	let line = def.command_line();
	engine.config_mut().add(def)?;
	engine.config().save()?;
	println!("added {} {}", name.bold(), line.dimmed());
	Ok(true)
}

fn cmd_modify(engine: &mut LifecycleEngine, m: ModifyArgs) -> Result<bool, EngineError> {
	let current = engine
		.config()
		.get(&m.name)
		.ok_or_else(|| EngineError::UnknownService(m.name.clone()))?;
	let mut builder = ServiceDefinitionBuilder::from_definition(current).base_dir(current_dir()?);
	if let Some(command) = m.command {
		builder = builder.command(command);
	}
	if m.clear_args {
		builder = builder.clear_args();
	}
	builder = builder.args(m.args);
	if m.clear_cwd {
		builder = builder.clear_cwd();
	}
	if let Some(cwd) = m.cwd {
		builder = builder.cwd(cwd);
	}
	for key in &m.unset_env {
		builder = builder.unset_env(key);
	}
	for assignment in &m.env {
		builder = builder.env_assignment(assignment)?;
	}
	let def = builder.build()?;
	engine.config_mut().replace(def)?;
	engine.config().save()?;
	println!("updated {}", m.name.bold());
	Ok(true)
}

fn cmd_delete(engine: &mut LifecycleEngine, name: &str, stop: bool) -> Result<bool, EngineError> {
	if stop {
		let outcome = engine.stop(name)?;
		if let StopOutcome::StillRunning { .. } = outcome {
			output::print_stop(name, &outcome);
			return Ok(false);
		}
	}
	engine.forget(name)?;
	engine.config().save()?;
	println!("deleted {}", name.bold());
	Ok(true)
}
