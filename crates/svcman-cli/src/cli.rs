use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use svcman_core::DEFAULT_CONFIG_FILE;

#[derive(Debug, Parser)]
#[command(name = "svcman", version, about = "Start, stop and inspect local background services")]
pub struct Cli {
	/// Configuration file (.json or .toml)
	#[arg(long, global = true, env = "SVCMAN_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
	pub config: PathBuf,

	/// More diagnostics on stderr (-v info, -vv debug)
	#[arg(short, long, global = true, action = ArgAction::Count)]
	pub verbose: u8,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Start a service in the background
	Start(Target),
	/// Stop a service (SIGTERM, then SIGKILL)
	Stop(Target),
	/// Stop then start a service
	Restart(Target),
	/// Show whether a service is running
	Status {
		#[command(flatten)]
		target: Target,
		/// Print machine-readable JSON
		#[arg(long)]
		json: bool,
	},
	/// List configured services
	List,
	/// Print the end of a service's latest log file
	Logs {
		name: String,
		#[arg(short = 'n', long, default_value_t = 100)]
		lines: usize,
	},
	/// Register a new service
	Add {
		name: String,
		#[arg(long)]
		cwd: Option<PathBuf>,
		#[arg(long = "env", value_name = "KEY=VALUE")]
		env: Vec<String>,
		/// Command and arguments, after `--`
		#[arg(last = true, required = true, num_args = 1..)]
		command: Vec<String>,
	},
	/// Change an existing service definition
	Modify(ModifyArgs),
	/// Remove a service from the configuration
	Delete {
		name: String,
		/// Stop the service first if it is running
		#[arg(long)]
		stop: bool,
	},
	/// Record an already running, externally started process as the service
	Adopt { name: String },
}

#[derive(Debug, Args)]
pub struct ModifyArgs {
	pub name: String,
	#[arg(long)]
	pub command: Option<String>,
	/// Append an argument (repeatable)
	#[arg(long = "arg", allow_hyphen_values = true)]
	pub args: Vec<String>,
	/// Drop existing arguments before appending --arg values
	#[arg(long)]
	pub clear_args: bool,
	#[arg(long, conflicts_with = "clear_cwd")]
	pub cwd: Option<PathBuf>,
	#[arg(long)]
	pub clear_cwd: bool,
	#[arg(long = "env", value_name = "KEY=VALUE")]
	pub env: Vec<String>,
	#[arg(long = "unset-env", value_name = "KEY")]
	pub unset_env: Vec<String>,
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct Target {
	pub name: Option<String>,
	/// Every configured service, in configuration order
	#[arg(long)]
	pub all: bool,
}

pub enum Selection<'a> {
	One(&'a str),
	All,
}

impl Target {
	pub fn selection(&self) -> Selection<'_> {
		match &self.name {
			Some(name) if !self.all => Selection::One(name),
			_ => Selection::All,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
		Cli::try_parse_from(std::iter::once("svcman").chain(args.iter().copied()))
	}

	#[test]
	fn definition_is_consistent() {
		use clap::CommandFactory;
		Cli::command().debug_assert();
	}

	#[test]
	fn target_requires_name_or_all() {
		assert!(parse(&["start"]).is_err());
		assert!(parse(&["start", "web", "--all"]).is_err());

		let cli = parse(&["stop", "--all"]).unwrap();
		match cli.command {
			Command::Stop(t) => assert!(matches!(t.selection(), Selection::All)),
			other => panic!("unexpected {:?}", other),
		}
		let cli = parse(&["status", "web", "--json"]).unwrap();
		match cli.command {
			Command::Status { target, json } => {
				assert!(json);
				assert!(matches!(target.selection(), Selection::One("web")));
			}
			other => panic!("unexpected {:?}", other),
		}
	}

	#[test]
	fn add_takes_command_after_separator() {
		let cli = parse(&["add", "web", "--env", "PORT=8000", "--", "python3", "-m", "http.server"]).unwrap();
		match cli.command {
			Command::Add { name, env, command, cwd } => {
				assert_eq!(name, "web");
				assert_eq!(env, vec!["PORT=8000"]);
				assert_eq!(command, vec!["python3", "-m", "http.server"]);
				assert!(cwd.is_none());
			}
			other => panic!("unexpected {:?}", other),
		}
		assert!(parse(&["add", "web"]).is_err());
	}

	#[test]
	fn global_flags_and_defaults() {
		let cli = parse(&["-vv", "logs", "web", "--config", "/etc/svcman.toml"]).unwrap();
		assert_eq!(cli.verbose, 2);
		assert_eq!(cli.config, PathBuf::from("/etc/svcman.toml"));
		match cli.command {
			Command::Logs { lines, .. } => assert_eq!(lines, 100),
			other => panic!("unexpected {:?}", other),
		}
	}

	#[test]
	fn modify_rejects_cwd_with_clear_cwd() {
		assert!(parse(&["modify", "web", "--cwd", "/srv", "--clear-cwd"]).is_err());
		let cli = parse(&["modify", "web", "--clear-args", "--arg", "-p", "--arg", "8080"]).unwrap();
		match cli.command {
			Command::Modify(m) => {
				assert!(m.clear_args);
				assert_eq!(m.args, vec!["-p", "8080"]);
			}
			other => panic!("unexpected {:?}", other),
		}
	}
}
